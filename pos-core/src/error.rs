//! # Erros do etiquetador
//!
//! Palavras desconhecidas **não** são erro: recebem o valor de fallback
//! do modelo (ver [`crate::model::DEFAULT_UNKNOWN_VALUE`]). Os erros abaixo
//! cobrem apenas falhas reais de dados ou de decodificação.

use thiserror::Error;

/// Erros que podem ocorrer no treino, na decodificação ou na validação cruzada.
#[derive(Debug, Error)]
pub enum PosError {
    /// Nenhuma tag alcançável nesta posição (tabela de transições esgotada).
    #[error("no reachable tag at position {position} (word {word:?})")]
    NoReachableState {
        /// Posição (0-indexada) da palavra na sentença.
        position: usize,
        /// Palavra que não pôde receber tag.
        word: String,
    },

    /// A partição de teste não tem nenhuma tag para comparar.
    #[error("fold {fold} has no test tags")]
    EmptyFold { fold: usize },

    #[error("cross-validation needs at least one fold")]
    InvalidFoldCount,

    /// Todas as partições falharam: não existe média para reportar.
    #[error("every cross-validation fold failed")]
    NoSuccessfulFolds,

    /// Linha do corpus com número diferente de palavras e tags.
    #[error("sentence on line {line} has {words} words but {tags} tags")]
    MisalignedSentence { line: usize, words: usize, tags: usize },

    /// Os arquivos de palavras e tags têm quantidades de linhas diferentes.
    #[error("corpus has {words} word lines but {tags} tag lines")]
    LineCountMismatch { words: usize, tags: usize },

    #[error("corpus I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias de `Result` para as operações do etiquetador.
pub type Result<T> = std::result::Result<T, PosError>;
