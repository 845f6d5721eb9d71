//! # Etiquetador POS
//!
//! Fachada que junta treino e decodificação:
//!
//! ```rust
//! use pos_core::{corpus::Sentence, PosTagger};
//!
//! let corpus = vec![
//!     Sentence::from_lines("the dog runs", "DET NOUN VERB"),
//!     Sentence::from_lines("a cat runs", "DET NOUN VERB"),
//! ];
//! let tagger = PosTagger::trained(&corpus, usize::MAX);
//!
//! assert_eq!(tagger.tag("The cat runs").unwrap(), vec!["DET", "NOUN", "VERB"]);
//! ```

use crate::config::TaggerConfig;
use crate::corpus::Sentence;
use crate::error::Result;
use crate::model::ProbabilityModel;
use crate::trainer::Trainer;
use crate::viterbi::{decode, viterbi_decode, ViterbiResult};

/// Divide o texto em palavras minúsculas (separadas por espaço).
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Etiquetador HMM: guarda o modelo treinado e a configuração.
#[derive(Debug, Clone, Default)]
pub struct PosTagger {
    model: ProbabilityModel,
    config: TaggerConfig,
}

impl PosTagger {
    /// Etiquetador ainda sem treino (não consegue atribuir nenhuma tag).
    pub fn new(config: TaggerConfig) -> Self {
        Self {
            model: ProbabilityModel::empty().with_unknown_value(config.unknown_value),
            config,
        }
    }

    /// Cria e treina com a configuração padrão.
    pub fn trained(sentences: &[Sentence], limit: usize) -> Self {
        let mut tagger = Self::new(TaggerConfig::default());
        tagger.train(sentences, limit);
        tagger
    }

    /// Usa um modelo já treinado (ex: carregado de JSON).
    pub fn from_model(model: ProbabilityModel, config: TaggerConfig) -> Self {
        Self { model, config }
    }

    /// Descarta o modelo atual e treina outro com até `limit` sentenças.
    pub fn train(&mut self, sentences: &[Sentence], limit: usize) {
        self.model = self.trainer().train(sentences, limit);
    }

    /// Treino a partir de listas paralelas de palavras e tags.
    pub fn train_aligned(
        &mut self,
        word_sentences: &[Vec<String>],
        tag_sentences: &[Vec<String>],
        limit: usize,
    ) {
        self.model = self.trainer().train_aligned(word_sentences, tag_sentences, limit);
    }

    fn trainer(&self) -> Trainer {
        Trainer::new(self.config.unknown_value)
    }

    /// Etiqueta um texto com palavras separadas por espaço.
    /// Texto vazio devolve uma sequência vazia.
    pub fn tag(&self, text: &str) -> Result<Vec<String>> {
        decode(&self.model, &tokenize(text))
    }

    /// Como [`PosTagger::tag`], mas devolve também a tabela do Viterbi.
    pub fn tag_with_trace(&self, text: &str) -> Result<ViterbiResult> {
        viterbi_decode(&self.model, &tokenize(text))
    }

    pub fn model(&self) -> &ProbabilityModel {
        &self.model
    }

    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }
}
