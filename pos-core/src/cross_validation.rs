//! # Validação cruzada
//!
//! Para cada partição `f` em `0..k`, a sentença de índice `i` (entre as
//! primeiras `n` do corpus) vai para o **teste** se `(i + f) % k == 0`;
//! as demais vão para o treino. Cada partição treina um modelo novo,
//! etiqueta as sentenças de teste e compara tag a tag com o gabarito.
//!
//! ```text
//! acurácia(f) = acertos / tags comparadas * 100
//! média       = média aritmética das acurácias das partições bem-sucedidas
//! ```
//!
//! Partições sem nenhuma tag de teste falham com [`PosError::EmptyFold`] e
//! aparecem no relatório como puladas; nunca entram na média.
//!
//! As partições são independentes entre si e rodam em paralelo (Rayon).
//! O relatório sai sempre na ordem das partições.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::TaggerConfig;
use crate::corpus::{Corpus, Sentence};
use crate::error::{PosError, Result};
use crate::tagger::tokenize;
use crate::trainer::Trainer;
use crate::viterbi::decode;

/// Contagens de uma partição avaliada com sucesso.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldAccuracy {
    pub matches: usize,
    pub total: usize,
    /// Porcentagem (0 a 100).
    pub accuracy: f64,
    /// Sentenças de teste que o decodificador não conseguiu etiquetar.
    pub failed_sentences: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FoldOutcome {
    Scored(FoldAccuracy),
    Failed { error: String },
}

/// Resultado de uma partição.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldReport {
    pub fold: usize,
    pub train_sentences: usize,
    pub test_sentences: usize,
    pub outcome: FoldOutcome,
}

impl FoldReport {
    pub fn accuracy(&self) -> Option<f64> {
        match &self.outcome {
            FoldOutcome::Scored(scored) => Some(scored.accuracy),
            FoldOutcome::Failed { .. } => None,
        }
    }
}

/// Relatório completo da validação cruzada.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationReport {
    pub folds: Vec<FoldReport>,
}

impl CrossValidationReport {
    /// Média das acurácias das partições bem-sucedidas.
    pub fn average_accuracy(&self) -> Result<f64> {
        let scored: Vec<f64> = self.folds.iter().filter_map(FoldReport::accuracy).collect();
        if scored.is_empty() {
            return Err(PosError::NoSuccessfulFolds);
        }
        Ok(scored.iter().sum::<f64>() / scored.len() as f64)
    }

    /// Partições que falharam e ficaram de fora da média.
    pub fn skipped_folds(&self) -> Vec<&FoldReport> {
        self.folds.iter().filter(|f| f.accuracy().is_none()).collect()
    }
}

/// Executor da validação cruzada com `folds` partições sobre até `limit`
/// sentenças.
#[derive(Debug, Clone, Copy)]
pub struct CrossValidator {
    folds: usize,
    limit: usize,
    trainer: Trainer,
}

impl CrossValidator {
    pub fn new(folds: usize, limit: usize) -> Self {
        Self {
            folds,
            limit,
            trainer: Trainer::default(),
        }
    }

    pub fn from_config(config: &TaggerConfig) -> Self {
        Self {
            folds: config.folds,
            limit: config.limit,
            trainer: Trainer::new(config.unknown_value),
        }
    }

    /// Avalia todas as partições.
    ///
    /// Só falha como um todo se `folds == 0`; falhas de partições
    /// individuais ficam registradas no relatório.
    pub fn run(&self, sentences: &[Sentence]) -> Result<CrossValidationReport> {
        if self.folds == 0 {
            return Err(PosError::InvalidFoldCount);
        }

        let pool = &sentences[..self.limit.min(sentences.len())];
        let folds: Vec<FoldReport> = (0..self.folds)
            .into_par_iter()
            .map(|fold| self.run_fold(pool, fold))
            .collect();

        Ok(CrossValidationReport { folds })
    }

    fn run_fold(&self, pool: &[Sentence], fold: usize) -> FoldReport {
        let mut train: Vec<&Sentence> = Vec::new();
        let mut test: Vec<&Sentence> = Vec::new();
        for (i, sentence) in pool.iter().enumerate() {
            if (i + fold) % self.folds == 0 {
                test.push(sentence);
            } else {
                train.push(sentence);
            }
        }

        let outcome = match self.score_fold(fold, &train, &test) {
            Ok(scored) => {
                info!(
                    fold = fold,
                    matches = scored.matches,
                    total = scored.total,
                    "fold accuracy {:.2}%",
                    scored.accuracy
                );
                FoldOutcome::Scored(scored)
            }
            Err(err) => {
                warn!(fold = fold, "fold skipped: {err}");
                FoldOutcome::Failed {
                    error: err.to_string(),
                }
            }
        };

        FoldReport {
            fold,
            train_sentences: train.len(),
            test_sentences: test.len(),
            outcome,
        }
    }

    fn score_fold(&self, fold: usize, train: &[&Sentence], test: &[&Sentence]) -> Result<FoldAccuracy> {
        let model = self.trainer.train(train.iter().copied(), usize::MAX);

        let mut matches = 0;
        let mut total = 0;
        let mut failed_sentences = 0;

        for sentence in test {
            // Passa pelo mesmo caminho de texto que uma consulta real.
            let words = tokenize(&sentence.text());
            let predicted = match decode(&model, &words) {
                Ok(tags) => tags,
                Err(err) => {
                    warn!(fold = fold, "sentence not tagged: {err}");
                    failed_sentences += 1;
                    continue;
                }
            };

            for (predicted_tag, gold_tag) in predicted.iter().zip(&sentence.tags) {
                if predicted_tag == gold_tag {
                    matches += 1;
                }
                total += 1;
            }
        }

        if total == 0 {
            return Err(PosError::EmptyFold { fold });
        }

        Ok(FoldAccuracy {
            matches,
            total,
            accuracy: matches as f64 / total as f64 * 100.0,
            failed_sentences,
        })
    }
}

/// Média de acurácia (%) com `k` partições sobre as primeiras `n` sentenças.
///
/// Atalho que descarta o resto do relatório: sentenças que o decodificador
/// não conseguiu etiquetar ficam fora da conta da partição (só aparecem no
/// log e em [`FoldAccuracy::failed_sentences`]), e partições puladas não
/// entram na média. Use [`CrossValidator::run`] quando isso importar.
pub fn cross_validate(corpus: &Corpus, k: usize, n: usize) -> Result<f64> {
    CrossValidator::new(k, n).run(&corpus.sentences)?.average_accuracy()
}
