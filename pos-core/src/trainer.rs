//! # Treinamento supervisionado do HMM
//!
//! O treino acontece em duas passadas independentes:
//!
//! 1. **Contagem**: percorre as sentenças e acumula frequências de emissão
//!    (`palavra -> tag`) e de transição (`tag -> próxima tag`, incluindo
//!    `# -> primeira tag`) numa tabela nova.
//! 2. **Normalização**: converte cada contagem em log-probabilidade.
//!
//! ```text
//! emissão:   log( count(palavra, tag) / total(tag) )
//! transição: log( count(tag, próxima) / Σ_próximas count(tag, ·) )
//! ```
//!
//! `total(tag)` é acumulado percorrendo a tabela de emissões em ordem de
//! palavra: a primeira palavra vista com a tag contribui com a contagem
//! inteira, cada palavra distinta seguinte contribui com `+1`. Não é a
//! frequência da tag no corpus, e as emissões de uma tag não somam 1.
//!
//! Não há suavização: pares nunca vistos recebem o valor de fallback do
//! modelo na hora da consulta.

use std::collections::BTreeMap;

use tracing::debug;

use crate::corpus::Sentence;
use crate::model::{LogProbTable, ProbabilityModel, DEFAULT_UNKNOWN_VALUE, START_TAG};

type CountTable = BTreeMap<String, BTreeMap<String, u32>>;

/// Frequências brutas acumuladas na primeira passada.
#[derive(Debug, Default)]
struct FrequencyTables {
    emissions: CountTable,
    transitions: CountTable,
}

impl FrequencyTables {
    fn observe_sentence(&mut self, sentence: &Sentence) {
        debug_assert_eq!(
            sentence.words.len(),
            sentence.tags.len(),
            "sentence words and tags must be aligned"
        );

        for (j, (word, tag)) in sentence.pairs().enumerate() {
            increment(&mut self.emissions, word, tag);

            // Toda tag vista ganha uma entrada, mesmo que nunca tenha sucessora.
            self.transitions.entry(tag.to_string()).or_default();

            if j == 0 {
                increment(&mut self.transitions, START_TAG, tag);
            }
            if let Some(next_tag) = sentence.tags.get(j + 1) {
                increment(&mut self.transitions, tag, next_tag);
            }
        }
    }

    /// Denominador de emissão por tag (ver doc do módulo).
    fn tag_totals(&self) -> BTreeMap<&str, u32> {
        let mut totals: BTreeMap<&str, u32> = BTreeMap::new();
        for by_tag in self.emissions.values() {
            for (tag, &count) in by_tag {
                totals
                    .entry(tag.as_str())
                    .and_modify(|total| *total += 1)
                    .or_insert(count);
            }
        }
        totals
    }

    fn normalize(self, unknown_value: f64) -> ProbabilityModel {
        let tag_totals = self.tag_totals();

        let emissions: LogProbTable = self
            .emissions
            .iter()
            .map(|(word, by_tag)| {
                let probs = by_tag
                    .iter()
                    .map(|(tag, &count)| {
                        let total = tag_totals.get(tag.as_str()).copied().unwrap_or(count);
                        (tag.clone(), log_ratio(count, total))
                    })
                    .collect();
                (word.clone(), probs)
            })
            .collect();

        let transitions: LogProbTable = self
            .transitions
            .into_iter()
            .map(|(from, next)| {
                let total: u32 = next.values().sum();
                let probs = next
                    .into_iter()
                    .map(|(to, count)| (to, log_ratio(count, total)))
                    .collect();
                (from, probs)
            })
            .collect();

        ProbabilityModel::from_tables(emissions, transitions, unknown_value)
    }
}

fn increment(table: &mut CountTable, key: &str, inner: &str) {
    *table
        .entry(key.to_string())
        .or_default()
        .entry(inner.to_string())
        .or_insert(0) += 1;
}

fn log_ratio(count: u32, total: u32) -> f64 {
    (count as f64 / total as f64).ln()
}

/// Estimador de parâmetros do HMM.
///
/// Cada chamada de `train` devolve um [`ProbabilityModel`] novo e
/// independente; a entrada nunca é modificada.
#[derive(Debug, Clone, Copy)]
pub struct Trainer {
    unknown_value: f64,
}

impl Trainer {
    pub fn new(unknown_value: f64) -> Self {
        Self { unknown_value }
    }

    /// Treina com até `limit` sentenças do início de `sentences`.
    pub fn train<'a, I>(&self, sentences: I, limit: usize) -> ProbabilityModel
    where
        I: IntoIterator<Item = &'a Sentence>,
    {
        let mut counts = FrequencyTables::default();
        let mut used = 0;
        for sentence in sentences.into_iter().take(limit) {
            counts.observe_sentence(sentence);
            used += 1;
        }
        self.finish(counts, used)
    }

    /// Mesma coisa que [`Trainer::train`], mas com palavras e tags em
    /// listas paralelas (uma entrada por sentença).
    pub fn train_aligned(
        &self,
        word_sentences: &[Vec<String>],
        tag_sentences: &[Vec<String>],
        limit: usize,
    ) -> ProbabilityModel {
        let mut counts = FrequencyTables::default();
        let pairs = word_sentences.iter().zip(tag_sentences).take(limit);
        let mut used = 0;
        for (words, tags) in pairs {
            counts.observe_sentence(&Sentence::new(words.clone(), tags.clone()));
            used += 1;
        }
        self.finish(counts, used)
    }

    fn finish(&self, counts: FrequencyTables, sentences: usize) -> ProbabilityModel {
        debug!(
            sentences = sentences,
            words = counts.emissions.len(),
            tags = counts.transitions.len(),
            "training pass finished"
        );
        counts.normalize(self.unknown_value)
    }
}

impl Default for Trainer {
    fn default() -> Self {
        Self::new(DEFAULT_UNKNOWN_VALUE)
    }
}

/// Atalho para `Trainer::default().train(sentences, limit)`.
pub fn train<'a, I>(sentences: I, limit: usize) -> ProbabilityModel
where
    I: IntoIterator<Item = &'a Sentence>,
{
    Trainer::default().train(sentences, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::demo_corpus;

    fn sentences(lines: &[(&str, &str)]) -> Vec<Sentence> {
        lines
            .iter()
            .map(|(w, t)| Sentence::from_lines(w, t))
            .collect()
    }

    #[test]
    fn test_transition_rows_sum_to_one() {
        let corpus = demo_corpus();
        let model = train(&corpus.sentences, usize::MAX);

        for (from, next) in model.transitions() {
            if next.is_empty() {
                continue;
            }
            let mass: f64 = next.values().map(|lp| lp.exp()).sum();
            assert!((mass - 1.0).abs() < 1e-9, "row {from} sums to {mass}");
        }
    }

    #[test]
    fn test_emissions_normalized_per_tag() {
        let model = train(
            &sentences(&[("the dog runs", "DET N V"), ("a dog sleeps", "DET N V")]),
            usize::MAX,
        );

        // DET: "the" 1x, "a" 1x
        assert!((model.emission("the", "DET") - 0.5f64.ln()).abs() < 1e-12);
        // N: só "dog"
        assert!(model.emission("dog", "N").abs() < 1e-12);
    }

    #[test]
    fn test_emission_total_counts_first_word_then_one_per_word() {
        let model = train(
            &sentences(&[("the dog", "DET N"), ("the cat", "DET N"), ("a cat", "DET N")]),
            usize::MAX,
        );

        // DET: "a" (1) vem primeiro, "the" soma +1 => total 2, não 3.
        assert!(model.emission("the", "DET").abs() < 1e-12);
        assert!((model.emission("a", "DET") - 0.5f64.ln()).abs() < 1e-12);
        // N: "cat" (2) vem primeiro, "dog" soma +1 => total 3.
        assert!((model.emission("cat", "N") - (2.0f64 / 3.0).ln()).abs() < 1e-12);
        assert!((model.emission("dog", "N") - (1.0f64 / 3.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_emission_total_can_fall_below_count() {
        let model = train(
            &sentences(&[
                ("a dog", "DET N"),
                ("the dog", "DET N"),
                ("the cat", "DET N"),
                ("the bird", "DET N"),
            ]),
            usize::MAX,
        );

        // DET: "a" (1) + "the" (+1) => total 2 para 3 ocorrências de "the".
        assert!((model.emission("the", "DET") - 1.5f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_start_transitions_come_from_first_tags() {
        let model = train(
            &sentences(&[("the dog", "DET N"), ("dogs run", "N V"), ("a cat", "DET N")]),
            usize::MAX,
        );

        assert!((model.transition(START_TAG, "DET").unwrap() - (2.0f64 / 3.0).ln()).abs() < 1e-12);
        assert!((model.transition(START_TAG, "N").unwrap() - (1.0f64 / 3.0).ln()).abs() < 1e-12);
        assert_eq!(model.transition(START_TAG, "V"), None);
    }

    #[test]
    fn test_sentence_final_tag_has_no_outgoing_mass() {
        let model = train(&sentences(&[("the dog runs", "DET N V")]), usize::MAX);

        let successors = model.successors("V");
        assert!(successors.map_or(true, |next| next.is_empty()));
    }

    #[test]
    fn test_limit_caps_consumed_sentences() {
        let data = sentences(&[("the dog", "DET N"), ("runs", "V")]);
        let model = train(&data, 1);

        assert_eq!(model.emission("runs", "V"), DEFAULT_UNKNOWN_VALUE);
        assert_eq!(model.vocabulary_size(), 2);
    }

    #[test]
    fn test_train_aligned_matches_train() {
        let corpus = demo_corpus();
        let a = train(&corpus.sentences, 5);
        let b = Trainer::default().train_aligned(&corpus.word_sentences(), &corpus.tag_sentences(), 5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_retraining_yields_independent_models() {
        let corpus = demo_corpus();
        let trainer = Trainer::default();
        let small = trainer.train(&corpus.sentences, 1);
        let full = trainer.train(&corpus.sentences, usize::MAX);

        assert!(small.vocabulary_size() < full.vocabulary_size());
        assert_eq!(small, trainer.train(&corpus.sentences, 1));
    }

    #[test]
    fn test_unknown_value_is_carried_into_model() {
        let model = Trainer::new(-50.0).train(&demo_corpus().sentences, usize::MAX);
        assert_eq!(model.emission("zebra", "N"), -50.0);
    }
}
