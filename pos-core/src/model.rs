//! # Modelo de probabilidades do HMM
//!
//! - **Estados ocultos**: tags POS (DET, N, V, ...)
//! - **Observações**: palavras (em minúsculas)
//!
//! O modelo guarda apenas **log-probabilidades** (sem contagens brutas):
//!
//! - `emissions[palavra][tag]` = log P(palavra | tag)
//! - `transitions[tag][próxima]` = log P(próxima | tag)
//!
//! A tag sentinela [`START_TAG`] (`#`) representa o início da sentença:
//! `transitions["#"]` contém as probabilidades iniciais.
//!
//! As tabelas usam `BTreeMap` para que a iteração seja sempre em ordem
//! crescente de tag. O decodificador depende disso para desempatar scores.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tag sentinela de início de sentença.
pub const START_TAG: &str = "#";

/// Log-probabilidade usada para pares (palavra, tag) nunca observados.
pub const DEFAULT_UNKNOWN_VALUE: f64 = -200.0;

/// Tabela `chave -> (chave -> log-probabilidade)`.
pub type LogProbTable = BTreeMap<String, BTreeMap<String, f64>>;

/// Parâmetros aprendidos do HMM. Somente leitura depois do treino.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityModel {
    emissions: LogProbTable,
    transitions: LogProbTable,
    unknown_value: f64,
}

impl ProbabilityModel {
    /// Monta um modelo a partir de tabelas já normalizadas.
    pub fn from_tables(emissions: LogProbTable, transitions: LogProbTable, unknown_value: f64) -> Self {
        Self {
            emissions,
            transitions,
            unknown_value,
        }
    }

    /// Modelo sem nenhum parâmetro (nenhuma tag alcançável).
    pub fn empty() -> Self {
        Self::from_tables(LogProbTable::new(), LogProbTable::new(), DEFAULT_UNKNOWN_VALUE)
    }

    /// Troca a constante de fallback para palavras desconhecidas.
    pub fn with_unknown_value(mut self, unknown_value: f64) -> Self {
        self.unknown_value = unknown_value;
        self
    }

    pub fn unknown_value(&self) -> f64 {
        self.unknown_value
    }

    /// log P(palavra | tag), ou o valor de fallback se o par nunca foi visto.
    pub fn emission(&self, word: &str, tag: &str) -> f64 {
        self.emissions
            .get(word)
            .and_then(|tags| tags.get(tag))
            .copied()
            .unwrap_or(self.unknown_value)
    }

    /// log P(to | from). `None` se a transição nunca foi observada.
    ///
    /// Não existe valor padrão para transições: um estado sem saídas
    /// simplesmente não é expandido.
    pub fn transition(&self, from: &str, to: &str) -> Option<f64> {
        self.transitions.get(from).and_then(|next| next.get(to)).copied()
    }

    /// Tags que podem seguir `tag`, em ordem crescente.
    /// `None` (ou mapa vazio) significa "sem continuação".
    pub fn successors(&self, tag: &str) -> Option<&BTreeMap<String, f64>> {
        self.transitions.get(tag)
    }

    pub fn emissions(&self) -> &LogProbTable {
        &self.emissions
    }

    pub fn transitions(&self) -> &LogProbTable {
        &self.transitions
    }

    /// Todas as tags conhecidas (sem a sentinela), em ordem.
    pub fn tags(&self) -> BTreeSet<&str> {
        let mut tags: BTreeSet<&str> = BTreeSet::new();
        for (from, next) in &self.transitions {
            tags.insert(from.as_str());
            tags.extend(next.keys().map(String::as_str));
        }
        for by_tag in self.emissions.values() {
            tags.extend(by_tag.keys().map(String::as_str));
        }
        tags.remove(START_TAG);
        tags
    }

    /// Número de palavras distintas vistas no treino.
    pub fn vocabulary_size(&self) -> usize {
        self.emissions.len()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for ProbabilityModel {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &[(&str, f64)])]) -> LogProbTable {
        entries
            .iter()
            .map(|(k, inner)| {
                let inner = inner.iter().map(|(t, p)| (t.to_string(), *p)).collect();
                (k.to_string(), inner)
            })
            .collect()
    }

    fn tiny_model() -> ProbabilityModel {
        ProbabilityModel::from_tables(
            table(&[("dog", &[("N", -0.5)]), ("runs", &[("V", 0.0)])]),
            table(&[("#", &[("N", 0.0)]), ("N", &[("V", 0.0)])]),
            DEFAULT_UNKNOWN_VALUE,
        )
    }

    #[test]
    fn test_unseen_pairs_use_unknown_value() {
        let model = tiny_model();
        assert_eq!(model.emission("dog", "N"), -0.5);
        assert_eq!(model.emission("dog", "V"), DEFAULT_UNKNOWN_VALUE);
        assert_eq!(model.emission("cat", "N"), DEFAULT_UNKNOWN_VALUE);
    }

    #[test]
    fn test_unknown_value_can_be_injected() {
        let model = tiny_model().with_unknown_value(-7.0);
        assert_eq!(model.emission("cat", "N"), -7.0);
    }

    #[test]
    fn test_transition_has_no_default() {
        let model = tiny_model();
        assert_eq!(model.transition("#", "N"), Some(0.0));
        assert_eq!(model.transition("V", "N"), None);
        assert!(model.successors("V").is_none());
    }

    #[test]
    fn test_tags_exclude_sentinel() {
        let model = tiny_model();
        let tags: Vec<&str> = model.tags().into_iter().collect();
        assert_eq!(tags, vec!["N", "V"]);
        assert_eq!(model.vocabulary_size(), 2);
    }

    #[test]
    fn test_json_export_reloads_same_model() {
        let model = tiny_model();
        let json = model.to_json().unwrap();
        assert_eq!(ProbabilityModel::from_json(&json).unwrap(), model);
    }
}
