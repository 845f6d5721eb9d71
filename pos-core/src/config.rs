//! Parâmetros do etiquetador e da validação cruzada.

use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_UNKNOWN_VALUE;

/// Configuração compartilhada por treino, decodificação e avaliação.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaggerConfig {
    /// Log-probabilidade para pares (palavra, tag) nunca vistos.
    pub unknown_value: f64,
    /// Número de partições da validação cruzada.
    pub folds: usize,
    /// Quantas sentenças do corpus entram na validação cruzada.
    pub limit: usize,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            unknown_value: DEFAULT_UNKNOWN_VALUE,
            folds: 5,
            limit: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config: TaggerConfig = serde_json::from_str(r#"{"folds": 10}"#).unwrap();
        assert_eq!(config.folds, 10);
        assert_eq!(config.limit, 1000);
        assert_eq!(config.unknown_value, DEFAULT_UNKNOWN_VALUE);
    }
}
