//! # pos-core — Etiquetador Morfossintático (POS) com HMM
//!
//! Este crate implementa um etiquetador de classes gramaticais baseado em um
//! **Hidden Markov Model** treinado de forma supervisionada, com decodificação
//! pelo **algoritmo de Viterbi** em log-espaço.
//!
//! ## Arquitetura do Sistema
//!
//! ```text
//! Corpus ──▶ Trainer ──▶ ProbabilityModel ──▶ Viterbi ──▶ tags
//!    └──────────── CrossValidator (repete o ciclo por partição) ───────┘
//! ```
//!
//! 1.  **Corpus** ([`corpus`]): sentenças com palavras e tags alinhadas.
//! 2.  **Treino** ([`trainer`]): conta frequências e normaliza em log-probabilidades.
//! 3.  **Modelo** ([`model`]): tabelas de emissão e transição, com a sentinela `#`.
//! 4.  **Decodificação** ([`viterbi`]): melhor sequência de tags + tabela de scores.
//! 5.  **Avaliação** ([`cross_validation`]): acurácia média em `k` partições.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use pos_core::{corpus::demo_corpus, cross_validate, PosTagger};
//!
//! let corpus = demo_corpus();
//! let tagger = PosTagger::trained(&corpus.sentences, usize::MAX);
//!
//! let tags = tagger.tag("The dog runs .").unwrap();
//! assert_eq!(tags, vec!["DET", "N", "V", "."]);
//!
//! let accuracy = cross_validate(&corpus, 5, 1000).unwrap();
//! println!("Acurácia média: {accuracy:.2}%");
//! ```

pub mod config;
pub mod corpus;
pub mod cross_validation;
pub mod error;
pub mod model;
pub mod tagger;
pub mod trainer;
pub mod viterbi;

pub use config::TaggerConfig;
pub use corpus::{Corpus, Sentence};
pub use cross_validation::{cross_validate, CrossValidationReport, CrossValidator};
pub use error::{PosError, Result};
pub use model::{ProbabilityModel, DEFAULT_UNKNOWN_VALUE, START_TAG};
pub use tagger::PosTagger;
pub use trainer::Trainer;
pub use viterbi::{ViterbiResult, ViterbiStep};
