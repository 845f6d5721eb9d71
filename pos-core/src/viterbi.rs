//! # Algoritmo de Viterbi — Decodificação do HMM
//!
//! Encontra a sequência de tags mais provável para uma sentença, em
//! log-espaço, expandindo apenas as transições observadas no treino.
//!
//! ```text
//! Inicialização: score[#] = 0
//!
//! Recursão: score_i[t] = max_{s} [score_{i-1}[s] + trans(s, t)] + emit(w_i, t)
//!           (s percorre os estados alcançados; t percorre transitions[s])
//!
//! Backtracking: segue os ponteiros de trás pra frente até chegar em `#`
//! ```
//!
//! ## Desempate
//!
//! Estados e sucessores são percorridos em ordem crescente de tag, e um
//! candidato só substitui o atual quando é **estritamente** maior. Portanto:
//!
//! - empate entre predecessores: vence a menor tag (ordem lexicográfica);
//! - empate na tag final: vence a menor tag.
//!
//! O resultado é determinístico para um mesmo modelo e uma mesma sentença.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PosError, Result};
use crate::model::{ProbabilityModel, START_TAG};

/// Score de uma tag candidata em uma posição (para visualização).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagScore {
    pub tag: String,
    /// Score acumulado do melhor caminho que termina nesta tag.
    pub score: f64,
    /// Tag anterior no melhor caminho (`#` na primeira posição).
    pub best_prev: String,
    pub emission: f64,
    pub transition: f64,
}

/// Estado do Viterbi depois de processar uma palavra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViterbiStep {
    pub token_index: usize,
    pub word: String,
    /// Uma entrada por tag alcançada, em ordem crescente de tag.
    pub scores: Vec<TagScore>,
    pub best_tag: String,
    pub best_score: f64,
}

/// Resultado completo da decodificação.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViterbiResult {
    /// Uma tag por palavra de entrada.
    pub best_sequence: Vec<String>,
    /// Log-probabilidade do melhor caminho (0.0 para sentença vazia).
    pub best_score: f64,
    pub steps: Vec<ViterbiStep>,
}

/// Melhor candidato conhecido para uma tag na posição atual.
#[derive(Debug, Clone)]
struct Candidate<'m> {
    score: f64,
    prev: &'m str,
    emission: f64,
    transition: f64,
}

/// Decodifica `words` (já em minúsculas) e devolve só as tags.
pub fn decode(model: &ProbabilityModel, words: &[String]) -> Result<Vec<String>> {
    viterbi_decode(model, words).map(|result| result.best_sequence)
}

/// Executa o Viterbi guardando a tabela de scores de cada posição.
///
/// # Erros
/// [`PosError::NoReachableState`] se nenhuma tag puder ser atribuída a uma
/// posição (só acontece se o modelo não tiver transições que alcancem ela).
pub fn viterbi_decode(model: &ProbabilityModel, words: &[String]) -> Result<ViterbiResult> {
    if words.is_empty() {
        return Ok(ViterbiResult {
            best_sequence: vec![],
            best_score: 0.0,
            steps: vec![],
        });
    }

    let mut prev_scores: BTreeMap<&str, f64> = BTreeMap::new();
    prev_scores.insert(START_TAG, 0.0);

    // backtrace[i][tag] = tag anterior no melhor caminho até `tag` na posição i
    let mut backtrace: Vec<BTreeMap<&str, &str>> = Vec::with_capacity(words.len());
    let mut steps: Vec<ViterbiStep> = Vec::with_capacity(words.len());

    for (i, word) in words.iter().enumerate() {
        let mut next_scores: BTreeMap<&str, Candidate> = BTreeMap::new();

        for (&state, &state_score) in &prev_scores {
            let Some(successors) = model.successors(state) else {
                continue;
            };

            for (next_state, &transition) in successors {
                let emission = model.emission(word, next_state);
                let score = state_score + transition + emission;

                let better = next_scores
                    .get(next_state.as_str())
                    .map_or(true, |current| score > current.score);
                if better {
                    next_scores.insert(
                        next_state.as_str(),
                        Candidate {
                            score,
                            prev: state,
                            emission,
                            transition,
                        },
                    );
                }
            }
        }

        if next_scores.is_empty() {
            return Err(PosError::NoReachableState {
                position: i,
                word: word.clone(),
            });
        }

        let scores: Vec<TagScore> = next_scores
            .iter()
            .map(|(&tag, c)| TagScore {
                tag: tag.to_string(),
                score: c.score,
                best_prev: c.prev.to_string(),
                emission: c.emission,
                transition: c.transition,
            })
            .collect();
        let (best_tag, best_score) = best_in_map(next_scores.iter().map(|(&t, c)| (t, c.score)));
        steps.push(ViterbiStep {
            token_index: i,
            word: word.clone(),
            scores,
            best_tag: best_tag.to_string(),
            best_score,
        });

        backtrace.push(next_scores.iter().map(|(&t, c)| (t, c.prev)).collect());
        prev_scores = next_scores.into_iter().map(|(t, c)| (t, c.score)).collect();
    }

    // === Backtracking ===
    let (last_tag, best_score) = best_in_map(prev_scores.iter().map(|(&t, &s)| (t, s)));
    let mut best_sequence: Vec<String> = Vec::with_capacity(words.len());
    let mut current = last_tag;

    for pointers in backtrace.iter().rev() {
        best_sequence.push(current.to_string());
        current = pointers.get(current).copied().unwrap_or(START_TAG);
    }
    debug_assert_eq!(current, START_TAG, "backtrace must end at the start sentinel");

    best_sequence.reverse();
    Ok(ViterbiResult {
        best_sequence,
        best_score,
        steps,
    })
}

/// Retorna (tag, score) do máximo; em empate fica a primeira tag iterada.
fn best_in_map<'a>(scores: impl Iterator<Item = (&'a str, f64)>) -> (&'a str, f64) {
    let mut best = (START_TAG, f64::NEG_INFINITY);
    let mut found = false;
    for (tag, score) in scores {
        if !found || score > best.1 {
            best = (tag, score);
            found = true;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Sentence;
    use crate::model::{LogProbTable, DEFAULT_UNKNOWN_VALUE};
    use crate::trainer::train;

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn det_noun_verb_model() -> ProbabilityModel {
        let corpus = vec![
            Sentence::from_lines("the dog runs", "DET NOUN VERB"),
            Sentence::from_lines("a cat runs", "DET NOUN VERB"),
        ];
        train(&corpus, usize::MAX)
    }

    fn table(entries: &[(&str, &[(&str, f64)])]) -> LogProbTable {
        entries
            .iter()
            .map(|(k, inner)| {
                let inner = inner.iter().map(|(t, p)| (t.to_string(), *p)).collect();
                (k.to_string(), inner)
            })
            .collect()
    }

    #[test]
    fn test_viterbi_tags_mixed_sentence() {
        let model = det_noun_verb_model();
        let result = viterbi_decode(&model, &words("the cat runs")).unwrap();

        assert_eq!(result.best_sequence, vec!["DET", "NOUN", "VERB"]);
        assert_eq!(result.steps.len(), 3);
        assert_eq!(result.steps[0].scores[0].best_prev, START_TAG);
    }

    #[test]
    fn test_viterbi_empty() {
        let model = det_noun_verb_model();
        let result = viterbi_decode(&model, &[]).unwrap();
        assert!(result.best_sequence.is_empty());
        assert!(result.steps.is_empty());
    }

    #[test]
    fn test_unseen_words_follow_transition_structure() {
        let model = det_noun_verb_model();
        let tags = decode(&model, &words("some bird sings")).unwrap();
        assert_eq!(tags, vec!["DET", "NOUN", "VERB"]);
    }

    #[test]
    fn test_decoding_is_deterministic() {
        let model = det_noun_verb_model();
        let input = words("a dog runs");
        let first = decode(&model, &input).unwrap();
        for _ in 0..10 {
            assert_eq!(decode(&model, &input).unwrap(), first);
        }
    }

    #[test]
    fn test_ties_go_to_smallest_tag() {
        // "x" é emitido igualmente por A e B, com transições iguais.
        let model = ProbabilityModel::from_tables(
            table(&[("x", &[("A", 0.0), ("B", 0.0)])]),
            table(&[("#", &[("B", 0.5f64.ln()), ("A", 0.5f64.ln())])]),
            DEFAULT_UNKNOWN_VALUE,
        );
        assert_eq!(decode(&model, &words("x")).unwrap(), vec!["A"]);
    }

    #[test]
    fn test_predecessor_ties_go_to_smallest_tag() {
        // A e B chegam a "x" com o mesmo score e ambos levam a C.
        let model = ProbabilityModel::from_tables(
            table(&[("x", &[("A", 0.0), ("B", 0.0)]), ("y", &[("C", 0.0)])]),
            table(&[
                ("#", &[("B", 0.5f64.ln()), ("A", 0.5f64.ln())]),
                ("B", &[("C", 0.0)]),
                ("A", &[("C", 0.0)]),
            ]),
            DEFAULT_UNKNOWN_VALUE,
        );
        let result = viterbi_decode(&model, &words("x y")).unwrap();

        assert_eq!(result.steps[1].scores.len(), 1);
        assert_eq!(result.steps[1].scores[0].tag, "C");
        assert_eq!(result.steps[1].scores[0].best_prev, "A");
        assert_eq!(result.best_sequence, vec!["A", "C"]);
    }

    #[test]
    fn test_sentence_final_tag_cannot_be_extended() {
        let model = train(&[Sentence::from_lines("the dog runs", "DET N V")], usize::MAX);

        // Exatamente o comprimento visto: funciona.
        assert_eq!(decode(&model, &words("the dog runs")).unwrap(), vec!["DET", "N", "V"]);

        // Uma palavra a mais: V não tem sucessoras e nada mais é alcançável.
        let err = decode(&model, &words("the dog runs fast")).unwrap_err();
        assert!(matches!(err, PosError::NoReachableState { position: 3, .. }));
    }

    #[test]
    fn test_empty_model_reports_no_reachable_state() {
        let err = decode(&ProbabilityModel::empty(), &words("anything")).unwrap_err();
        assert!(matches!(err, PosError::NoReachableState { position: 0, .. }));
    }

    #[test]
    fn test_best_score_matches_path_probability() {
        let model = det_noun_verb_model();
        let result = viterbi_decode(&model, &words("the dog runs")).unwrap();

        let expected = model.transition(START_TAG, "DET").unwrap()
            + model.emission("the", "DET")
            + model.transition("DET", "NOUN").unwrap()
            + model.emission("dog", "NOUN")
            + model.transition("NOUN", "VERB").unwrap()
            + model.emission("runs", "VERB");
        assert!((result.best_score - expected).abs() < 1e-12);
    }
}
