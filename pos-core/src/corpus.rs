//! # Corpus anotado com tags POS
//!
//! O corpus chega em duas fontes alinhadas, no estilo do Brown corpus:
//!
//! ```text
//! brown-words.txt:  the dog runs .
//! brown-tags.txt:   DET N V .
//! ```
//!
//! Cada linha é uma sentença; a i-ésima palavra da linha de palavras
//! corresponde à i-ésima tag da linha de tags. Palavras são normalizadas
//! para minúsculas; tags ficam como estão.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PosError, Result};

/// Uma sentença anotada: palavras e tags alinhadas por posição.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub words: Vec<String>,
    pub tags: Vec<String>,
}

impl Sentence {
    /// Cria uma sentença a partir de palavras e tags já alinhadas.
    ///
    /// O alinhamento é responsabilidade de quem carrega o corpus;
    /// aqui ele só é verificado em builds de debug.
    pub fn new(words: Vec<String>, tags: Vec<String>) -> Self {
        debug_assert_eq!(
            words.len(),
            tags.len(),
            "sentence words and tags must be aligned"
        );
        Self { words, tags }
    }

    /// Constrói a sentença a partir de uma linha de palavras e uma de tags.
    /// As palavras são convertidas para minúsculas.
    pub fn from_lines(word_line: &str, tag_line: &str) -> Self {
        let words = split_line(&word_line.to_lowercase());
        let tags = split_line(tag_line);
        Self::new(words, tags)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Pares (palavra, tag) na ordem da sentença.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.words
            .iter()
            .zip(self.tags.iter())
            .map(|(w, t)| (w.as_str(), t.as_str()))
    }

    /// Reconstrói o texto da sentença (palavras separadas por espaço).
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

fn split_line(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Sequência ordenada de sentenças anotadas.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    pub sentences: Vec<Sentence>,
}

impl Corpus {
    pub fn new(sentences: Vec<Sentence>) -> Self {
        Self { sentences }
    }

    /// Lê as duas fontes alinhadas (uma linha por sentença).
    ///
    /// Rejeita o corpus se o número de linhas diferir ou se alguma linha
    /// tiver quantidades diferentes de palavras e tags.
    pub fn from_readers<W: BufRead, T: BufRead>(words: W, tags: T) -> Result<Self> {
        let word_lines = words.lines().collect::<std::io::Result<Vec<_>>>()?;
        let tag_lines = tags.lines().collect::<std::io::Result<Vec<_>>>()?;

        if word_lines.len() != tag_lines.len() {
            return Err(PosError::LineCountMismatch {
                words: word_lines.len(),
                tags: tag_lines.len(),
            });
        }

        let mut sentences = Vec::with_capacity(word_lines.len());
        for (i, (word_line, tag_line)) in word_lines.iter().zip(&tag_lines).enumerate() {
            let words = split_line(&word_line.to_lowercase());
            let tags = split_line(tag_line);
            if words.len() != tags.len() {
                return Err(PosError::MisalignedSentence {
                    line: i + 1,
                    words: words.len(),
                    tags: tags.len(),
                });
            }
            sentences.push(Sentence::new(words, tags));
        }

        tracing::debug!(sentences = sentences.len(), "corpus loaded");
        Ok(Self { sentences })
    }

    /// Carrega o corpus de dois arquivos (palavras e tags).
    pub fn load(words_path: impl AsRef<Path>, tags_path: impl AsRef<Path>) -> Result<Self> {
        let words = BufReader::new(File::open(words_path)?);
        let tags = BufReader::new(File::open(tags_path)?);
        Self::from_readers(words, tags)
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn word_sentences(&self) -> Vec<Vec<String>> {
        self.sentences.iter().map(|s| s.words.clone()).collect()
    }

    pub fn tag_sentences(&self) -> Vec<Vec<String>> {
        self.sentences.iter().map(|s| s.tags.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Sentence;
    type IntoIter = std::slice::Iter<'a, Sentence>;

    fn into_iter(self) -> Self::IntoIter {
        self.sentences.iter()
    }
}

impl FromIterator<Sentence> for Corpus {
    fn from_iter<I: IntoIterator<Item = Sentence>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Corpus de demonstração embutido (tags simplificadas do Brown corpus).
///
/// Usado pelo servidor quando nenhum arquivo é informado e pelos testes.
pub fn demo_corpus() -> Corpus {
    const DEMO: &[(&str, &str)] = &[
        ("The dog runs .", "DET N V ."),
        ("A cat sleeps on the mat .", "DET N V P DET N ."),
        ("The old man walks his dog .", "DET ADJ N V PRO N ."),
        ("She reads a good book .", "PRO V DET ADJ N ."),
        ("We saw the big ship in the harbor .", "PRO VD DET ADJ N P DET N ."),
        ("He quickly ate the bread .", "PRO ADV VD DET N ."),
        ("The children play in the park .", "DET N V P DET N ."),
        ("My sister likes music and art .", "PRO N V N CNJ N ."),
        ("They will watch the game tonight .", "PRO MOD V DET N ADV ."),
        ("The teacher gave the students a test .", "DET N VD DET N DET N ."),
        ("A bird sings in the tree .", "DET N V P DET N ."),
        ("You can see the river from here .", "PRO MOD V DET N P ADV ."),
        ("The house was very quiet .", "DET N VD ADV ADJ ."),
        ("I like the red car .", "PRO V DET ADJ N ."),
        ("The cat chased a mouse .", "DET N VD DET N ."),
    ];

    DEMO.iter()
        .map(|(words, tags)| Sentence::from_lines(words, tags))
        .collect()
}
