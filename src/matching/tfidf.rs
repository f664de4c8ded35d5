// src/matching/tfidf.rs - Character n-gram TF-IDF encoding of composite keys
//!
//! Encoding is split into two explicit phases. [`CharNgramTfidf::fit`] reads
//! every key once and freezes the vocabulary and IDF weights into a
//! [`FittedTfidf`]; [`FittedTfidf::transform`] then maps keys into that space.
//! A fitted model belongs to the row set it was fitted on.

use anyhow::{bail, Result};
use log::debug;
use std::collections::{BTreeMap, HashMap};

use crate::models::stats_models::EncoderStats;
use crate::utils::constants::{MAX_NGRAM, MIN_NGRAM};

/// Sparse row vector with strictly increasing feature indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseVector {
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn weight_sum(&self) -> f64 {
        self.values.iter().sum()
    }

    /// True for the all-zero vector of a key with no usable content.
    pub fn is_zero(&self) -> bool {
        self.weight_sum() <= 0.0
    }

    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut total = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    total += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        total
    }
}

/// Unfitted encoder settings: word-bounded character n-grams of length
/// `min_n..=max_n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharNgramTfidf {
    min_n: usize,
    max_n: usize,
}

impl Default for CharNgramTfidf {
    fn default() -> Self {
        Self {
            min_n: MIN_NGRAM,
            max_n: MAX_NGRAM,
        }
    }
}

impl CharNgramTfidf {
    pub fn new(min_n: usize, max_n: usize) -> Result<Self> {
        if min_n == 0 || min_n > max_n {
            bail!("Invalid n-gram range ({}, {})", min_n, max_n);
        }
        Ok(Self { min_n, max_n })
    }

    /// Splits `key` into words, pads each word with one space on both sides and
    /// emits the n-grams found inside each padded word. A padded word no longer
    /// than n is emitted once, whole, and longer n are skipped for it.
    pub fn analyze(&self, key: &str) -> Vec<String> {
        char_wb_ngrams(key, self.min_n, self.max_n)
    }

    /// Learns the vocabulary and smoothed IDF weights over every key.
    pub fn fit<S: AsRef<str>>(&self, keys: &[S]) -> FittedTfidf {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();

        for key in keys {
            let mut terms = self.analyze(key.as_ref());
            terms.sort_unstable();
            terms.dedup();
            for term in terms {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let n_documents = keys.len();
        let mut vocabulary = HashMap::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());
        // BTreeMap iteration is sorted, so feature indices follow term order.
        for (index, (term, df)) in document_frequency.into_iter().enumerate() {
            idf.push(smoothed_idf(n_documents, df));
            vocabulary.insert(term, index);
        }

        debug!(
            "Fitted TF-IDF over {} documents: {} features",
            n_documents,
            idf.len()
        );

        FittedTfidf {
            settings: *self,
            vocabulary,
            idf,
            n_documents,
        }
    }

    pub fn fit_transform<S: AsRef<str>>(&self, keys: &[S]) -> (FittedTfidf, Vec<SparseVector>) {
        let fitted = self.fit(keys);
        let vectors = fitted.transform(keys);
        (fitted, vectors)
    }
}

/// Frozen vocabulary and IDF weights.
#[derive(Debug, Clone)]
pub struct FittedTfidf {
    settings: CharNgramTfidf,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    n_documents: usize,
}

impl FittedTfidf {
    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    pub fn feature_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.feature_index(term).map(|idx| self.idf[idx])
    }

    /// Encodes every key as raw term counts times IDF, L2-normalized.
    /// Terms outside the vocabulary are ignored.
    pub fn transform<S: AsRef<str>>(&self, keys: &[S]) -> Vec<SparseVector> {
        keys.iter().map(|key| self.transform_one(key.as_ref())).collect()
    }

    fn transform_one(&self, key: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in self.settings.analyze(key) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut vector = SparseVector {
            indices: Vec::with_capacity(counts.len()),
            values: Vec::with_capacity(counts.len()),
        };
        for (idx, count) in counts {
            vector.indices.push(idx);
            vector.values.push(count * self.idf[idx]);
        }

        let norm = vector.norm();
        if norm > 0.0 {
            for value in &mut vector.values {
                *value /= norm;
            }
        }
        vector
    }

    pub fn stats(&self, vectors: &[SparseVector]) -> EncoderStats {
        EncoderStats {
            documents: self.n_documents,
            vocabulary_size: self.vocabulary_size(),
            zero_vectors: vectors.iter().filter(|v| v.is_zero()).count(),
            stored_entries: vectors.iter().map(SparseVector::nnz).sum(),
        }
    }
}

fn smoothed_idf(n_documents: usize, document_frequency: usize) -> f64 {
    ((1.0 + n_documents as f64) / (1.0 + document_frequency as f64)).ln() + 1.0
}

fn char_wb_ngrams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let mut ngrams = Vec::new();
    for word in text.split_whitespace() {
        let padded: Vec<char> = std::iter::once(' ')
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        let len = padded.len();

        for n in min_n..=max_n {
            let mut offset = 0;
            ngrams.push(padded[offset..(offset + n).min(len)].iter().collect());
            while offset + n < len {
                offset += 1;
                ngrams.push(padded[offset..offset + n].iter().collect());
            }
            if offset == 0 {
                break;
            }
        }
    }
    ngrams
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_word_bounded_ngrams() {
        let encoder = CharNgramTfidf::default();
        assert_eq!(encoder.analyze("a"), vec![" a", "a ", " a "]);
        assert_eq!(
            encoder.analyze("ab"),
            vec![" a", "ab", "b ", " ab", "ab ", " ab "]
        );
        // n-grams never straddle words
        let grams = encoder.analyze("ab cd");
        assert!(grams.iter().all(|g| !g.contains("b c")));
        assert!(grams.contains(&" cd ".to_string()));
        assert!(encoder.analyze("").is_empty());
        assert!(encoder.analyze("    ").is_empty());
    }

    #[test]
    fn test_invalid_range_rejected() {
        assert!(CharNgramTfidf::new(0, 3).is_err());
        assert!(CharNgramTfidf::new(4, 2).is_err());
        assert!(CharNgramTfidf::new(3, 3).is_ok());
    }

    #[test]
    fn test_vocabulary_is_sorted_and_idf_smoothed() {
        let encoder = CharNgramTfidf::new(2, 2).unwrap();
        let fitted = encoder.fit(&["ab", "ab", "cd"]);
        // " a", " c", "ab", "b ", "cd", "d "
        assert_eq!(fitted.vocabulary_size(), 6);
        assert_eq!(fitted.feature_index(" a"), Some(0));
        assert_eq!(fitted.feature_index(" c"), Some(1));
        assert_eq!(fitted.feature_index("d "), Some(5));
        assert!(approx(fitted.idf("ab").unwrap(), (4.0f64 / 3.0).ln() + 1.0));
        assert!(approx(fitted.idf("cd").unwrap(), (4.0f64 / 2.0).ln() + 1.0));
        assert_eq!(fitted.idf("zz"), None);
    }

    #[test]
    fn test_vectors_are_unit_length_and_empty_keys_are_zero() {
        let keys = ["acme widgets", "", "   ", "acme widgets inc"];
        let (fitted, vectors) = CharNgramTfidf::default().fit_transform(&keys);
        assert_eq!(vectors.len(), 4);
        assert!(approx(vectors[0].norm(), 1.0));
        assert!(vectors[1].is_zero());
        assert!(vectors[2].is_zero());
        assert!(!vectors[3].is_zero());
        assert!(vectors[0].indices.windows(2).all(|w| w[0] < w[1]));

        let stats = fitted.stats(&vectors);
        assert_eq!(stats.documents, 4);
        assert_eq!(stats.zero_vectors, 2);
        assert_eq!(stats.vocabulary_size, fitted.vocabulary_size());
    }

    #[test]
    fn test_all_empty_keys_yield_empty_vocabulary() {
        let (fitted, vectors) = CharNgramTfidf::default().fit_transform(&["", " ", "      "]);
        assert_eq!(fitted.vocabulary_size(), 0);
        assert!(vectors.iter().all(SparseVector::is_zero));
    }

    #[test]
    fn test_similar_keys_score_higher() {
        let keys = [
            "acme widgets corporation",
            "acme widget corporation",
            "blue river bakery",
        ];
        let (_, vectors) = CharNgramTfidf::default().fit_transform(&keys);
        let near = vectors[0].dot(&vectors[1]);
        let far = vectors[0].dot(&vectors[2]);
        assert!(near > 0.8, "near similarity was {}", near);
        assert!(far < 0.2, "far similarity was {}", far);
    }

    #[test]
    fn test_transform_ignores_unknown_terms() {
        let fitted = CharNgramTfidf::default().fit(&["acme"]);
        let vectors = fitted.transform(&["zzzz"]);
        assert!(vectors[0].is_zero());
    }
}
