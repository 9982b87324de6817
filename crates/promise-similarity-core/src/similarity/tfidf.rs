use std::collections::{BTreeMap, HashSet};

use crate::text::tokenize_filtered;

/// Sparse, L2-normalized TF-IDF vector as `(term id, weight)` pairs sorted by term id
pub type SparseVector = Vec<(usize, f64)>;

/// TF-IDF model fitted over one collection of documents.
///
/// The vocabulary is derived from the documents passed to [`TfidfModel::fit`]
/// and is never reused across fits.
#[derive(Debug, Clone)]
pub struct TfidfModel {
    vectors: Vec<SparseVector>,
    /// term id -> documents containing the term, with their weights
    postings: Vec<Vec<(usize, f64)>>,
    vocabulary_len: usize,
}

/// Smoothed inverse document frequency
pub fn smooth_idf(total_docs: usize, doc_freq: usize) -> f64 {
    ((1.0 + total_docs as f64) / (1.0 + doc_freq as f64)).ln() + 1.0
}

impl TfidfModel {
    /// Fit the vocabulary and weights for `documents`
    pub fn fit(documents: &[String], stop_words: Option<&HashSet<String>>) -> Self {
        let tokenized: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| tokenize_filtered(doc, stop_words))
            .collect();

        // Term ids follow sorted term order so fits are reproducible
        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let unique: HashSet<&str> = tokens.iter().map(|t| t.as_str()).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let total_docs = documents.len();
        let mut term_ids: BTreeMap<&str, usize> = BTreeMap::new();
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (id, (term, df)) in doc_freq.iter().enumerate() {
            term_ids.insert(*term, id);
            idf.push(smooth_idf(total_docs, *df));
        }

        let vectors: Vec<SparseVector> = tokenized
            .iter()
            .map(|tokens| {
                let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
                for token in tokens {
                    if let Some(&id) = term_ids.get(token.as_str()) {
                        *counts.entry(id).or_insert(0.0) += 1.0;
                    }
                }

                let mut vector: SparseVector = counts
                    .into_iter()
                    .map(|(id, tf)| (id, tf * idf[id]))
                    .collect();

                let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, w) in vector.iter_mut() {
                        *w /= norm;
                    }
                }
                vector
            })
            .collect();

        let mut postings = vec![Vec::new(); idf.len()];
        for (doc, vector) in vectors.iter().enumerate() {
            for &(term, weight) in vector {
                postings[term].push((doc, weight));
            }
        }

        TfidfModel {
            vectors,
            postings,
            vocabulary_len: idf.len(),
        }
    }

    /// Number of documents the model was fitted on
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Number of distinct terms after stop-word removal
    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary_len
    }

    /// Normalized vector of one document
    pub fn vector(&self, doc: usize) -> &SparseVector {
        &self.vectors[doc]
    }

    /// Cosine similarity of `doc` against every document: one row of the
    /// pairwise matrix.
    ///
    /// Contributions are summed in ascending term id order, so
    /// `row(i)[j]` and `row(j)[i]` are bitwise equal. The diagonal is 1.0 for
    /// documents with at least one term and 0.0 otherwise.
    pub fn similarity_row(&self, doc: usize) -> Vec<f64> {
        let mut scores = vec![0.0; self.vectors.len()];
        let vector = &self.vectors[doc];

        for &(term, weight) in vector {
            for &(other, other_weight) in &self.postings[term] {
                scores[other] += weight * other_weight;
            }
        }

        for score in scores.iter_mut() {
            *score = score.clamp(0.0, 1.0);
        }
        scores[doc] = if vector.is_empty() { 0.0 } else { 1.0 };

        scores
    }

    /// Cosine similarity between two documents
    pub fn score(&self, a: usize, b: usize) -> f64 {
        self.similarity_row(a)[b]
    }
}
