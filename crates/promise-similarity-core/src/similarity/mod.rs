//! Similarity engine for finding related promises and duplicates
//!
//! Documents are vectorized with TF-IDF over a vocabulary fitted per call,
//! compared pairwise with cosine similarity and filtered per source document
//! by a [`Selection`] policy.

mod tfidf;

mod duplicates;

use std::cmp::Reverse;
use std::collections::HashSet;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PromiseError, Result};
use crate::trace_time;

pub use duplicates::{duplicate_report, find_duplicates, DuplicateCandidate, DuplicateRow};
pub use tfidf::{smooth_idf, SparseVector, TfidfModel};

/// Scores closer than this are treated as ties when ranking
const TIE_RESOLUTION: f64 = 1e-9;

/// How related documents are chosen for each source document
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// The `k - 1` highest-scoring other documents, zero scores included
    Top(usize),
    /// Every other document scoring strictly above the threshold
    Threshold(f64),
}

impl Selection {
    /// Build a selection from optional settings.
    ///
    /// `top` wins when both are given.
    pub fn from_options(top: Option<usize>, threshold: Option<f64>) -> Result<Self> {
        let selection = match (top, threshold) {
            (Some(k), _) => Selection::Top(k),
            (None, Some(t)) => Selection::Threshold(t),
            (None, None) => crate::bail_config!("must provide either 'top' or 'threshold'"),
        };
        selection.validate()?;
        Ok(selection)
    }

    /// Reject policies that cannot select anything meaningful
    pub fn validate(&self) -> Result<()> {
        match *self {
            Selection::Top(0) => crate::bail_config!("top must be at least 1"),
            Selection::Threshold(t) if !t.is_finite() || !(0.0..1.0).contains(&t) => {
                Err(PromiseError::Configuration(format!(
                    "threshold must be in [0, 1), got {}",
                    t
                )))
            }
            _ => Ok(()),
        }
    }
}

/// A related document and its cosine similarity to the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Related {
    /// Index of the related document
    pub index: usize,
    /// Similarity score (0.0 to 1.0)
    pub score: f64,
}

/// All related documents for one source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSimilarity {
    /// Index of the source document
    pub index: usize,
    /// Related documents, highest score first
    pub related: Vec<Related>,
}

/// Result of one engine run: sources with at least one related document,
/// ordered by source index.
///
/// Decoding goes through [`Similarities::from_entries`], so a cached artifact
/// is held to the same ordering as a fresh result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<DocumentSimilarity>", into = "Vec<DocumentSimilarity>")]
pub struct Similarities {
    entries: Vec<DocumentSimilarity>,
}

impl From<Vec<DocumentSimilarity>> for Similarities {
    fn from(entries: Vec<DocumentSimilarity>) -> Self {
        Similarities::from_entries(entries)
    }
}

impl From<Similarities> for Vec<DocumentSimilarity> {
    fn from(similarities: Similarities) -> Self {
        similarities.entries
    }
}

impl Similarities {
    /// Build from entries in any order. Self references are removed and
    /// entries left with no related documents are dropped.
    pub fn from_entries(mut entries: Vec<DocumentSimilarity>) -> Self {
        for entry in entries.iter_mut() {
            let source = entry.index;
            entry.related.retain(|related| related.index != source);
        }
        entries.retain(|entry| !entry.related.is_empty());
        entries.sort_by_key(|entry| entry.index);
        Similarities { entries }
    }

    /// Entry for a source document, if it has any related documents
    pub fn get(&self, index: usize) -> Option<&DocumentSimilarity> {
        self.entries
            .binary_search_by_key(&index, |entry| entry.index)
            .ok()
            .map(|pos| &self.entries[pos])
    }

    /// Related documents for a source; empty when the source is absent
    pub fn related(&self, index: usize) -> &[Related] {
        self.get(index)
            .map(|entry| entry.related.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocumentSimilarity> {
        self.entries.iter()
    }

    /// Number of source documents with at least one related document
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of (source, related) pairs
    pub fn pair_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.related.len()).sum()
    }

    /// Largest document index referenced as source or related
    pub fn max_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .flat_map(|entry| {
                std::iter::once(entry.index).chain(entry.related.iter().map(|r| r.index))
            })
            .max()
    }
}

/// Similarity Engine
pub struct SimilarityEngine<'a> {
    selection: Selection,
    stop_words: Option<&'a HashSet<String>>,
}

impl<'a> SimilarityEngine<'a> {
    /// Create a new Similarity Engine
    pub fn new(selection: Selection) -> Self {
        SimilarityEngine {
            selection,
            stop_words: None,
        }
    }

    /// Exclude these terms from the vocabulary before weighting
    pub fn with_stop_words(mut self, stop_words: &'a HashSet<String>) -> Self {
        self.stop_words = Some(stop_words);
        self
    }

    /// Compute related documents for every document
    #[tracing::instrument(skip_all, fields(documents = documents.len(), selection = ?self.selection))]
    pub fn compute(&self, documents: &[String]) -> Result<Similarities> {
        self.selection.validate()?;
        if documents.is_empty() {
            return Err(PromiseError::EmptyInput);
        }

        let start = Instant::now();
        let model = TfidfModel::fit(documents, self.stop_words);
        trace_time!(start, "fit_tfidf", terms = model.vocabulary_len());

        let entries: Vec<DocumentSimilarity> = (0..model.len())
            .into_par_iter()
            .filter_map(|index| {
                let row = model.similarity_row(index);
                let related = select_related(index, &row, self.selection);
                if related.is_empty() {
                    None
                } else {
                    Some(DocumentSimilarity { index, related })
                }
            })
            .collect();

        trace_time!(start, "compute_similarities", sources = entries.len());
        tracing::debug!(
            documents = documents.len(),
            sources = entries.len(),
            "similarities computed"
        );

        Ok(Similarities { entries })
    }
}

/// Compute related documents for `documents` with the given policy
pub fn compute(
    documents: &[String],
    selection: Selection,
    stop_words: Option<&HashSet<String>>,
) -> Result<Similarities> {
    let engine = SimilarityEngine::new(selection);
    match stop_words {
        Some(words) => engine.with_stop_words(words).compute(documents),
        None => engine.compute(documents),
    }
}

/// Ranking key that treats float noise below [`TIE_RESOLUTION`] as a tie
fn rank_key(score: f64) -> i64 {
    (score / TIE_RESOLUTION).round() as i64
}

/// Apply the selection policy to one row of the similarity matrix.
///
/// The source document itself is never part of the result. `Top` ranks every
/// other document, so unrelated ones still fill the list with score 0.0.
fn select_related(source: usize, row: &[f64], selection: Selection) -> Vec<Related> {
    let mut candidates: Vec<Related> = row
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != source)
        .filter(|(_, score)| match selection {
            Selection::Top(_) => true,
            Selection::Threshold(t) => **score > t,
        })
        .map(|(index, score)| Related {
            index,
            score: *score,
        })
        .collect();

    candidates.sort_by_key(|r| (Reverse(rank_key(r.score)), r.index));

    if let Selection::Top(k) = selection {
        candidates.truncate(k.saturating_sub(1));
    }

    candidates
}

#[cfg(test)]
mod tests;
