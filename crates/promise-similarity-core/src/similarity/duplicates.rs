use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::promise::Promise;
use crate::similarity::Similarities;

/// A promise that looks like a copy of another promise in the same program
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateCandidate {
    /// Corpus index of the promise the duplicate was found from
    pub original: usize,
    /// Corpus index of the duplicate
    pub duplicate: usize,
    pub score: f64,
}

/// One row of the duplicate report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateRow {
    /// `Y` on the original's row, empty on duplicate rows
    pub original: String,
    pub promisor: String,
    pub period: String,
    /// Empty on the original's row
    pub score: Option<f64>,
    pub id: i64,
    pub body: String,
    pub url: String,
}

/// Canonical key for an unordered pair of promise ids
fn pair_key(a: i64, b: i64) -> (i64, i64) {
    (a.min(b), a.max(b))
}

/// Find duplicate candidates in a promise similarity result
///
/// A candidate is a related pair that is not the same promise, shares
/// promisor and period, and scores at least `threshold`. Each unordered pair
/// of ids is reported once, from the first source it is seen from. Candidates
/// are grouped by original in similarity order, highest score first.
pub fn find_duplicates(
    similarities: &Similarities,
    promises: &[Promise],
    threshold: f64,
) -> Vec<DuplicateCandidate> {
    let mut seen: HashSet<(i64, i64)> = HashSet::new();
    let mut candidates = Vec::new();

    for entry in similarities.iter() {
        let original = &promises[entry.index];
        let mut hits: Vec<DuplicateCandidate> = entry
            .related
            .iter()
            .filter(|related| related.index != entry.index)
            .filter(|related| related.score >= threshold)
            .filter(|related| original.same_program(&promises[related.index]))
            .filter(|related| seen.insert(pair_key(original.id, promises[related.index].id)))
            .map(|related| DuplicateCandidate {
                original: entry.index,
                duplicate: related.index,
                score: related.score,
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates.extend(hits);
    }

    candidates
}

/// Flatten candidates into report rows: each original followed by its duplicates
pub fn duplicate_report(
    candidates: &[DuplicateCandidate],
    promises: &[Promise],
    url_template: &str,
) -> Vec<DuplicateRow> {
    let mut rows = Vec::new();
    let mut current: Option<usize> = None;

    for candidate in candidates {
        let original = &promises[candidate.original];
        if current != Some(candidate.original) {
            rows.push(DuplicateRow {
                original: "Y".to_string(),
                promisor: original.promisor.clone(),
                period: original.period.clone(),
                score: None,
                id: original.id,
                body: original.body.clone(),
                url: original.review_url(url_template),
            });
            current = Some(candidate.original);
        }

        let duplicate = &promises[candidate.duplicate];
        rows.push(DuplicateRow {
            original: String::new(),
            promisor: original.promisor.clone(),
            period: original.period.clone(),
            score: Some(candidate.score),
            id: duplicate.id,
            body: duplicate.body.clone(),
            url: duplicate.review_url(url_template),
        });
    }

    rows
}
