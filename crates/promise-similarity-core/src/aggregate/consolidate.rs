use serde::{Deserialize, Serialize};

use crate::promise::Promise;
use crate::similarity::Similarities;

/// A related promise in the published result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedPromise {
    pub id: i64,
    pub score: f64,
}

/// One promise and the promises related to it, by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedPromise {
    pub id: i64,
    pub related: Vec<RelatedPromise>,
}

/// Translate corpus indices to promise ids, keeping order and scores
pub fn consolidate(similarities: &Similarities, promises: &[Promise]) -> Vec<ConsolidatedPromise> {
    similarities
        .iter()
        .filter(|entry| !entry.related.is_empty())
        .map(|entry| ConsolidatedPromise {
            id: promises[entry.index].id,
            related: entry
                .related
                .iter()
                .map(|related| RelatedPromise {
                    id: promises[related.index].id,
                    score: related.score,
                })
                .collect(),
        })
        .collect()
}
