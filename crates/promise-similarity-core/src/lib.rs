//! Promise Similarity Core Library
//!
//! TF-IDF similarity between manifesto promises, the staged pipeline that
//! produces it from a raw corpus, and the aggregates derived from it.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod lemma;
pub mod logging;
pub mod pipeline;
pub mod promise;
pub mod similarity;
pub mod text;
