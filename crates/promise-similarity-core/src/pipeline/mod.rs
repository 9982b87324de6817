//! Staged cache-or-compute pipeline
//!
//! Stages run in a fixed order and each writes one artifact into the data
//! directory. An artifact that exists is loaded instead of recomputed unless
//! its [`Stage`] is listed in the run's [`Invalidation`].

mod codec;
mod executor;
mod materialize;
mod paths;
mod stage;

pub use codec::{ArtifactCodec, JsonCodec, TableCodec, TsvCodec};
pub use executor::{DetailSummary, Executor, RunSummary, StageReport};
pub use materialize::{
    materialize, materialize_file, write_atomic, write_atomic_with, Materialized, Outcome,
};
pub use paths::ArtifactPaths;
pub use stage::{Invalidation, Stage};
