//! Aggregates derived from one promise similarity result
//!
//! Everything here is a pure function of the corpus and a [`Similarities`]
//! value. Duplicate detection lives with the engine in
//! [`crate::similarity`].
//!
//! [`Similarities`]: crate::similarity::Similarities

mod consolidate;
mod details;
mod programs;
mod reuse;

pub use consolidate::{consolidate, ConsolidatedPromise, RelatedPromise};
pub use details::{detail_report, DetailKind, DetailRow};
pub use programs::{program_similarities, ProgramSimilarity, RelatedProgram};
pub use reuse::{reuse_matrix, ReuseKey, ReuseMatrix, ReuseStat};
