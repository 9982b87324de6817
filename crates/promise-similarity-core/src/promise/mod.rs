//! Promise model and corpus loading
//!
//! A promise is a single manifesto statement. The corpus is loaded once per
//! run from a CSV file; `index` is the zero-based load position and serves as
//! the join key between lemmas, similarity results and aggregates.

mod program;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PromiseError, Result};

pub use program::{group_programs, program_label, program_slug, Program};

/// A single manifesto statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promise {
    /// Externally assigned identifier
    pub id: i64,
    /// Zero-based position in the loaded corpus
    pub index: usize,
    /// Issuing party or entity
    pub promisor: String,
    /// Electoral or governing period
    pub period: String,
    /// Raw statement text
    pub body: String,
}

impl Promise {
    /// True when both promises come from the same promisor in the same period
    pub fn same_program(&self, other: &Promise) -> bool {
        self.promisor == other.promisor && self.period == other.period
    }

    /// Manual review URL: every `{}` in the template is replaced by the id
    pub fn review_url(&self, template: &str) -> String {
        template.replace("{}", &self.id.to_string())
    }
}

/// Raw CSV row; extra columns are ignored
#[derive(Debug, Deserialize)]
struct PromiseRecord {
    id: String,
    promisor: String,
    period: String,
    body: String,
}

/// Parse a promise corpus from CSV, assigning `index` by row order
pub fn parse_promises<R: Read>(reader: R, source: &Path) -> Result<Vec<Promise>> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut promises = Vec::new();

    for (index, record) in csv_reader.deserialize::<PromiseRecord>().enumerate() {
        // Header is row 1, so data rows start at 2
        let row = index + 2;
        let record = record.map_err(|e| PromiseError::InvalidRecord {
            path: source.to_path_buf(),
            row,
            reason: e.to_string(),
        })?;

        let id = record
            .id
            .trim()
            .parse::<i64>()
            .map_err(|_| PromiseError::InvalidRecord {
                path: source.to_path_buf(),
                row,
                reason: format!("id is not an integer: {:?}", record.id),
            })?;

        promises.push(Promise {
            id,
            index,
            promisor: record.promisor,
            period: record.period,
            body: record.body,
        });
    }

    Ok(promises)
}

/// Read the promise corpus from a CSV file
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn read_promises(path: &Path) -> Result<Vec<Promise>> {
    let file = File::open(path)
        .map_err(|e| PromiseError::io_operation("open promise corpus", path.display(), e))?;
    let promises = parse_promises(file, path)?;
    tracing::info!(count = promises.len(), "read promises");
    Ok(promises)
}
