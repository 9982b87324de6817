//! Artifact locations inside the data directory

use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE;

/// Paths of every artifact the pipeline reads or writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    data_dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    pub fn promises(&self) -> PathBuf {
        self.data_dir.join("promises.csv")
    }

    pub fn stop_words(&self) -> PathBuf {
        self.data_dir.join("ton_idf.txt")
    }

    pub fn lemmas(&self) -> PathBuf {
        self.data_dir.join("lemmas.json")
    }

    pub fn similarities(&self) -> PathBuf {
        self.data_dir.join("similarities.json")
    }

    pub fn result(&self) -> PathBuf {
        self.data_dir.join("result.json")
    }

    pub fn duplicates(&self) -> PathBuf {
        self.data_dir.join("duplicates.tsv")
    }

    pub fn program_similarities(&self) -> PathBuf {
        self.data_dir.join("program-similarities.json")
    }

    pub fn program_reuse(&self) -> PathBuf {
        self.data_dir.join("program-reuse.json")
    }

    pub fn program_reuse_table(&self) -> PathBuf {
        self.data_dir.join("program-reuse.tsv")
    }

    /// Detail report for one filter, e.g. `details-hoyre.tsv`
    pub fn details(&self, slug: &str) -> PathBuf {
        self.data_dir.join(format!("details-{}.tsv", slug))
    }
}
