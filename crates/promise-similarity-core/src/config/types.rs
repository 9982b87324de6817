//! Configuration type definitions

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default location of the promise corpus
pub const DEFAULT_PROMISES_URL: &str = "https://files.holderdeord.no/data/csv/promises.csv";

/// Default location of the term frequency list used as program stop words
pub const DEFAULT_STOP_WORDS_URL: &str =
    "https://files.holderdeord.no/data/2017/internal/ton_idf.txt";

/// Default manual review link for a promise id
pub const DEFAULT_REVIEW_URL_TEMPLATE: &str = "https://lofter.holderdeord.no/?q={}&ids=true";

/// Name of the config file looked up in the data directory
pub const CONFIG_FILE: &str = "promise-similarity.toml";

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the corpus and every derived artifact
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Oslo-Bergen-Tagger installation directory
    #[serde(default = "default_obt_path")]
    pub obt_path: PathBuf,

    /// Similarity configuration
    #[serde(default)]
    pub similarity: SimilarityConfig,

    /// Download configuration
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Manual review link; `{}` is replaced by the promise id
    #[serde(default = "default_review_url_template")]
    pub review_url_template: String,

    /// Detail reports produced on every full run
    #[serde(default, rename = "details")]
    pub detail_reports: Vec<DetailFilter>,
}

/// Thresholds and selection sizes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Promise-level inclusion threshold (default 0.7)
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Minimum score for a duplicate candidate (default 0.8)
    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_threshold: f64,

    /// Minimum score counted as reuse; defaults to `threshold`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reuse_threshold: Option<f64>,

    /// Top-K size for program-level similarity (default 20)
    #[serde(default = "default_program_top")]
    pub program_top: usize,
}

/// Remote sources and HTTP behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_promises_url")]
    pub promises_url: String,

    #[serde(default = "default_stop_words_url")]
    pub stop_words_url: String,

    /// Request timeout in seconds (default 30)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retries after the first failed attempt (default 3)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Filters for one detail report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailFilter {
    /// Promisor whose promises are the report's sources
    pub promisor: String,

    /// Only keep matches from these promisors (empty keeps all)
    #[serde(default)]
    pub compare: Vec<String>,

    /// Only keep sources and matches from these periods (empty keeps all)
    #[serde(default)]
    pub periods: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            obt_path: default_obt_path(),
            similarity: SimilarityConfig::default(),
            sources: SourcesConfig::default(),
            review_url_template: default_review_url_template(),
            detail_reports: Vec::new(),
        }
    }
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            duplicate_threshold: default_duplicate_threshold(),
            reuse_threshold: None,
            program_top: default_program_top(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            promises_url: default_promises_url(),
            stop_words_url: default_stop_words_url(),
            timeout_seconds: default_timeout_seconds(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_obt_path() -> PathBuf {
    PathBuf::from("obt")
}

fn default_review_url_template() -> String {
    DEFAULT_REVIEW_URL_TEMPLATE.to_string()
}

fn default_threshold() -> f64 {
    0.7
}

fn default_duplicate_threshold() -> f64 {
    0.8
}

fn default_program_top() -> usize {
    20
}

fn default_promises_url() -> String {
    DEFAULT_PROMISES_URL.to_string()
}

fn default_stop_words_url() -> String {
    DEFAULT_STOP_WORDS_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}
