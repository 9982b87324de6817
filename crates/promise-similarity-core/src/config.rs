//! Pipeline configuration
//!
//! Settings come from `promise-similarity.toml` (in the data directory or an
//! explicit path), then `PROMISE_SIMILARITY_*` environment variables, then
//! CLI flags applied by the binary.

pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PromiseError, Result};
use crate::similarity::Selection;

pub use types::{
    DetailFilter, PipelineConfig, SimilarityConfig, SourcesConfig, CONFIG_FILE,
    DEFAULT_PROMISES_URL, DEFAULT_REVIEW_URL_TEMPLATE, DEFAULT_STOP_WORDS_URL,
};

const ENV_DATA_DIR: &str = "PROMISE_SIMILARITY_DATA_DIR";
const ENV_OBT_PATH: &str = "PROMISE_SIMILARITY_OBT_PATH";
const ENV_THRESHOLD: &str = "PROMISE_SIMILARITY_THRESHOLD";
const ENV_DUPLICATE_THRESHOLD: &str = "PROMISE_SIMILARITY_DUPLICATE_THRESHOLD";
const ENV_TIMEOUT: &str = "PROMISE_SIMILARITY_TIMEOUT";
const ENV_RETRIES: &str = "PROMISE_SIMILARITY_RETRIES";

impl PipelineConfig {
    /// Parse a config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load config from an explicit file, or from `<data_dir>/promise-similarity.toml`
    /// when it exists, falling back to defaults.
    ///
    /// The directory searched is `data_dir`, then `PROMISE_SIMILARITY_DATA_DIR`,
    /// then the default. An explicit `data_dir` wins over the environment.
    pub fn load(explicit: Option<&Path>, data_dir: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let dir = search_dir(data_dir, env_value(ENV_DATA_DIR));
                let candidate = dir.join(CONFIG_FILE);
                candidate.exists().then_some(candidate)
            }
        };

        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    PromiseError::io_operation("read config from", path.display(), e)
                })?;
                tracing::debug!(path = %path.display(), "loaded config file");
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };

        config.apply_env()?;
        if let Some(dir) = data_dir {
            config.data_dir = dir.to_path_buf();
        }
        Ok(config)
    }

    /// Apply `PROMISE_SIMILARITY_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(dir) = env_value(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(path) = env_value(ENV_OBT_PATH) {
            self.obt_path = PathBuf::from(path);
        }

        if let Some(value) = env_value(ENV_THRESHOLD) {
            self.similarity.threshold = parse_env(ENV_THRESHOLD, &value)?;
        }

        if let Some(value) = env_value(ENV_DUPLICATE_THRESHOLD) {
            self.similarity.duplicate_threshold = parse_env(ENV_DUPLICATE_THRESHOLD, &value)?;
        }

        if let Some(value) = env_value(ENV_TIMEOUT) {
            let seconds: u64 = parse_env(ENV_TIMEOUT, &value)?;
            self.sources.timeout_seconds = seconds.clamp(1, 600);
        }

        if let Some(value) = env_value(ENV_RETRIES) {
            let retries: u32 = parse_env(ENV_RETRIES, &value)?;
            self.sources.max_retries = retries.clamp(0, 10);
        }

        Ok(())
    }

    /// Check thresholds and sizes before any stage runs
    pub fn validate(&self) -> Result<()> {
        self.promise_selection().validate()?;
        self.program_selection().validate()?;

        let duplicate = self.similarity.duplicate_threshold;
        if !(0.0..=1.0).contains(&duplicate) {
            crate::bail_invalid!("duplicate threshold", duplicate);
        }

        let reuse = self.reuse_threshold();
        if !(0.0..=1.0).contains(&reuse) {
            crate::bail_invalid!("reuse threshold", reuse);
        }

        if !self.review_url_template.contains("{}") {
            crate::bail_invalid!("review url template", &self.review_url_template);
        }

        for filter in &self.detail_reports {
            if filter.promisor.trim().is_empty() {
                crate::bail_invalid!("detail report promisor", "(empty)");
            }
        }

        Ok(())
    }

    /// Selection used for promise-level similarity
    pub fn promise_selection(&self) -> Selection {
        Selection::Threshold(self.similarity.threshold)
    }

    /// Selection used for program-level similarity
    pub fn program_selection(&self) -> Selection {
        Selection::Top(self.similarity.program_top)
    }

    /// Minimum score counted as reuse
    pub fn reuse_threshold(&self) -> f64 {
        self.similarity
            .reuse_threshold
            .unwrap_or(self.similarity.threshold)
    }
}

/// Directory holding the config file when no explicit file is given
fn search_dir(data_dir: Option<&Path>, env_dir: Option<String>) -> PathBuf {
    match (data_dir, env_dir) {
        (Some(dir), _) => dir.to_path_buf(),
        (None, Some(dir)) => PathBuf::from(dir),
        (None, None) => PipelineConfig::default().data_dir,
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| PromiseError::invalid_value(key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.similarity.threshold, 0.7);
        assert_eq!(config.similarity.duplicate_threshold, 0.8);
        assert_eq!(config.similarity.program_top, 20);
        assert_eq!(config.reuse_threshold(), 0.7);
        assert_eq!(config.review_url_template, DEFAULT_REVIEW_URL_TEMPLATE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config = PipelineConfig::from_toml(
            r#"
obt_path = "/opt/obt"
review_url_template = "https://example.org/promises/{}"

[similarity]
threshold = 0.6
reuse_threshold = 0.9
program_top = 10

[[details]]
promisor = "Høyre"
compare = ["Fremskrittspartiet"]
periods = ["2013-2017"]
"#,
        )
        .unwrap();

        assert_eq!(config.obt_path, PathBuf::from("/opt/obt"));
        assert_eq!(config.similarity.threshold, 0.6);
        assert_eq!(config.similarity.duplicate_threshold, 0.8);
        assert_eq!(config.reuse_threshold(), 0.9);
        assert_eq!(config.program_selection(), Selection::Top(10));
        assert_eq!(config.detail_reports.len(), 1);
        assert_eq!(config.detail_reports[0].compare, vec!["Fremskrittspartiet"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = PipelineConfig::default();
        config.similarity.threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(PromiseError::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_template_without_placeholder() {
        let config = PipelineConfig {
            review_url_template: "https://example.org".to_string(),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PromiseError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_load_from_data_dir() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[similarity]\nduplicate_threshold = 0.9\n",
        )
        .unwrap();

        let config = PipelineConfig::load(None, Some(dir.path())).unwrap();
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.similarity.duplicate_threshold, 0.9);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = PipelineConfig::load(None, Some(dir.path())).unwrap();
        assert_eq!(config.similarity.threshold, 0.7);
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempdir().unwrap();
        let result = PipelineConfig::load(Some(&dir.path().join("nope.toml")), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let result = PipelineConfig::from_toml("[similarity\nthreshold = ");
        assert!(matches!(result, Err(PromiseError::Toml(_))));
    }

    #[test]
    fn test_search_dir_precedence() {
        let env = Some("/srv/promises".to_string());
        assert_eq!(
            search_dir(Some(Path::new("/tmp/data")), env.clone()),
            PathBuf::from("/tmp/data")
        );
        assert_eq!(search_dir(None, env), PathBuf::from("/srv/promises"));
        assert_eq!(search_dir(None, None), PathBuf::from("data"));
    }
}
