//! Source downloads
//!
//! Downloads go through the [`Fetcher`] trait so runs can be driven from
//! local fixtures. [`HttpFetcher`] retries network and 5xx failures with
//! exponential backoff and never leaves a partial file at the destination.

use std::io;
use std::path::Path;
use std::time::Duration;

use crate::config::SourcesConfig;
use crate::error::{PromiseError, Result};
use crate::pipeline::write_atomic_with;

/// Downloads a URL to a local path
pub trait Fetcher {
    fn fetch(&self, url: &str, destination: &Path) -> Result<()>;
}

/// Outcome of a single attempt
enum AttemptError {
    /// Client errors are not retried
    Permanent(PromiseError),
    Retryable(PromiseError),
}

/// Blocking HTTP fetcher
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_retries: u32,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(sources: &SourcesConfig) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(sources.timeout_seconds)))
            .build();

        Self {
            agent: config.into(),
            max_retries: sources.max_retries,
            user_agent: format!(
                "promise-similarity/{} ({})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS
            ),
        }
    }

    fn attempt(&self, url: &str, destination: &Path) -> std::result::Result<(), AttemptError> {
        let response = self
            .agent
            .get(url)
            .header("User-Agent", &self.user_agent)
            .call();

        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => {
                return Err(AttemptError::Permanent(PromiseError::download(
                    url,
                    format!("HTTP {}", code),
                )));
            }
            Err(ureq::Error::StatusCode(code)) => {
                return Err(AttemptError::Retryable(PromiseError::download(
                    url,
                    format!("HTTP {}", code),
                )));
            }
            Err(e) => return Err(AttemptError::Retryable(PromiseError::download(url, e))),
        };

        let mut body = response.into_body().into_reader();
        write_atomic_with(destination, |file| {
            io::copy(&mut body, file)
                .map(|_| ())
                .map_err(|e| PromiseError::download(url, e))
        })
        .map_err(AttemptError::Retryable)
    }
}

impl Fetcher for HttpFetcher {
    #[tracing::instrument(skip(self, destination), fields(destination = %destination.display()))]
    fn fetch(&self, url: &str, destination: &Path) -> Result<()> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(100 * 2_u64.pow(attempt - 1));
                tracing::debug!(attempt, ?backoff, "retrying download");
                std::thread::sleep(backoff);
            }

            match self.attempt(url, destination) {
                Ok(()) => {
                    tracing::info!("downloaded");
                    return Ok(());
                }
                Err(AttemptError::Permanent(e)) => return Err(e),
                Err(AttemptError::Retryable(e)) => {
                    tracing::warn!(attempt, error = %e, "download failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| PromiseError::download(url, "no attempts made")))
    }
}
