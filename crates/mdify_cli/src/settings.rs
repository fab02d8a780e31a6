//! Optional RON settings file and its merge with command-line flags.
//!
//! Precedence for every value: command-line flag, then settings file, then the
//! built-in default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use mdify_engine::{FetchSettings, RetryPolicy, ScrapeConfig};
use mdify_logging::mdify_info;
use serde::Deserialize;

pub const DEFAULT_OUTPUT_DIR: &str = "./docs";
pub const DEFAULT_PORT: u16 = 8080;

/// Contents of a settings file, e.g.
///
/// ```ron
/// (output: Some("./site-docs"), workers: Some(8), timeout_secs: Some(60))
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub output: Option<PathBuf>,
    pub workers: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub retries: Option<u32>,
    pub port: Option<u16>,
}

impl FileSettings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings: FileSettings = ron::from_str(&content)
            .with_context(|| format!("failed to parse settings file {}", path.display()))?;
        mdify_info!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

/// Effective values for one `scrape` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSettings {
    pub output: PathBuf,
    pub workers: usize,
    pub timeout: Duration,
    pub retries: u32,
}

impl ScrapeSettings {
    pub fn resolve(
        output: Option<PathBuf>,
        workers: Option<usize>,
        timeout_secs: Option<u64>,
        retries: Option<u32>,
        file: &FileSettings,
    ) -> Self {
        let defaults = ScrapeConfig::default();
        Self {
            output: output
                .or_else(|| file.output.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            workers: workers.or(file.workers).unwrap_or(defaults.workers),
            timeout: timeout_secs
                .or(file.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch.request_timeout),
            retries: retries.or(file.retries).unwrap_or(defaults.retry.max_retries),
        }
    }

    pub fn engine_config(&self) -> ScrapeConfig {
        ScrapeConfig {
            fetch: FetchSettings {
                request_timeout: self.timeout,
                ..FetchSettings::default()
            },
            retry: RetryPolicy::new(self.retries),
            workers: self.workers,
        }
    }
}

/// Effective values for one `serve` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeSettings {
    pub dir: PathBuf,
    pub port: u16,
}

impl ServeSettings {
    pub fn resolve(dir: Option<PathBuf>, port: Option<u16>, file: &FileSettings) -> Self {
        Self {
            dir: dir
                .or_else(|| file.output.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            port: port.or(file.port).unwrap_or(DEFAULT_PORT),
        }
    }
}
