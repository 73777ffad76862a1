//! Runtime settings
//!
//! Every option can be given as a flag or through the environment variable
//! named next to it. `OPENAPI_SOURCES` takes a comma-separated list; the
//! older single-source `OPENAPI_FILE` is still read when the list is empty.
//! Defaults match a container deployment where the collection sits next to
//! the binary.

use clap::Args;
use clap::builder::BoolishValueParser;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TRANSFORMER_CONFIG: &str = "./portman.json";
pub const DEFAULT_COLLECTION_FILE: &str = "./collection.json";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 120;
pub const DEFAULT_RUN_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_RUN_ITERATIONS: u32 = 1;

/// Environment variables with this prefix are passed to every run as
/// variables, with the prefix stripped
pub const RUN_VARIABLE_PREFIX: &str = "POSTMAN_";

/// Paths the metrics endpoint may not shadow
const RESERVED_PATHS: [&str; 3] = ["/", "/health", "/status"];

/// Errors that can occur while validating settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Monitor settings
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// OpenAPI sources (files or URLs, comma-separated) to generate the collection from
    #[arg(long = "openapi-source", env = "OPENAPI_SOURCES", value_delimiter = ',')]
    pub openapi_sources: Vec<String>,

    /// Single OpenAPI source, used only when no sources list is given
    #[arg(long, env = "OPENAPI_FILE")]
    pub openapi_file: Option<String>,

    /// Transformer configuration file passed to the collection generator
    #[arg(long, env = "PORTMAN_CONFIG_FILE", default_value = DEFAULT_TRANSFORMER_CONFIG)]
    pub transformer_config: PathBuf,

    /// Collection file to run (also the output of generation)
    #[arg(long, env = "COLLECTION_FILE", default_value = DEFAULT_COLLECTION_FILE)]
    pub collection_file: PathBuf,

    /// Collection URL; when set it is downloaded and used instead of the file
    #[arg(long, env = "COLLECTION_URL")]
    pub collection_url: Option<String>,

    /// Environment file passed to every run
    #[arg(long, env = "ENVIRONMENT_FILE")]
    pub environment_file: Option<PathBuf>,

    /// Environment URL; when set it is downloaded and used instead of the file
    #[arg(long, env = "ENVIRONMENT_URL")]
    pub environment_url: Option<String>,

    /// Port for the metrics/status HTTP server
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Path the Prometheus metrics are served on
    #[arg(long = "metrics-path", env = "METRICS_URL_PATH", default_value = DEFAULT_METRICS_PATH)]
    pub metrics_path: String,

    /// Serve the JSON status document on /status
    #[arg(
        long,
        env = "STATUS_ENABLED",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub status_enabled: bool,

    /// Seconds between config refreshes
    #[arg(long, env = "REFRESH_INTERVAL", default_value_t = DEFAULT_REFRESH_INTERVAL_SECS)]
    pub refresh_interval: u64,

    /// Seconds between collection runs
    #[arg(long, env = "RUN_INTERVAL", default_value_t = DEFAULT_RUN_INTERVAL_SECS)]
    pub run_interval: u64,

    /// Iterations per collection run
    #[arg(long, env = "RUN_ITERATIONS", default_value_t = DEFAULT_RUN_ITERATIONS)]
    pub run_iterations: u32,

    /// Stop a run on the first failing request
    #[arg(
        long,
        env = "ENABLE_BAIL",
        default_value_t = false,
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub enable_bail: bool,

    /// Export per-request metrics
    #[arg(
        long = "request-metrics",
        env = "ENABLE_REQUEST_METRICS",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub request_metrics: bool,

    /// Directory for downloaded, generated and debug files
    #[arg(long, env = "WORK_DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// newman executable used to run collections
    #[arg(long, env = "NEWMAN_BIN", default_value = "newman")]
    pub newman_bin: String,

    /// portman executable used to generate collections
    #[arg(long, env = "PORTMAN_BIN", default_value = "portman")]
    pub portman_bin: String,

    /// Keep the last resolved collection when a periodic refresh fails instead of exiting
    #[arg(
        long = "keep-last-good",
        env = "KEEP_LAST_GOOD_COLLECTION",
        default_value_t = false,
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    pub keep_last_good: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openapi_sources: Vec::new(),
            openapi_file: None,
            transformer_config: PathBuf::from(DEFAULT_TRANSFORMER_CONFIG),
            collection_file: PathBuf::from(DEFAULT_COLLECTION_FILE),
            collection_url: None,
            environment_file: None,
            environment_url: None,
            port: DEFAULT_PORT,
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            status_enabled: true,
            refresh_interval: DEFAULT_REFRESH_INTERVAL_SECS,
            run_interval: DEFAULT_RUN_INTERVAL_SECS,
            run_iterations: DEFAULT_RUN_ITERATIONS,
            enable_bail: false,
            request_metrics: true,
            work_dir: PathBuf::from("."),
            newman_bin: "newman".to_string(),
            portman_bin: "portman".to_string(),
            keep_last_good: false,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Settings {
    /// Check values that clap cannot validate on its own
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.refresh_interval == 0 {
            return Err(SettingsError::Invalid(
                "refresh interval must be at least 1 second".into(),
            ));
        }
        if self.run_interval == 0 {
            return Err(SettingsError::Invalid(
                "run interval must be at least 1 second".into(),
            ));
        }
        if self.run_iterations == 0 {
            return Err(SettingsError::Invalid(
                "run iterations must be at least 1".into(),
            ));
        }
        if !self.metrics_path.starts_with('/') {
            return Err(SettingsError::Invalid(format!(
                "metrics path '{}' must start with '/'",
                self.metrics_path
            )));
        }
        if self.metrics_path.contains(['{', '}'])
            || self
                .metrics_path
                .split('/')
                .any(|segment| segment.starts_with([':', '*']))
        {
            return Err(SettingsError::Invalid(format!(
                "metrics path '{}' must be a literal path without captures or wildcards",
                self.metrics_path
            )));
        }
        if RESERVED_PATHS.contains(&self.metrics_path.as_str()) {
            return Err(SettingsError::Invalid(format!(
                "metrics path '{}' collides with a built-in route",
                self.metrics_path
            )));
        }
        Ok(())
    }

    /// Configured OpenAPI sources, blanks removed
    ///
    /// Falls back to the single `OPENAPI_FILE` source when the list is empty.
    pub fn openapi_sources(&self) -> Vec<&str> {
        let sources: Vec<&str> = self
            .openapi_sources
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        if sources.is_empty() {
            return non_empty(&self.openapi_file).into_iter().collect();
        }
        sources
    }

    pub fn collection_url(&self) -> Option<&str> {
        non_empty(&self.collection_url)
    }

    pub fn environment_url(&self) -> Option<&str> {
        non_empty(&self.environment_url)
    }

    pub fn environment_file(&self) -> Option<&Path> {
        self.environment_file
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    pub fn run_period(&self) -> Duration {
        Duration::from_secs(self.run_interval)
    }

    /// Where the collection comes from, for display
    pub fn collection_source(&self) -> String {
        self.collection_url()
            .map(str::to_string)
            .unwrap_or_else(|| self.collection_file.display().to_string())
    }

    /// Where the environment comes from, for display; empty when unset
    pub fn environment_source(&self) -> String {
        self.environment_url()
            .map(str::to_string)
            .or_else(|| self.environment_file().map(|p| p.display().to_string()))
            .unwrap_or_default()
    }
}

/// Variables injected into every run
///
/// Built once at startup from the process environment and never changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunVariables(BTreeMap<String, String>);

impl RunVariables {
    /// Collect `POSTMAN_*` variables from the process environment
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Collect prefixed variables from `vars`, stripping the prefix
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self(
            vars.into_iter()
                .filter_map(|(key, value)| {
                    key.strip_prefix(RUN_VARIABLE_PREFIX)
                        .filter(|name| !name.is_empty())
                        .map(|name| (name.to_string(), value))
                })
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
