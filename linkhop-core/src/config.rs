use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Maximum response body size for page fetches (16 MB).
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Default per-fetch timeout
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Host application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resolver: ResolveConfig,
    pub logging: LoggingConfig,
}

/// Options recognized by the resolution pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Reject requests that carry no referer
    pub require_referer: bool,
    /// Follow redirects on the initial page fetch
    pub follow_redirects: bool,
    /// Timeout for every single fetch, in milliseconds
    pub timeout_ms: u64,
    /// Candidate hops in flight at once
    pub max_concurrent_hops: usize,
    /// Upper bound on redirect-probe iterations per candidate
    pub max_redirect_hops: usize,
    /// How many times generic delegation may re-enter the registry
    pub max_delegation_depth: usize,
    /// Sort collected streams best-first (page order otherwise)
    pub rank_by_quality: bool,
    pub user_agent: String,
    pub max_body_bytes: usize,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            require_referer: false,
            follow_redirects: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_concurrent_hops: 4,
            max_redirect_hops: 5,
            max_delegation_depth: 2,
            rank_by_quality: false,
            user_agent: USER_AGENT.to_string(),
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

impl ResolveConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub const fn with_require_referer(mut self, enabled: bool) -> Self {
        self.require_referer = enabled;
        self
    }

    #[must_use]
    pub const fn with_rank_by_quality(mut self, enabled: bool) -> Self {
        self.rank_by_quality = enabled;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from an optional file, then environment variables
    /// (`LINKHOP_RESOLVER__TIMEOUT_MS`, `LINKHOP_LOGGING__LEVEL`, ...).
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("LINKHOP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Check for values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let resolver = &self.resolver;

        if resolver.timeout_ms == 0 {
            errors.push("resolver.timeout_ms must be greater than 0".to_string());
        }
        if resolver.max_concurrent_hops == 0 {
            errors.push("resolver.max_concurrent_hops must be greater than 0".to_string());
        }
        if resolver.max_redirect_hops == 0 {
            errors.push("resolver.max_redirect_hops must be greater than 0".to_string());
        }
        if resolver.max_body_bytes == 0 {
            errors.push("resolver.max_body_bytes must be greater than 0".to_string());
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be \"json\" or \"pretty\", got \"{}\"",
                self.logging.format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
