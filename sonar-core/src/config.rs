use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Result, SonarError};

/// Environment variables prefixed with `SONAR__` override file values,
/// e.g. `SONAR__API__BASE_URL`.
const ENV_PREFIX: &str = "SONAR";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Deserialize, Clone)]
pub struct SonarConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Root of the search/render service, e.g. `https://sonar.example.net`.
    pub base_url: String,
    /// Polling budget in seconds for a single render.
    #[serde(default = "default_max_wait")]
    pub max_wait: f64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_wait() -> f64 {
    300.0
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            max_wait: default_max_wait(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn with_max_wait(mut self, max_wait: f64) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// `base_url` without a trailing slash, ready for path concatenation.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Render budget. Values `validate` would reject saturate instead of
    /// panicking: negative or NaN as zero, too large as `Duration::MAX`.
    pub fn max_wait(&self) -> Duration {
        Duration::try_from_secs_f64(self.max_wait).unwrap_or(if self.max_wait > 0.0 {
            Duration::MAX
        } else {
            Duration::ZERO
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.base_url();
        if base.is_empty() {
            return Err(invalid("api.base_url must not be empty"));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(invalid(format!(
                "api.base_url must be an http(s) URL, got {base}"
            )));
        }
        if let Err(e) = Duration::try_from_secs_f64(self.max_wait) {
            return Err(invalid(format!(
                "api.max_wait must be a non-negative number of seconds, got {} ({e})",
                self.max_wait
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("api.request_timeout_secs must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> SonarError {
    SonarError::Config(ConfigError::Message(msg.into()))
}

/// Command-line values that take precedence over file and environment.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub max_wait: Option<f64>,
}

impl SonarConfig {
    /// Load from a TOML file (optional if missing) plus `SONAR__*` env vars.
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with_overrides(path, &ConfigOverrides::default())
    }

    pub fn load_with_overrides(path: &str, overrides: &ConfigOverrides) -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR));
        Self::build(builder, overrides)
    }

    /// Parse an in-memory TOML document. No environment lookup.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        Self::build(builder, &ConfigOverrides::default())
    }

    fn build(
        mut builder: ConfigBuilder<DefaultState>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        if let Some(base_url) = &overrides.base_url {
            builder = builder.set_override("api.base_url", base_url.as_str())?;
        }
        if let Some(max_wait) = overrides.max_wait {
            builder = builder.set_override("api.max_wait", max_wait)?;
        }

        let config: SonarConfig = builder.build()?.try_deserialize()?;
        config.api.validate()?;
        Ok(config)
    }
}
