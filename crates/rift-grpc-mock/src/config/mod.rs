//! Configuration for the gRPC mock.

mod logging;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub use logging::init_logging;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MockConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub stubs: StubsConfig,
    #[serde(default)]
    pub forward: ForwardConfig,
}

impl MockConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, anyhow::Error> {
        let config: MockConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.logging.level.trim().is_empty() {
            anyhow::bail!("logging.level must not be empty");
        }
        if self.forward.connect_timeout_ms == Some(0) {
            anyhow::bail!("forward.connectTimeoutMs must be greater than zero");
        }
        if self.forward.request_timeout_ms == Some(0) {
            anyhow::bail!("forward.requestTimeoutMs must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `rift_grpc_mock=debug`. `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Seed stubs loaded at startup
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StubsConfig {
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

/// Outbound connection settings for forward stubs
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardConfig {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl ForwardConfig {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: None,
        }
    }
}

fn default_connect_timeout_ms() -> Option<u64> {
    Some(5000)
}
