//! Runtime configuration.
//!
//! Loaded from YAML or JSON. Every field has a default, so an empty file is
//! a valid stringent-mode configuration. Durations are human-readable
//! (`10s`, `1m 30s`).

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::providers::CompletionConfig;
use crate::resilience::{CircuitBreakerConfig, FallbackStrategy};

/// Errors from loading runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Serde adapter for `humantime` durations.
pub(crate) mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

/// Which decision path the runtime takes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningMode {
    /// Stringent rule pipeline only
    #[default]
    Stringent,
    /// Remote LLM result blended with the stringent result
    Blended,
    /// Remote LLM only
    Llm,
}

impl ScreeningMode {
    pub fn needs_provider(&self) -> bool {
        !matches!(self, ScreeningMode::Stringent)
    }
}

impl fmt::Display for ScreeningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScreeningMode::Stringent => "stringent",
            ScreeningMode::Blended => "blended",
            ScreeningMode::Llm => "llm",
        })
    }
}

impl FromStr for ScreeningMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stringent" => Ok(ScreeningMode::Stringent),
            "blended" => Ok(ScreeningMode::Blended),
            "llm" => Ok(ScreeningMode::Llm),
            other => Err(format!("unknown screening mode '{}'", other)),
        }
    }
}

/// DOI full-text verification settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub enabled: bool,

    /// Resolver prefixes, tried in order
    pub endpoints: Vec<String>,

    /// Per-endpoint request timeout
    #[serde(with = "duration_str")]
    pub timeout: Duration,

    /// Bodies at or below this size are treated as no content
    pub min_body_bytes: usize,

    pub user_agent: String,

    pub cache_capacity: u64,

    #[serde(with = "duration_str")]
    pub cache_ttl: Duration,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoints: vec![
                "https://doi.org".to_string(),
                "https://dx.doi.org".to_string(),
                "https://www.doi.org".to_string(),
            ],
            timeout: Duration::from_secs(10),
            min_body_bytes: 1000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            cache_capacity: 10_000,
            cache_ttl: Duration::from_secs(24 * 3600),
        }
    }
}

/// Exponential backoff for remote LLM calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: usize,

    #[serde(with = "duration_str")]
    pub initial_delay: Duration,

    #[serde(with = "duration_str")]
    pub max_delay: Duration,

    pub factor: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            factor: 2.0,
        }
    }
}

/// Provider type plus its provider-specific JSON block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    #[serde(rename = "type")]
    pub kind: String,

    pub config: JsonValue,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: "groq".to_string(),
            config: JsonValue::Object(Default::default()),
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub mode: ScreeningMode,

    /// Records screened concurrently
    pub concurrency: usize,

    /// Titles shorter than this are excluded
    pub min_title_len: usize,

    pub verification: VerificationConfig,
    pub retry: RetryConfig,
    pub completion: CompletionConfig,
    pub provider: ProviderSettings,
    pub circuit_breaker: CircuitBreakerConfig,

    /// What LLM mode returns when the provider fails
    pub llm_fallback: FallbackStrategy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            mode: ScreeningMode::default(),
            concurrency: 8,
            min_title_len: trialscreen_core::aggregator::MIN_TITLE_LEN,
            verification: VerificationConfig::default(),
            retry: RetryConfig::default(),
            completion: CompletionConfig::default(),
            provider: ProviderSettings::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            llm_fallback: FallbackStrategy::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

        if self.concurrency == 0 {
            return invalid("concurrency must be at least 1");
        }
        if self.retry.max_attempts == 0 {
            return invalid("retry.max_attempts must be at least 1");
        }
        if self.retry.factor < 1.0 {
            return invalid("retry.factor must be at least 1.0");
        }
        if self.retry.initial_delay > self.retry.max_delay {
            return invalid("retry.initial_delay must not exceed retry.max_delay");
        }
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            return invalid("completion.temperature must be within [0, 2]");
        }
        if self.circuit_breaker.failure_threshold == 0 || self.circuit_breaker.success_threshold == 0
        {
            return invalid("circuit_breaker thresholds must be at least 1");
        }
        if self.verification.enabled {
            if self.verification.endpoints.is_empty() {
                return invalid("verification.endpoints must not be empty");
            }
            if let Some(bad) = self
                .verification
                .endpoints
                .iter()
                .find(|e| !e.starts_with("http://") && !e.starts_with("https://"))
            {
                return Err(ConfigError::ValidationError(format!(
                    "verification endpoint '{}' must start with http:// or https://",
                    bad
                )));
            }
        }
        if self.provider.kind.trim().is_empty() {
            return invalid("provider.type must not be empty");
        }
        Ok(())
    }
}
