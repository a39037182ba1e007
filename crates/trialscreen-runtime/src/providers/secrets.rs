//! API keys for remote providers.
//!
//! A key is looked up in the provider config block first and the
//! environment second. Blank values and the `.env` template placeholders
//! are treated as absent, so a half-filled config still falls through to
//! `GROQ_API_KEY`.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;

use super::ProviderError;

const PLACEHOLDER_KEYS: &[&str] = &["your_groq_api_key_here", "changeme"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Config,
    Environment,
    Programmatic,
}

impl CredentialSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Environment => "environment",
            Self::Programmatic => "programmatic",
        }
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trimmed key, or `None` when blank or a placeholder.
fn usable(raw: &str) -> Option<&str> {
    let key = raw.trim();
    (!key.is_empty() && !PLACEHOLDER_KEYS.contains(&key)).then_some(key)
}

fn from_environment(env_var: &str) -> Option<String> {
    let raw = std::env::var(env_var).ok()?;
    usable(&raw).map(str::to_owned)
}

fn lookup(config: &JsonValue, config_key: &str, env_var: &str) -> Option<(String, CredentialSource)> {
    config
        .get(config_key)
        .and_then(JsonValue::as_str)
        .and_then(usable)
        .map(|key| (key.to_owned(), CredentialSource::Config))
        .or_else(|| from_environment(env_var).map(|key| (key, CredentialSource::Environment)))
}

/// An API key that only leaves its wrapper through [`expose`](Self::expose).
pub struct ApiCredential {
    secret: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            secret: SecretString::from(value.into()),
            source,
            name,
        }
    }

    pub fn from_env(env_var: &str, name: &'static str) -> Result<Self, ProviderError> {
        from_environment(env_var)
            .map(|key| Self::new(key, CredentialSource::Environment, name))
            .ok_or_else(|| ProviderError::NotConfigured(format!("{name}: {env_var} is not set")))
    }

    /// `config[config_key]` if usable, else `env_var`.
    pub fn from_config_or_env(
        config: &JsonValue,
        config_key: &str,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, ProviderError> {
        let (key, source) = lookup(config, config_key, env_var).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "{name}: neither provider.config.{config_key} nor {env_var} holds a key"
            ))
        })?;
        Ok(Self::new(key, source, name))
    }

    pub fn is_available(config: &JsonValue, config_key: &str, env_var: &str) -> bool {
        lookup(config, config_key, env_var).is_some()
    }

    /// The raw key, for setting a request header.
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiCredential({}, {}, [REDACTED])", self.name, self.source)
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}
