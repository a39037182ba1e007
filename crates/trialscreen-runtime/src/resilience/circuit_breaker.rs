//! Per-provider circuit breaker.
//!
//! `failure_threshold` consecutive failures open a provider's circuit and
//! records then skip the remote call. Once `recovery_timeout` has passed the
//! next check lets calls through as probes; `success_threshold` probe
//! successes close the circuit, one probe failure reopens it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    #[serde(with = "crate::config::duration_str")]
    pub recovery_timeout: Duration,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    /// Calls pass; counts consecutive failures.
    Closed { failures: u32 },
    /// Calls are skipped.
    Open { opened_at: Instant },
    /// Calls pass as recovery probes.
    HalfOpen { successes: u32 },
}

impl Default for CircuitState {
    fn default() -> Self {
        Self::Closed { failures: 0 }
    }
}

impl CircuitState {
    fn after_success(&self, config: &CircuitBreakerConfig) -> Self {
        match *self {
            Self::HalfOpen { successes } if successes + 1 < config.success_threshold => {
                Self::HalfOpen {
                    successes: successes + 1,
                }
            }
            Self::Open { opened_at } => Self::Open { opened_at },
            _ => Self::default(),
        }
    }

    fn after_failure(&self, config: &CircuitBreakerConfig, now: Instant) -> Self {
        match *self {
            Self::Closed { failures } if failures + 1 < config.failure_threshold => Self::Closed {
                failures: failures + 1,
            },
            Self::Open { opened_at } => Self::Open { opened_at },
            _ => Self::Open { opened_at: now },
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Closed { .. } => "closed",
            Self::Open { .. } => "open",
            Self::HalfOpen { .. } => "half-open",
        }
    }
}

/// Circuits keyed by provider name.
pub struct CircuitBreaker {
    circuits: Mutex<HashMap<String, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Whether calls to `provider` should be skipped. An open circuit past
    /// its recovery timeout moves to half-open here.
    pub fn is_open(&self, provider: &str) -> bool {
        let mut circuits = self.circuits.lock();
        let Some(state) = circuits.get_mut(provider) else {
            return false;
        };
        let CircuitState::Open { opened_at } = *state else {
            return false;
        };
        if opened_at.elapsed() < self.config.recovery_timeout {
            return true;
        }
        *state = CircuitState::HalfOpen { successes: 0 };
        tracing::info!(provider, "circuit half-open, probing provider");
        false
    }

    pub fn record_success(&self, provider: &str) {
        self.apply(provider, |state, config| state.after_success(config));
    }

    pub fn record_failure(&self, provider: &str) {
        let now = Instant::now();
        self.apply(provider, |state, config| state.after_failure(config, now));
    }

    fn apply(
        &self,
        provider: &str,
        next: impl FnOnce(&CircuitState, &CircuitBreakerConfig) -> CircuitState,
    ) {
        let mut circuits = self.circuits.lock();
        let state = circuits.entry(provider.to_string()).or_default();
        let updated = next(state, &self.config);
        let (from, to) = (state.label(), updated.label());
        if from != to {
            if matches!(updated, CircuitState::Open { .. }) {
                tracing::warn!(provider, from, "circuit opened");
            } else {
                tracing::info!(provider, from, to, "circuit state changed");
            }
        }
        *state = updated;
    }

    pub fn state(&self, provider: &str) -> CircuitState {
        self.circuits
            .lock()
            .get(provider)
            .cloned()
            .unwrap_or_default()
    }

    pub fn reset(&self) {
        self.circuits.lock().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("circuits", &*self.circuits.lock())
            .finish()
    }
}
