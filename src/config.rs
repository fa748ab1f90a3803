//! Engine configuration sourced from the environment.

use std::time::Duration;

use tracing::warn;

const CACHE_TTL_VAR: &str = "ABAC_CACHE_TTL_SECONDS";
const DEADLINE_VAR: &str = "ABAC_DEFAULT_DEADLINE_MS";

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);
const DEFAULT_DEADLINE: Duration = Duration::from_millis(50);

/// Tunables for one engine instance.
///
/// `default_deadline` is advisory: the engine never imposes it, but callers
/// can feed it into [`CancelToken::with_deadline`](crate::CancelToken::with_deadline).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub cache_ttl: Duration,
    pub default_deadline: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            default_deadline: DEFAULT_DEADLINE,
        }
    }
}

impl EngineConfig {
    /// Read `ABAC_CACHE_TTL_SECONDS` and `ABAC_DEFAULT_DEADLINE_MS`,
    /// falling back to the defaults (60s, 50ms) for unset or unparsable
    /// values.
    pub fn from_env() -> Self {
        Self {
            cache_ttl: read_var(CACHE_TTL_VAR, DEFAULT_CACHE_TTL, Duration::from_secs),
            default_deadline: read_var(DEADLINE_VAR, DEFAULT_DEADLINE, Duration::from_millis),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = deadline;
        self
    }
}

fn read_var(name: &str, default: Duration, to_duration: fn(u64) -> Duration) -> Duration {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(value) => to_duration(value),
            Err(_) => {
                warn!(
                    event = "Config",
                    var = name,
                    value = raw,
                    "unparsable value, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}
