use std::env;
use std::time::Duration;

/// Key used to look up the secondary service health endpoint from the
/// provider's configuration.
pub const HEALTH_URL_KEY: &str = "HEALTH_URL";

/// Engine configuration derived from the host environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How often the secondary service is probed while a session runs.
    pub probe_interval: Duration,

    /// Upper bound on a single probe round trip.
    pub probe_timeout: Duration,

    /// Vehicles not updated within this window are filtered out of the live view.
    pub stale_after: Duration,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            probe_interval: Duration::from_secs(env_u64("FLEET_PROBE_INTERVAL_SECS", 30)),
            probe_timeout: Duration::from_secs(env_u64("FLEET_PROBE_TIMEOUT_SECS", 5)),
            stale_after: Duration::from_secs(env_u64("FLEET_STALE_AFTER_SECS", 120)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(5),
            stale_after: Duration::from_secs(120),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}
