//! Fan-out configuration.

use std::time::Duration;

/// Default limit on how long a single monthly sub-fetch may take.
pub const DEFAULT_SUBFETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable overriding the sub-fetch timeout, in seconds.
/// `0` disables the timeout.
pub const SUBFETCH_TIMEOUT_ENV: &str = "CRIME_LOOKUP_SUBFETCH_TIMEOUT_SECS";

/// Settings shared by every twelve-month fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOutConfig {
    /// Upper bound on a single monthly sub-fetch. A sub-fetch exceeding
    /// it settles as a failure. `None` waits indefinitely.
    pub subfetch_timeout: Option<Duration>,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            subfetch_timeout: Some(DEFAULT_SUBFETCH_TIMEOUT),
        }
    }
}

impl FanOutConfig {
    /// Reads the configuration from the environment, falling back to
    /// [`FanOutConfig::default`] for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(SUBFETCH_TIMEOUT_ENV)
            .ok()
            .map_or_else(Self::default, |raw| Self::from_timeout_secs(&raw))
    }

    /// Sets the sub-fetch timeout.
    #[must_use]
    pub const fn with_subfetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.subfetch_timeout = timeout;
        self
    }

    fn from_timeout_secs(raw: &str) -> Self {
        match raw.trim().parse::<u64>() {
            Ok(0) => Self {
                subfetch_timeout: None,
            },
            Ok(secs) => Self {
                subfetch_timeout: Some(Duration::from_secs(secs)),
            },
            Err(e) => {
                log::warn!(
                    "Ignoring {SUBFETCH_TIMEOUT_ENV}={raw:?} ({e}), using {DEFAULT_SUBFETCH_TIMEOUT:?}"
                );
                Self::default()
            }
        }
    }
}
