/*!
 * Manager Configuration
 *
 * Construction-time settings for the admission controller and the build
 * launcher, with environment overrides
 */

use super::limits::{
    DEFAULT_BUILD_TIMEOUT, DEFAULT_MAX_CONCURRENT_PROCESSES, ENV_BUILD_TIMEOUT_SECS,
    ENV_MAX_CONCURRENT,
};
use std::time::Duration;
use tracing::warn;

/// Process manager configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Initial admission ceiling (adjustable at runtime)
    pub max_concurrent: usize,
    /// Wall-clock budget for each launched build
    pub build_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT_PROCESSES,
            build_timeout: DEFAULT_BUILD_TIMEOUT,
        }
    }
}

impl ManagerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent;
        self
    }

    pub fn with_build_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout = timeout;
        self
    }

    /// Load from the process environment, falling back to defaults
    ///
    /// Unparsable or non-positive values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MAX_CONCURRENT) {
            match parse_positive(&raw) {
                Some(value) => config.max_concurrent = value as usize,
                None => warn!(
                    key = ENV_MAX_CONCURRENT,
                    value = %raw,
                    default = config.max_concurrent,
                    "Ignoring invalid process limit"
                ),
            }
        }

        if let Some(raw) = lookup(ENV_BUILD_TIMEOUT_SECS) {
            match parse_positive(&raw) {
                Some(secs) => config.build_timeout = Duration::from_secs(secs),
                None => warn!(
                    key = ENV_BUILD_TIMEOUT_SECS,
                    value = %raw,
                    default_secs = config.build_timeout.as_secs(),
                    "Ignoring invalid build timeout"
                ),
            }
        }

        config
    }
}

fn parse_positive(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|v| *v > 0)
}
