//! Read-only run configuration shared by the prober and the search engine.
//!
//! A [`SearchSettings`] value is built once (defaults, then config file, then
//! command-line overrides), validated, and passed by reference for the whole
//! run. Nothing writes to it while a search is in progress.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::probe::{DEFAULT_DELAY_PROBABILITY, DEFAULT_TIMEOUT_SECS, Throttle, default_delays};
use crate::search::{DEFAULT_WORKERS, MAX_WORKERS, SearchMode};
use crate::user_agent;

/// Errors reported by [`SearchSettings::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    /// Timeout must be at least one second.
    #[error("invalid timeout {secs}s: must be a positive number of seconds")]
    InvalidTimeout {
        /// The rejected timeout in seconds.
        secs: u64,
    },

    /// Worker count outside `1..=MAX_WORKERS`.
    #[error("invalid worker count {value}: must be between 1 and {MAX_WORKERS}")]
    InvalidWorkers {
        /// The rejected worker count.
        value: usize,
    },

    /// A delay value was negative, not finite, or too large for a `Duration`.
    #[error("invalid delay {value}: delays must be finite, >= 0 and representable")]
    InvalidDelay {
        /// The rejected delay in seconds.
        value: f64,
    },

    /// Delay probability outside `0.0..=1.0`.
    #[error("invalid delay probability {value}: must be between 0 and 1")]
    InvalidProbability {
        /// The rejected probability.
        value: f64,
    },
}

/// Settings for one search run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSettings {
    /// Per-request timeout in whole seconds.
    pub timeout_secs: u64,
    /// Run the bounded worker pool instead of a sequential walk.
    pub concurrent: bool,
    /// Worker pool size for concurrent mode.
    pub workers: usize,
    /// Throttle delays in seconds.
    pub delays: Vec<f64>,
    /// Probability of applying a throttle delay after a probe.
    pub delay_probability: f64,
    /// Render every outcome as its own line instead of a progress line.
    pub verbose: bool,
    /// User-Agent header sent with probes.
    pub user_agent: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            concurrent: true,
            workers: DEFAULT_WORKERS,
            delays: default_delays().iter().map(Duration::as_secs_f64).collect(),
            delay_probability: DEFAULT_DELAY_PROBABILITY,
            verbose: false,
            user_agent: user_agent::default_probe_user_agent(),
        }
    }
}

impl SearchSettings {
    /// Checks every field; the first violation is returned.
    ///
    /// # Errors
    ///
    /// Returns the matching [`SettingsError`] variant.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.timeout_secs == 0 {
            return Err(SettingsError::InvalidTimeout {
                secs: self.timeout_secs,
            });
        }
        if !(1..=MAX_WORKERS).contains(&self.workers) {
            return Err(SettingsError::InvalidWorkers {
                value: self.workers,
            });
        }
        if let Some(bad) = self
            .delays
            .iter()
            .find(|delay| Duration::try_from_secs_f64(**delay).is_err())
        {
            return Err(SettingsError::InvalidDelay { value: *bad });
        }
        if !(0.0..=1.0).contains(&self.delay_probability) {
            return Err(SettingsError::InvalidProbability {
                value: self.delay_probability,
            });
        }
        Ok(())
    }

    /// Request timeout as a duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Scheduler mode implied by `concurrent` and `workers`.
    #[must_use]
    pub fn mode(&self) -> SearchMode {
        if self.concurrent {
            SearchMode::Concurrent {
                workers: self.workers,
            }
        } else {
            SearchMode::Sequential
        }
    }

    /// Builds the throttle from `delays` and `delay_probability`.
    ///
    /// Invalid delays are skipped; call [`validate`](Self::validate) first to
    /// reject them instead.
    #[must_use]
    pub fn throttle(&self) -> Throttle {
        let delays = self
            .delays
            .iter()
            .filter_map(|secs| Duration::try_from_secs_f64(*secs).ok())
            .collect();
        Throttle::new(delays, self.delay_probability)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = SearchSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.timeout(), Duration::from_secs(10));
        assert_eq!(settings.mode(), SearchMode::Concurrent { workers: 5 });
        assert_eq!(settings.delays, vec![0.5, 1.0, 1.5, 2.0, 2.5]);
        assert!(!settings.verbose);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let settings = SearchSettings {
            timeout_secs: 0,
            ..SearchSettings::default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::InvalidTimeout { secs: 0 })
        );
    }

    #[test]
    fn test_worker_bounds() {
        for value in [0, MAX_WORKERS + 1] {
            let settings = SearchSettings {
                workers: value,
                ..SearchSettings::default()
            };
            assert_eq!(
                settings.validate(),
                Err(SettingsError::InvalidWorkers { value })
            );
        }
        let settings = SearchSettings {
            workers: MAX_WORKERS,
            ..SearchSettings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_negative_or_nan_delay_rejected() {
        let settings = SearchSettings {
            delays: vec![0.5, -1.0],
            ..SearchSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidDelay { .. })
        ));

        let settings = SearchSettings {
            delays: vec![f64::NAN],
            ..SearchSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_unrepresentable_delay_rejected() {
        let settings = SearchSettings {
            delays: vec![1.0, 1e30],
            ..SearchSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidDelay { value }) if value == 1e30
        ));
    }

    #[test]
    fn test_empty_delay_set_is_valid() {
        let settings = SearchSettings {
            delays: Vec::new(),
            ..SearchSettings::default()
        };
        assert!(settings.validate().is_ok());
        assert!(settings.throttle().is_disabled());
    }

    #[test]
    fn test_probability_bounds() {
        for value in [-0.1, 1.5] {
            let settings = SearchSettings {
                delay_probability: value,
                ..SearchSettings::default()
            };
            assert!(matches!(
                settings.validate(),
                Err(SettingsError::InvalidProbability { .. })
            ));
        }
    }

    #[test]
    fn test_sequential_mode() {
        let settings = SearchSettings {
            concurrent: false,
            ..SearchSettings::default()
        };
        assert_eq!(settings.mode(), SearchMode::Sequential);
    }

    #[test]
    fn test_throttle_uses_delays_in_seconds() {
        let settings = SearchSettings {
            delays: vec![0.25],
            delay_probability: 1.0,
            ..SearchSettings::default()
        };
        assert_eq!(
            settings.throttle().pick_delay(),
            Some(Duration::from_millis(250))
        );
    }
}
