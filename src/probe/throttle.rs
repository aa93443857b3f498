//! Randomised politeness delay applied after each probe.
//!
//! After a probe completes, the [`Throttle`] sleeps with probability
//! `probability` for a duration picked uniformly from a fixed set of delays.
//! The decision is made once per probe; there is no compounding.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use fwprobe_core::probe::Throttle;
//!
//! let throttle = Throttle::new(vec![Duration::from_millis(500)], 0.0);
//! assert_eq!(throttle.pick_delay(), None);
//! ```

use std::time::Duration;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use super::constants::{DEFAULT_DELAY_PROBABILITY, default_delays};

/// Probability-gated random delay.
#[derive(Debug, Clone, PartialEq)]
pub struct Throttle {
    delays: Vec<Duration>,
    probability: f64,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(default_delays(), DEFAULT_DELAY_PROBABILITY)
    }
}

impl Throttle {
    /// Creates a throttle. `probability` is clamped to `0.0..=1.0`.
    #[must_use]
    pub fn new(delays: Vec<Duration>, probability: f64) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self {
            delays,
            probability,
        }
    }

    /// A throttle that never sleeps.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Vec::new(), 0.0)
    }

    /// Returns true when no delay can ever be applied.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.delays.is_empty() || self.probability <= 0.0
    }

    /// Candidate delays.
    #[must_use]
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Probability that a delay is applied after a probe.
    #[must_use]
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Draws the delay for one probe, if any.
    ///
    /// Kept synchronous so the thread-local RNG is never held across an await.
    #[must_use]
    pub fn pick_delay(&self) -> Option<Duration> {
        if self.is_disabled() {
            return None;
        }
        let mut rng = rand::thread_rng();
        if !rng.gen_bool(self.probability) {
            return None;
        }
        self.delays.choose(&mut rng).copied()
    }

    /// Sleeps for a randomly picked delay, or returns immediately.
    pub async fn pause(&self) {
        if let Some(delay) = self.pick_delay() {
            debug!(delay_ms = delay.as_millis(), "throttling after probe");
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_throttle_matches_documented_defaults() {
        let throttle = Throttle::default();
        assert!((throttle.probability() - 0.1).abs() < f64::EPSILON);
        assert_eq!(
            throttle.delays(),
            &[
                Duration::from_millis(500),
                Duration::from_millis(1000),
                Duration::from_millis(1500),
                Duration::from_millis(2000),
                Duration::from_millis(2500),
            ]
        );
    }

    #[test]
    fn test_zero_probability_never_delays() {
        let throttle = Throttle::new(vec![Duration::from_secs(1)], 0.0);
        assert!(throttle.is_disabled());
        for _ in 0..100 {
            assert_eq!(throttle.pick_delay(), None);
        }
    }

    #[test]
    fn test_empty_delay_set_never_delays() {
        let throttle = Throttle::new(Vec::new(), 1.0);
        assert!(throttle.is_disabled());
        assert_eq!(throttle.pick_delay(), None);
    }

    #[test]
    fn test_certain_probability_always_picks_from_set() {
        let delays = vec![Duration::from_millis(10), Duration::from_millis(20)];
        let throttle = Throttle::new(delays.clone(), 1.0);
        for _ in 0..100 {
            let picked = throttle.pick_delay();
            assert!(picked.is_some_and(|d| delays.contains(&d)));
        }
    }

    #[test]
    fn test_probability_is_clamped() {
        assert!((Throttle::new(vec![], 7.0).probability() - 1.0).abs() < f64::EPSILON);
        assert!(Throttle::new(vec![], -1.0).probability().abs() < f64::EPSILON);
        assert!(Throttle::new(vec![], f64::NAN).probability().abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_probability_sometimes_delays() {
        let throttle = Throttle::new(vec![Duration::from_millis(1)], 0.5);
        let hits = (0..1000).filter(|_| throttle.pick_delay().is_some()).count();
        assert!((300..=700).contains(&hits), "hits = {hits}");
    }

    #[tokio::test]
    async fn test_disabled_pause_returns_immediately() {
        let start = std::time::Instant::now();
        Throttle::disabled().pause().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
