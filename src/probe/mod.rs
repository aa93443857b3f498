//! Existence probes against a remote HTTP endpoint.
//!
//! This module provides the [`Prober`] trait, its HTTP implementation
//! [`HttpProber`], and the [`ProbeOutcome`] every probe produces.
//!
//! # Outcome classification
//!
//! | Result | Outcome |
//! |--------|---------|
//! | final status 200 (after redirects) | [`ProbeOutcome::Found`] with the probed URL's last path segment |
//! | any other final status | [`ProbeOutcome::NotFound`] with that status |
//! | timeout / transport / HTTP-layer failure | [`ProbeOutcome::Error`] with an [`ErrorKind`] |
//!
//! A probe is attempted once. Failures are reported, never retried.

mod client;
mod constants;
mod error;
mod outcome;
mod throttle;

pub use client::{HttpProber, filename_from_url};
pub use constants::{
    DEFAULT_DELAY_PROBABILITY, DEFAULT_DELAYS_MS, DEFAULT_TIMEOUT_SECS, MAX_REDIRECTS,
    default_delays,
};
pub use error::ProbeError;
pub use outcome::{ErrorKind, ProbeOutcome};
pub use throttle::Throttle;

use async_trait::async_trait;

/// One existence check against one fully-qualified candidate URL.
///
/// Implementations must be stateless between calls (or internally
/// synchronised) because the search engine shares one instance across all
/// workers. `probe` never fails: every problem is folded into
/// [`ProbeOutcome::Error`].
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probes `url` and classifies the result.
    async fn probe(&self, url: &str) -> ProbeOutcome;
}
