//! HTTP prober issuing HEAD requests.
//!
//! [`HttpProber`] wraps one pooled `reqwest` client with the run's timeout,
//! identity header and redirect policy. It is cheap to clone and stateless
//! between probes, so one instance is shared by every worker.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use super::constants::MAX_REDIRECTS;
use super::error::ProbeError;
use super::{ProbeOutcome, Prober, Throttle};
use crate::config::SearchSettings;

/// Existence prober backed by HTTP HEAD requests.
///
/// # Example
///
/// ```no_run
/// use fwprobe_core::SearchSettings;
/// use fwprobe_core::probe::{HttpProber, Prober};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prober = HttpProber::from_settings(&SearchSettings::default())?;
/// let outcome = prober
///     .probe("https://s3.amazonaws.com/firmwaredownloads/update_kindle_11th_5.16.8.bin")
///     .await;
/// println!("{outcome:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    throttle: Throttle,
}

impl HttpProber {
    /// Creates a prober with an explicit timeout, User-Agent and throttle.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::ClientBuild`] if the HTTP client cannot be built.
    #[instrument(level = "debug", skip(user_agent, throttle), fields(timeout_ms = timeout.as_millis()))]
    pub fn new(timeout: Duration, user_agent: &str, throttle: Throttle) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()
            .map_err(|source| ProbeError::ClientBuild { source })?;

        debug!(
            throttle_disabled = throttle.is_disabled(),
            delay_probability = throttle.probability(),
            "creating HTTP prober"
        );

        Ok(Self { client, throttle })
    }

    /// Creates a prober from validated run settings.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::ClientBuild`] if the HTTP client cannot be built.
    pub fn from_settings(settings: &SearchSettings) -> Result<Self, ProbeError> {
        Self::new(settings.timeout(), &settings.user_agent, settings.throttle())
    }

    /// The throttle applied after each probe.
    #[must_use]
    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Sends the HEAD request and returns the final status after redirects.
    async fn head_status(&self, url: &str) -> Result<StatusCode, ProbeError> {
        let parsed = Url::parse(url).map_err(|_| ProbeError::invalid_candidate(url))?;
        let response = self
            .client
            .head(parsed)
            .send()
            .await
            .map_err(|e| ProbeError::from_request(url, e))?;
        Ok(response.status())
    }
}

#[async_trait]
impl Prober for HttpProber {
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let outcome = match self.head_status(url).await {
            Ok(StatusCode::OK) => ProbeOutcome::found(filename_from_url(url)),
            Ok(status) => ProbeOutcome::not_found(status.as_u16()),
            Err(error) => {
                debug!(error = %error, kind = %error.kind(), "probe failed");
                error.into_outcome()
            }
        };

        self.throttle.pause().await;
        outcome
    }
}

/// Last path segment of `url`, as requested (redirect targets are ignored).
#[must_use]
pub fn filename_from_url(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment
        .split('?')
        .next()
        .unwrap_or(without_fragment);
    without_query
        .rsplit('/')
        .next()
        .unwrap_or(without_query)
        .to_string()
}
