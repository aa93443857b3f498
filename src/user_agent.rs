//! User-Agent string for probe requests.
//!
//! Probes present a regular desktop browser identity unless the config file
//! or `--user-agent` sets another one.

/// Browser User-Agent sent with every probe unless overridden.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default User-Agent for probe requests.
#[must_use]
pub fn default_probe_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}
