//! Filename templates with a single version wildcard.
//!
//! A template such as `update_kindle_all_new_paperwhite_*.bin` turns a
//! [`Version`] into a concrete filename by substituting `M.m.p` at the `*`.
//! Templates are usually inferred from an example filename published for a
//! model; see [`FilenameTemplate::infer`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::version::Version;

/// Placeholder replaced by the version string.
pub const WILDCARD: char = '*';

/// Template used when nothing better can be inferred from an example.
pub const FALLBACK_TEMPLATE: &str = "update_kindle_*.bin";

/// `<prefix><dotted version><_suffix...><.ext>`
#[allow(clippy::expect_used)]
static VERSIONED_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?)(\d+\.\d+\.\d+(?:\.\d+)*)((?:_[a-zA-Z0-9]+)*?)(\.\w+)$")
        .expect("versioned filename regex is valid") // Static pattern, safe to panic
});

/// Errors raised while building templates and candidate URLs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Template has no `*` placeholder.
    #[error("template '{template}' has no '*' placeholder")]
    MissingWildcard {
        /// The rejected template.
        template: String,
    },

    /// Template has more than one `*` placeholder.
    #[error("template '{template}' has {count} '*' placeholders, expected exactly one")]
    MultipleWildcards {
        /// The rejected template.
        template: String,
        /// Number of placeholders found.
        count: usize,
    },

    /// Base URL is not an absolute http(s) URL.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected base URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Substituting a version produced something that is not a URL.
    #[error("candidate '{url}' is not a valid URL")]
    InvalidCandidate {
        /// The malformed candidate.
        url: String,
    },
}

/// How a template was derived from an example filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inference {
    /// A dotted version token was found and replaced.
    VersionToken,
    /// The last `_`-separated part of the stem was replaced.
    LastSegment,
    /// Nothing matched; [`FALLBACK_TEMPLATE`] was used.
    Fallback,
}

/// Filename template with exactly one [`WILDCARD`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilenameTemplate {
    prefix: String,
    suffix: String,
}

impl FilenameTemplate {
    /// Parses a template string.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::MissingWildcard`] or
    /// [`TemplateError::MultipleWildcards`] unless `pattern` contains exactly
    /// one `*`.
    pub fn new(pattern: &str) -> Result<Self, TemplateError> {
        let count = pattern.matches(WILDCARD).count();
        match count {
            0 => Err(TemplateError::MissingWildcard {
                template: pattern.to_string(),
            }),
            1 => {
                let (prefix, suffix) = pattern
                    .split_once(WILDCARD)
                    .ok_or_else(|| TemplateError::MissingWildcard {
                        template: pattern.to_string(),
                    })?;
                Ok(Self {
                    prefix: prefix.to_string(),
                    suffix: suffix.to_string(),
                })
            }
            _ => Err(TemplateError::MultipleWildcards {
                template: pattern.to_string(),
                count,
            }),
        }
    }

    /// Infers a template from an example filename.
    ///
    /// `update_kindle_paperwhite_v2_5.12.2.2.bin` becomes
    /// `update_kindle_paperwhite_v2_*.bin`. Examples without a dotted version
    /// have their last `_` part replaced; anything else falls back to
    /// [`FALLBACK_TEMPLATE`].
    #[must_use]
    pub fn infer(example: &str) -> Self {
        Self::infer_with_method(example).0
    }

    /// Like [`infer`](Self::infer), also reporting which rule applied.
    #[must_use]
    pub fn infer_with_method(example: &str) -> (Self, Inference) {
        if let Some(caps) = VERSIONED_FILENAME.captures(example) {
            let prefix = caps.get(1).map_or("", |m| m.as_str());
            let tail = caps.get(3).map_or("", |m| m.as_str());
            let ext = caps.get(4).map_or("", |m| m.as_str());
            let template = Self {
                prefix: prefix.to_string(),
                suffix: format!("{tail}{ext}"),
            };
            debug!(example, template = %template, "inferred template from version token");
            return (template, Inference::VersionToken);
        }

        let (stem, ext) = match example.rfind('.') {
            Some(dot) if dot > 0 => example.split_at(dot),
            _ => (example, ""),
        };
        if let Some((head, _)) = stem.rsplit_once('_') {
            let template = Self {
                prefix: format!("{head}_"),
                suffix: ext.to_string(),
            };
            debug!(example, template = %template, "inferred template from last segment");
            return (template, Inference::LastSegment);
        }

        warn!(example, fallback = FALLBACK_TEMPLATE, "could not infer template");
        (Self::fallback(), Inference::Fallback)
    }

    /// The [`FALLBACK_TEMPLATE`].
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            prefix: "update_kindle_".to_string(),
            suffix: ".bin".to_string(),
        }
    }

    /// Substitutes `version` at the wildcard.
    #[must_use]
    pub fn render(&self, version: &Version) -> String {
        format!("{}{version}{}", self.prefix, self.suffix)
    }

    /// Text before the wildcard.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Text after the wildcard.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl fmt::Display for FilenameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{WILDCARD}{}", self.prefix, self.suffix)
    }
}

impl std::str::FromStr for FilenameTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Validates an absolute http(s) base URL and makes it end with `/`.
///
/// # Errors
///
/// Returns [`TemplateError::InvalidBaseUrl`] if `base` does not parse or uses
/// another scheme.
pub fn normalize_base_url(base: &str) -> Result<String, TemplateError> {
    let trimmed = base.trim();
    let parsed = Url::parse(trimmed).map_err(|e| TemplateError::InvalidBaseUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(TemplateError::InvalidBaseUrl {
            url: base.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    let mut normalized = trimmed.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Ok(normalized)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_exactly_one_wildcard() {
        assert!(matches!(
            FilenameTemplate::new("update.bin"),
            Err(TemplateError::MissingWildcard { .. })
        ));
        assert!(matches!(
            FilenameTemplate::new("*_*.bin"),
            Err(TemplateError::MultipleWildcards { count: 2, .. })
        ));
        let template = FilenameTemplate::new("update_kindle_*.bin").unwrap();
        assert_eq!(template.prefix(), "update_kindle_");
        assert_eq!(template.suffix(), ".bin");
    }

    #[test]
    fn test_render_substitutes_version() {
        let template = FilenameTemplate::new("update_kindle_11th_*.bin").unwrap();
        assert_eq!(
            template.render(&Version::new(5, 16, 8)),
            "update_kindle_11th_5.16.8.bin"
        );
    }

    #[test]
    fn test_infer_replaces_version_token() {
        let cases = [
            ("update_kindle_5.6.1.1.bin", "update_kindle_*.bin"),
            (
                "update_kindle_paperwhite_v2_5.12.2.2.bin",
                "update_kindle_paperwhite_v2_*.bin",
            ),
            (
                "update_kindle_all_new_paperwhite_11th_5.16.8.bin",
                "update_kindle_all_new_paperwhite_11th_*.bin",
            ),
            ("fw_1.2.3_beta.zip", "fw_*_beta.zip"),
        ];
        for (example, expected) in cases {
            let (template, method) = FilenameTemplate::infer_with_method(example);
            assert_eq!(template.to_string(), expected, "example: {example}");
            assert_eq!(method, Inference::VersionToken);
        }
    }

    #[test]
    fn test_infer_replaces_last_segment_without_version() {
        let (template, method) = FilenameTemplate::infer_with_method("update_kindle_latest.bin");
        assert_eq!(template.to_string(), "update_kindle_*.bin");
        assert_eq!(method, Inference::LastSegment);
    }

    #[test]
    fn test_infer_falls_back() {
        let (template, method) = FilenameTemplate::infer_with_method("firmware.bin");
        assert_eq!(template.to_string(), FALLBACK_TEMPLATE);
        assert_eq!(method, Inference::Fallback);
    }

    #[test]
    fn test_normalize_base_url_appends_slash() {
        assert_eq!(
            normalize_base_url("https://s3.amazonaws.com/firmwaredownloads").unwrap(),
            "https://s3.amazonaws.com/firmwaredownloads/"
        );
        assert_eq!(
            normalize_base_url("https://example.com/fw/").unwrap(),
            "https://example.com/fw/"
        );
    }

    #[test]
    fn test_normalize_base_url_rejects_garbage() {
        assert!(matches!(
            normalize_base_url("not a url"),
            Err(TemplateError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            normalize_base_url("ftp://example.com/"),
            Err(TemplateError::InvalidBaseUrl { .. })
        ));
    }
}
