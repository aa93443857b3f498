//! Search jobs: a base URL, a template and a version range.

use serde::Serialize;

use super::template::{FilenameTemplate, TemplateError, normalize_base_url};
use crate::version::{Version, VersionRange, VersionSpace};

/// One fully-qualified URL to probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Version substituted into the template.
    pub version: Version,
    /// Base URL followed by the rendered filename.
    pub url: String,
}

/// Everything the engine needs to enumerate candidates.
///
/// The base URL is normalised on construction, so joining it with a rendered
/// filename is plain concatenation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchJob {
    base_url: String,
    template: FilenameTemplate,
    space: VersionSpace,
}

impl SearchJob {
    /// Builds a job over `range` with the default domain limits.
    ///
    /// An inverted range is accepted and enumerates nothing. Use
    /// [`VersionRange::new`] upstream to reject it as a configuration error.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidBaseUrl`] for a malformed base URL.
    pub fn new(
        base_url: &str,
        template: FilenameTemplate,
        range: VersionRange,
    ) -> Result<Self, TemplateError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            template,
            space: VersionSpace::new(range),
        })
    }

    /// Normalised base URL (ends with `/`).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Filename template.
    #[must_use]
    pub fn template(&self) -> &FilenameTemplate {
        &self.template
    }

    /// Version range being searched.
    #[must_use]
    pub fn range(&self) -> VersionRange {
        self.space.range()
    }

    /// Version space being searched.
    #[must_use]
    pub fn space(&self) -> &VersionSpace {
        &self.space
    }

    /// Number of candidates, without enumerating them.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.space.count()
    }

    /// Builds the candidate for one version.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidCandidate`] if the joined string is not
    /// a valid URL.
    pub fn candidate(&self, version: Version) -> Result<Candidate, TemplateError> {
        let url = format!("{}{}", self.base_url, self.template.render(&version));
        if url::Url::parse(&url).is_err() {
            return Err(TemplateError::InvalidCandidate { url });
        }
        Ok(Candidate { version, url })
    }

    /// Lazily yields one candidate (or substitution failure) per version.
    pub fn candidates(
        &self,
    ) -> impl Iterator<Item = (Version, Result<Candidate, TemplateError>)> + '_ {
        self.space
            .iter()
            .map(move |version| (version, self.candidate(version)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn job(start: Version, end: Version) -> SearchJob {
        SearchJob::new(
            "https://example.com/fw",
            FilenameTemplate::new("update_*.bin").unwrap(),
            VersionRange::unchecked(start, end),
        )
        .unwrap()
    }

    #[test]
    fn test_candidates_follow_enumeration_order() {
        let job = job(Version::new(5, 14, 0), Version::new(5, 14, 2));
        let urls: Vec<String> = job
            .candidates()
            .map(|(_, candidate)| candidate.unwrap().url)
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/fw/update_5.14.0.bin",
                "https://example.com/fw/update_5.14.1.bin",
                "https://example.com/fw/update_5.14.2.bin",
            ]
        );
        assert_eq!(job.total(), 3);
    }

    #[test]
    fn test_inverted_range_has_no_candidates() {
        let job = job(Version::new(5, 15, 0), Version::new(5, 14, 0));
        assert_eq!(job.total(), 0);
        assert_eq!(job.candidates().count(), 0);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = SearchJob::new(
            "nope",
            FilenameTemplate::fallback(),
            VersionRange::unchecked(Version::new(1, 0, 0), Version::new(1, 0, 0)),
        );
        assert!(matches!(result, Err(TemplateError::InvalidBaseUrl { .. })));
    }
}
