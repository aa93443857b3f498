//! Built-in device table.
//!
//! Each [`Model`] names a firmware host and either one fixed filename or an
//! example filename plus the version range worth searching by default.

use serde::Serialize;
use tracing::debug;

use crate::search::{FilenameTemplate, SearchJob, TemplateError, normalize_base_url};
use crate::version::{Version, VersionRange};

const LEGACY_WEB_DOWNLOADS: &str = "https://s3.amazonaws.com/G7G_FirmwareUpdates_WebDownloads/";
const FIRMWARE_UPDATES: &str = "https://s3.amazonaws.com/firmwareupdates/";
const FIRMWARE_DOWNLOADS: &str = "https://s3.amazonaws.com/firmwaredownloads/";

/// What to probe for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Target {
    /// A single known filename.
    Static {
        /// Filename appended to the base URL.
        filename: &'static str,
    },
    /// A version search seeded by an example filename.
    Dynamic {
        /// Published filename the template is inferred from.
        example_filename: &'static str,
        /// Range searched when the user gives no bounds.
        default_range: VersionRange,
    },
}

/// One device entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Model {
    key: &'static str,
    description: &'static str,
    base_url: &'static str,
    target: Target,
}

impl Model {
    const fn fixed(
        key: &'static str,
        description: &'static str,
        base_url: &'static str,
        filename: &'static str,
    ) -> Self {
        Self {
            key,
            description,
            base_url,
            target: Target::Static { filename },
        }
    }

    const fn searched(
        key: &'static str,
        description: &'static str,
        base_url: &'static str,
        example_filename: &'static str,
        start: (u32, u32, u32),
        end: (u32, u32, u32),
    ) -> Self {
        Self {
            key,
            description,
            base_url,
            target: Target::Dynamic {
                example_filename,
                default_range: VersionRange::unchecked(
                    Version::new(start.0, start.1, start.2),
                    Version::new(end.0, end.1, end.2),
                ),
            },
        }
    }

    /// Short model key, e.g. `PW5`.
    #[must_use]
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Human-readable device name.
    #[must_use]
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// What gets probed.
    #[must_use]
    pub fn target(&self) -> Target {
        self.target
    }

    /// Whether the model has a single fixed filename.
    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self.target, Target::Static { .. })
    }

    /// Base URL, normalised to end with `/`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidBaseUrl`] if the table entry is malformed.
    pub fn base_url(&self) -> Result<String, TemplateError> {
        normalize_base_url(self.base_url)
    }

    /// Default search range for dynamic models.
    #[must_use]
    pub fn default_range(&self) -> Option<VersionRange> {
        match self.target {
            Target::Dynamic { default_range, .. } => Some(default_range),
            Target::Static { .. } => None,
        }
    }

    /// Template inferred from the example filename, for dynamic models.
    #[must_use]
    pub fn template(&self) -> Option<FilenameTemplate> {
        match self.target {
            Target::Dynamic {
                example_filename, ..
            } => Some(FilenameTemplate::infer(example_filename)),
            Target::Static { .. } => None,
        }
    }

    /// Full URL of the fixed filename, for static models.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidBaseUrl`] if the table entry is malformed.
    pub fn static_url(&self) -> Result<Option<String>, TemplateError> {
        match self.target {
            Target::Static { filename } => Ok(Some(format!("{}{filename}", self.base_url()?))),
            Target::Dynamic { .. } => Ok(None),
        }
    }

    /// Builds a search job, defaulting template and range from the table.
    ///
    /// Returns `Ok(None)` for static models.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidBaseUrl`] if the table entry is malformed.
    pub fn search_job(
        &self,
        range: Option<VersionRange>,
        template: Option<FilenameTemplate>,
    ) -> Result<Option<SearchJob>, TemplateError> {
        let (Some(default_template), Some(default_range)) = (self.template(), self.default_range())
        else {
            return Ok(None);
        };
        let template = template.unwrap_or(default_template);
        let range = range.unwrap_or(default_range);
        debug!(model = self.key, template = %template, range = %range, "building search job");
        SearchJob::new(self.base_url, template, range).map(Some)
    }
}

static BUILTIN_MODELS: [Model; 18] = [
    Model::searched(
        "K5",
        "Kindle 5 (Touch)",
        LEGACY_WEB_DOWNLOADS,
        "update_kindle_5.6.1.1.bin",
        (5, 3, 0),
        (5, 6, 25),
    ),
    Model::fixed(
        "K4",
        "Kindle 4 (Non-Touch, Silver/Graphite)",
        FIRMWARE_UPDATES,
        "update_kindle_4.1.4.bin",
    ),
    Model::fixed(
        "K4B",
        "Kindle 4 (Non-Touch, Black)",
        FIRMWARE_UPDATES,
        "update_kindle_4.1.4.bin",
    ),
    Model::searched(
        "PW",
        "Kindle Paperwhite 1 (2012)",
        LEGACY_WEB_DOWNLOADS,
        "update_kindle_5.6.1.1.bin",
        (5, 0, 0),
        (5, 6, 25),
    ),
    Model::searched(
        "PW2",
        "Kindle Paperwhite 2 (2013)",
        FIRMWARE_DOWNLOADS,
        "update_kindle_paperwhite_v2_5.12.2.2.bin",
        (5, 4, 0),
        (5, 12, 25),
    ),
    Model::searched(
        "KT2",
        "Kindle 7 (Basic, 2014)",
        FIRMWARE_DOWNLOADS,
        "update_kindle_5.12.2.2.bin",
        (5, 6, 0),
        (5, 12, 25),
    ),
    Model::fixed(
        "KV",
        "Kindle Voyage (2014)",
        FIRMWARE_DOWNLOADS,
        "update_kindle_voyage_5.13.7.0.1.bin",
    ),
    Model::searched(
        "PW3",
        "Kindle Paperwhite 3 (2015)",
        FIRMWARE_DOWNLOADS,
        "update_kindle_all_new_paperwhite_5.15.1.1.bin",
        (5, 7, 0),
        (5, 15, 25),
    ),
    Model::searched(
        "KOA1",
        "Kindle Oasis 1 (2016)",
        FIRMWARE_DOWNLOADS,
        "update_kindle_oasis_5.15.1.1.bin",
        (5, 8, 0),
        (5, 15, 25),
    ),
    Model::searched(
        "KT3",
        "Kindle 8 (Basic, 2016)",
        FIRMWARE_DOWNLOADS,
        "update_kindle_8th_5.15.1.1.bin",
        (5, 8, 0),
        (5, 15, 25),
    ),
    Model::searched(
        "KOA2",
        "Kindle Oasis 2 (2017)",
        FIRMWARE_DOWNLOADS,
        "update_kindle_all_new_oasis_5.16.2.1.1.bin",
        (5, 9, 0),
        (5, 16, 25),
    ),
    Model::searched(
        "PW4",
        "Kindle Paperwhite 4 (2018)",
        FIRMWARE_DOWNLOADS,
        "update_kindle_paperwhite_10th_5.16.2.1.1.bin",
        (5, 10, 0),
        (5, 16, 25),
    ),
    Model::searched(
        "KT4",
        "Kindle 10 (Basic, 2019)",
        FIRMWARE_DOWNLOADS,
        "update_kindle_10th_5.16.2.1.1.bin",
        (5, 11, 0),
        (5, 16, 25),
    ),
    Model::searched(
        "KOA3",
        "Kindle Oasis 3 (2019)",
        FIRMWARE_DOWNLOADS,
        "update_kindle_oasis_10th_5.16.2.1.1.bin",
        (5, 12, 0),
        (5, 16, 25),
    ),
    Model::searched(
        "PW5",
        "Kindle Paperwhite 5 (11th Gen, 2021)",
        FIRMWARE_DOWNLOADS,
        "update_kindle_all_new_paperwhite_11th_5.16.8.bin",
        (5, 14, 0),
        (5, 17, 25),
    ),
    Model::searched(
        "PW5SE",
        "Kindle Paperwhite 5 Signature Edition (11th Gen, 2021)",
        FIRMWARE_DOWNLOADS,
        "update_kindle_all_new_paperwhite_11th_5.16.8.bin",
        (5, 14, 0),
        (5, 17, 25),
    ),
    Model::searched(
        "K11",
        "Kindle 11 (Basic, 2022)",
        FIRMWARE_DOWNLOADS,
        "update_kindle_11th_5.16.8.bin",
        (5, 15, 0),
        (5, 17, 25),
    ),
    Model::searched(
        "Scribe",
        "Kindle Scribe (2022)",
        FIRMWARE_DOWNLOADS,
        "update_kindle_scribe_5.16.8.bin",
        (5, 16, 0),
        (5, 17, 25),
    ),
];

/// Lookup table of known models.
#[derive(Debug, Clone, Copy)]
pub struct ModelRegistry {
    models: &'static [Model],
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModelRegistry {
    /// The built-in Kindle table.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            models: &BUILTIN_MODELS,
        }
    }

    /// Case-insensitive lookup by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'static Model> {
        let key = key.trim();
        self.models
            .iter()
            .find(|model| model.key.eq_ignore_ascii_case(key))
    }

    /// All models in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'static Model> {
        self.models.iter()
    }

    /// All keys in table order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        self.models.iter().map(Model::key)
    }

    /// Number of models.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_consistent() {
        let registry = ModelRegistry::builtin();
        assert_eq!(registry.len(), 18);
        for model in registry.iter() {
            let base = model.base_url().unwrap();
            assert!(base.ends_with('/'), "{}: {base}", model.key());
            if let Some(range) = model.default_range() {
                assert!(range.is_valid(), "{}: {range}", model.key());
                let template = model.template().unwrap();
                assert!(template.prefix().starts_with("update_kindle_"), "{template}");
                assert_eq!(template.suffix(), ".bin", "{}", model.key());
            }
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = ModelRegistry::builtin();
        assert_eq!(registry.get("pw5").unwrap().key(), "PW5");
        assert_eq!(registry.get(" scribe ").unwrap().key(), "Scribe");
        assert!(registry.get("PW9").is_none());
    }

    #[test]
    fn test_static_model() {
        let model = ModelRegistry::builtin().get("K4").unwrap();
        assert!(model.is_static());
        assert_eq!(
            model.static_url().unwrap().as_deref(),
            Some("https://s3.amazonaws.com/firmwareupdates/update_kindle_4.1.4.bin")
        );
        assert!(model.search_job(None, None).unwrap().is_none());
    }

    #[test]
    fn test_dynamic_model_job_uses_defaults() {
        let model = ModelRegistry::builtin().get("PW5").unwrap();
        let job = model.search_job(None, None).unwrap().unwrap();
        assert_eq!(
            job.template().to_string(),
            "update_kindle_all_new_paperwhite_11th_*.bin"
        );
        assert_eq!(job.range().start(), Version::new(5, 14, 0));
        assert_eq!(job.range().end(), Version::new(5, 17, 25));
        assert_eq!(job.base_url(), FIRMWARE_DOWNLOADS);
    }

    #[test]
    fn test_dynamic_model_job_overrides() {
        let model = ModelRegistry::builtin().get("K11").unwrap();
        let range = VersionRange::new(Version::new(5, 16, 0), Version::new(5, 16, 3)).unwrap();
        let template = FilenameTemplate::new("custom_*.bin").unwrap();
        let job = model
            .search_job(Some(range), Some(template))
            .unwrap()
            .unwrap();
        assert_eq!(job.total(), 4);
        assert_eq!(job.template().to_string(), "custom_*.bin");
    }
}
