//! Accumulation and version ordering of found filenames.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// First dotted token of three or more integers in a filename.
#[allow(clippy::expect_used)]
static VERSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+\.\d+\.\d+(?:\.\d+)*)").expect("version token regex is valid") // Static pattern, safe to panic
});

/// First run of one or more dotted integers, used when no full token exists.
#[allow(clippy::expect_used)]
static SHORT_VERSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)*)").expect("short version token regex is valid") // Static pattern, safe to panic
});

/// Numeric sort key extracted from a filename.
///
/// Trailing zero components are dropped, so `5.6.1` and `5.6.1.0` compare
/// equal. The empty key is the lowest possible version.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey(Vec<u64>);

impl SortKey {
    /// Extracts the key from `filename`, or `None` when no usable token exists.
    ///
    /// A token of three or more components wins; otherwise the first run of
    /// dotted integers (`fw_12.bin`, `fw_1.2.bin`) is used.
    #[must_use]
    pub fn parse(filename: &str) -> Option<Self> {
        let token = VERSION_TOKEN
            .find(filename)
            .or_else(|| SHORT_VERSION_TOKEN.find(filename))?
            .as_str();
        let mut parts = token
            .split('.')
            .map(|part| part.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;
        while parts.last() == Some(&0) {
            parts.pop();
        }
        Some(Self(parts))
    }

    /// The lowest key, used for filenames without a version token.
    #[must_use]
    pub fn lowest() -> Self {
        Self::default()
    }

    /// Key components after trailing zeros were dropped.
    #[must_use]
    pub fn components(&self) -> &[u64] {
        &self.0
    }
}

/// Append-only set of found filenames for one search.
///
/// Filenames are kept in discovery order until [`finalize`](Self::finalize)
/// sorts them by embedded version. The sort is stable, so ties keep their
/// discovery order. A filename without a parseable version never fails the
/// search; it sorts first.
#[derive(Debug, Default)]
pub struct ResultCollator {
    entries: Vec<(SortKey, String)>,
}

impl ResultCollator {
    /// Creates an empty collator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a found filename.
    pub fn add(&mut self, filename: impl Into<String>) {
        let filename = filename.into();
        let key = SortKey::parse(&filename).unwrap_or_else(|| {
            warn!(filename = %filename, "no version token in filename, sorting it first");
            SortKey::lowest()
        });
        self.entries.push((key, filename));
    }

    /// Number of filenames recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Filenames in discovery order.
    pub fn discovered(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, filename)| filename.as_str())
    }

    /// Consumes the collator and returns filenames ordered by version.
    #[must_use]
    pub fn finalize(mut self) -> Vec<String> {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        self.entries
            .into_iter()
            .map(|(_, filename)| filename)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_takes_first_token() {
        assert_eq!(
            SortKey::parse("update_kindle_paperwhite_v2_5.12.2.2.bin"),
            Some(SortKey(vec![5, 12, 2, 2]))
        );
        assert_eq!(
            SortKey::parse("a_1.2.3_b_4.5.6.bin"),
            Some(SortKey(vec![1, 2, 3]))
        );
    }

    #[test]
    fn test_sort_key_ignores_trailing_zeros() {
        assert_eq!(
            SortKey::parse("fw_5.6.1.bin"),
            SortKey::parse("fw_5.6.1.0.bin")
        );
    }

    #[test]
    fn test_sort_key_missing_or_overflowing() {
        assert_eq!(SortKey::parse("update_kindle.bin"), None);
        assert_eq!(SortKey::parse("fw_1.2.99999999999999999999999.bin"), None);
    }

    #[test]
    fn test_sort_key_falls_back_to_short_tokens() {
        assert_eq!(SortKey::parse("fw_12.bin"), Some(SortKey(vec![12])));
        assert_eq!(SortKey::parse("fw_1.2.bin"), Some(SortKey(vec![1, 2])));
        // A full token later in the name beats a short one earlier.
        assert_eq!(
            SortKey::parse("update_kindle_paperwhite_v2_5.12.2.2.bin"),
            Some(SortKey(vec![5, 12, 2, 2]))
        );
    }

    #[test]
    fn test_finalize_orders_short_tokens_numerically() {
        let mut collator = ResultCollator::new();
        for name in ["fw_12.bin", "fw_7.bin", "fw_1.2.bin", "fw_1.1.bin"] {
            collator.add(name);
        }
        assert_eq!(
            collator.finalize(),
            vec!["fw_1.1.bin", "fw_1.2.bin", "fw_7.bin", "fw_12.bin"]
        );
    }

    #[test]
    fn test_finalize_orders_numerically() {
        let mut collator = ResultCollator::new();
        for name in [
            "update_kindle_5.10.1.bin",
            "update_kindle_5.9.2.bin",
            "update_kindle_5.10.0.bin",
            "update_kindle_5.9.10.bin",
        ] {
            collator.add(name);
        }
        assert_eq!(
            collator.finalize(),
            vec![
                "update_kindle_5.9.2.bin",
                "update_kindle_5.9.10.bin",
                "update_kindle_5.10.0.bin",
                "update_kindle_5.10.1.bin",
            ]
        );
    }

    #[test]
    fn test_finalize_puts_unparseable_first() {
        let mut collator = ResultCollator::new();
        collator.add("update_kindle_5.16.8.bin");
        collator.add("update_kindle_latest.bin");
        collator.add("update_kindle_5.14.0.bin");
        assert_eq!(
            collator.finalize(),
            vec![
                "update_kindle_latest.bin",
                "update_kindle_5.14.0.bin",
                "update_kindle_5.16.8.bin",
            ]
        );
    }

    #[test]
    fn test_finalize_is_stable_for_equal_keys() {
        let mut collator = ResultCollator::new();
        collator.add("b_5.6.1.bin");
        collator.add("a_5.6.1.0.bin");
        collator.add("c_no_version.bin");
        collator.add("d_no_version.bin");
        let discovered: Vec<&str> = collator.discovered().collect();
        assert_eq!(discovered.len(), 4);
        assert_eq!(
            collator.finalize(),
            vec![
                "c_no_version.bin",
                "d_no_version.bin",
                "b_5.6.1.bin",
                "a_5.6.1.0.bin",
            ]
        );
    }

    #[test]
    fn test_empty_collator() {
        let collator = ResultCollator::new();
        assert!(collator.is_empty());
        assert!(collator.finalize().is_empty());
    }
}
