//! Enumeration of every version triple inside a range.

use super::{Version, VersionRange};

/// Highest patch value enumerated for a minor that is not the range's end minor.
pub const DEFAULT_MAX_PATCH: u32 = 25;

/// Highest minor value enumerated for a major that is not the range's end major.
pub const DEFAULT_MAX_MINOR: u32 = 99;

/// Per-field domain limits for enumeration.
///
/// The limits only apply to "open" positions. Inside the range's first
/// major the minor starts at `start.minor`, inside its last major it stops at
/// `end.minor`; the same holds for patches inside the first and last minor.
/// Explicit range bounds are used as given even when they exceed a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomainLimits {
    /// Inclusive upper bound for an open minor position.
    pub max_minor: u32,
    /// Inclusive upper bound for an open patch position.
    pub max_patch: u32,
}

impl Default for DomainLimits {
    fn default() -> Self {
        Self {
            max_minor: DEFAULT_MAX_MINOR,
            max_patch: DEFAULT_MAX_PATCH,
        }
    }
}

/// The ordered set of versions covered by a [`VersionRange`].
///
/// `VersionSpace` itself is a cheap description; [`VersionSpace::iter`]
/// produces the lazy, single-pass [`Versions`] sequence and
/// [`VersionSpace::count`] gives its exact length without enumerating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionSpace {
    range: VersionRange,
    limits: DomainLimits,
}

impl VersionSpace {
    /// Creates a space with the default domain limits (minor 0..=99, patch 0..=25).
    #[must_use]
    pub fn new(range: VersionRange) -> Self {
        Self::with_limits(range, DomainLimits::default())
    }

    /// Creates a space with explicit domain limits.
    #[must_use]
    pub const fn with_limits(range: VersionRange, limits: DomainLimits) -> Self {
        Self { range, limits }
    }

    /// The range this space enumerates.
    #[must_use]
    pub const fn range(&self) -> VersionRange {
        self.range
    }

    /// The domain limits in effect.
    #[must_use]
    pub const fn limits(&self) -> DomainLimits {
        self.limits
    }

    /// Exact number of versions [`iter`](Self::iter) yields.
    ///
    /// Closed form over the first major, the last major and the fully open
    /// majors between them; an inverted range counts as zero.
    #[must_use]
    pub fn count(&self) -> u64 {
        if !self.range.is_valid() {
            return 0;
        }
        let start = self.range.start();
        let end = self.range.end();

        if start.major() == end.major() {
            return self.count_in_major(start.major());
        }

        let open_majors = u64::from(end.major() - start.major() - 1);
        let per_open_major =
            (u64::from(self.limits.max_minor) + 1) * (u64::from(self.limits.max_patch) + 1);

        self.count_in_major(start.major())
            + self.count_in_major(end.major())
            + open_majors * per_open_major
    }

    /// Number of versions inside one major of the range.
    fn count_in_major(&self, major: u32) -> u64 {
        let (lo_minor, hi_minor) = self.minor_bounds(major);
        if lo_minor > hi_minor {
            return 0;
        }

        let start = self.range.start();
        let end = self.range.end();
        let first_lo = if major == start.major() { start.patch() } else { 0 };
        let last_hi = if major == end.major() {
            end.patch()
        } else {
            self.limits.max_patch
        };

        if lo_minor == hi_minor {
            return span(first_lo, last_hi);
        }

        let open_minors = u64::from(hi_minor - lo_minor - 1);
        span(first_lo, self.limits.max_patch)
            + span(0, last_hi)
            + open_minors * (u64::from(self.limits.max_patch) + 1)
    }

    /// Returns the lazy sequence of versions in ascending order.
    #[must_use]
    pub fn iter(&self) -> Versions {
        let next = if self.range.is_valid() {
            let start = self.range.start();
            self.seek(start.major(), start.minor(), start.patch())
        } else {
            None
        };
        Versions {
            space: *self,
            next,
            remaining: self.count(),
        }
    }

    fn minor_bounds(&self, major: u32) -> (u32, u32) {
        let start = self.range.start();
        let end = self.range.end();
        let lo = if major == start.major() { start.minor() } else { 0 };
        let hi = if major == end.major() {
            end.minor()
        } else {
            self.limits.max_minor
        };
        (lo, hi)
    }

    fn patch_bounds(&self, major: u32, minor: u32) -> (u32, u32) {
        let start = self.range.start();
        let end = self.range.end();
        let lo = if major == start.major() && minor == start.minor() {
            start.patch()
        } else {
            0
        };
        let hi = if major == end.major() && minor == end.minor() {
            end.patch()
        } else {
            self.limits.max_patch
        };
        (lo, hi)
    }

    /// Finds the first enumerable version at or after `(major, minor, patch)`.
    fn seek(&self, mut major: u32, mut minor: u32, mut patch: u32) -> Option<Version> {
        let end_major = self.range.end().major();
        loop {
            if major > end_major {
                return None;
            }

            let (lo_minor, hi_minor) = self.minor_bounds(major);
            if minor < lo_minor {
                minor = lo_minor;
                patch = 0;
            }
            if minor > hi_minor {
                major = major.checked_add(1)?;
                minor = 0;
                patch = 0;
                continue;
            }

            let (lo_patch, hi_patch) = self.patch_bounds(major, minor);
            if patch < lo_patch {
                patch = lo_patch;
            }
            if patch > hi_patch {
                match minor.checked_add(1) {
                    Some(next) => minor = next,
                    None => {
                        major = major.checked_add(1)?;
                        minor = 0;
                    }
                }
                patch = 0;
                continue;
            }

            return Some(Version::new(major, minor, patch));
        }
    }
}

impl IntoIterator for &VersionSpace {
    type Item = Version;
    type IntoIter = Versions;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Single-pass iterator over a [`VersionSpace`].
#[derive(Debug, Clone)]
pub struct Versions {
    space: VersionSpace,
    next: Option<Version>,
    remaining: u64,
}

impl Iterator for Versions {
    type Item = Version;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.remaining = self.remaining.saturating_sub(1);
        self.next = match current.patch().checked_add(1) {
            Some(patch) => self.space.seek(current.major(), current.minor(), patch),
            None => match current.minor().checked_add(1) {
                Some(minor) => self.space.seek(current.major(), minor, 0),
                None => current
                    .major()
                    .checked_add(1)
                    .and_then(|major| self.space.seek(major, 0, 0)),
            },
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl std::iter::FusedIterator for Versions {}

/// Inclusive span length, zero when `lo > hi`.
fn span(lo: u32, hi: u32) -> u64 {
    if lo > hi {
        0
    } else {
        u64::from(hi - lo) + 1
    }
}
