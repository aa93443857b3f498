//! Version triples and the candidate version space.
//!
//! A [`Version`] is a `(major, minor, patch)` triple with lexicographic
//! ordering. A [`VersionRange`] bounds a search, and [`VersionSpace`]
//! enumerates every triple inside that range under fixed per-field
//! domain limits (see [`DomainLimits`]).
//!
//! # Example
//!
//! ```
//! use fwprobe_core::version::{Version, VersionRange, VersionSpace};
//!
//! let range = VersionRange::new(Version::new(5, 14, 0), Version::new(5, 14, 2)).unwrap();
//! let space = VersionSpace::new(range);
//! assert_eq!(space.count(), 3);
//! let versions: Vec<String> = space.iter().map(|v| v.to_string()).collect();
//! assert_eq!(versions, ["5.14.0", "5.14.1", "5.14.2"]);
//! ```

mod space;

pub use space::{DEFAULT_MAX_MINOR, DEFAULT_MAX_PATCH, DomainLimits, VersionSpace, Versions};

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// An immutable `(major, minor, patch)` version triple.
///
/// Ordering is lexicographic on `(major, minor, patch)`, which is what the
/// derived `Ord` gives us given the field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Version {
    major: u32,
    minor: u32,
    patch: u32,
}

impl Version {
    /// Creates a version triple.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Major component.
    #[must_use]
    pub const fn major(&self) -> u32 {
        self.major
    }

    /// Minor component.
    #[must_use]
    pub const fn minor(&self) -> u32 {
        self.minor
    }

    /// Patch component.
    #[must_use]
    pub const fn patch(&self) -> u32 {
        self.patch
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Errors from parsing a user-supplied version string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    /// The input was empty (after trimming and removing a leading `v`).
    #[error("version string is empty")]
    Empty,

    /// One of the dotted components was not a non-negative integer.
    #[error("invalid version component '{component}' in '{input}'")]
    InvalidComponent {
        /// The full input string.
        input: String,
        /// The offending component.
        component: String,
    },
}

impl FromStr for Version {
    type Err = VersionParseError;

    /// Parses `M`, `M.m`, `M.m.p` or longer dotted forms.
    ///
    /// Missing components are zero-padded and components past the third are
    /// dropped, so `5.16` is `5.16.0` and `5.16.2.1` is `5.16.2`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        if body.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let mut parts = [0u32; 3];
        for (index, component) in body.split('.').enumerate() {
            let value = component
                .parse::<u32>()
                .map_err(|_| VersionParseError::InvalidComponent {
                    input: s.to_string(),
                    component: component.to_string(),
                })?;
            if let Some(slot) = parts.get_mut(index) {
                *slot = value;
            }
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

/// Error returned when a range is constructed with `start > end`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// Start version is greater than end version.
    #[error("start version {start} is greater than end version {end}")]
    Inverted {
        /// Requested start.
        start: Version,
        /// Requested end.
        end: Version,
    },
}

/// An inclusive `(start, end)` version range.
///
/// A range with `start > end` is invalid. [`VersionRange::new`] rejects it,
/// while [`VersionRange::unchecked`] keeps it and lets it enumerate to
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionRange {
    start: Version,
    end: Version,
}

impl VersionRange {
    /// Creates a validated range.
    ///
    /// # Errors
    ///
    /// Returns [`RangeError::Inverted`] when `start > end`.
    pub fn new(start: Version, end: Version) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a range without validating the bounds.
    #[must_use]
    pub const fn unchecked(start: Version, end: Version) -> Self {
        Self { start, end }
    }

    /// Lower bound (inclusive).
    #[must_use]
    pub const fn start(&self) -> Version {
        self.start
    }

    /// Upper bound (inclusive).
    #[must_use]
    pub const fn end(&self) -> Version {
        self.end
    }

    /// Returns true when `start <= end`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}
