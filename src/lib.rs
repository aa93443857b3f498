//! Firmware Probe Core Library
//!
//! This library finds which version-tagged firmware files exist on a remote
//! HTTP host. It enumerates a version space, probes every candidate URL with
//! a HEAD request and reports the hits sorted by version.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`version`] - Version triples, ranges and the enumerable version space
//! - [`probe`] - HTTP existence probes and outcome classification
//! - [`search`] - Templates, the search engine, progress and result ordering
//! - [`registry`] - Built-in device table
//! - [`config`] - Read-only run settings

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod probe;
pub mod registry;
pub mod search;
pub mod user_agent;
pub mod version;

// Re-export commonly used types
pub use config::{SearchSettings, SettingsError};
pub use probe::{ErrorKind, HttpProber, ProbeError, ProbeOutcome, Prober, Throttle};
pub use registry::{Model, ModelRegistry, Target};
pub use search::{
    ConsoleReporter, FilenameTemplate, OutputSink, ProgressReporter, ProgressState,
    ResultCollator, SearchEngine, SearchError, SearchJob, SearchMode, SearchReport,
    TemplateError,
};
pub use version::{RangeError, Version, VersionParseError, VersionRange, VersionSpace};
