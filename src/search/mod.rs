//! Candidate enumeration, scheduling and result handling.
//!
//! Data flows from a [`SearchJob`] (base URL, [`FilenameTemplate`], version
//! range) through the [`SearchEngine`] to a [`Prober`](crate::probe::Prober);
//! each outcome is counted in a [`ProgressState`], shown by a
//! [`ProgressReporter`] and, when found, collected by the
//! [`ResultCollator`] into a version-sorted [`SearchReport`].

mod collator;
mod engine;
mod job;
mod progress;
mod template;

pub use collator::{ResultCollator, SortKey};
pub use engine::{
    DEFAULT_WORKERS, MAX_WORKERS, SearchEngine, SearchError, SearchMode, SearchReport,
};
pub use job::{Candidate, SearchJob};
pub use progress::{
    ConsoleReporter, NullReporter, OutputSink, ProgressReporter, ProgressState, RecordingSink,
    SinkEvent,
};
pub use template::{
    FALLBACK_TEMPLATE, FilenameTemplate, Inference, TemplateError, WILDCARD, normalize_base_url,
};
