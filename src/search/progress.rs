//! Progress counters and outcome rendering.
//!
//! The engine owns one [`ProgressState`] per run and updates it from the
//! single outcome-delivery path. Reporters only observe it; nothing they do
//! feeds back into the search.

use serde::Serialize;

use crate::probe::ProbeOutcome;

/// Counters for one search run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressState {
    /// Outcomes delivered so far, including errors.
    pub checks_done: u64,
    /// Candidates in the version space.
    pub total_checks: u64,
    /// Found outcomes delivered so far.
    pub found_count: u64,
    /// Error outcomes delivered so far.
    pub errors: u64,
}

impl ProgressState {
    /// Fresh counters for a run over `total_checks` candidates.
    #[must_use]
    pub fn new(total_checks: u64) -> Self {
        Self {
            total_checks,
            ..Self::default()
        }
    }

    /// Clears the counters for a new run.
    pub fn reset(&mut self, total_checks: u64) {
        *self = Self::new(total_checks);
    }

    /// Counts one delivered outcome.
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        self.checks_done += 1;
        match outcome {
            ProbeOutcome::Found { .. } => self.found_count += 1,
            ProbeOutcome::Error { .. } => self.errors += 1,
            ProbeOutcome::NotFound { .. } => {}
        }
    }

    /// Completion in percent; an empty run counts as complete.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent(&self) -> f64 {
        if self.total_checks == 0 {
            100.0
        } else {
            self.checks_done as f64 / self.total_checks as f64 * 100.0
        }
    }

    /// Whether every candidate has been accounted for.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.checks_done >= self.total_checks
    }

    /// `Progress: 12/52 (23.08%) [1 found]`
    #[must_use]
    pub fn line(&self) -> String {
        format!(
            "Progress: {}/{} ({:.2}%) [{} found]",
            self.checks_done,
            self.total_checks,
            self.percent(),
            self.found_count
        )
    }
}

/// Observer of a run's outcomes, called in delivery order.
///
/// Sequential runs deliver in candidate order; concurrent runs deliver in
/// completion order.
pub trait ProgressReporter: Send {
    /// Called once before the first probe.
    fn on_start(&mut self, _progress: &ProgressState) {}

    /// Called once per delivered outcome, after `progress` was updated.
    fn on_outcome(&mut self, url: &str, outcome: &ProbeOutcome, progress: &ProgressState);

    /// Called once after the last outcome.
    fn on_finish(&mut self, _progress: &ProgressState, _interrupted: bool) {}
}

/// Reporter that renders nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn on_outcome(&mut self, _url: &str, _outcome: &ProbeOutcome, _progress: &ProgressState) {}
}

/// Line-oriented output surface.
pub trait OutputSink: Send {
    /// Prints a permanent line.
    fn emit_line(&mut self, line: &str);

    /// Replaces the current transient line.
    fn overwrite_line(&mut self, line: &str);

    /// Removes the transient line, if any.
    fn clear_line(&mut self) {}
}

/// Renders outcomes to an [`OutputSink`].
///
/// Non-verbose mode keeps one overwritten progress line and interrupts it
/// with a `Found:` line for every hit and an `Error:` line for every failed
/// check. Verbose mode prints one line per
/// outcome and never overwrites.
#[derive(Debug)]
pub struct ConsoleReporter<S> {
    sink: S,
    verbose: bool,
}

impl<S: OutputSink> ConsoleReporter<S> {
    /// Creates a reporter writing to `sink`.
    #[must_use]
    pub fn new(sink: S, verbose: bool) -> Self {
        Self { sink, verbose }
    }

    /// Whether every outcome gets its own line.
    #[must_use]
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// The underlying sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the reporter, returning the sink.
    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }
}

impl<S: OutputSink> ProgressReporter for ConsoleReporter<S> {
    fn on_start(&mut self, progress: &ProgressState) {
        if !self.verbose {
            self.sink.overwrite_line(&progress.line());
        }
    }

    fn on_outcome(&mut self, url: &str, outcome: &ProbeOutcome, progress: &ProgressState) {
        if self.verbose {
            let line = match outcome {
                ProbeOutcome::Found { .. } => format!("Found: {url}"),
                ProbeOutcome::NotFound { status } => {
                    format!("Not found: {url} (Status: {status})")
                }
                ProbeOutcome::Error { kind, detail } => format!("Error: {url} ({kind}: {detail})"),
            };
            self.sink.emit_line(&line);
            return;
        }

        match outcome {
            ProbeOutcome::Found { .. } => self.sink.emit_line(&format!("Found: {url}")),
            ProbeOutcome::Error { kind, .. } => {
                self.sink.emit_line(&format!("Error: {url} ({kind})"));
            }
            ProbeOutcome::NotFound { .. } => {}
        }
        self.sink.overwrite_line(&progress.line());
    }

    fn on_finish(&mut self, _progress: &ProgressState, _interrupted: bool) {
        if !self.verbose {
            self.sink.clear_line();
        }
    }
}

/// What a [`RecordingSink`] received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// [`OutputSink::emit_line`]
    Line(String),
    /// [`OutputSink::overwrite_line`]
    Overwrite(String),
    /// [`OutputSink::clear_line`]
    Clear,
}

/// In-memory sink, handy for tests and for capturing output.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Vec<SinkEvent>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received, in order.
    #[must_use]
    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    /// Only the permanent lines.
    #[must_use]
    pub fn lines(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Line(line) => Some(line.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl OutputSink for RecordingSink {
    fn emit_line(&mut self, line: &str) {
        self.events.push(SinkEvent::Line(line.to_string()));
    }

    fn overwrite_line(&mut self, line: &str) {
        self.events.push(SinkEvent::Overwrite(line.to_string()));
    }

    fn clear_line(&mut self) {
        self.events.push(SinkEvent::Clear);
    }
}
