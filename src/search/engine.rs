//! Search engine driving probes over a version space.
//!
//! The [`SearchEngine`] walks every candidate of a [`SearchJob`], probes it
//! with a shared [`Prober`] and funnels each outcome through one delivery
//! point that owns the progress counters and the result collator.
//!
//! # Modes
//!
//! - [`SearchMode::Sequential`]: one probe at a time, outcomes delivered in
//!   candidate order.
//! - [`SearchMode::Concurrent`]: up to `workers` probes in flight, outcomes
//!   delivered in completion order. Candidates are produced lazily; a
//!   semaphore bounds in-flight probes and a bounded channel carries outcomes
//!   back, so memory does not grow with the size of the range.
//!
//! # Interruption
//!
//! When the interrupt flag is raised the engine stops starting probes, lets
//! in-flight probes finish, delivers their outcomes, and returns the partial
//! report with [`SearchReport::interrupted`] set. Interruption is not an
//! error.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//!
//! use fwprobe_core::probe::HttpProber;
//! use fwprobe_core::search::{FilenameTemplate, NullReporter, SearchEngine, SearchJob, SearchMode};
//! use fwprobe_core::version::{Version, VersionRange};
//! use fwprobe_core::SearchSettings;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let prober = Arc::new(HttpProber::from_settings(&SearchSettings::default())?);
//! let engine = SearchEngine::new(prober, SearchMode::Concurrent { workers: 5 })?;
//! let job = SearchJob::new(
//!     "https://s3.amazonaws.com/firmwaredownloads/",
//!     FilenameTemplate::new("update_kindle_11th_*.bin")?,
//!     VersionRange::new(Version::new(5, 16, 0), Version::new(5, 17, 25))?,
//! )?;
//! let report = engine
//!     .run(&job, &mut NullReporter, Arc::new(AtomicBool::new(false)))
//!     .await?;
//! println!("found: {:?}", report.found);
//! # Ok(())
//! # }
//! ```

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, info, instrument, warn};

use super::collator::ResultCollator;
use super::job::SearchJob;
use super::progress::{ProgressReporter, ProgressState};
use super::template::TemplateError;
use crate::config::SearchSettings;
use crate::probe::{ErrorKind, ProbeOutcome, Prober};
use crate::version::Version;

/// Minimum allowed worker count.
const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
pub const MAX_WORKERS: usize = 100;

/// Default worker count for concurrent mode.
pub const DEFAULT_WORKERS: usize = 5;

/// How often a blocked producer re-checks the interrupt flag.
const INTERRUPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Error type for search engine operations.
///
/// Per-candidate failures never show up here; they are
/// [`ProbeOutcome::Error`] values counted in the report.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Invalid worker count for concurrent mode.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkerCount {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Scheduling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SearchMode {
    /// One probe at a time, in candidate order.
    Sequential,
    /// Bounded pool of concurrent probes, completion-order delivery.
    Concurrent {
        /// Maximum probes in flight.
        workers: usize,
    },
}

impl Default for SearchMode {
    fn default() -> Self {
        Self::Concurrent {
            workers: DEFAULT_WORKERS,
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Concurrent { workers } => write!(f, "concurrent ({workers} workers)"),
        }
    }
}

/// Scheduler lifecycle, logged at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchPhase {
    Enumerating,
    Sequential,
    Concurrent,
    Draining,
    Done,
}

impl SearchPhase {
    fn enter(self) {
        debug!(phase = ?self, "search phase");
    }
}

/// Result of one search run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchReport {
    /// Found filenames ordered by embedded version.
    pub found: Vec<String>,
    /// Final counters.
    pub progress: ProgressState,
    /// The run stopped early because the interrupt flag was raised.
    pub interrupted: bool,
}

impl SearchReport {
    fn empty(total_checks: u64) -> Self {
        Self {
            found: Vec::new(),
            progress: ProgressState::new(total_checks),
            interrupted: false,
        }
    }

    /// Whether nothing was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }
}

/// Search engine with a shared prober and a scheduling mode.
///
/// # Concurrency Model
///
/// - Each concurrent probe runs in its own Tokio task
/// - A semaphore permit is acquired before starting each probe
/// - Permits are released automatically when probes complete (RAII)
/// - Outcomes travel over a bounded channel to a single consumer, which is
///   the only writer of progress counters and results
pub struct SearchEngine {
    prober: Arc<dyn Prober>,
    mode: SearchMode,
}

impl fmt::Debug for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchEngine")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl SearchEngine {
    /// Creates an engine.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidWorkerCount`] if a concurrent mode asks
    /// for a worker count outside 1..=100.
    pub fn new(prober: Arc<dyn Prober>, mode: SearchMode) -> Result<Self, SearchError> {
        if let SearchMode::Concurrent { workers } = mode {
            if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
                return Err(SearchError::InvalidWorkerCount { value: workers });
            }
        }
        debug!(%mode, "creating search engine");
        Ok(Self { prober, mode })
    }

    /// Creates an engine using the mode implied by `settings`.
    ///
    /// # Errors
    ///
    /// Same as [`SearchEngine::new`].
    pub fn from_settings(
        prober: Arc<dyn Prober>,
        settings: &SearchSettings,
    ) -> Result<Self, SearchError> {
        Self::new(prober, settings.mode())
    }

    /// Returns the scheduling mode.
    #[must_use]
    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    /// Probes every candidate of `job` and returns the sorted report.
    ///
    /// `reporter` sees every outcome exactly once, in delivery order.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::SemaphoreClosed`] if the worker pool breaks.
    /// Probe failures and interruption are reported in the
    /// [`SearchReport`], not as errors.
    #[instrument(
        skip(self, job, reporter, interrupted),
        fields(base_url = %job.base_url(), template = %job.template(), range = %job.range(), mode = %self.mode)
    )]
    pub async fn run<R>(
        &self,
        job: &SearchJob,
        reporter: &mut R,
        interrupted: Arc<AtomicBool>,
    ) -> Result<SearchReport, SearchError>
    where
        R: ProgressReporter + ?Sized,
    {
        SearchPhase::Enumerating.enter();
        let total = job.total();
        if total == 0 {
            info!("no candidates in range");
            SearchPhase::Done.enter();
            return Ok(SearchReport::empty(0));
        }

        info!(total, "starting search");
        let mut delivery = Delivery::new(total, reporter);
        delivery.reporter.on_start(&delivery.progress);

        let stopped_early = match self.mode {
            SearchMode::Sequential => {
                SearchPhase::Sequential.enter();
                self.run_sequential(job, &mut delivery, &interrupted).await
            }
            SearchMode::Concurrent { workers } => {
                SearchPhase::Concurrent.enter();
                self.run_concurrent(job, workers, &mut delivery, &interrupted)
                    .await?
            }
        };

        let report = delivery.finish(stopped_early);
        SearchPhase::Done.enter();
        info!(
            checks_done = report.progress.checks_done,
            total_checks = report.progress.total_checks,
            found = report.progress.found_count,
            errors = report.progress.errors,
            interrupted = report.interrupted,
            "search complete"
        );
        Ok(report)
    }

    /// Probes a single URL through the same delivery path as a search.
    #[instrument(skip(self, reporter), fields(url = %url))]
    pub async fn check<R>(&self, url: &str, reporter: &mut R) -> SearchReport
    where
        R: ProgressReporter + ?Sized,
    {
        let mut delivery = Delivery::new(1, reporter);
        delivery.reporter.on_start(&delivery.progress);
        let outcome = guarded_probe(self.prober.as_ref(), url).await;
        delivery.deliver(url, outcome);
        delivery.finish(false)
    }

    /// Returns true if the walk stopped because of the interrupt flag.
    async fn run_sequential<R>(
        &self,
        job: &SearchJob,
        delivery: &mut Delivery<'_, R>,
        interrupted: &AtomicBool,
    ) -> bool
    where
        R: ProgressReporter + ?Sized,
    {
        for (version, candidate) in job.candidates() {
            if interrupted.load(Ordering::SeqCst) {
                debug!(%version, "interrupted, not starting further probes");
                return true;
            }
            match candidate {
                Ok(candidate) => {
                    let outcome = guarded_probe(self.prober.as_ref(), &candidate.url).await;
                    delivery.deliver(&candidate.url, outcome);
                }
                Err(error) => {
                    let (url, outcome) = invalid_candidate_outcome(version, &error);
                    delivery.deliver(&url, outcome);
                }
            }
        }
        false
    }

    /// Returns true if production stopped because of the interrupt flag.
    async fn run_concurrent<R>(
        &self,
        job: &SearchJob,
        workers: usize,
        delivery: &mut Delivery<'_, R>,
        interrupted: &AtomicBool,
    ) -> Result<bool, SearchError>
    where
        R: ProgressReporter + ?Sized,
    {
        let semaphore = Arc::new(Semaphore::new(workers));
        let (tx, mut rx) = mpsc::channel::<(String, ProbeOutcome)>(workers);

        let producer = async move {
            let mut stopped_early = false;
            for (version, candidate) in job.candidates() {
                if interrupted.load(Ordering::SeqCst) {
                    stopped_early = true;
                    break;
                }

                let candidate = match candidate {
                    Ok(candidate) => candidate,
                    Err(error) => {
                        let item = invalid_candidate_outcome(version, &error);
                        if tx.send(item).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };

                // Race permit acquisition against the interrupt flag so a full
                // pool does not delay shutdown.
                let permit = tokio::select! {
                    biased;
                    () = wait_for_interrupt(interrupted) => None,
                    result = Arc::clone(&semaphore).acquire_owned() => {
                        Some(result.map_err(|_| SearchError::SemaphoreClosed)?)
                    }
                };
                let Some(permit) = permit else {
                    stopped_early = true;
                    break;
                };

                let prober = Arc::clone(&self.prober);
                let tx = tx.clone();
                tokio::spawn(async move {
                    // Permit is dropped when this block exits (RAII)
                    let _permit = permit;
                    let outcome = guarded_probe(prober.as_ref(), &candidate.url).await;
                    if tx.send((candidate.url, outcome)).await.is_err() {
                        debug!("outcome receiver closed");
                    }
                });
            }

            if stopped_early {
                debug!("interrupted, not starting further probes");
            }
            SearchPhase::Draining.enter();
            // Remaining senders belong to in-flight probes.
            drop(tx);
            Ok::<bool, SearchError>(stopped_early)
        };

        let consumer = async {
            while let Some((url, outcome)) = rx.recv().await {
                delivery.deliver(&url, outcome);
            }
        };

        let (produced, ()) = tokio::join!(producer, consumer);
        produced
    }
}

/// Single writer of progress and results for one run.
struct Delivery<'r, R: ?Sized> {
    progress: ProgressState,
    results: ResultCollator,
    reporter: &'r mut R,
}

impl<'r, R> Delivery<'r, R>
where
    R: ProgressReporter + ?Sized,
{
    fn new(total_checks: u64, reporter: &'r mut R) -> Self {
        Self {
            progress: ProgressState::new(total_checks),
            results: ResultCollator::new(),
            reporter,
        }
    }

    fn deliver(&mut self, url: &str, outcome: ProbeOutcome) {
        self.progress.record(&outcome);
        match &outcome {
            ProbeOutcome::Found { filename } => {
                info!(url, filename = %filename, "found");
                self.results.add(filename.as_str());
            }
            ProbeOutcome::NotFound { status } => debug!(url, status, "not found"),
            ProbeOutcome::Error { kind, detail } => {
                debug!(url, kind = %kind, detail = %detail, "probe error");
            }
        }
        self.reporter.on_outcome(url, &outcome, &self.progress);
    }

    fn finish(self, interrupted: bool) -> SearchReport {
        self.reporter.on_finish(&self.progress, interrupted);
        SearchReport {
            found: self.results.finalize(),
            progress: self.progress,
            interrupted,
        }
    }
}

/// Runs one probe, turning a panic into an [`ErrorKind::Internal`] outcome.
async fn guarded_probe(prober: &dyn Prober, url: &str) -> ProbeOutcome {
    match AssertUnwindSafe(prober.probe(url)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            let detail = panic_message(payload.as_ref());
            warn!(url, detail = %detail, "prober panicked");
            ProbeOutcome::error(ErrorKind::Internal, detail)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "prober panicked".to_string()
    }
}

/// Outcome for a candidate whose URL could not be built.
fn invalid_candidate_outcome(version: Version, error: &TemplateError) -> (String, ProbeOutcome) {
    let url = match error {
        TemplateError::InvalidCandidate { url } => url.clone(),
        _ => version.to_string(),
    };
    warn!(%version, error = %error, "skipping candidate");
    (
        url,
        ProbeOutcome::error(ErrorKind::InvalidCandidate, error.to_string()),
    )
}

async fn wait_for_interrupt(interrupted: &AtomicBool) {
    while !interrupted.load(Ordering::SeqCst) {
        tokio::time::sleep(INTERRUPT_POLL_INTERVAL).await;
    }
}
