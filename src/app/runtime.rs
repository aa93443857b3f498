//! Command execution for the fwprobe binary.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use fwprobe_core::probe::HttpProber;
use fwprobe_core::registry::{ModelRegistry, Target};
use fwprobe_core::search::{ConsoleReporter, NullReporter, ProgressReporter};
use fwprobe_core::{
    FilenameTemplate, SearchEngine, SearchJob, SearchReport, SearchSettings, Version, VersionRange,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::{config_file, terminal};
use crate::cli::{Args, CheckArgs, Command, OutputArgs, ProbeArgs, RunArgs, ScanArgs, SearchArgs};

const RULE_WIDTH: usize = 30;
/// Exit status for a second Ctrl+C, matching `ProcessExit::Interrupted`.
const INTERRUPTED_EXIT_CODE: i32 = 130;

pub(crate) async fn run_fwprobe(args: Args) -> Result<ProcessExit> {
    let default_level = terminal::default_log_level(args.quiet, args.verbose);
    let no_color = terminal::no_color_env_requested() || terminal::is_dumb_terminal();
    terminal::init_tracing(default_level, no_color);
    debug!(?args, "CLI arguments parsed");

    match args.command {
        Command::Models => {
            write_models(&mut io::stdout().lock(), &ModelRegistry::builtin())?;
            Ok(ProcessExit::Success)
        }
        Command::Pattern { example } => {
            let (template, method) = FilenameTemplate::infer_with_method(&example);
            info!(?method, "template inferred");
            println!("{template}");
            Ok(ProcessExit::Success)
        }
        Command::Search(search) => {
            let file = load_file_config(args.config.as_deref())?;
            run_model_search(search, file.as_ref()).await
        }
        Command::Scan(scan) => {
            let file = load_file_config(args.config.as_deref())?;
            run_scan(scan, file.as_ref()).await
        }
        Command::Check(check) => {
            let file = load_file_config(args.config.as_deref())?;
            run_check(check, file.as_ref()).await
        }
    }
}

fn load_file_config(explicit: Option<&Path>) -> Result<Option<config_file::FileConfig>> {
    let loaded = config_file::load_config(explicit)?;
    if let (Some(path), Some(_)) = (&loaded.path, &loaded.config) {
        info!(path = %path.display(), "using config file");
    }
    Ok(loaded.config)
}

/// Defaults, then the config file, then command-line flags.
fn resolve_settings(
    file: Option<&config_file::FileConfig>,
    probe: &ProbeArgs,
    run: Option<&RunArgs>,
    output: &OutputArgs,
) -> Result<SearchSettings> {
    let mut settings = SearchSettings::default();
    if let Some(file) = file {
        file.apply_to(&mut settings);
    }

    if let Some(timeout) = probe.timeout {
        settings.timeout_secs = timeout;
    }
    if let Some(delays) = &probe.delays {
        settings.delays.clone_from(delays);
    }
    if let Some(probability) = probe.delay_probability {
        settings.delay_probability = probability;
    }
    if probe.no_delay {
        settings.delays.clear();
        settings.delay_probability = 0.0;
    }
    if let Some(user_agent) = &probe.user_agent {
        settings.user_agent.clone_from(user_agent);
    }
    if let Some(run) = run {
        if run.sequential {
            settings.concurrent = false;
        }
        if let Some(workers) = run.workers {
            settings.workers = usize::from(workers);
        }
    }
    if output.each {
        settings.verbose = true;
    }

    settings.validate().context("Invalid search settings")?;
    Ok(settings)
}

async fn run_model_search(
    args: SearchArgs,
    file: Option<&config_file::FileConfig>,
) -> Result<ProcessExit> {
    let registry = ModelRegistry::builtin();
    let model = registry.get(&args.model).ok_or_else(|| {
        let known: Vec<&str> = registry.keys().collect();
        anyhow!(
            "Unknown model '{}'. Known models: {}",
            args.model,
            known.join(", ")
        )
    })?;
    let settings = resolve_settings(file, &args.run.probe, Some(&args.run), &args.run.output)?;

    match model.target() {
        Target::Static { .. } => {
            let url = model
                .static_url()?
                .ok_or_else(|| anyhow!("Model '{}' has no static filename", model.key()))?;
            if !args.run.output.json {
                println!("Searching static firmware for {}", model.key());
                println!("Checking: {url}");
            }
            check_url(&url, &settings, &args.run.output).await
        }
        Target::Dynamic { .. } => {
            let default_range = model.default_range();
            let range = resolve_range(
                args.start.or(default_range.map(|r| r.start())),
                args.end.or(default_range.map(|r| r.end())),
            )?;
            let job = model
                .search_job(Some(range), args.pattern)?
                .ok_or_else(|| anyhow!("Model '{}' cannot be searched", model.key()))?;
            if !args.run.output.json {
                println!("Searching firmware for {} ({})", model.key(), model.description());
            }
            execute_search(&job, &settings, &args.run.output).await
        }
    }
}

async fn run_scan(args: ScanArgs, file: Option<&config_file::FileConfig>) -> Result<ProcessExit> {
    let settings = resolve_settings(file, &args.run.probe, Some(&args.run), &args.run.output)?;
    let range = resolve_range(Some(args.start), Some(args.end))?;
    let job = SearchJob::new(&args.base_url, args.pattern, range)?;
    execute_search(&job, &settings, &args.run.output).await
}

async fn run_check(args: CheckArgs, file: Option<&config_file::FileConfig>) -> Result<ProcessExit> {
    let settings = resolve_settings(file, &args.probe, None, &args.output)?;
    check_url(&args.url, &settings, &args.output).await
}

fn resolve_range(start: Option<Version>, end: Option<Version>) -> Result<VersionRange> {
    let start = start.context("Missing start version")?;
    let end = end.context("Missing end version")?;
    VersionRange::new(start, end).context("Start version is greater than end version")
}

/// What a Ctrl+C does, by how many have been received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalAction {
    /// Stop starting new checks and let in-flight ones finish.
    Drain,
    /// Give up on the drain and leave immediately.
    Exit,
}

fn signal_action(received: u32) -> SignalAction {
    if received <= 1 {
        SignalAction::Drain
    } else {
        SignalAction::Exit
    }
}

/// Raises the returned flag on the first Ctrl+C; a second one exits with 130.
fn interrupt_flag() -> Arc<AtomicBool> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        let mut received = 0u32;
        while tokio::signal::ctrl_c().await.is_ok() {
            received = received.saturating_add(1);
            match signal_action(received) {
                SignalAction::Drain => {
                    interrupted_signal.store(true, Ordering::SeqCst);
                    warn!("interrupted, finishing in-flight checks; Ctrl+C again to quit");
                }
                SignalAction::Exit => {
                    warn!("second interrupt received, exiting without results");
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            }
        }
    });
    interrupted
}

fn engine_for(settings: &SearchSettings) -> Result<SearchEngine> {
    let prober = HttpProber::from_settings(settings).context("Failed to build HTTP client")?;
    Ok(SearchEngine::from_settings(Arc::new(prober), settings)?)
}

fn reporter_for(settings: &SearchSettings, output: &OutputArgs) -> Box<dyn ProgressReporter> {
    if output.json {
        Box::new(NullReporter)
    } else {
        Box::new(ConsoleReporter::new(
            terminal::TerminalSink::for_stdout(settings.verbose),
            settings.verbose,
        ))
    }
}

async fn execute_search(
    job: &SearchJob,
    settings: &SearchSettings,
    output: &OutputArgs,
) -> Result<ProcessExit> {
    let engine = engine_for(settings)?;
    if !output.json {
        write_summary(&mut io::stdout().lock(), job, settings)?;
    }
    if job.total() == 0 {
        println!("No versions to check in the specified range.");
        return Ok(ProcessExit::Success);
    }

    let interrupted = interrupt_flag();
    let mut reporter = reporter_for(settings, output);
    let started = Instant::now();
    let report = engine
        .run(job, reporter.as_mut(), interrupted)
        .await
        .context("Search failed")?;
    let elapsed = started.elapsed();

    let mut stdout = io::stdout().lock();
    if output.json {
        write_json(&mut stdout, job.base_url(), &report, elapsed)?;
    } else {
        write_report(&mut stdout, &report, elapsed)?;
    }
    Ok(exit_for(&report))
}

async fn check_url(url: &str, settings: &SearchSettings, output: &OutputArgs) -> Result<ProcessExit> {
    let engine = engine_for(settings)?;
    let mut reporter = reporter_for(settings, output);
    let started = Instant::now();
    let report = engine.check(url, reporter.as_mut()).await;
    let elapsed = started.elapsed();

    let mut stdout = io::stdout().lock();
    if output.json {
        write_json(&mut stdout, url, &report, elapsed)?;
    } else {
        if !settings.verbose && report.is_empty() {
            if report.progress.errors > 0 {
                writeln!(stdout, "Check failed: {url} (run with --each for details)")?;
            } else {
                writeln!(stdout, "Not found: {url}")?;
            }
        }
        writeln!(stdout, "{}", "-".repeat(RULE_WIDTH))?;
    }
    Ok(ProcessExit::Success)
}

fn exit_for(report: &SearchReport) -> ProcessExit {
    if report.interrupted {
        ProcessExit::Interrupted
    } else {
        ProcessExit::Success
    }
}

fn write_models(out: &mut impl Write, registry: &ModelRegistry) -> io::Result<()> {
    let width = registry.keys().map(str::len).max().unwrap_or(0);
    writeln!(out, "Available models:")?;
    for model in registry.iter() {
        let detail = match (model.target(), model.default_range()) {
            (Target::Static { filename }, _) => format!("static {filename}"),
            (Target::Dynamic { .. }, Some(range)) => format!("search {range}"),
            (Target::Dynamic { .. }, None) => "search".to_string(),
        };
        writeln!(
            out,
            "- {:<width$} : {} [{detail}]",
            model.key(),
            model.description()
        )?;
    }
    writeln!(out, "{}", "-".repeat(width + 20))
}

fn write_summary(
    out: &mut impl Write,
    job: &SearchJob,
    settings: &SearchSettings,
) -> io::Result<()> {
    writeln!(out, "Base URL: {}", job.base_url())?;
    writeln!(out, "Pattern: {}", job.template())?;
    writeln!(out, "Range: {} ({} versions)", job.range(), job.total())?;
    writeln!(out, "Mode: {}", settings.mode())?;
    writeln!(out, "Timeout: {}s", settings.timeout_secs)?;
    writeln!(
        out,
        "Delays: {:?}s with {:.0}% probability",
        settings.delays,
        settings.delay_probability * 100.0
    )?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))
}

fn write_report(out: &mut impl Write, report: &SearchReport, elapsed: Duration) -> io::Result<()> {
    if report.interrupted {
        writeln!(
            out,
            "Search interrupted after {}/{} checks; showing partial results.",
            report.progress.checks_done, report.progress.total_checks
        )?;
    }
    if report.progress.errors > 0 {
        writeln!(out, "{} checks failed with errors.", report.progress.errors)?;
    }
    if report.found.is_empty() {
        writeln!(
            out,
            "No matching firmware files found in the specified version range."
        )?;
    } else {
        writeln!(
            out,
            "The following {} firmware files were found (sorted):",
            report.found.len()
        )?;
        for file in &report.found {
            writeln!(out, "- {file}")?;
        }
    }
    writeln!(out, "Search took {:.2} seconds.", elapsed.as_secs_f64())?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))
}

#[derive(Serialize)]
struct JsonReport<'a> {
    target: &'a str,
    #[serde(flatten)]
    report: &'a SearchReport,
    elapsed_secs: f64,
}

fn write_json(
    out: &mut impl Write,
    target: &str,
    report: &SearchReport,
    elapsed: Duration,
) -> Result<()> {
    let json = serde_json::to_string_pretty(&JsonReport {
        target,
        report,
        elapsed_secs: elapsed.as_secs_f64(),
    })?;
    writeln!(out, "{json}")?;
    Ok(())
}
