//! Terminal detection, tracing setup and the console output sink.

use std::io::{self, IsTerminal};

use fwprobe_core::OutputSink;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

pub(crate) fn no_color_env_requested() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty())
}

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

/// Whether the overwritten progress line should be drawn.
pub(crate) fn should_draw_progress_line(
    stdout_is_terminal: bool,
    per_outcome_lines: bool,
    dumb_terminal: bool,
) -> bool {
    stdout_is_terminal && !per_outcome_lines && !dumb_terminal
}

/// Log level used when `RUST_LOG` is unset.
pub(crate) fn default_log_level(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

pub(crate) fn init_tracing(default_level: &str, no_color: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_env_filter(filter)
        .try_init();
}

/// Stdout sink: an indicatif line for progress, plain lines otherwise.
///
/// Without a progress bar (verbose output, pipes, dumb terminals) overwrite
/// requests are dropped and permanent lines go straight to stdout.
pub(crate) struct TerminalSink {
    bar: Option<ProgressBar>,
}

impl TerminalSink {
    pub(crate) fn new(draw_progress_line: bool) -> Self {
        let bar = draw_progress_line.then(|| {
            let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stdout());
            bar.set_style(
                ProgressStyle::with_template("{msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        });
        Self { bar }
    }

    /// Sink for the current process, based on terminal detection.
    pub(crate) fn for_stdout(per_outcome_lines: bool) -> Self {
        Self::new(should_draw_progress_line(
            io::stdout().is_terminal(),
            per_outcome_lines,
            is_dumb_terminal(),
        ))
    }
}

impl OutputSink for TerminalSink {
    fn emit_line(&mut self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{line}"),
        }
    }

    fn overwrite_line(&mut self, line: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(line.to_string());
        }
    }

    fn clear_line(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
