//! CLI entry point for the fwprobe tool.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

mod app;
mod cli;

use cli::Args;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every requested check ran.
    Success,
    /// Ctrl+C stopped the search early; partial results were printed.
    Interrupted,
}

impl ProcessExit {
    fn code(self) -> ExitCode {
        match self {
            Self::Success => ExitCode::SUCCESS,
            Self::Interrupted => ExitCode::from(130),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    let exit = app::runtime::run_fwprobe(args).await?;
    Ok(exit.code())
}
