//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use fwprobe_core::{FilenameTemplate, Version};

/// Find published firmware files by probing version-tagged URLs.
///
/// fwprobe enumerates candidate versions between two bounds, sends a HEAD
/// request for each candidate filename and lists the ones that exist,
/// sorted by version.
#[derive(Parser, Debug)]
#[command(name = "fwprobe")]
#[command(author, version, about)]
pub struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Config file (default: $XDG_CONFIG_HOME/fwprobe/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the built-in models
    Models,

    /// Search firmware versions of a built-in model
    Search(SearchArgs),

    /// Search an arbitrary base URL with a filename template
    Scan(ScanArgs),

    /// Probe a single URL
    Check(CheckArgs),

    /// Print the template inferred from an example filename
    Pattern {
        /// Example filename, e.g. update_kindle_11th_5.16.8.bin
        example: String,
    },
}

/// Arguments of `search`.
#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    /// Model key (see `fwprobe models`), case-insensitive
    pub model: String,

    /// First version to check (default: model's range start)
    #[arg(long, value_name = "VERSION")]
    pub start: Option<Version>,

    /// Last version to check (default: model's range end)
    #[arg(long, value_name = "VERSION")]
    pub end: Option<Version>,

    /// Filename template with one '*' (default: inferred from the model)
    #[arg(long, value_name = "TEMPLATE")]
    pub pattern: Option<FilenameTemplate>,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Arguments of `scan`.
#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// Base URL the filenames are appended to
    pub base_url: String,

    /// Filename template with one '*'
    pub pattern: FilenameTemplate,

    /// First version to check
    #[arg(long, value_name = "VERSION")]
    pub start: Version,

    /// Last version to check
    #[arg(long, value_name = "VERSION")]
    pub end: Version,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Arguments of `check`.
#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Fully-qualified URL to probe
    pub url: String,

    #[command(flatten)]
    pub probe: ProbeArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Scheduling, probing and output flags shared by `search` and `scan`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Probe one candidate at a time
    #[arg(long)]
    pub sequential: bool,

    /// Maximum concurrent probes (1-100)
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub workers: Option<u8>,

    #[command(flatten)]
    pub probe: ProbeArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Per-request flags.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ProbeArgs {
    /// Request timeout in seconds (1-3600)
    #[arg(short = 't', long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    /// Throttle delays in seconds, comma-separated
    #[arg(long, value_name = "SECS", value_delimiter = ',', num_args = 1..)]
    pub delays: Option<Vec<f64>>,

    /// Probability (0-1) of pausing after a probe
    #[arg(long, value_name = "P")]
    pub delay_probability: Option<f64>,

    /// Never pause between probes
    #[arg(long, conflicts_with_all = ["delays", "delay_probability"])]
    pub no_delay: bool,

    /// User-Agent header sent with probes
    #[arg(long, value_name = "STRING")]
    pub user_agent: Option<String>,
}

/// Output flags.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Print every outcome on its own line instead of a progress line
    #[arg(long)]
    pub each: bool,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn search_args(args: Args) -> SearchArgs {
        match args.command {
            Command::Search(search) => search,
            other => panic!("expected search, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_models_parses() {
        let args = Args::try_parse_from(["fwprobe", "models"]).unwrap();
        assert!(matches!(args.command, Command::Models));
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_cli_missing_subcommand_is_error() {
        let result = Args::try_parse_from(["fwprobe"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verbose_flag_is_global() {
        let args = Args::try_parse_from(["fwprobe", "models", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);

        let args = Args::try_parse_from(["fwprobe", "-v", "models"]).unwrap();
        assert_eq!(args.verbose, 1);
    }

    #[test]
    fn test_cli_quiet_conflicts_with_verbose() {
        let result = Args::try_parse_from(["fwprobe", "-q", "-v", "models"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["fwprobe", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["fwprobe", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_search_defaults() {
        let search = search_args(Args::try_parse_from(["fwprobe", "search", "pw5"]).unwrap());
        assert_eq!(search.model, "pw5");
        assert!(search.start.is_none());
        assert!(search.end.is_none());
        assert!(search.pattern.is_none());
        assert!(!search.run.sequential);
        assert!(search.run.workers.is_none());
        assert!(!search.run.output.each);
    }

    #[test]
    fn test_cli_search_all_flags() {
        let search = search_args(
            Args::try_parse_from([
                "fwprobe",
                "search",
                "K11",
                "--start",
                "5.16",
                "--end",
                "5.17.3",
                "--pattern",
                "update_kindle_11th_*.bin",
                "--sequential",
                "-t",
                "5",
                "--delays",
                "0.1,0.2",
                "--delay-probability",
                "0.5",
                "--each",
                "--json",
            ])
            .unwrap(),
        );
        assert_eq!(search.start, Some(Version::new(5, 16, 0)));
        assert_eq!(search.end, Some(Version::new(5, 17, 3)));
        assert_eq!(
            search.pattern.unwrap().to_string(),
            "update_kindle_11th_*.bin"
        );
        assert!(search.run.sequential);
        assert_eq!(search.run.probe.timeout, Some(5));
        assert_eq!(search.run.probe.delays, Some(vec![0.1, 0.2]));
        assert_eq!(search.run.probe.delay_probability, Some(0.5));
        assert!(search.run.output.each);
        assert!(search.run.output.json);
    }

    #[test]
    fn test_cli_workers_bounds() {
        let search =
            search_args(Args::try_parse_from(["fwprobe", "search", "PW5", "-w", "100"]).unwrap());
        assert_eq!(search.run.workers, Some(100));

        for bad in ["0", "101"] {
            let err = Args::try_parse_from(["fwprobe", "search", "PW5", "-w", bad]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_invalid_version_rejected() {
        let err =
            Args::try_parse_from(["fwprobe", "search", "PW5", "--start", "5.x"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_pattern_without_wildcard_rejected() {
        let err = Args::try_parse_from([
            "fwprobe",
            "scan",
            "https://example.com/",
            "update.bin",
            "--start",
            "1.0.0",
            "--end",
            "1.0.1",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_scan_requires_bounds() {
        let err = Args::try_parse_from(["fwprobe", "scan", "https://example.com/", "fw_*.bin"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_no_delay_conflicts_with_delays() {
        let err = Args::try_parse_from([
            "fwprobe",
            "check",
            "https://example.com/a.bin",
            "--no-delay",
            "--delays",
            "1",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cli_check_and_pattern() {
        let args =
            Args::try_parse_from(["fwprobe", "check", "https://example.com/a.bin", "--json"])
                .unwrap();
        match args.command {
            Command::Check(check) => {
                assert_eq!(check.url, "https://example.com/a.bin");
                assert!(check.output.json);
            }
            other => panic!("expected check, got {other:?}"),
        }

        let args = Args::try_parse_from(["fwprobe", "pattern", "update_kindle_5.6.1.1.bin"]).unwrap();
        assert!(matches!(args.command, Command::Pattern { .. }));
    }
}
