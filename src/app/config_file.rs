//! Config file loading for search defaults.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use fwprobe_core::SearchSettings;
use tracing::debug;

/// File configuration; every key is optional and overrides the default.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FileConfig {
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Use the concurrent worker pool.
    pub concurrent: Option<bool>,
    /// Worker pool size.
    pub workers: Option<usize>,
    /// Throttle delays in seconds.
    pub delays: Option<Vec<f64>>,
    /// Probability of a throttle pause.
    pub delay_probability: Option<f64>,
    /// One output line per outcome.
    pub verbose: Option<bool>,
    /// User-Agent header for probes.
    pub user_agent: Option<String>,
}

impl FileConfig {
    /// Overwrites the fields of `settings` that this file sets.
    pub(crate) fn apply_to(&self, settings: &mut SearchSettings) {
        if let Some(timeout_secs) = self.timeout_secs {
            settings.timeout_secs = timeout_secs;
        }
        if let Some(concurrent) = self.concurrent {
            settings.concurrent = concurrent;
        }
        if let Some(workers) = self.workers {
            settings.workers = workers;
        }
        if let Some(delays) = &self.delays {
            settings.delays.clone_from(delays);
        }
        if let Some(delay_probability) = self.delay_probability {
            settings.delay_probability = delay_probability;
        }
        if let Some(verbose) = self.verbose {
            settings.verbose = verbose;
        }
        if let Some(user_agent) = &self.user_agent {
            settings.user_agent.clone_from(user_agent);
        }
    }

    /// Validates the values against the same rules as the command line.
    pub(crate) fn validate(&self) -> Result<()> {
        let mut settings = SearchSettings::default();
        self.apply_to(&mut settings);
        settings.validate().context("Invalid config value")
    }
}

/// Loaded config metadata.
#[derive(Debug, Clone, Default)]
pub(crate) struct LoadedConfig {
    /// Path that was (or would have been) read.
    pub path: Option<PathBuf>,
    /// Parsed config when a file was found.
    pub config: Option<FileConfig>,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/fwprobe/config.toml`
/// 2. `$HOME/.config/fwprobe/config.toml`
pub(crate) fn resolve_default_config_path() -> Option<PathBuf> {
    config_path_from(env_var_non_empty_os("XDG_CONFIG_HOME"), env_var_non_empty_os("HOME"))
}

fn config_path_from(xdg_config_home: Option<OsString>, home: Option<OsString>) -> Option<PathBuf> {
    if let Some(xdg_config_home) = xdg_config_home {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("fwprobe")
                .join("config.toml"),
        );
    }

    let home = home?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("fwprobe")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads `explicit` (which must exist) or the default path (if present).
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
        });
    }

    let path = resolve_default_config_path();
    let Some(path_ref) = path.as_deref() else {
        return Ok(LoadedConfig { path, config: None });
    };
    if !path_ref.exists() {
        debug!(path = %path_ref.display(), "no config file");
        return Ok(LoadedConfig { path, config: None });
    }

    let config = load_file_config(path_ref)?;
    Ok(LoadedConfig {
        path,
        config: Some(config),
    })
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    let config = parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
    debug!(path = %path.display(), ?config, "loaded config file");
    Ok(config)
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        let line_no = line_index + 1;

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!("Invalid config syntax on line {line_no}: expected key = value");
        };

        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "timeout_secs" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `timeout_secs` value on line {line_no}"))?;
                cfg.timeout_secs = Some(parsed);
            }
            "concurrent" => {
                let parsed = parse_boolean(value)
                    .with_context(|| format!("Invalid `concurrent` value on line {line_no}"))?;
                cfg.concurrent = Some(parsed);
            }
            "workers" => {
                let parsed = parse_integer_u64(value)
                    .with_context(|| format!("Invalid `workers` value on line {line_no}"))?;
                let n = usize::try_from(parsed)
                    .map_err(|_| anyhow::anyhow!("workers out of range for usize"))?;
                cfg.workers = Some(n);
            }
            "delays" => {
                let parsed = parse_float_list(value)
                    .with_context(|| format!("Invalid `delays` value on line {line_no}"))?;
                cfg.delays = Some(parsed);
            }
            "delay_probability" => {
                let parsed = parse_float(value).with_context(|| {
                    format!("Invalid `delay_probability` value on line {line_no}")
                })?;
                cfg.delay_probability = Some(parsed);
            }
            "verbose" => {
                let parsed = parse_boolean(value)
                    .with_context(|| format!("Invalid `verbose` value on line {line_no}"))?;
                cfg.verbose = Some(parsed);
            }
            "user_agent" => {
                let parsed = parse_string_literal(value)
                    .with_context(|| format!("Invalid `user_agent` value on line {line_no}"))?;
                cfg.user_agent = Some(parsed);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_no}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_float(raw_value: &str) -> Result<f64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected number");
    }
    let value = token.parse::<f64>()?;
    if !value.is_finite() {
        bail!("Expected a finite number");
    }
    Ok(value)
}

fn parse_float_list(raw_value: &str) -> Result<Vec<f64>> {
    let inner = raw_value
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| anyhow::anyhow!("Expected a list like [0.5, 1.0]"))?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_float)
        .collect()
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_parse_config_all_fields() {
        let raw = r#"
# fwprobe defaults
timeout_secs = 5
concurrent = false
workers = 8          # ignored while concurrent = false
delays = [0.25, 0.5]
delay_probability = 0.3
verbose = true
user_agent = "probe#1"
"#;
        let cfg = parse_config_str(raw).unwrap();
        assert_eq!(cfg.timeout_secs, Some(5));
        assert_eq!(cfg.concurrent, Some(false));
        assert_eq!(cfg.workers, Some(8));
        assert_eq!(cfg.delays, Some(vec![0.25, 0.5]));
        assert_eq!(cfg.delay_probability, Some(0.3));
        assert_eq!(cfg.verbose, Some(true));
        assert_eq!(cfg.user_agent.as_deref(), Some("probe#1"));
    }

    #[test]
    fn test_parse_config_partial_fields_keep_defaults() {
        let cfg = parse_config_str("workers = 3\n").unwrap();
        let mut settings = SearchSettings::default();
        cfg.apply_to(&mut settings);
        assert_eq!(settings.workers, 3);
        assert_eq!(settings, SearchSettings {
            workers: 3,
            ..SearchSettings::default()
        });
    }

    #[test]
    fn test_parse_config_empty_delay_list() {
        let cfg = parse_config_str("delays = []").unwrap();
        assert_eq!(cfg.delays, Some(Vec::new()));
    }

    #[test]
    fn test_parse_config_unknown_key_rejected() {
        let err = parse_config_str("threads = 4").unwrap_err();
        assert!(err.to_string().contains("Unknown configuration key"));
    }

    #[test]
    fn test_parse_config_missing_equals_rejected() {
        let err = parse_config_str("workers 4").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_config_out_of_range_values_rejected() {
        for raw in [
            "workers = 0",
            "workers = 101",
            "timeout_secs = 0",
            "delay_probability = 1.5",
            "delays = [0.5, -1]",
        ] {
            assert!(parse_config_str(raw).is_err(), "accepted: {raw}");
        }
    }

    #[test]
    fn test_parse_config_bad_types_rejected() {
        for raw in [
            "concurrent = yes",
            "user_agent = unquoted",
            "delays = 0.5",
            "timeout_secs = -3",
        ] {
            assert!(parse_config_str(raw).is_err(), "accepted: {raw}");
        }
    }

    #[test]
    fn test_config_path_prefers_xdg() {
        let path = config_path_from(
            Some(OsString::from("/xdg")),
            Some(OsString::from("/home/u")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/xdg/fwprobe/config.toml"));

        let path = config_path_from(None, Some(OsString::from("/home/u"))).unwrap();
        assert_eq!(path, PathBuf::from("/home/u/.config/fwprobe/config.toml"));

        assert!(config_path_from(None, None).is_none());
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = 3").unwrap();
        let loaded = load_config(Some(file.path())).unwrap();
        assert_eq!(loaded.config.unwrap().timeout_secs, Some(3));
    }

    #[test]
    fn test_load_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(Some(&missing)).is_err());
    }
}
