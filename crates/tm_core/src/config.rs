//! Adapter configuration.
//!
//! The tournament runner configures the adapter through environment
//! variables that are read once when the adapter is attached. The same
//! settings can be loaded from a RON file for headless runs.
//!
//! | Variable               | Field               | Default  |
//! |------------------------|---------------------|----------|
//! | `TM_LOG_RESULTS`       | `results_path`      | none     |
//! | `TM_LOG_FRAMETIMES`    | `frametimes_path`   | none     |
//! | `TM_LOG_UNIT_EVENTS`   | `unit_events_path`  | none     |
//! | `TM_ALLOW_USER_INPUT`  | `allow_user_input`  | `false`  |
//! | `TM_SPEED_OVERRIDE`    | `speed_override`    | `0`      |
//! | `TM_TIME_OUT_AT_FRAME` | `time_out_at_frame` | `0` (off)|
//!
//! A missing path is not an error: the matching stream is simply never
//! written.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TelemetryError};

/// Environment variable holding the outcome summary path.
pub const ENV_RESULTS: &str = "TM_LOG_RESULTS";
/// Environment variable holding the frame time CSV path.
pub const ENV_FRAMETIMES: &str = "TM_LOG_FRAMETIMES";
/// Environment variable holding the unit event CSV path.
pub const ENV_UNIT_EVENTS: &str = "TM_LOG_UNIT_EVENTS";
/// Environment variable enabling user input (`"1"` only).
pub const ENV_ALLOW_USER_INPUT: &str = "TM_ALLOW_USER_INPUT";
/// Environment variable holding the local speed applied at match start.
pub const ENV_SPEED_OVERRIDE: &str = "TM_SPEED_OVERRIDE";
/// Environment variable holding the frame at which the match times out.
pub const ENV_TIME_OUT_AT_FRAME: &str = "TM_TIME_OUT_AT_FRAME";

/// Settings fixed for the lifetime of the adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Where the outcome summary is written at teardown.
    pub results_path: Option<PathBuf>,
    /// Where the per-window frame time CSV is written.
    pub frametimes_path: Option<PathBuf>,
    /// Where the unit event CSV is written.
    pub unit_events_path: Option<PathBuf>,
    /// Whether the bot may enable local user input.
    pub allow_user_input: bool,
    /// Local speed requested from the host at match start.
    pub speed_override: i32,
    /// Frame at which the match is forcibly ended; 0 disables the limit.
    pub time_out_at_frame: u64,
}

impl TelemetryConfig {
    /// Read the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from)
        };
        let int = |key: &str| lookup(key).map_or(0, |value| parse_int(key, &value));

        let time_out_at_frame = u64::try_from(int(ENV_TIME_OUT_AT_FRAME)).unwrap_or(0);

        let config = Self {
            results_path: path(ENV_RESULTS),
            frametimes_path: path(ENV_FRAMETIMES),
            unit_events_path: path(ENV_UNIT_EVENTS),
            allow_user_input: lookup(ENV_ALLOW_USER_INPUT).as_deref() == Some("1"),
            speed_override: i32::try_from(int(ENV_SPEED_OVERRIDE)).unwrap_or(0),
            time_out_at_frame,
        };
        tracing::debug!(?config, "Loaded telemetry config");
        config
    }

    /// Load a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| TelemetryError::io(path, e))?;
        Self::from_ron_str(&contents).map_err(|e| match e {
            TelemetryError::ConfigParse { message, .. } => TelemetryError::ConfigParse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Parse a configuration from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        ron::from_str(ron).map_err(|e| TelemetryError::ConfigParse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Point all three outputs into `dir` using the standard file names.
    #[must_use]
    pub fn with_output_dir(mut self, dir: &Path) -> Self {
        self.results_path = Some(dir.join("results.json"));
        self.frametimes_path = Some(dir.join("frametimes.csv"));
        self.unit_events_path = Some(dir.join("unit_events.csv"));
        self
    }

    /// Whether the forced time limit is active.
    #[must_use]
    pub const fn has_time_limit(&self) -> bool {
        self.time_out_at_frame > 0
    }
}

/// Parse an integer the way C's `atoi` does: skip leading whitespace, take
/// an optional sign and as many digits as follow. No digits yields 0.
fn parse_int(key: &str, value: &str) -> i64 {
    let trimmed = value.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: &str = {
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        if !value.trim().is_empty() {
            tracing::warn!(key, value, "Ignoring non-numeric config value");
        }
        return 0;
    }
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = TelemetryConfig::from_lookup(|_| None);
        assert_eq!(config, TelemetryConfig::default());
        assert!(!config.has_time_limit());
    }

    #[test]
    fn test_full_environment() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            (ENV_RESULTS, "out/results.json"),
            (ENV_FRAMETIMES, "out/frametimes.csv"),
            (ENV_UNIT_EVENTS, "out/unit_events.csv"),
            (ENV_ALLOW_USER_INPUT, "1"),
            (ENV_SPEED_OVERRIDE, "42"),
            (ENV_TIME_OUT_AT_FRAME, "86400"),
        ]));
        assert_eq!(
            config.results_path.as_deref(),
            Some(Path::new("out/results.json"))
        );
        assert!(config.allow_user_input);
        assert_eq!(config.speed_override, 42);
        assert_eq!(config.time_out_at_frame, 86400);
        assert!(config.has_time_limit());
    }

    #[test]
    fn test_user_input_requires_exact_one() {
        for value in ["true", "yes", "01", " 1", ""] {
            let config = TelemetryConfig::from_lookup(lookup(&[(ENV_ALLOW_USER_INPUT, value)]));
            assert!(!config.allow_user_input, "{value:?} should not enable input");
        }
    }

    #[test]
    fn test_empty_path_is_absent() {
        let config = TelemetryConfig::from_lookup(lookup(&[(ENV_RESULTS, "  ")]));
        assert_eq!(config.results_path, None);
    }

    #[test]
    fn test_atoi_parsing() {
        assert_eq!(parse_int("k", "  17abc"), 17);
        assert_eq!(parse_int("k", "-3"), -3);
        assert_eq!(parse_int("k", "+8"), 8);
        assert_eq!(parse_int("k", "abc"), 0);
        assert_eq!(parse_int("k", ""), 0);
    }

    #[test]
    fn test_negative_time_limit_disables() {
        let config = TelemetryConfig::from_lookup(lookup(&[(ENV_TIME_OUT_AT_FRAME, "-100")]));
        assert_eq!(config.time_out_at_frame, 0);
    }

    #[test]
    fn test_parse_from_ron() {
        let ron = r#"
            TelemetryConfig(
                results_path: Some("results.json"),
                time_out_at_frame: 500,
            )
        "#;
        let config = TelemetryConfig::from_ron_str(ron).unwrap();
        assert_eq!(config.results_path, Some(PathBuf::from("results.json")));
        assert_eq!(config.time_out_at_frame, 500);
        assert_eq!(config.frametimes_path, None);
    }

    #[test]
    fn test_bad_ron_is_parse_error() {
        let err = TelemetryConfig::from_ron_str("TelemetryConfig(").unwrap_err();
        assert!(matches!(err, TelemetryError::ConfigParse { .. }));
    }

    #[test]
    fn test_with_output_dir() {
        let config = TelemetryConfig::default().with_output_dir(Path::new("/tmp/match"));
        assert_eq!(
            config.frametimes_path,
            Some(PathBuf::from("/tmp/match/frametimes.csv"))
        );
    }
}
