//! Batch match runner.
//!
//! Runs many scripts in parallel using rayon. Every match gets its own
//! output subdirectory named after its script, so the CSV streams and
//! outcome summaries of different matches never share a file.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tm_core::config::TelemetryConfig;
use tracing::{info, warn};

use crate::runner::{run_match, MatchReport};
use crate::script::{MatchScript, ScriptError};

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Script files to play
    pub scripts: Vec<PathBuf>,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Maximum parallel matches (0 = use rayon default)
    pub parallel_games: u32,
    /// Adapter settings shared by every match; output paths are replaced
    pub telemetry: TelemetryConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scripts: Vec::new(),
            output_dir: PathBuf::from("results"),
            parallel_games: 0,
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Create config for every `.ron` file in `dir`, in name order.
    pub fn from_dir(dir: &Path) -> Result<Self, ScriptError> {
        if !dir.is_dir() {
            return Err(ScriptError::FileNotFound(dir.display().to_string()));
        }
        let mut scripts = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "ron") {
                scripts.push(path);
            }
        }
        scripts.sort();
        Ok(Self {
            scripts,
            ..Default::default()
        })
    }

    /// Set output directory
    #[must_use]
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set adapter settings
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Set parallelism
    #[must_use]
    pub fn with_parallel(mut self, parallel_games: u32) -> Self {
        self.parallel_games = parallel_games;
        self
    }

    /// Output directory for the match played from `script`.
    #[must_use]
    pub fn match_dir(&self, index: usize, script: &Path) -> PathBuf {
        let stem = script
            .file_stem()
            .map_or_else(|| format!("match_{index}"), |s| s.to_string_lossy().into_owned());
        self.output_dir.join(stem)
    }
}

/// Aggregate counts over a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Matches played to completion
    pub total_matches: u32,
    /// Matches the observed player won
    pub wins: u32,
    /// Matches that ended without an end report
    pub crashes: u32,
    /// Matches stopped by the frame limit
    pub timeouts: u32,
    /// Frame time rows across all matches
    pub frametime_rows: u64,
    /// Unit event rows across all matches
    pub unit_event_rows: u64,
}

impl BatchSummary {
    /// Summarize match reports
    #[must_use]
    pub fn from_matches(matches: &[MatchReport]) -> Self {
        matches.iter().fold(Self::default(), |mut summary, report| {
            summary.total_matches += 1;
            summary.wins += u32::from(report.outcome.is_winner);
            summary.crashes += u32::from(report.outcome.is_crashed);
            summary.timeouts += u32::from(report.outcome.timed_out);
            summary.frametime_rows += report.frametime_rows;
            summary.unit_event_rows += report.unit_event_rows;
            summary
        })
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual match reports, in script order
    pub matches: Vec<MatchReport>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Script that failed
    pub script: PathBuf,
    /// Error message
    pub message: String,
}

fn run_single_match(config: &BatchConfig, index: usize, path: &Path) -> Result<MatchReport, String> {
    let script = MatchScript::load(path).map_err(|e| e.to_string())?;
    let dir = config.match_dir(index, path);
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("cannot create {}: {e}", dir.display()))?;
    let telemetry = config.telemetry.clone().with_output_dir(&dir);
    run_match(&script, telemetry).map_err(|e| e.to_string())
}

/// Run a batch of matches
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        "Starting batch run: {} scripts into {}",
        config.scripts.len(),
        config.output_dir.display()
    );

    let play = || -> Vec<Result<MatchReport, BatchError>> {
        config
            .scripts
            .par_iter()
            .enumerate()
            .map(|(index, path)| {
                run_single_match(&config, index, path).map_err(|message| {
                    warn!("Match {} failed: {}", path.display(), message);
                    BatchError {
                        script: path.clone(),
                        message,
                    }
                })
            })
            .collect()
    };

    let pool = (config.parallel_games > 0)
        .then(|| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(config.parallel_games as usize)
                .build()
        })
        .transpose();
    let results = match pool {
        Ok(Some(pool)) => pool.install(play),
        Ok(None) => play(),
        Err(e) => {
            warn!("Failed to build thread pool: {}, using default", e);
            play()
        }
    };

    let (matches, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let matches: Vec<MatchReport> = matches.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_matches(&matches);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} matches, {} failed in {:.1}s",
        matches.len(),
        errors.len(),
        duration_seconds
    );

    BatchResults {
        config,
        matches,
        summary,
        duration_seconds,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{ScriptAction, ScriptEvent};

    fn write_script(dir: &Path, name: &str, script: &MatchScript) -> PathBuf {
        let path = dir.join(format!("{name}.ron"));
        std::fs::write(&path, ron::to_string(script).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert!(config.scripts.is_empty());
        assert_eq!(config.parallel_games, 0);
    }

    #[test]
    fn test_from_dir_picks_ron_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "b", &MatchScript::default());
        write_script(dir.path(), "a", &MatchScript::default());
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let config = BatchConfig::from_dir(dir.path()).unwrap();
        let names: Vec<_> = config
            .scripts
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.ron", "b.ron"]);
    }

    #[test]
    fn test_from_missing_dir() {
        let err = BatchConfig::from_dir(Path::new("/nonexistent/scripts")).unwrap_err();
        assert!(matches!(err, ScriptError::FileNotFound(_)));
    }

    #[test]
    fn test_match_dir_uses_stem() {
        let config = BatchConfig::default().with_output(PathBuf::from("out"));
        assert_eq!(
            config.match_dir(3, Path::new("scripts/rush.ron")),
            PathBuf::from("out/rush")
        );
    }

    #[test]
    fn test_run_batch_small() {
        let scripts = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let lost = MatchScript {
            result: Some(false),
            ..MatchScript::default()
        };
        let config = BatchConfig {
            scripts: vec![
                write_script(scripts.path(), "win", &MatchScript::default()),
                write_script(scripts.path(), "loss", &lost),
                scripts.path().join("missing.ron"),
            ],
            output_dir: output.path().to_path_buf(),
            parallel_games: 2,
            telemetry: TelemetryConfig::default(),
        };

        let results = run_batch(config);
        assert_eq!(results.matches.len(), 2);
        assert_eq!(results.errors.len(), 1);
        assert_eq!(results.summary.wins, 1);
        assert_eq!(results.summary.total_matches, 2);
        // 240 frames per default script is 10 windows each.
        assert_eq!(results.summary.frametime_rows, 20);
        assert!(output.path().join("win/results.json").exists());
        assert!(output.path().join("loss/frametimes.csv").exists());
    }

    #[test]
    fn test_overflowing_script_fails_alone() {
        let scripts = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let mut flood = MatchScript::default();
        flood.events = (1..=2)
            .map(|frame| {
                ScriptEvent::new(
                    frame,
                    ScriptAction::Score {
                        building: 0,
                        kill: i32::MAX,
                        razing: 0,
                        unit: 0,
                    },
                )
            })
            .collect();
        let config = BatchConfig {
            scripts: vec![
                write_script(scripts.path(), "flood", &flood),
                write_script(scripts.path(), "win", &MatchScript::default()),
            ],
            output_dir: output.path().to_path_buf(),
            parallel_games: 2,
            telemetry: TelemetryConfig::default(),
        };

        let results = run_batch(config);
        assert_eq!(results.matches.len(), 1);
        assert_eq!(results.errors.len(), 1);
        assert!(results.errors[0].message.contains("kill score overflows"));
    }

    #[test]
    fn test_batch_results_save_load() {
        let output = tempfile::tempdir().unwrap();
        let results = run_batch(BatchConfig::default().with_output(output.path().to_path_buf()));
        let path = output.path().join("batch_results.json");

        results.save(&path).unwrap();
        let loaded = BatchResults::load(&path).unwrap();
        assert!(loaded.matches.is_empty());
        assert_eq!(loaded.summary, BatchSummary::default());
    }
}
