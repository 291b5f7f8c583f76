use std::path::{Path, PathBuf};

use geo::Point;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::instance::ExperimentMatrix;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// What to do when one unit of work fails inside a larger sweep.
///
/// Corpus loading defaults to [`FailFast`](Self::FailFast) so no partial
/// corpus survives; the run loop defaults to [`Continue`](Self::Continue)
/// so one failing planner run does not sink the whole experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the whole operation on the first failure.
    FailFast,
    /// Log the failure and move on to the next unit.
    Continue,
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("pwh_instances")
}
fn default_results_file() -> PathBuf {
    PathBuf::from("coverage_results.csv")
}
fn default_max_obstacles() -> usize {
    5
}
fn default_obstacle_step() -> usize {
    5
}
fn default_replicates() -> usize {
    10
}
fn default_map_scale() -> f64 {
    0.025
}
fn default_sweep_distance() -> f64 {
    3.0
}
fn default_overlap() -> f64 {
    0.0
}
fn default_v_max() -> f64 {
    3.0
}
fn default_a_max() -> f64 {
    1.0
}
fn default_offset_polygons() -> bool {
    true
}
fn default_load_failure_policy() -> FailurePolicy {
    FailurePolicy::FailFast
}
fn default_run_failure_policy() -> FailurePolicy {
    FailurePolicy::Continue
}

/// Benchmark configuration, loadable from a TOML file.
///
/// Every field has a default matching the reference configuration, so an
/// empty file (or none at all) yields a runnable setup.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkConfig {
    /// Directory holding `<bin>/<replicate>.json` instance files.
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: PathBuf,
    /// Destination of the results CSV.
    #[serde(default = "default_results_file")]
    pub results_file: PathBuf,
    #[serde(default = "default_max_obstacles")]
    pub max_obstacles: usize,
    #[serde(default = "default_obstacle_step")]
    pub obstacle_step: usize,
    #[serde(default = "default_replicates")]
    pub replicates: usize,
    /// Raw map units to metric coordinates.
    #[serde(default = "default_map_scale")]
    pub map_scale: f64,
    /// Sensor sweep distance in metric units.
    #[serde(default = "default_sweep_distance")]
    pub sweep_distance: f64,
    /// Fractional overlap between adjacent sweeps.
    #[serde(default = "default_overlap")]
    pub overlap: f64,
    #[serde(default = "default_v_max")]
    pub v_max: f64,
    #[serde(default = "default_a_max")]
    pub a_max: f64,
    #[serde(default)]
    pub start: [f64; 2],
    #[serde(default)]
    pub goal: [f64; 2],
    #[serde(default)]
    pub sweep_around_obstacles: bool,
    #[serde(default = "default_offset_polygons")]
    pub offset_polygons: bool,
    #[serde(default = "default_load_failure_policy")]
    pub load_failure_policy: FailurePolicy,
    #[serde(default = "default_run_failure_policy")]
    pub run_failure_policy: FailurePolicy,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            corpus_dir: default_corpus_dir(),
            results_file: default_results_file(),
            max_obstacles: default_max_obstacles(),
            obstacle_step: default_obstacle_step(),
            replicates: default_replicates(),
            map_scale: default_map_scale(),
            sweep_distance: default_sweep_distance(),
            overlap: default_overlap(),
            v_max: default_v_max(),
            a_max: default_a_max(),
            start: [0.0, 0.0],
            goal: [0.0, 0.0],
            sweep_around_obstacles: false,
            offset_polygons: default_offset_polygons(),
            load_failure_policy: default_load_failure_policy(),
            run_failure_policy: default_run_failure_policy(),
        }
    }
}

impl BenchmarkConfig {
    /// Search the conventional config locations, first readable hit wins.
    pub fn load() -> Option<Self> {
        let config_paths = get_config_paths();

        for path in config_paths {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str::<Self>(&contents) {
                    Ok(config) => match config.validate() {
                        Ok(()) => return Some(config),
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                        }
                    },
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "failed to parse config file");
                    }
                }
            }
        }
        None
    }

    /// Load and validate an explicit config file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject grids and dynamics the harness cannot iterate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.obstacle_step == 0 {
            return Err(ConfigError::Invalid("obstacle_step must be non-zero".into()));
        }
        if self.replicates == 0 {
            return Err(ConfigError::Invalid("replicates must be non-zero".into()));
        }
        if self.map_scale <= 0.0 {
            return Err(ConfigError::Invalid("map_scale must be positive".into()));
        }
        if self.sweep_distance <= 0.0 {
            return Err(ConfigError::Invalid("sweep_distance must be positive".into()));
        }
        if self.v_max <= 0.0 || self.a_max <= 0.0 {
            return Err(ConfigError::Invalid("v_max and a_max must be positive".into()));
        }
        Ok(())
    }

    pub fn matrix(&self) -> ExperimentMatrix {
        ExperimentMatrix::new(self.max_obstacles, self.obstacle_step, self.replicates)
    }

    pub fn start_point(&self) -> Point<f64> {
        Point::new(self.start[0], self.start[1])
    }

    pub fn goal_point(&self) -> Point<f64> {
        Point::new(self.goal[0], self.goal[1])
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("coverbench.toml"));
    paths.push(PathBuf::from(".coverbench.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("coverbench").join("config.toml"));
        paths.push(config_dir.join("coverbench.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".coverbench.toml"));
    }

    paths
}
