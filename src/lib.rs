//! coverbench - Benchmark harness for coverage path planners on polygon-with-holes corpora

pub mod config;
pub mod geometry;
pub mod instance;
pub mod planner;
pub mod results;
pub mod runner;
pub mod timing;

pub use config::{BenchmarkConfig, FailurePolicy};
pub use geometry::{BooleanError, PolygonWithHoles};
pub use instance::{ExperimentMatrix, InstanceCoordinate, InstanceCorpus, LoadError};
pub use planner::{
    CoveragePlanner, DecompositionStrategy, PlannerError, PlannerSettings, PlannerVariant,
};
pub use results::{ResultRecord, WriteError};
pub use runner::{BenchmarkError, RunError, run_benchmark, run_matrix, run_single};
pub use timing::{TimingContext, TimingReport};
