pub mod cost;

pub use cost::{PathCost, VelocityRamp};

use geo::Point;
use serde::Deserialize;
use thiserror::Error;

use crate::geometry::PolygonWithHoles;
use crate::timing::TimingContext;

/// Error reported by a planner collaborator during setup or solve.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PlannerError(String);

impl PlannerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Cell-decomposition algorithm a planner variant runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecompositionStrategy {
    Boustrophedon,
    Trapezoidal,
}

/// Line sensor footprint swept along coverage paths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSensor {
    pub sweep_distance: f64,
    pub overlap: f64,
}

/// Fixed per-run configuration handed to a planner before `setup`.
#[derive(Debug, Clone)]
pub struct PlannerSettings {
    pub polygon: PolygonWithHoles,
    pub path_cost: VelocityRamp,
    pub sensor: LineSensor,
    pub sweep_around_obstacles: bool,
    pub offset_polygons: bool,
    pub decomposition: DecompositionStrategy,
}

/// Contract the benchmark runner drives a planner through.
///
/// Planners receive the run's [`TimingContext`] so internal phases
/// (decomposition, sweep-graph construction, per-line sweeps) can report
/// under the well-known labels in [`crate::timing::labels`].
pub trait CoveragePlanner {
    /// Build internal state (decomposition, sweep graph) from the settings.
    fn setup(&mut self, timing: &TimingContext) -> Result<(), PlannerError>;

    /// Whether `setup` completed and `solve` may be called.
    fn is_initialized(&self) -> bool;

    /// Plan a coverage path from `start` to `goal`.
    fn solve(
        &mut self,
        start: Point<f64>,
        goal: Point<f64>,
        timing: &TimingContext,
    ) -> Result<Vec<Point<f64>>, PlannerError>;
}

/// Factory producing a fresh boxed planner for each settings value.
pub type PlannerFactory = Box<dyn FnMut(PlannerSettings) -> Box<dyn CoveragePlanner>>;

/// One planner configuration under test: a display label, the
/// decomposition strategy baked into its settings, and a factory called
/// once per run.
pub struct PlannerVariant {
    pub label: String,
    pub decomposition: DecompositionStrategy,
    factory: PlannerFactory,
}

impl PlannerVariant {
    pub fn new(
        label: impl Into<String>,
        decomposition: DecompositionStrategy,
        factory: impl FnMut(PlannerSettings) -> Box<dyn CoveragePlanner> + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            decomposition,
            factory: Box::new(factory),
        }
    }

    pub(crate) fn build(&mut self, settings: PlannerSettings) -> Box<dyn CoveragePlanner> {
        (self.factory)(settings)
    }
}

impl std::fmt::Debug for PlannerVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannerVariant")
            .field("label", &self.label)
            .field("decomposition", &self.decomposition)
            .finish_non_exhaustive()
    }
}
