use geo::Point;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{BenchmarkConfig, FailurePolicy};
use crate::geometry::PolygonWithHoles;
use crate::instance::{InstanceCorpus, LoadError};
use crate::planner::{
    CoveragePlanner, DecompositionStrategy, LineSensor, PathCost, PlannerError, PlannerSettings,
    PlannerVariant, VelocityRamp,
};
use crate::results::{self, ResultRecord, WriteError};
use crate::timing::{TimingContext, labels};

/// A single planner run that produced no result row.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("planner `{planner}` failed to initialize")]
    Setup {
        planner: String,
        #[source]
        source: Option<PlannerError>,
    },
    #[error("planner `{planner}` found no coverage path")]
    Solve {
        planner: String,
        #[source]
        source: PlannerError,
    },
}

/// Anything that aborts a whole benchmark sweep.
#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("corpus load failed")]
    Load(#[from] LoadError),
    #[error("benchmark run aborted")]
    Run(#[from] RunError),
    #[error("failed to write results")]
    Write(#[from] WriteError),
}

/// Conditions shared by every run of one benchmark sweep.
#[derive(Debug, Clone, Copy)]
pub struct RunConditions {
    pub start: Point<f64>,
    pub goal: Point<f64>,
    pub sensor: LineSensor,
    pub cost: VelocityRamp,
    pub sweep_around_obstacles: bool,
    pub offset_polygons: bool,
}

impl RunConditions {
    pub fn from_config(config: &BenchmarkConfig) -> Self {
        Self {
            start: config.start_point(),
            goal: config.goal_point(),
            sensor: LineSensor {
                sweep_distance: config.sweep_distance,
                overlap: config.overlap,
            },
            cost: VelocityRamp::new(config.v_max, config.a_max),
            sweep_around_obstacles: config.sweep_around_obstacles,
            offset_polygons: config.offset_polygons,
        }
    }

    fn settings(
        &self,
        polygon: PolygonWithHoles,
        decomposition: DecompositionStrategy,
    ) -> PlannerSettings {
        PlannerSettings {
            polygon,
            path_cost: self.cost,
            sensor: self.sensor,
            sweep_around_obstacles: self.sweep_around_obstacles,
            offset_polygons: self.offset_polygons,
            decomposition,
        }
    }
}

/// Drive one planner through the setup -> solve -> harvest protocol.
///
/// The timing context is reset first, so the report read afterwards
/// reflects exactly this run. Timer guards release on every exit path,
/// including the early failure returns. One attempt, no retries; whether
/// the experiment continues after a failure is the caller's policy.
pub fn run_single(
    planner: &mut dyn CoveragePlanner,
    label: &str,
    instance: &PolygonWithHoles,
    conditions: &RunConditions,
    timing: &TimingContext,
) -> Result<ResultRecord, RunError> {
    timing.reset();

    {
        let _setup = timing.scoped(labels::SETUP_TOTAL);
        planner.setup(timing).map_err(|source| RunError::Setup {
            planner: label.to_string(),
            source: Some(source),
        })?;
    }
    if !planner.is_initialized() {
        return Err(RunError::Setup {
            planner: label.to_string(),
            source: None,
        });
    }

    let waypoints = {
        let _solve = timing.scoped(labels::SOLVE_TOTAL);
        planner
            .solve(conditions.start, conditions.goal, timing)
            .map_err(|source| RunError::Solve {
                planner: label.to_string(),
                source,
            })?
    };

    let cost = conditions.cost.path_cost(&waypoints);
    let report = timing.collect();
    debug!(planner = label, cost, timers = %report, "run finished");

    Ok(ResultRecord {
        planner: label.to_string(),
        num_holes: instance.hole_count(),
        num_hole_vertices: instance.hole_vertex_count(),
        cost,
        total_time: report.seconds(labels::SETUP_TOTAL) + report.seconds(labels::SOLVE_TOTAL),
        total_time_setup: report.seconds(labels::SETUP_TOTAL),
        total_time_solve: report.seconds(labels::SOLVE_TOTAL),
        time_decomposition: report.seconds(labels::DECOMPOSITION),
        time_polygon_adjacency: report.seconds(labels::POLYGON_ADJACENCY),
        time_poly_offset: report.seconds(labels::POLY_OFFSET),
        total_time_sweep_graph: report.seconds(labels::SWEEP_GRAPH),
        total_time_setup_solver: report.seconds(labels::SETUP_SOLVER),
        time_line_sweeps: report.seconds(labels::LINE_SWEEPS),
        time_node_creation: report.seconds(labels::NODE_CREATION),
        time_pruning: report.seconds(labels::PRUNING),
        time_edge_creation: report.seconds(labels::EDGE_CREATION),
        sweep_distance: conditions.sensor.sweep_distance,
        v_max: conditions.cost.v_max,
        a_max: conditions.cost.a_max,
    })
}

/// Run every planner variant over every loaded instance.
///
/// Iteration is strictly sequential: corpus coordinates in deterministic
/// order, variants innermost, a fresh planner per run. Failed runs are
/// logged and skipped under [`FailurePolicy::Continue`] (no row is
/// written for them) or abort the sweep under
/// [`FailurePolicy::FailFast`].
pub fn run_matrix(
    corpus: &InstanceCorpus,
    variants: &mut [PlannerVariant],
    config: &BenchmarkConfig,
) -> Result<Vec<ResultRecord>, RunError> {
    let conditions = RunConditions::from_config(config);
    let timing = TimingContext::new();
    let mut records = Vec::new();

    for (coord, instance) in corpus.iter() {
        info!(
            bin = coord.bin,
            replicate = coord.replicate,
            holes = instance.hole_count(),
            hole_vertices = instance.hole_vertex_count(),
            "benchmarking instance"
        );

        for variant in variants.iter_mut() {
            let settings = conditions.settings(instance.clone(), variant.decomposition);
            let mut planner = variant.build(settings);

            match run_single(planner.as_mut(), &variant.label, instance, &conditions, &timing) {
                Ok(record) => records.push(record),
                Err(err) => match config.run_failure_policy {
                    FailurePolicy::Continue => warn!(
                        bin = coord.bin,
                        replicate = coord.replicate,
                        error = %err,
                        "run failed, no result row recorded"
                    ),
                    FailurePolicy::FailFast => return Err(err),
                },
            }
        }
    }

    Ok(records)
}

/// Full pipeline: load the corpus, run the matrix, write the CSV.
pub fn run_benchmark(
    config: &BenchmarkConfig,
    variants: &mut [PlannerVariant],
) -> Result<Vec<ResultRecord>, BenchmarkError> {
    let corpus = InstanceCorpus::load(
        &config.corpus_dir,
        config.matrix(),
        config.map_scale,
        config.load_failure_policy,
    )?;
    let records = run_matrix(&corpus, variants, config)?;
    results::write_results(&config.results_file, &records)?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    /// Scripted planner exercising the protocol without any real planning.
    struct ScriptedPlanner {
        initialized: bool,
        fail_setup: bool,
        report_uninitialized: bool,
        fail_solve: bool,
        path: Vec<Point<f64>>,
    }

    impl ScriptedPlanner {
        fn returning(path: Vec<Point<f64>>) -> Self {
            Self {
                initialized: false,
                fail_setup: false,
                report_uninitialized: false,
                fail_solve: false,
                path,
            }
        }
    }

    impl CoveragePlanner for ScriptedPlanner {
        fn setup(&mut self, timing: &TimingContext) -> Result<(), PlannerError> {
            if self.fail_setup {
                return Err(PlannerError::new("decomposition failed"));
            }
            {
                let _t = timing.scoped(labels::DECOMPOSITION);
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
            self.initialized = !self.report_uninitialized;
            Ok(())
        }

        fn is_initialized(&self) -> bool {
            self.initialized
        }

        fn solve(
            &mut self,
            _start: Point<f64>,
            _goal: Point<f64>,
            timing: &TimingContext,
        ) -> Result<Vec<Point<f64>>, PlannerError> {
            if self.fail_solve {
                return Err(PlannerError::new("no feasible path"));
            }
            for _ in 0..2 {
                let _t = timing.scoped(labels::LINE_SWEEPS);
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
            Ok(self.path.clone())
        }
    }

    fn square_instance() -> PolygonWithHoles {
        PolygonWithHoles::from_hull(polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ])
    }

    fn test_conditions() -> RunConditions {
        RunConditions::from_config(&BenchmarkConfig::default())
    }

    #[test]
    fn test_successful_run_harvests_timers() {
        let instance = square_instance();
        let conditions = test_conditions();
        let timing = TimingContext::new();
        let mut planner = ScriptedPlanner::returning(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 30.0),
        ]);

        let record =
            run_single(&mut planner, "scripted", &instance, &conditions, &timing).unwrap();

        assert_eq!(record.planner, "scripted");
        assert_eq!(record.num_holes, 0);
        assert_eq!(record.num_hole_vertices, 0);
        // 30 units at v_max 3, a_max 1.
        assert!((record.cost - 13.0).abs() < 1e-9);
        assert!(record.total_time_setup > 0.0);
        assert!(record.total_time_solve > 0.0);
        assert!(
            (record.total_time - record.total_time_setup - record.total_time_solve).abs() < 1e-12
        );
        // Populated by the planner.
        assert!(record.time_decomposition > 0.0);
        assert!(record.time_line_sweeps > 0.0);
        // Two sweep timers accumulated into one label.
        assert_eq!(timing.collect().starts(labels::LINE_SWEEPS), 2);
        // Never populated, defaults to zero.
        assert_eq!(record.time_pruning, 0.0);
        assert_eq!(record.sweep_distance, 3.0);
        assert_eq!(record.v_max, 3.0);
        assert_eq!(record.a_max, 1.0);
    }

    #[test]
    fn test_setup_failure_is_reported() {
        let instance = square_instance();
        let conditions = test_conditions();
        let timing = TimingContext::new();
        let mut planner = ScriptedPlanner::returning(Vec::new());
        planner.fail_setup = true;

        let err = run_single(&mut planner, "scripted", &instance, &conditions, &timing)
            .unwrap_err();
        assert!(matches!(err, RunError::Setup { source: Some(_), .. }));
        // The setup timer released despite the early return.
        assert_eq!(timing.collect().starts(labels::SETUP_TOTAL), 1);
    }

    #[test]
    fn test_uninitialized_planner_is_setup_failure() {
        let instance = square_instance();
        let conditions = test_conditions();
        let timing = TimingContext::new();
        let mut planner = ScriptedPlanner::returning(Vec::new());
        planner.report_uninitialized = true;

        let err = run_single(&mut planner, "scripted", &instance, &conditions, &timing)
            .unwrap_err();
        assert!(matches!(err, RunError::Setup { source: None, .. }));
    }

    #[test]
    fn test_solve_failure_is_reported() {
        let instance = square_instance();
        let conditions = test_conditions();
        let timing = TimingContext::new();
        let mut planner = ScriptedPlanner::returning(Vec::new());
        planner.fail_solve = true;

        let err = run_single(&mut planner, "scripted", &instance, &conditions, &timing)
            .unwrap_err();
        assert!(matches!(err, RunError::Solve { .. }));
    }

    #[test]
    fn test_consecutive_runs_do_not_share_timers() {
        let instance = square_instance();
        let conditions = test_conditions();
        let timing = TimingContext::new();

        let mut planner = ScriptedPlanner::returning(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
        ]);
        let first = run_single(&mut planner, "a", &instance, &conditions, &timing).unwrap();

        let mut planner = ScriptedPlanner::returning(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
        ]);
        let second = run_single(&mut planner, "b", &instance, &conditions, &timing).unwrap();

        // Each run resets the context, so solve counts do not accumulate.
        assert_eq!(timing.collect().starts(labels::SOLVE_TOTAL), 1);
        assert_eq!(first.num_holes, second.num_holes);
        assert!((first.cost - second.cost).abs() < 1e-12);
    }

    #[test]
    fn test_two_variants_share_instance_metrics() {
        let instance = square_instance();
        let conditions = test_conditions();
        let timing = TimingContext::new();

        let path = vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0)];
        let mut bcd = ScriptedPlanner::returning(path.clone());
        let mut trapezoid = ScriptedPlanner::returning(path);

        let a = run_single(&mut bcd, "our_bcd", &instance, &conditions, &timing).unwrap();
        let b = run_single(&mut trapezoid, "our_tcd", &instance, &conditions, &timing).unwrap();

        assert_eq!(a.num_holes, b.num_holes);
        assert_eq!(a.num_hole_vertices, b.num_hole_vertices);
        assert_ne!(a.planner, b.planner);
        // Timing fields are measured independently per run.
        assert!(a.total_time > 0.0);
        assert!(b.total_time > 0.0);
    }

    #[test]
    fn test_variant_builds_planner_with_its_strategy() {
        let mut variant = PlannerVariant::new(
            "our_tcd",
            DecompositionStrategy::Trapezoidal,
            |settings: PlannerSettings| {
                Box::new(ScriptedPlanner::returning(vec![
                    Point::new(0.0, 0.0),
                    Point::new(settings.sensor.sweep_distance, 0.0),
                ])) as Box<dyn CoveragePlanner>
            },
        );

        let conditions = test_conditions();
        let settings = conditions.settings(square_instance(), variant.decomposition);
        assert_eq!(settings.decomposition, DecompositionStrategy::Trapezoidal);

        let mut planner = variant.build(settings);
        let timing = TimingContext::new();
        planner.setup(&timing).unwrap();
        assert!(planner.is_initialized());
    }
}
