use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create results file {}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write results file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One successful benchmark run.
///
/// Field order mirrors the CSV column order; the column list and record
/// shape are a compatibility contract and must be extended together.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub planner: String,
    pub num_holes: usize,
    pub num_hole_vertices: usize,
    pub cost: f64,
    pub total_time: f64,
    pub total_time_setup: f64,
    pub total_time_solve: f64,
    pub time_decomposition: f64,
    pub time_polygon_adjacency: f64,
    pub time_poly_offset: f64,
    pub total_time_sweep_graph: f64,
    pub total_time_setup_solver: f64,
    pub time_line_sweeps: f64,
    pub time_node_creation: f64,
    pub time_pruning: f64,
    pub time_edge_creation: f64,
    pub sweep_distance: f64,
    pub v_max: f64,
    pub a_max: f64,
}

/// Number of columns in the results schema.
pub const COLUMN_COUNT: usize = 19;

/// Header and rows render from this one table, so the column list cannot
/// drift from the record fields.
static COLUMNS: &[(&str, fn(&ResultRecord) -> String)] = &[
    ("planner", |r| r.planner.clone()),
    ("num_holes", |r| r.num_holes.to_string()),
    ("num_hole_vertices", |r| r.num_hole_vertices.to_string()),
    ("cost", |r| r.cost.to_string()),
    ("total_time", |r| r.total_time.to_string()),
    ("total_time_setup", |r| r.total_time_setup.to_string()),
    ("total_time_solve", |r| r.total_time_solve.to_string()),
    ("time_decomposition", |r| r.time_decomposition.to_string()),
    ("time_polygon_adjacency", |r| {
        r.time_polygon_adjacency.to_string()
    }),
    ("time_poly_offset", |r| r.time_poly_offset.to_string()),
    ("total_time_sweep_graph", |r| {
        r.total_time_sweep_graph.to_string()
    }),
    ("total_time_setup_solver", |r| {
        r.total_time_setup_solver.to_string()
    }),
    ("time_line_sweeps", |r| r.time_line_sweeps.to_string()),
    ("time_node_creation", |r| r.time_node_creation.to_string()),
    ("time_pruning", |r| r.time_pruning.to_string()),
    ("time_edge_creation", |r| r.time_edge_creation.to_string()),
    ("sweep_distance", |r| r.sweep_distance.to_string()),
    ("v_max", |r| r.v_max.to_string()),
    ("a_max", |r| r.a_max.to_string()),
];

/// Ordered CSV column names.
pub fn column_names() -> impl Iterator<Item = &'static str> {
    COLUMNS.iter().map(|(name, _)| *name)
}

/// Write one header row plus one comma-separated row per record.
///
/// All values are numeric or simple identifiers, so no quoting or escaping
/// is applied. Failure to open the target path fails immediately; there is
/// no partial-write recovery.
pub fn write_results(path: &Path, records: &[ResultRecord]) -> Result<(), WriteError> {
    info!(path = %path.display(), records = records.len(), "saving results");

    let file = File::create(path).map_err(|source| WriteError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    write_table(&mut writer, records).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_table(writer: &mut impl Write, records: &[ResultRecord]) -> io::Result<()> {
    let header: Vec<&str> = COLUMNS.iter().map(|(name, _)| *name).collect();
    writeln!(writer, "{}", header.join(","))?;

    for record in records {
        let row: Vec<String> = COLUMNS.iter().map(|(_, value)| value(record)).collect();
        writeln!(writer, "{}", row.join(","))?;
    }

    writer.flush()
}
