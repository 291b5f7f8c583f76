use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use geo::{Coord, LineString, Polygon};
use serde::Deserialize;
use thiserror::Error;

use crate::geometry::{BooleanError, PolygonWithHoles};

/// Minimum vertex count for the hull and every hole boundary.
pub const MIN_BOUNDARY_VERTICES: usize = 3;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("instance file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },
    #[error("failed to read instance file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed instance description in {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} in {} has {} vertices, at least 3 required", .section, .path.display(), .found)]
    InsufficientVertices {
        path: PathBuf,
        section: String,
        found: usize,
    },
    #[error("hole subtraction failed for {}", .path.display())]
    Boolean {
        path: PathBuf,
        #[source]
        source: BooleanError,
    },
}

/// On-disk instance description: one hull section plus an ordered list of
/// hole sections, all in raw map units.
#[derive(Debug, Deserialize)]
struct RawInstance {
    hull: RawBoundary,
    #[serde(default)]
    holes: Vec<RawBoundary>,
}

#[derive(Debug, Deserialize)]
struct RawBoundary {
    points: Vec<RawPoint>,
}

/// Both coordinate fields are mandatory; a point missing either one fails
/// the whole parse.
#[derive(Debug, Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

/// Load one polygon-with-holes instance from `path`.
///
/// Raw coordinates are scaled by `map_scale` into metric units on
/// ingestion. Holes are subtracted from the accumulating region in file
/// order; any subtraction that does not leave exactly one region fails the
/// load.
pub fn load_polygon(path: &Path, map_scale: f64) -> Result<PolygonWithHoles, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let raw: RawInstance = serde_json::from_str(&text).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let hull = Polygon::new(
        scaled_ring(&raw.hull, "hull", path, map_scale)?,
        Vec::new(),
    );
    let holes = raw
        .holes
        .iter()
        .enumerate()
        .map(|(index, boundary)| {
            scaled_ring(boundary, &format!("hole {index}"), path, map_scale)
                .map(|ring| Polygon::new(ring, Vec::new()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    PolygonWithHoles::new(hull, &holes).map_err(|source| LoadError::Boolean {
        path: path.to_path_buf(),
        source,
    })
}

fn scaled_ring(
    boundary: &RawBoundary,
    section: &str,
    path: &Path,
    map_scale: f64,
) -> Result<LineString<f64>, LoadError> {
    if boundary.points.len() < MIN_BOUNDARY_VERTICES {
        return Err(LoadError::InsufficientVertices {
            path: path.to_path_buf(),
            section: section.to_string(),
            found: boundary.points.len(),
        });
    }

    Ok(boundary
        .points
        .iter()
        .map(|point| Coord {
            x: point.x * map_scale,
            y: point.y * map_scale,
        })
        .collect())
}
