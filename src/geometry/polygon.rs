use geo::{BooleanOps, LineString, MultiPolygon, Polygon};
use thiserror::Error;

/// Failure of an exact Boolean hole subtraction.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BooleanError {
    /// The hole swallowed the entire remaining region.
    #[error("subtracting hole {hole} left an empty region")]
    EmptyDifference { hole: usize },
    /// The hole cut the remaining region into disjoint parts.
    #[error("subtracting hole {hole} split the region into {regions} parts")]
    SplitRegion { hole: usize, regions: usize },
}

/// A region bounded by one outer boundary with zero or more disjoint
/// interior exclusions.
///
/// Holes only enter through Boolean subtraction in [`new`](Self::new), so
/// every hole is strictly interior to the outer boundary and holes are
/// pairwise disjoint. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonWithHoles {
    polygon: Polygon<f64>,
}

impl PolygonWithHoles {
    /// Subtract `holes` from `hull` one at a time, in order.
    ///
    /// Each subtraction must leave exactly one region: an empty difference
    /// means the hole consumed the hull, a multi-part difference means the
    /// hole disconnected it. Both abort with the offending hole index.
    pub fn new(hull: Polygon<f64>, holes: &[Polygon<f64>]) -> Result<Self, BooleanError> {
        let polygon = holes
            .iter()
            .enumerate()
            .try_fold(hull, |region, (index, hole)| {
                subtract_hole(region, hole, index)
            })?;
        Ok(Self { polygon })
    }

    /// Wrap a hull that has no holes to subtract.
    pub fn from_hull(hull: Polygon<f64>) -> Self {
        Self { polygon: hull }
    }

    pub fn hole_count(&self) -> usize {
        self.polygon.interiors().len()
    }

    /// Distinct vertices across all holes.
    ///
    /// Rings store a closing coordinate equal to their first; it is not
    /// counted twice.
    pub fn hole_vertex_count(&self) -> usize {
        self.polygon.interiors().iter().map(ring_vertex_count).sum()
    }

    pub fn outer_vertex_count(&self) -> usize {
        ring_vertex_count(self.polygon.exterior())
    }

    pub fn as_polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    pub fn into_polygon(self) -> Polygon<f64> {
        self.polygon
    }
}

fn subtract_hole(
    region: Polygon<f64>,
    hole: &Polygon<f64>,
    index: usize,
) -> Result<Polygon<f64>, BooleanError> {
    let difference: MultiPolygon<f64> = region.difference(hole);
    let mut parts = difference.0.into_iter();
    match (parts.next(), parts.next()) {
        (Some(only), None) => Ok(only),
        (None, _) => Err(BooleanError::EmptyDifference { hole: index }),
        (Some(_), Some(_)) => Err(BooleanError::SplitRegion {
            hole: index,
            regions: 2 + parts.count(),
        }),
    }
}

fn ring_vertex_count(ring: &LineString<f64>) -> usize {
    let n = ring.0.len();
    if n > 1 && ring.is_closed() { n - 1 } else { n }
}
