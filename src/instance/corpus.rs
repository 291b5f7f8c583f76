use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::FailurePolicy;
use crate::geometry::PolygonWithHoles;

use super::loader::{self, LoadError};

/// Structural key into the corpus: obstacle bin and replicate index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceCoordinate {
    pub bin: usize,
    pub replicate: usize,
}

/// The obstacle-count x replicate grid of one benchmark corpus.
///
/// Bins run from zero to `max_obstacles` inclusive at a fixed step; each
/// bin holds a fixed replicate count. Purely structural, no randomization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperimentMatrix {
    max_obstacles: usize,
    step: usize,
    replicates: usize,
}

impl ExperimentMatrix {
    /// `step` and `replicates` must be non-zero.
    pub fn new(max_obstacles: usize, step: usize, replicates: usize) -> Self {
        assert!(step > 0, "obstacle step must be non-zero");
        assert!(replicates > 0, "replicate count must be non-zero");
        Self {
            max_obstacles,
            step,
            replicates,
        }
    }

    pub fn bins(&self) -> impl Iterator<Item = usize> + '_ {
        (0..=self.max_obstacles).step_by(self.step)
    }

    pub fn bin_count(&self) -> usize {
        self.max_obstacles / self.step + 1
    }

    pub fn replicates(&self) -> usize {
        self.replicates
    }

    /// Total number of instance coordinates in the grid.
    pub fn len(&self) -> usize {
        self.bin_count() * self.replicates
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All coordinates in bin-major, replicate-minor order.
    pub fn coordinates(&self) -> impl Iterator<Item = InstanceCoordinate> + '_ {
        let replicates = self.replicates;
        self.bins().flat_map(move |bin| {
            (0..replicates).map(move |replicate| InstanceCoordinate { bin, replicate })
        })
    }
}

/// Resolve the conventional corpus directory under a build root:
/// `<build_root>/<package>/pwh_instances-prefix/src/pwh_instances`.
pub fn conventional_corpus_dir(build_root: &Path, package: &str) -> PathBuf {
    build_root
        .join(package)
        .join("pwh_instances-prefix")
        .join("src")
        .join("pwh_instances")
}

/// Fully loaded mapping from coordinate to polygon instance.
///
/// Populated up front, before any benchmark run; iteration order is
/// deterministic (bin-major, replicate-minor).
#[derive(Debug)]
pub struct InstanceCorpus {
    matrix: ExperimentMatrix,
    instances: BTreeMap<InstanceCoordinate, PolygonWithHoles>,
}

impl InstanceCorpus {
    /// Load every instance the matrix names from `dir`.
    ///
    /// Under [`FailurePolicy::FailFast`] the first unreadable instance
    /// aborts the load and no partial corpus is retained. Under
    /// [`FailurePolicy::Continue`] the failure is logged and that
    /// coordinate is left out.
    pub fn load(
        dir: &Path,
        matrix: ExperimentMatrix,
        map_scale: f64,
        policy: FailurePolicy,
    ) -> Result<Self, LoadError> {
        info!(
            instances = matrix.len(),
            dir = %dir.display(),
            "loading test instances"
        );

        let mut instances = BTreeMap::new();
        for coord in matrix.coordinates() {
            let path = Self::instance_path(dir, coord);
            match loader::load_polygon(&path, map_scale) {
                Ok(polygon) => {
                    instances.insert(coord, polygon);
                }
                Err(err) => match policy {
                    FailurePolicy::FailFast => return Err(err),
                    FailurePolicy::Continue => warn!(
                        bin = coord.bin,
                        replicate = coord.replicate,
                        error = %err,
                        "skipping unreadable instance"
                    ),
                },
            }
        }

        Ok(Self { matrix, instances })
    }

    /// File backing one coordinate: `<dir>/<bin>/<replicate as %04d>.json`.
    pub fn instance_path(dir: &Path, coord: InstanceCoordinate) -> PathBuf {
        dir.join(coord.bin.to_string())
            .join(format!("{:04}.json", coord.replicate))
    }

    pub fn matrix(&self) -> ExperimentMatrix {
        self.matrix
    }

    pub fn get(&self, coord: InstanceCoordinate) -> Option<&PolygonWithHoles> {
        self.instances.get(&coord)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstanceCoordinate, &PolygonWithHoles)> + '_ {
        self.instances.iter().map(|(coord, polygon)| (*coord, polygon))
    }
}
