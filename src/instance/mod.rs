pub mod corpus;
pub mod loader;

pub use corpus::{
    ExperimentMatrix, InstanceCoordinate, InstanceCorpus, conventional_corpus_dir,
};
pub use loader::{LoadError, MIN_BOUNDARY_VERTICES, load_polygon};
