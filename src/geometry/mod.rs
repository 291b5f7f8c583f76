pub mod polygon;

pub use polygon::{BooleanError, PolygonWithHoles};
