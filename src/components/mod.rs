pub mod bounds;
pub mod engines;
pub mod file;
pub mod transforms;

pub use bounds::{BlockBounds, BlockGrid};
pub use engines::gdal_engine::{GdalEngine, GdalFile, GdalSink};
pub use file::{Engine, File, Sink};
pub use transforms::{GeoTransform, Resolution};
