use ndarray::Array2;
use std::{fmt::Debug, path::Path};

use crate::{
    components::{BlockBounds, GeoTransform, Resolution},
    errors::Result,
    options::OutputOptions,
};

/// Read access to one raster file.
///
/// Band indexes are zero based.
pub trait File: Debug + Sized {
    fn open<P: AsRef<Path>>(path: P) -> Result<Self>;
    fn path(&self) -> &Path;
    /// (width, height)
    fn shape(&self) -> (usize, usize);
    fn crs(&self) -> String;
    fn transform(&self) -> Result<GeoTransform>;
    fn resolution(&self) -> Result<Resolution> {
        Ok(self.transform()?.resolution())
    }
    fn num_bands(&self) -> usize;
    /// Native storage block (width, height) of the first band.
    fn block_shape(&self) -> Result<(usize, usize)>;
    fn band_description(&self, index: usize) -> Result<String>;
    fn read_window(&self, index: usize, bounds: &BlockBounds) -> Result<Array2<f64>>;
}

/// Single band raster receiving evaluated blocks.
pub trait Sink: Debug {
    fn path(&self) -> &Path;
    fn write_window(&mut self, bounds: &BlockBounds, block: &Array2<f64>) -> Result<()>;
}

/// Raster I/O capability handed to every processing step.
pub trait Engine {
    type File: File;
    type Sink: Sink;

    fn open(&self, path: impl AsRef<Path>) -> Result<Self::File> {
        Self::File::open(path)
    }

    /// Empty single band float raster on the grid of `like`.
    fn create_sink(&self, path: &Path, like: &Self::File) -> Result<Self::Sink>;

    /// Nearest neighbour copy of `source` with pixel size `resolution`.
    fn resample(&self, source: &Self::File, path: &Path, resolution: Resolution) -> Result<()>;

    /// Build overviews on `sink` and copy it, compressed, to `path`.
    fn finalize(&self, sink: &mut Self::Sink, path: &Path, options: &OutputOptions) -> Result<()>;
}
