//! Small georeferenced rasters for the tests.

use gdal::{
    raster::{Buffer, RasterCreationOptions},
    spatial_ref::SpatialRef,
    DriverManager, Metadata,
};
use ndarray::Array2;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::components::{BlockBounds, File, GdalFile, GeoTransform};

pub const ORIGIN: (f64, f64) = (500_000., 4_200_000.);

/// Float64 GeoTIFF in UTM 33N with one band per `(description, data)`.
///
/// `block` switches to square tiles of that size.
pub fn write_raster(
    path: &Path,
    resolution: f64,
    bands: &[(&str, Array2<f64>)],
    block: Option<usize>,
) -> PathBuf {
    DriverManager::register_all();
    let (rows, cols) = bands[0].1.dim();
    let mut options = RasterCreationOptions::new();
    if let Some(block) = block {
        options.set_name_value("TILED", "YES").unwrap();
        options.set_name_value("BLOCKXSIZE", &block.to_string()).unwrap();
        options.set_name_value("BLOCKYSIZE", &block.to_string()).unwrap();
    }
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type_with_options::<f64, _>(path, cols, rows, bands.len(), &options)
        .unwrap();
    dataset
        .set_geo_transform(&[ORIGIN.0, resolution, 0., ORIGIN.1, 0., -resolution])
        .unwrap();
    let wkt = SpatialRef::from_epsg(32633).unwrap().to_wkt().unwrap();
    dataset.set_projection(&wkt).unwrap();
    for (index, (description, data)) in bands.iter().enumerate() {
        let mut band = dataset.rasterband(index + 1).unwrap();
        let mut buffer = Buffer::new((cols, rows), data.iter().copied().collect());
        band.write((0, 0), (cols, rows), &mut buffer).unwrap();
        band.set_description(description).unwrap();
    }
    path.to_path_buf()
}

/// Grid and first band of the raster at `path`.
pub fn read_raster(path: &Path) -> (GeoTransform, Array2<f64>) {
    let file = GdalFile::open(path).unwrap();
    let bounds = BlockBounds::new((0, 0), file.shape());
    (
        file.transform().unwrap(),
        file.read_window(0, &bounds).unwrap(),
    )
}

pub fn lookup(entries: &[(&str, &Path)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(name, path)| (name.to_string(), path.display().to_string()))
        .collect()
}
