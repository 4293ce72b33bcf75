use ndarray::Array2;
use std::{
    fmt::Debug,
    path::{Path, PathBuf},
};

use crate::{
    components::{
        file::{Engine, File, Sink},
        BlockBounds, BlockGrid, GeoTransform, Resolution,
    },
    errors::Result,
    options::OutputOptions,
    try_tuple_cast,
};

/// Implementations for gdal
pub mod gdal_engine {
    use super::*;
    use gdal::{
        raster::{Buffer, GdalDataType, GdalType, RasterCreationOptions},
        Dataset as GdalDataset, Driver, DriverManager, Metadata as GdalMetadata,
    };
    use log::debug;

    const DRIVER_NAME: &str = "GTiff";

    fn driver() -> Result<Driver> {
        Ok(DriverManager::get_driver_by_name(DRIVER_NAME)?)
    }

    fn copy_grid(dataset: &mut GdalDataset, transform: &GeoTransform) -> Result<()> {
        dataset.set_geo_transform(&transform.to_gdal())?;
        if !transform.crs().is_empty() {
            dataset.set_projection(transform.crs())?;
        }
        Ok(())
    }

    /// Target block of a resampling pass.
    pub(crate) const RESAMPLE_BLOCK: (usize, usize) = (512, 512);

    /// Source pixel whose center is nearest to the center of target pixel `index`.
    pub(crate) fn nearest(index: usize, source_len: usize, target_len: usize) -> usize {
        let ratio = source_len as f64 / target_len as f64;
        (((index as f64 + 0.5) * ratio) as usize).min(source_len.saturating_sub(1))
    }

    fn resample_as<T: GdalType + Copy>(
        source: &GdalFile,
        path: &Path,
        resolution: Resolution,
    ) -> Result<()> {
        let transform = source.transform()?;
        let (source_width, source_height) = source.shape();
        let shape = transform.resampled_shape(source.shape(), resolution);
        let num_bands = source.num_bands();
        let mut dataset =
            driver()?.create_with_band_type::<T, _>(path, shape.0, shape.1, num_bands)?;
        copy_grid(&mut dataset, &transform.with_resolution(resolution))?;

        let grid = BlockGrid::new(shape, RESAMPLE_BLOCK);
        for index in 1..=num_bands {
            let source_band = source.dataset.rasterband(index)?;
            let mut band = dataset.rasterband(index)?;
            for bounds in &grid {
                let (x, y) = bounds.offset().x_y();
                let (width, height) = bounds.shape().x_y();
                let columns: Vec<usize> = (x..x + width)
                    .map(|col| nearest(col, source_width, shape.0))
                    .collect();
                let rows: Vec<usize> = (y..y + height)
                    .map(|row| nearest(row, source_height, shape.1))
                    .collect();
                // Indexes grow with the target pixel, the window spans first to last.
                let origin = (columns[0], rows[0]);
                let window_size = (
                    columns[width - 1] - origin.0 + 1,
                    rows[height - 1] - origin.1 + 1,
                );
                let window = source_band.read_as::<T>(
                    try_tuple_cast(origin)?,
                    window_size,
                    window_size,
                    None,
                )?;
                let window = window.data();
                let data: Vec<T> = rows
                    .iter()
                    .flat_map(|row| {
                        columns
                            .iter()
                            .map(move |col| window[(row - origin.1) * window_size.0 + col - origin.0])
                    })
                    .collect();
                let mut buffer = Buffer::new((width, height), data);
                band.write(bounds.window()?, (width, height), &mut buffer)?;
            }
            band.set_description(&source_band.description()?)?;
            if let Some(no_data) = source_band.no_data_value() {
                band.set_no_data_value(Some(no_data))?;
            }
        }
        Ok(())
    }

    /// Raster I/O through GDAL.
    ///
    /// Drivers are registered when the engine is built,
    /// every other call goes through the engine it was passed.
    #[derive(Debug)]
    pub struct GdalEngine;

    impl GdalEngine {
        pub fn new() -> Self {
            DriverManager::register_all();
            Self
        }
    }

    impl Default for GdalEngine {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Engine for GdalEngine {
        type File = GdalFile;
        type Sink = GdalSink;

        fn create_sink(&self, path: &Path, like: &GdalFile) -> Result<GdalSink> {
            let (width, height) = like.shape();
            let mut dataset = driver()?.create_with_band_type::<f32, _>(path, width, height, 1)?;
            copy_grid(&mut dataset, &like.transform()?)?;
            debug!("created {width}x{height} sink {path:?}");
            Ok(GdalSink {
                path: path.to_path_buf(),
                dataset,
            })
        }

        /// Copy in the data type of the first source band, one target block at a time.
        fn resample(&self, source: &GdalFile, path: &Path, resolution: Resolution) -> Result<()> {
            match source.dataset.rasterband(1)?.band_type() {
                GdalDataType::UInt8 => resample_as::<u8>(source, path, resolution),
                GdalDataType::UInt16 => resample_as::<u16>(source, path, resolution),
                GdalDataType::Int16 => resample_as::<i16>(source, path, resolution),
                GdalDataType::UInt32 => resample_as::<u32>(source, path, resolution),
                GdalDataType::Int32 => resample_as::<i32>(source, path, resolution),
                GdalDataType::Float32 => resample_as::<f32>(source, path, resolution),
                _ => resample_as::<f64>(source, path, resolution),
            }?;
            debug!("resampled {:?} {:?} -> {path:?}", source.path, source.shape());
            Ok(())
        }

        fn finalize(&self, sink: &mut GdalSink, path: &Path, options: &OutputOptions) -> Result<()> {
            sink.dataset.build_overviews(
                &options.overview_resampling,
                &options.overview_factors,
                &[],
            )?;
            let mut creation_options = RasterCreationOptions::new();
            creation_options.set_name_value("COPY_SRC_OVERVIEWS", "YES")?;
            if options.tiled {
                creation_options.set_name_value("TILED", "YES")?;
            }
            creation_options.set_name_value("COMPRESS", &options.compression)?;
            sink.dataset
                .create_copy(&driver()?, path, &creation_options)?;
            Ok(())
        }
    }

    #[derive(Debug)]
    pub struct GdalFile {
        path: PathBuf,
        dataset: GdalDataset,
    }

    impl File for GdalFile {
        fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
            Ok(GdalFile {
                path: path.as_ref().to_path_buf(),
                dataset: GdalDataset::open(&path)?,
            })
        }
        fn path(&self) -> &Path {
            &self.path
        }
        fn shape(&self) -> (usize, usize) {
            self.dataset.raster_size()
        }
        fn crs(&self) -> String {
            self.dataset.projection()
        }
        fn transform(&self) -> Result<GeoTransform> {
            Ok(GeoTransform::from_gdal(
                self.dataset.geo_transform()?,
                self.crs(),
            ))
        }
        fn num_bands(&self) -> usize {
            self.dataset.raster_count()
        }
        fn block_shape(&self) -> Result<(usize, usize)> {
            Ok(self.dataset.rasterband(1)?.block_size())
        }
        fn band_description(&self, index: usize) -> Result<String> {
            Ok(self.dataset.rasterband(index + 1)?.description()?)
        }
        fn read_window(&self, index: usize, bounds: &BlockBounds) -> Result<Array2<f64>> {
            let rasterband = self.dataset.rasterband(index + 1)?;
            let window_shape = bounds.shape().x_y();
            let buffer =
                rasterband.read_as::<f64>(bounds.window()?, window_shape, window_shape, None)?;
            Ok(Array2::from_shape_vec(
                bounds.array_shape(),
                buffer.data().to_vec(),
            )?)
        }
    }

    /// Float32 raster written block by block.
    #[derive(Debug)]
    pub struct GdalSink {
        path: PathBuf,
        dataset: GdalDataset,
    }

    impl Sink for GdalSink {
        fn path(&self) -> &Path {
            &self.path
        }

        fn write_window(&mut self, bounds: &BlockBounds, block: &Array2<f64>) -> Result<()> {
            let window_shape = bounds.shape().x_y();
            let data: Vec<f32> = block.iter().map(|value| *value as f32).collect();
            let mut buffer = Buffer::new(window_shape, data);
            let mut rasterband = self.dataset.rasterband(1)?;
            Ok(rasterband.write(bounds.window()?, window_shape, &mut buffer)?)
        }
    }
}
