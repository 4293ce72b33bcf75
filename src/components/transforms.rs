use geo::AffineTransform;
use shrinkwraprs::Shrinkwrap;
use std::fmt::Display;

/// Pixel size of a raster grid.
///
/// Pixels are assumed square, so a single value describes both axes.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Resolution(f64);

impl Resolution {
    const TOLERANCE: f64 = 1e-9;

    pub fn new(pixel_size: f64) -> Self {
        Self(pixel_size.abs())
    }

    /// Equality up to floating point noise in the geotransform.
    pub fn matches(&self, other: &Resolution) -> bool {
        (self.0 - other.0).abs() <= Self::TOLERANCE * self.0.max(other.0).max(1.)
    }

    pub fn min(self, other: Resolution) -> Resolution {
        if other.0 < self.0 {
            other
        } else {
            self
        }
    }
}

impl Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pixel to geo transform of a raster, with the projection it is expressed in.
#[derive(Shrinkwrap, Debug, Clone)]
pub struct GeoTransform(#[shrinkwrap(main_field)] AffineTransform, String);

impl GeoTransform {
    pub fn new(a: f64, b: f64, xoff: f64, d: f64, e: f64, yoff: f64, crs: String) -> Self {
        Self(AffineTransform::new(a, b, xoff, d, e, yoff), crs)
    }

    pub fn from_gdal(gdal_transform: [f64; 6], crs: String) -> Self {
        Self::new(
            gdal_transform[1],
            gdal_transform[2],
            gdal_transform[0],
            gdal_transform[4],
            gdal_transform[5],
            gdal_transform[3],
            crs,
        )
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.0.xoff(),
            self.0.a(),
            self.0.b(),
            self.0.yoff(),
            self.0.d(),
            self.0.e(),
        ]
    }

    pub fn crs(&self) -> &str {
        &self.1
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.0.a())
    }

    /// Same origin and rotation, pixel size replaced by `resolution`.
    ///
    /// The sign of each axis step is kept so north-up rasters stay north-up.
    pub fn with_resolution(&self, resolution: Resolution) -> Self {
        let x_step = resolution.0.copysign(self.0.a());
        let y_step = resolution.0.copysign(self.0.e());
        Self::new(
            x_step,
            self.0.b(),
            self.0.xoff(),
            self.0.d(),
            y_step,
            self.0.yoff(),
            self.1.clone(),
        )
    }

    /// Shape of the grid covering `shape` pixels of this transform at `resolution`.
    pub fn resampled_shape(&self, shape: (usize, usize), resolution: Resolution) -> (usize, usize) {
        let scale = *self.resolution() / *resolution;
        let resample = |len: usize| ((len as f64 * scale).round() as usize).max(1);
        (resample(shape.0), resample(shape.1))
    }
}
