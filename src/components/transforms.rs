use geo::AffineTransform;
use shrinkwraprs::Shrinkwrap;

use crate::components::bounds::ProjectedBounds;

/// Affine map from (column, row) to raster crs coordinates.
#[derive(Shrinkwrap, Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(AffineTransform);

impl GeoTransform {
    pub fn from_gdal(gdal_transform: [f64; 6]) -> Self {
        Self(AffineTransform::new(
            gdal_transform[1],
            gdal_transform[2],
            gdal_transform[0],
            gdal_transform[4],
            gdal_transform[5],
            gdal_transform[3],
        ))
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.xoff(),
            self.a(),
            self.b(),
            self.yoff(),
            self.d(),
            self.e(),
        ]
    }

    /// Coordinates of the top left corner of the top left pixel.
    pub fn origin(&self) -> (f64, f64) {
        (self.xoff(), self.yoff())
    }

    /// (pixel width, pixel height), height is negative for north up rasters.
    pub fn resolution(&self) -> (f64, f64) {
        (self.a(), self.e())
    }

    pub fn is_north_up(&self) -> bool {
        self.b() == 0. && self.d() == 0. && self.e() < 0.
    }

    /// Transform of a crop of `bounds`.
    ///
    /// The origin is snapped to the nearest multiple of 10 crs units, which
    /// can move it up to 5 units away from the corner of `bounds`.
    pub fn snapped_to(&self, bounds: &ProjectedBounds) -> Self {
        let (xres, yres) = self.resolution();
        Self::from_gdal([
            round_to_nearest_10(bounds.xmin),
            xres,
            0.,
            round_to_nearest_10(bounds.ymax),
            0.,
            yres,
        ])
    }
}

/// Ties go to the even multiple of 10, e.g. 25 -> 20 and 35 -> 40.
pub fn round_to_nearest_10(value: f64) -> f64 {
    (value / 10.).round_ties_even() * 10.
}
