use std::path::PathBuf;

use gdal::raster::GdalDataType;

use crate::components::PixelWindow;

pub type Result<T> = std::result::Result<T, CropError>;

#[derive(thiserror::Error, Debug)]
pub enum CropError {
    #[error("Cannot open: {}", .0.display())]
    DatasetNotFound(PathBuf),
    #[error("Invalid spatial reference: {0}")]
    InvalidSpatialReference(String),
    #[error("Bounding box is invalid: {0}")]
    InvalidBoundingBox(String),
    #[error("Crop region is empty ({size_x}x{size_y} pixels)")]
    EmptyCropRegion { size_x: i64, size_y: i64 },
    #[error("Crop window {window:?} is outside of raster of size {size:?}")]
    WindowOutOfBounds {
        window: PixelWindow,
        size: (usize, usize),
    },
    #[error("Got {xs} x and {ys} y coordinates")]
    CoordinateCountMismatch { xs: usize, ys: usize },
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Sample type {0:?} is not supported")]
    UnsupportedSampleType(GdalDataType),
    #[error(transparent)]
    RasterIo(#[from] gdal::errors::GdalError),
    #[error(transparent)]
    Projection(#[from] proj::ProjError),
    #[error(transparent)]
    NdarrayError(#[from] ndarray::ShapeError),
}

impl From<proj::ProjCreateError> for CropError {
    fn from(value: proj::ProjCreateError) -> Self {
        CropError::InvalidSpatialReference(value.to_string())
    }
}

impl CropError {
    /// Whether the error surfaces to the caller as "image not found".
    pub fn is_not_found(&self) -> bool {
        matches!(self, CropError::DatasetNotFound(_))
    }
}
