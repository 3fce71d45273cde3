pub mod components;
mod crop;
pub mod crs_geo;
mod errors;
pub mod service;
pub mod settings;

#[cfg(test)]
mod test_utils;

pub use components::{BoundingBox, GeoJson, GeoTransform, OutputSampleType, PixelWindow};
pub use crop::{crop, crop_with, CropOptions, CropRequest, CroppedRaster};
pub use errors::{CropError, Result};
