use gdal::{
    raster::{Buffer, GdalDataType, GdalType, RasterCreationOptions},
    Dataset as GdalDataset, DriverManager,
};
use log::debug;
use ndarray::ArrayView3;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::{
    components::{dataset::DataType, memfile::CallScope, transforms::GeoTransform},
    errors::Result,
};

/// Sample type of written rasters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSampleType {
    /// Same type as the source raster.
    #[default]
    Source,
    /// 8 bit samples, values outside of 0..=255 are clamped and nodata is 0.
    Byte,
}

impl OutputSampleType {
    pub fn resolve<T: DataType>(&self) -> GdalDataType {
        match self {
            OutputSampleType::Source => T::datatype(),
            OutputSampleType::Byte => u8::datatype(),
        }
    }
}

/// Encodes cropped bands as a GeoTIFF.
pub struct RasterWriter<'a> {
    scope: &'a CallScope,
    sample_type: OutputSampleType,
}

impl<'a> RasterWriter<'a> {
    pub fn new(scope: &'a CallScope, sample_type: OutputSampleType) -> Self {
        Self { scope, sample_type }
    }

    /// Writes (bands, rows, columns) `bands` and returns the encoded file.
    ///
    /// Bands are prefilled with `nodata`, which is also recorded as the band
    /// nodata value. Narrowed to bytes, samples equal to `nodata` are written
    /// as 0, the nodata value of byte output.
    pub fn write<T: DataType>(
        &self,
        geo_transform: &GeoTransform,
        projection: &str,
        bands: ArrayView3<T>,
        nodata: Option<f64>,
    ) -> Result<Vec<u8>> {
        let (band_count, rows, cols) = bands.dim();
        let driver = DriverManager::get_driver_by_name("MEM")?;
        let (mut dataset, written_nodata, replaced_nodata) = match self.sample_type {
            OutputSampleType::Source => (
                driver.create_with_band_type::<T, _>("", cols, rows, band_count)?,
                nodata,
                None,
            ),
            OutputSampleType::Byte => (
                driver.create_with_band_type::<u8, _>("", cols, rows, band_count)?,
                nodata.map(|_| 0.),
                nodata,
            ),
        };
        dataset.set_geo_transform(&geo_transform.to_gdal())?;
        dataset.set_projection(projection)?;

        for (index, band_array) in bands.outer_iter().enumerate() {
            let mut band = dataset.rasterband(index + 1)?;
            if let Some(nodata) = written_nodata {
                band.fill(nodata, None)?;
            }
            let data = band_array
                .iter()
                .map(|value| match replaced_nodata {
                    Some(nodata) if is_nodata(*value, nodata) => T::zero(),
                    _ => *value,
                })
                .collect();
            let mut buffer = Buffer::new((cols, rows), data);
            band.write((0, 0), (cols, rows), &mut buffer)?;
            band.set_no_data_value(written_nodata)?;
        }
        dataset.flush_cache()?;

        let bytes = self.encode(&dataset)?;
        debug!(
            "encoded {band_count}x{rows}x{cols} {:?} raster into {} bytes",
            self.sample_type.resolve::<T>(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Copies `dataset` through the GeoTIFF driver, so the returned bytes are
    /// laid out as the driver writes files rather than as the source keeps
    /// them in memory.
    fn encode(&self, dataset: &GdalDataset) -> Result<Vec<u8>> {
        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let mem_file = self.scope.mem_file("output.tif");
        let copy = dataset.create_copy(&driver, mem_file.path(), &RasterCreationOptions::new())?;
        // The file is only complete once the copy is closed.
        drop(copy);
        mem_file.into_bytes()
    }
}

fn is_nodata<T: DataType>(value: T, nodata: f64) -> bool {
    match value.to_f64() {
        Some(value) => value == nodata || (value.is_nan() && nodata.is_nan()),
        None => false,
    }
}
