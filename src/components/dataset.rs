use std::{
    fmt::Debug,
    path::{Path, PathBuf},
};

use gdal::{
    raster::{GdalDataType, GdalType},
    spatial_ref::SpatialRef,
    Dataset as GdalDataset, DatasetOptions, GdalOpenFlags,
};
use itertools::Itertools;
use log::{debug, warn};
use ndarray::{stack, Array2, Array3, Axis};
use num_traits::{NumCast, Zero};

use crate::{
    components::{transforms::GeoTransform, window::PixelWindow},
    errors::{CropError, Result},
};

/// Sample types a raster can be cropped as.
pub trait DataType: GdalType + NumCast + Zero + Copy + Send + Sync + Debug + 'static {
    /// Value written where a mask excludes a pixel.
    fn nodata(band_nodata: Option<f64>) -> Self;
}

macro_rules! integer_data_type {
    ($($t:ty),*) => {
        $(impl DataType for $t {
            fn nodata(band_nodata: Option<f64>) -> Self {
                band_nodata
                    .and_then(|value| <$t as NumCast>::from(value))
                    .unwrap_or(0)
            }
        })*
    };
}

macro_rules! float_data_type {
    ($($t:ty),*) => {
        $(impl DataType for $t {
            fn nodata(_band_nodata: Option<f64>) -> Self {
                <$t>::NAN
            }
        })*
    };
}

integer_data_type!(i8, u8, u16, i16, u32, i32, u64, i64);
float_data_type!(f32, f64);

/// Read-only raster opened for the duration of one crop.
///
/// The underlying GDAL handle is closed when this value is dropped.
#[derive(Debug)]
pub struct RasterDataset {
    path: PathBuf,
    dataset: GdalDataset,
}

impl RasterDataset {
    /// Fails with [CropError::DatasetNotFound] unless `path` is a file GDAL
    /// can read as a raster.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CropError::DatasetNotFound(path.to_path_buf()));
        }
        let options = DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_READONLY | GdalOpenFlags::GDAL_OF_RASTER,
            ..Default::default()
        };
        let dataset = GdalDataset::open_ex(path, options).map_err(|err| {
            warn!("{} is not a readable raster: {err}", path.display());
            CropError::DatasetNotFound(path.to_path_buf())
        })?;
        debug!(
            "opened {} ({:?} pixels, {} bands)",
            path.display(),
            dataset.raster_size(),
            dataset.raster_count()
        );
        Ok(Self {
            path: path.to_path_buf(),
            dataset,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// (columns, rows)
    pub fn size(&self) -> (usize, usize) {
        self.dataset.raster_size()
    }

    pub fn band_count(&self) -> usize {
        self.dataset.raster_count()
    }

    pub fn geo_transform(&self) -> Result<GeoTransform> {
        Ok(GeoTransform::from_gdal(self.dataset.geo_transform()?))
    }

    /// Projection as WKT.
    pub fn projection(&self) -> String {
        self.dataset.projection()
    }

    pub fn spatial_ref(&self) -> Result<SpatialRef> {
        self.dataset.spatial_ref().map_err(|err| {
            CropError::InvalidSpatialReference(format!("{}: {err}", self.path.display()))
        })
    }

    /// Sample type shared by every band.
    pub fn sample_type(&self) -> Result<GdalDataType> {
        let band_types: Vec<GdalDataType> = self
            .dataset
            .rasterbands()
            .map_ok(|band| band.band_type())
            .collect::<gdal::errors::Result<_>>()?;
        match band_types.into_iter().all_equal_value() {
            Ok(band_type) => Ok(band_type),
            Err(Some((_, other))) => Err(CropError::UnsupportedSampleType(other)),
            Err(None) => Err(CropError::UnsupportedSampleType(GdalDataType::Unknown)),
        }
    }

    /// Nodata value of the first band.
    pub fn nodata(&self) -> Result<Option<f64>> {
        Ok(self.dataset.rasterband(1)?.no_data_value())
    }

    /// Reads `window` from every band into a (bands, rows, columns) array.
    pub fn read_window<T: DataType>(&self, window: &PixelWindow) -> Result<Array3<T>> {
        window.ensure_within(self.size())?;
        let offset = window.offset();
        let (cols, rows) = window.size();
        let bands = (1..=self.band_count())
            .map(|index| -> Result<Array2<T>> {
                let buffer = self.dataset.rasterband(index)?.read_as::<T>(
                    offset,
                    (cols, rows),
                    (cols, rows),
                    None,
                )?;
                let (_, data) = buffer.into_shape_and_vec();
                Ok(Array2::from_shape_vec((rows, cols), data)?)
            })
            .collect::<Result<Vec<_>>>()?;
        let views = bands.iter().map(Array2::view).collect_vec();
        Ok(stack(Axis(0), &views)?)
    }

    pub fn read_full<T: DataType>(&self) -> Result<Array3<T>> {
        self.read_window(&PixelWindow::covering(self.size()))
    }
}
