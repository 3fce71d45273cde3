use std::path::Path;

use gdal::raster::GdalDataType;
use log::{info, warn};
use num_traits::ToPrimitive;

use crate::{
    components::{
        apply_mask, rasterize_mask, BoundingBox, CallScope, DataType, GeoJson, GeoTransform,
        OutputSampleType, PixelWindow, RasterDataset, RasterWriter,
    },
    crs_geo::{proj_definition, WGS84},
    errors::{CropError, Result},
};

/// Area to crop a raster to.
#[derive(Debug, Clone)]
pub enum CropRequest {
    /// Box in WGS84 degrees.
    BoundingBox(BoundingBox),
    /// Polygon, every pixel outside of it is set to nodata.
    Geometry(GeoJson),
}

impl From<BoundingBox> for CropRequest {
    fn from(value: BoundingBox) -> Self {
        CropRequest::BoundingBox(value)
    }
}

impl From<GeoJson> for CropRequest {
    fn from(value: GeoJson) -> Self {
        CropRequest::Geometry(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CropOptions {
    pub output_sample_type: OutputSampleType,
}

/// Encoded GeoTIFF of a crop with the parameters it was written with.
#[derive(Debug, Clone)]
pub struct CroppedRaster {
    pub bytes: Vec<u8>,
    /// Window read from the source raster.
    pub window: PixelWindow,
    pub geo_transform: GeoTransform,
    /// WKT inherited from the source raster.
    pub projection: String,
    pub sample_type: GdalDataType,
}

pub fn crop<P: AsRef<Path>>(path: P, request: &CropRequest) -> Result<CroppedRaster> {
    crop_with(path, request, &CropOptions::default())
}

/// Crops the raster at `path` to `request`.
///
/// The whole output is built in memory. Polygon requests additionally read
/// and mask every band at full extent before the window is cut out.
pub fn crop_with<P: AsRef<Path>>(
    path: P,
    request: &CropRequest,
    options: &CropOptions,
) -> Result<CroppedRaster> {
    let dataset = RasterDataset::open(path)?;
    let scope = CallScope::new();
    info!(
        "cropping {} by {} (call {})",
        dataset.path().display(),
        match request {
            CropRequest::BoundingBox(_) => "bounding box",
            CropRequest::Geometry(_) => "geometry",
        },
        scope.id()
    );
    let cropper = Cropper {
        dataset: &dataset,
        scope: &scope,
        options,
    };
    match dataset.sample_type()? {
        GdalDataType::Int8 => cropper.crop::<i8>(request),
        GdalDataType::UInt8 => cropper.crop::<u8>(request),
        GdalDataType::UInt16 => cropper.crop::<u16>(request),
        GdalDataType::Int16 => cropper.crop::<i16>(request),
        GdalDataType::UInt32 => cropper.crop::<u32>(request),
        GdalDataType::Int32 => cropper.crop::<i32>(request),
        GdalDataType::UInt64 => cropper.crop::<u64>(request),
        GdalDataType::Int64 => cropper.crop::<i64>(request),
        GdalDataType::Float32 => cropper.crop::<f32>(request),
        GdalDataType::Float64 => cropper.crop::<f64>(request),
        other => Err(CropError::UnsupportedSampleType(other)),
    }
}

struct Cropper<'a> {
    dataset: &'a RasterDataset,
    scope: &'a CallScope,
    options: &'a CropOptions,
}

impl Cropper<'_> {
    fn crop<T: DataType>(&self, request: &CropRequest) -> Result<CroppedRaster> {
        if let CropRequest::BoundingBox(bbox) = request {
            bbox.validate()?;
        }
        let transform = self.dataset.geo_transform()?;
        if !transform.is_north_up() {
            warn!("{transform:?} is not north up, windows will be approximate");
        }
        let raster_srs = self.dataset.spatial_ref()?;
        let raster_crs = proj_definition(&raster_srs)?;
        let band_nodata = self.dataset.nodata()?;

        let (bounds, window, bands, nodata) = match request {
            CropRequest::BoundingBox(bbox) => {
                let bounds = bbox.to_crs(WGS84, &raster_crs)?;
                let window = PixelWindow::from_bounds(&bounds, &transform)?;
                let bands = self.dataset.read_window::<T>(&window)?;
                (bounds, window, bands, band_nodata)
            }
            CropRequest::Geometry(geojson) => {
                let geometry = geojson.parse(self.scope)?;
                let (bounds, polygon) = geometry.into_native(&raster_srs, &raster_crs)?;
                let window = PixelWindow::from_bounds(&bounds, &transform)?;
                window.ensure_within(self.dataset.size())?;

                let mask = rasterize_mask(self.dataset, &polygon)?;
                let nodata = T::nodata(band_nodata);
                let masked = apply_mask(self.dataset.read_full::<T>()?, mask.view(), nodata)?;
                let bands = window.slice(masked.view())?.to_owned();
                (bounds, window, bands, nodata.to_f64())
            }
        };
        info!("{window:?} of {:?} pixels", self.dataset.size());

        let geo_transform = transform.snapped_to(&bounds);
        let projection = self.dataset.projection();
        let bytes = RasterWriter::new(self.scope, self.options.output_sample_type).write(
            &geo_transform,
            &projection,
            bands.view(),
            nodata,
        )?;
        Ok(CroppedRaster {
            bytes,
            window,
            geo_transform,
            projection,
            sample_type: self.options.output_sample_type.resolve::<T>(),
        })
    }
}
