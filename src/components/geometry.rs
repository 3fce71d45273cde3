use std::rc::Rc;

use gdal::{
    spatial_ref::SpatialRef, vector::LayerAccess, Dataset as GdalDataset, DatasetOptions,
    GdalOpenFlags,
};
use geo::{Geometry, MultiPolygon};
use log::{debug, warn};

use crate::{
    components::{
        bounds::{BoundingBox, ProjectedBounds},
        memfile::CallScope,
    },
    crs_geo::{proj_definition, CrsGeometry},
    errors::{CropError, Result},
};

/// GeoJSON document as received, coordinates are never reserialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoJson(String);

impl From<String> for GeoJson {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for GeoJson {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for GeoJson {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl GeoJson {
    /// Reads the first polygon feature and the crs of the document.
    ///
    /// Documents without a crs member are in WGS84, a crs member GDAL cannot
    /// resolve is an [CropError::InvalidSpatialReference].
    pub fn parse(&self, scope: &CallScope) -> Result<RequestGeometry> {
        let mem_file = scope.create_mem_file("request.geojson", self.0.as_bytes().to_vec())?;
        let options = DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_READONLY | GdalOpenFlags::GDAL_OF_VECTOR,
            allowed_drivers: Some(&["GeoJSON"]),
            ..Default::default()
        };
        let dataset = GdalDataset::open_ex(mem_file.path(), options)
            .map_err(|err| CropError::InvalidGeometry(err.to_string()))?;
        let mut layer = dataset.layer(0)?;

        let srs = match layer.spatial_ref() {
            Some(srs) => srs,
            None if self.declares_crs() => {
                return Err(CropError::InvalidSpatialReference(
                    "crs member of geometry cannot be resolved".into(),
                ))
            }
            None => SpatialRef::from_epsg(4326)?,
        };
        let feature_count = layer.feature_count();
        if feature_count > 1 {
            warn!("geometry has {feature_count} features, only the first one is used");
        }

        let geometry = layer
            .features()
            .next()
            .ok_or_else(|| CropError::InvalidGeometry("no features".into()))?
            .geometry()
            .ok_or_else(|| CropError::InvalidGeometry("feature has no geometry".into()))?
            .to_geo()?;
        let polygon = match geometry {
            Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon]),
            Geometry::MultiPolygon(multi_polygon) => multi_polygon,
            _ => {
                return Err(CropError::InvalidGeometry(
                    "first feature is not a polygon".into(),
                ))
            }
        };

        let crs = proj_definition(&srs)?;
        debug!("request geometry in {crs}");
        Ok(RequestGeometry {
            srs,
            geometry: CrsGeometry::new(Rc::from(crs), polygon),
        })
    }

    fn declares_crs(&self) -> bool {
        serde_json::from_str::<serde_json::Value>(&self.0)
            .map(|document| document.get("crs").is_some_and(|crs| !crs.is_null()))
            .unwrap_or(false)
    }
}

/// Polygon of a request, in the crs it was given in.
#[derive(Debug)]
pub struct RequestGeometry {
    srs: SpatialRef,
    geometry: CrsGeometry<MultiPolygon>,
}

impl RequestGeometry {
    pub fn crs(&self) -> &str {
        self.geometry.crs()
    }

    pub fn polygon(&self) -> &MultiPolygon {
        &self.geometry
    }

    /// Extent and polygon in the raster crs.
    ///
    /// A geometry already in the raster crs is returned unmodified. Otherwise
    /// the polygon is reprojected, and its extent is moved the way bounding
    /// boxes are, see [BoundingBox::to_crs].
    pub fn into_native(
        self,
        raster_srs: &SpatialRef,
        raster_crs: &str,
    ) -> Result<(ProjectedBounds, MultiPolygon)> {
        let extent = self
            .geometry
            .bounding_rect()
            .ok_or_else(|| CropError::InvalidGeometry("geometry is empty".into()))?;
        if self.srs == *raster_srs {
            debug!("geometry is in raster crs, not reprojecting");
            return Ok((ProjectedBounds::from(*extent), self.geometry.into_inner()));
        }
        let bounds = BoundingBox::from(*extent).to_crs(extent.crs(), raster_crs)?;
        let polygon = self.geometry.with_crs(raster_crs)?.into_inner();
        Ok((bounds, polygon))
    }
}
