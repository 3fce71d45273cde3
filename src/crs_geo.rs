use std::rc::Rc;

use gdal::spatial_ref::SpatialRef;
use geo::{BoundingRect, Rect};
use itertools::Itertools;
use proj::{Proj, Transform};
use shrinkwraprs::Shrinkwrap;

use crate::errors::{CropError, Result};

/// Crs of request coordinates when none is given.
pub const WGS84: &str = "EPSG:4326";

/// PROJ definition of `srs`, usable as either end of a [Proj] pipeline.
pub fn proj_definition(srs: &SpatialRef) -> Result<String> {
    let proj4 = srs
        .to_proj4()
        .map_err(|err| CropError::InvalidSpatialReference(err.to_string()))?;
    let proj4 = proj4.trim();
    if proj4.is_empty() {
        return Err(CropError::InvalidSpatialReference(
            "spatial reference has no PROJ representation".into(),
        ));
    }
    if proj4.contains("+type=crs") {
        Ok(proj4.to_string())
    } else {
        Ok(format!("{proj4} +type=crs"))
    }
}

/// Transforms the points `(xs[i], ys[i])` from `source_crs` to `target_crs`.
///
/// Coordinates are always (x, y), i.e. (longitude, latitude) for geographic
/// crs, whatever axis order the crs declares. `xs` and `ys` must have the
/// same length.
pub fn transform_point_pairs(
    xs: &[f64],
    ys: &[f64],
    source_crs: &str,
    target_crs: &str,
) -> Result<(Vec<f64>, Vec<f64>)> {
    if xs.len() != ys.len() {
        return Err(CropError::CoordinateCountMismatch {
            xs: xs.len(),
            ys: ys.len(),
        });
    }
    let proj = Proj::new_known_crs(source_crs, target_crs, None)?;
    xs.iter()
        .zip(ys)
        .map(|(x, y)| proj.convert((*x, *y)))
        .process_results(|points| points.unzip())
        .map_err(CropError::Projection)
}

#[derive(Shrinkwrap, Debug, Clone)]
pub struct CrsGeometry<G> {
    crs: Rc<str>,
    #[shrinkwrap(main_field)]
    geometry: G,
}

impl<G> CrsGeometry<G> {
    pub fn new(crs: Rc<str>, geometry: G) -> Self {
        Self { crs, geometry }
    }

    pub fn crs(&self) -> &str {
        self.crs.as_ref()
    }

    pub fn into_inner(self) -> G {
        self.geometry
    }
}

impl<G: Transform<f64, Output = G>> CrsGeometry<G> {
    pub fn with_crs(mut self, crs: &str) -> Result<Self> {
        if self.crs().ne(crs) {
            let proj = Proj::new_known_crs(self.crs(), crs, None)?;
            self.crs = Rc::from(crs);
            self.geometry.transform(&proj)?;
        }
        Ok(self)
    }
}

impl<G: BoundingRect<f64, Output = Option<Rect>>> CrsGeometry<G> {
    pub fn bounding_rect(&self) -> Option<CrsGeometry<Rect>> {
        let geometry = self.geometry.bounding_rect()?;
        Some(CrsGeometry {
            crs: Rc::clone(&self.crs),
            geometry,
        })
    }
}
