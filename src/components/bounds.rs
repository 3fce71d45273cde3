use geo::Rect;
use serde::{Deserialize, Serialize};

use crate::{
    crs_geo::transform_point_pairs,
    errors::{CropError, Result},
};

/// Requested area, in WGS84 degrees for bounding box crops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// (min_x, min_y, max_x, max_y)
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.min_x, self.min_y, self.max_x, self.max_y)
    }

    pub fn validate(&self) -> Result<()> {
        let values = [self.min_x, self.max_x, self.min_y, self.max_y];
        if values.iter().any(|value| !value.is_finite()) {
            return Err(CropError::InvalidBoundingBox(format!(
                "coordinates must be finite, got {:?}",
                self.as_tuple()
            )));
        }
        if self.min_x >= self.max_x {
            return Err(CropError::InvalidBoundingBox(format!(
                "min_x {} is not less than max_x {}",
                self.min_x, self.max_x
            )));
        }
        if self.min_y >= self.max_y {
            return Err(CropError::InvalidBoundingBox(format!(
                "min_y {} is not less than max_y {}",
                self.min_y, self.max_y
            )));
        }
        Ok(())
    }

    /// Moves the box into `target_crs`.
    ///
    /// `(min_x, min_y)` and `(max_x, max_y)` are transformed as two
    /// independent points, the remaining corners are not considered. This
    /// is exact for axis aligned crs pairs and a close approximation for
    /// small boxes otherwise.
    pub fn to_crs(&self, source_crs: &str, target_crs: &str) -> Result<ProjectedBounds> {
        let (xs, ys) = transform_point_pairs(
            &[self.min_x, self.max_x],
            &[self.min_y, self.max_y],
            source_crs,
            target_crs,
        )?;
        Ok(ProjectedBounds {
            xmin: xs[0],
            xmax: xs[1],
            ymin: ys[0],
            ymax: ys[1],
        })
    }
}

impl From<Rect> for BoundingBox {
    fn from(value: Rect) -> Self {
        Self::new(value.min().x, value.max().x, value.min().y, value.max().y)
    }
}

/// Box in the raster's native crs.
///
/// Not normalized: a transform that flips an axis yields `xmin > xmax`,
/// which the window calculator rejects as an empty region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedBounds {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl From<Rect> for ProjectedBounds {
    fn from(value: Rect) -> Self {
        Self {
            xmin: value.min().x,
            xmax: value.max().x,
            ymin: value.min().y,
            ymax: value.max().y,
        }
    }
}
