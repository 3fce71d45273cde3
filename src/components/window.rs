use ndarray::{s, ArrayView3};

use crate::{
    components::{bounds::ProjectedBounds, transforms::GeoTransform},
    errors::{CropError, Result},
};

/// Pixel window of a crop.
///
/// Defined by:
///     - `offset`: (column, row) of the top left pixel of the window,
///         with origin at the top left pixel of the raster.
///     - `size`: (columns, rows), both at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    offset_x: isize,
    offset_y: isize,
    size_x: usize,
    size_y: usize,
}

impl PixelWindow {
    /// Window covering `bounds` on the grid of `transform`.
    ///
    /// Every quantity is truncated toward zero, so the window can fall short
    /// of the requested area by up to one pixel per edge.
    pub fn from_bounds(bounds: &ProjectedBounds, transform: &GeoTransform) -> Result<Self> {
        let (origin_x, origin_y) = transform.origin();
        let (xres, yres) = transform.resolution();
        let yres = yres.abs();

        let offset_x = ((bounds.xmin - origin_x) / xres).trunc() as i64;
        let offset_y = ((origin_y - bounds.ymax) / yres).trunc() as i64;
        let size_x = ((bounds.xmax - bounds.xmin) / xres).trunc() as i64;
        let size_y = ((bounds.ymax - bounds.ymin) / yres).trunc() as i64;

        if size_x <= 0 || size_y <= 0 {
            return Err(CropError::EmptyCropRegion { size_x, size_y });
        }
        Ok(Self {
            offset_x: offset_x as isize,
            offset_y: offset_y as isize,
            size_x: size_x as usize,
            size_y: size_y as usize,
        })
    }

    /// Window over a whole raster of `size` (columns, rows).
    pub fn covering(size: (usize, usize)) -> Self {
        Self {
            offset_x: 0,
            offset_y: 0,
            size_x: size.0,
            size_y: size.1,
        }
    }

    pub fn shifted(self, x: isize, y: isize) -> Self {
        Self {
            offset_x: self.offset_x + x,
            offset_y: self.offset_y + y,
            ..self
        }
    }

    /// (column, row) of the top left pixel.
    pub fn offset(&self) -> (isize, isize) {
        (self.offset_x, self.offset_y)
    }

    /// (columns, rows)
    pub fn size(&self) -> (usize, usize) {
        (self.size_x, self.size_y)
    }

    pub fn ensure_within(&self, raster_size: (usize, usize)) -> Result<()> {
        let fits = |offset: isize, size: usize, limit: usize| {
            offset >= 0 && (offset as usize).saturating_add(size) <= limit
        };
        if fits(self.offset_x, self.size_x, raster_size.0)
            && fits(self.offset_y, self.size_y, raster_size.1)
        {
            Ok(())
        } else {
            Err(CropError::WindowOutOfBounds {
                window: *self,
                size: raster_size,
            })
        }
    }

    /// View of the window over a (bands, rows, columns) array.
    pub fn slice<'a, T>(&self, array: ArrayView3<'a, T>) -> Result<ArrayView3<'a, T>> {
        let (_, rows, cols) = array.dim();
        self.ensure_within((cols, rows))?;
        let (x, y) = (self.offset_x as usize, self.offset_y as usize);
        Ok(array.slice_move(s![.., y..y + self.size_y, x..x + self.size_x]))
    }
}
