use gdal::{raster::rasterize, vector::ToGdal, DriverManager};
use geo::MultiPolygon;
use log::debug;
use ndarray::{Array2, Array3, ArrayView2, Axis, ErrorKind, ShapeError, Zip};
use rayon::prelude::*;

use crate::{
    components::dataset::{DataType, RasterDataset},
    errors::Result,
};

/// Mask value of pixels inside the polygon.
pub const BURN_VALUE: u8 = 1;

/// Burns `polygon` into a byte mask aligned with `dataset`.
///
/// `polygon` must be in the crs of `dataset`. The mask is (rows, columns).
pub fn rasterize_mask(dataset: &RasterDataset, polygon: &MultiPolygon) -> Result<Array2<u8>> {
    let (cols, rows) = dataset.size();
    let driver = DriverManager::get_driver_by_name("MEM")?;
    let mut mask_dataset = driver.create_with_band_type::<u8, _>("", cols, rows, 1)?;
    mask_dataset.set_geo_transform(&dataset.geo_transform()?.to_gdal())?;
    mask_dataset.set_projection(&dataset.projection())?;

    let geometry = polygon.to_gdal()?;
    rasterize(
        &mut mask_dataset,
        &[1],
        &[geometry],
        &[f64::from(BURN_VALUE)],
        None,
    )?;

    let buffer = mask_dataset
        .rasterband(1)?
        .read_as::<u8>((0, 0), (cols, rows), (cols, rows), None)?;
    let (_, data) = buffer.into_shape_and_vec();
    let mask = Array2::from_shape_vec((rows, cols), data)?;
    debug!(
        "mask covers {} of {} pixels",
        mask.iter().filter(|value| **value == BURN_VALUE).count(),
        mask.len()
    );
    Ok(mask)
}

/// Replaces every sample outside of `mask` with `nodata`, band by band.
pub fn apply_mask<T: DataType>(
    mut bands: Array3<T>,
    mask: ArrayView2<u8>,
    nodata: T,
) -> Result<Array3<T>> {
    let (_, rows, cols) = bands.dim();
    if mask.dim() != (rows, cols) {
        return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
    }
    bands
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .for_each(|mut band| {
            Zip::from(&mut band).and(&mask).for_each(|value, inside| {
                if *inside != BURN_VALUE {
                    *value = nodata;
                }
            })
        });
    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::CropError,
        test_utils::{f32_raster, source_value, RasterFixture, ORIGIN, PIXEL_SIZE},
    };
    use geo::{polygon, MultiPolygon};
    use ndarray::{array, Array3};
    use rstest::rstest;

    #[rstest]
    fn outside_samples_become_nodata() {
        let bands = Array3::from_shape_fn((2, 2, 3), |(b, r, c)| (b * 10 + r * 3 + c) as u16);
        let mask = array![[1u8, 0, 1], [0, 1, 1]];
        let masked = apply_mask(bands, mask.view(), 999).unwrap();
        assert_eq!(
            masked,
            Array3::from_shape_vec((2, 2, 3), vec![0, 999, 2, 999, 4, 5, 10, 999, 12, 999, 14, 15])
                .unwrap()
        );
    }

    #[rstest]
    fn float_nodata_is_nan() {
        let bands = Array3::from_elem((1, 1, 2), 7.5f32);
        let masked = apply_mask(bands, array![[0u8, 1]].view(), f32::nodata(None)).unwrap();
        assert!(masked[[0, 0, 0]].is_nan());
        assert_eq!(masked[[0, 0, 1]], 7.5);
    }

    #[rstest]
    fn mismatched_mask_is_rejected() {
        let bands = Array3::from_elem((1, 2, 2), 1u8);
        let err = apply_mask(bands, array![[1u8, 1, 1]].view(), 0).unwrap_err();
        assert!(matches!(err, CropError::NdarrayError(_)));
    }

    #[rstest]
    fn burns_pixels_inside_polygon(f32_raster: RasterFixture) {
        let dataset = RasterDataset::open(&f32_raster.path).unwrap();
        // Pixel aligned square of 4x3 pixels starting at column 10, row 20.
        let (x0, y0) = (ORIGIN.0 + 10. * PIXEL_SIZE, ORIGIN.1 - 20. * PIXEL_SIZE);
        let (x1, y1) = (x0 + 4. * PIXEL_SIZE, y0 - 3. * PIXEL_SIZE);
        let square = polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)];
        let mask = rasterize_mask(&dataset, &MultiPolygon::new(vec![square])).unwrap();

        assert_eq!(mask.dim(), (dataset.size().1, dataset.size().0));
        assert_eq!(mask.iter().filter(|value| **value == BURN_VALUE).count(), 12);
        assert_eq!(mask[[20, 10]], BURN_VALUE);
        assert_eq!(mask[[22, 13]], BURN_VALUE);
        assert_eq!(mask[[19, 10]], 0);
        assert_eq!(mask[[20, 14]], 0);

        let masked = apply_mask(dataset.read_full::<f32>().unwrap(), mask.view(), f32::NAN).unwrap();
        assert_eq!(masked[[1, 21, 11]], f32::from(source_value(1, 21, 11)));
        assert!(masked[[1, 0, 0]].is_nan());
    }
}
