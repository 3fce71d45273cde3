use std::path::PathBuf;

use gdal::{
    raster::{Buffer, GdalType},
    spatial_ref::SpatialRef,
    Dataset, DriverManager,
};
use rstest::fixture;
use tempfile::TempDir;

use crate::components::BoundingBox;

pub const UTM_35N: &str = "EPSG:32635";
/// Top left corner of the fixture rasters, in UTM 35N.
pub const ORIGIN: (f64, f64) = (520_000., 4_900_000.);
pub const PIXEL_SIZE: f64 = 30.;
/// (columns, rows)
pub const SIZE: (usize, usize) = (700, 700);

/// Box over the middle of the fixture rasters.
pub const SCENARIO_BBOX: BoundingBox = BoundingBox {
    min_x: 27.37,
    max_x: 27.42,
    min_y: 44.15,
    max_y: 44.20,
};

/// Sample of fixture rasters at (band, row, column), band counted from 0.
pub fn source_value(band: usize, row: usize, col: usize) -> u16 {
    ((row * 3 + col * 5 + band * 11) % 4096) as u16
}

pub struct RasterFixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

fn write_raster<T: GdalType + Copy>(
    name: &str,
    band_count: usize,
    projected: bool,
    nodata: Option<f64>,
    sample: impl Fn(u16) -> T,
) -> RasterFixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<T, _>(&path, SIZE.0, SIZE.1, band_count)
        .unwrap();
    dataset
        .set_geo_transform(&[ORIGIN.0, PIXEL_SIZE, 0., ORIGIN.1, 0., -PIXEL_SIZE])
        .unwrap();
    if projected {
        let wkt = SpatialRef::from_epsg(32635).unwrap().to_wkt().unwrap();
        dataset.set_projection(&wkt).unwrap();
    }
    for band_index in 0..band_count {
        let data = (0..SIZE.1)
            .flat_map(|row| (0..SIZE.0).map(move |col| (row, col)))
            .map(|(row, col)| sample(source_value(band_index, row, col)))
            .collect();
        let mut buffer = Buffer::new(SIZE, data);
        let mut band = dataset.rasterband(band_index + 1).unwrap();
        band.write((0, 0), SIZE, &mut buffer).unwrap();
        band.set_no_data_value(nodata).unwrap();
    }
    dataset.flush_cache().unwrap();
    RasterFixture { dir, path }
}

#[fixture]
pub fn u16_raster() -> RasterFixture {
    write_raster("20160501.tif", 2, true, None, |value| value)
}

#[fixture]
pub fn f32_raster() -> RasterFixture {
    write_raster("20160502.tif", 2, true, None, f32::from)
}

/// Nodata value of [nodata_u16_raster], never taken by [source_value].
pub const U16_NODATA: f64 = 65_535.;

#[fixture]
pub fn nodata_u16_raster() -> RasterFixture {
    write_raster("20160503.tif", 2, true, Some(U16_NODATA), |value| value)
}

#[fixture]
pub fn unprojected_raster() -> RasterFixture {
    write_raster("unprojected.tif", 1, false, None, |value| value)
}

/// Feature collection in UTM 35N with one pixel aligned 50x50 pixel square,
/// from column 333 and row 283 of the fixture rasters.
pub fn utm_rectangle_geojson() -> String {
    r#"{
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::32635"}},
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [529990.0, 4891510.0],
                    [531490.0, 4891510.0],
                    [531490.0, 4890010.0],
                    [529990.0, 4890010.0],
                    [529990.0, 4891510.0]
                ]]
            }
        }]
    }"#
    .to_string()
}

/// Feature collection without crs member, with a right triangle whose right
/// angle is at the south west corner.
pub fn wgs84_triangle_geojson() -> String {
    r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": "field"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [27.38, 44.16],
                    [27.41, 44.16],
                    [27.38, 44.19],
                    [27.38, 44.16]
                ]]
            }
        }]
    }"#
    .to_string()
}

/// Opens encoded GeoTIFF `bytes`, the directory must outlive the dataset.
pub fn open_bytes(bytes: &[u8]) -> (TempDir, Dataset) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output.tif");
    std::fs::write(&path, bytes).unwrap();
    let dataset = Dataset::open(&path).unwrap();
    (dir, dataset)
}
