pub mod bounds;
pub mod dataset;
pub mod geometry;
pub mod mask;
pub mod memfile;
pub mod transforms;
pub mod window;
pub mod writer;

pub use bounds::{BoundingBox, ProjectedBounds};
pub use dataset::{DataType, RasterDataset};
pub use geometry::{GeoJson, RequestGeometry};
pub use mask::{apply_mask, rasterize_mask};
pub use memfile::{CallScope, MemFile};
pub use transforms::{round_to_nearest_10, GeoTransform};
pub use window::PixelWindow;
pub use writer::{OutputSampleType, RasterWriter};
