//! Rasterized region capture

mod blob;
mod rasterizer;

pub use blob::ImageBlob;
pub use rasterizer::{
    CaptureConfig, CaptureError, RasterSource, RegionRasterizer, SourceRegion, source_region,
};
