//! Region capture
//!
//! Rasterizes a dragged render-space rectangle of a surface into a
//! standalone PNG. Used for surfaces whose text cannot be queried.

use std::future::Future;

use image::{RgbaImage, imageops};
use log::{debug, error, warn};

use crate::coords::{RenderPoint, RenderRect};
use crate::settings;

use super::blob::ImageBlob;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("surface unavailable for capture: {reason}")]
    SurfaceUnavailable { reason: String },

    #[error("capture region lies outside the rendered surface")]
    RegionOutsideRaster,

    #[error("failed to encode capture: {0}")]
    Encode(#[from] image::ImageError),
}

impl CaptureError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::SurfaceUnavailable {
            reason: reason.into(),
        }
    }
}

/// A surface that can be rendered off-screen
pub trait RasterSource {
    fn device_pixel_ratio(&self) -> f64;

    /// Current internal scroll offset, render pixels
    fn scroll_offset(&self) -> RenderPoint;

    /// Render all content at device-pixel resolution, with the raster's
    /// origin at the surface's unscrolled top-left
    fn rasterize(&self) -> impl Future<Output = Result<RgbaImage, CaptureError>>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureConfig {
    pub min_width: f64,
    pub min_height: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            min_width: 20.0,
            min_height: 20.0,
        }
    }
}

impl CaptureConfig {
    pub fn from_settings() -> Self {
        let s = settings::current();
        Self {
            min_width: s.capture_min_width,
            min_height: s.capture_min_height,
        }
    }
}

/// Source rectangle in device-pixel raster space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceRegion {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// Map a render-space drag rectangle into raster space: add the scroll
/// offset, then scale by the device pixel ratio.
pub fn source_region(rect: RenderRect, scroll: RenderPoint, dpr: f64) -> SourceRegion {
    SourceRegion {
        x: ((rect.x + scroll.x) * dpr).round() as i64,
        y: ((rect.y + scroll.y) * dpr).round() as i64,
        width: (rect.width * dpr).round() as u32,
        height: (rect.height * dpr).round() as u32,
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RegionRasterizer {
    config: CaptureConfig,
}

impl RegionRasterizer {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    /// Whether a drag is big enough to be deliberate
    pub fn accepts(&self, rect: &RenderRect) -> bool {
        rect.width >= self.config.min_width && rect.height >= self.config.min_height
    }

    /// Capture `rect` from `source`.
    ///
    /// `Ok(None)` means the drag was too small and nothing was rendered.
    /// Once rasterization starts it runs to completion or failure.
    pub async fn capture<S>(
        &self,
        source: &S,
        rect: RenderRect,
    ) -> Result<Option<ImageBlob>, CaptureError>
    where
        S: RasterSource + ?Sized,
    {
        if !self.accepts(&rect) {
            debug!(
                "Ignoring {:.0}x{:.0} capture drag (minimum {}x{})",
                rect.width, rect.height, self.config.min_width, self.config.min_height
            );
            return Ok(None);
        }

        let raster = source.rasterize().await.inspect_err(|e| {
            error!("Region capture failed: {e}");
        })?;

        let dpr = sanitize_dpr(source.device_pixel_ratio());
        let region = source_region(rect, source.scroll_offset(), dpr);
        let cropped = copy_region(&raster, region)?;
        Ok(Some(ImageBlob::encode_png(&cropped)?))
    }
}

fn sanitize_dpr(dpr: f64) -> f64 {
    if dpr.is_finite() && dpr > 0.0 {
        dpr
    } else {
        warn!("Invalid device pixel ratio {dpr}, using 1.0");
        1.0
    }
}

/// Smallest share of a capture region that must overlap the raster.
/// Keeps the padded output within a few times the raster's own size.
const MIN_VISIBLE_FRACTION_DENOM: u64 = 4;

/// Copy `region` out of `raster` into a new raster of exactly the region's
/// size. Parts of the region beyond the raster stay transparent; a region
/// that is mostly off the raster is rejected.
fn copy_region(raster: &RgbaImage, region: SourceRegion) -> Result<RgbaImage, CaptureError> {
    let (raster_w, raster_h) = (i64::from(raster.width()), i64::from(raster.height()));
    let left = region.x.max(0);
    let top = region.y.max(0);
    let right = (region.x + i64::from(region.width)).min(raster_w);
    let bottom = (region.y + i64::from(region.height)).min(raster_h);

    if right <= left || bottom <= top {
        return Err(CaptureError::RegionOutsideRaster);
    }

    let visible_area = ((right - left) * (bottom - top)) as u64;
    let region_area = u64::from(region.width) * u64::from(region.height);
    if visible_area * MIN_VISIBLE_FRACTION_DENOM < region_area {
        debug!(
            "Capture region {}x{} overlaps only {visible_area} raster pixels",
            region.width, region.height
        );
        return Err(CaptureError::RegionOutsideRaster);
    }

    let visible = imageops::crop_imm(
        raster,
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    )
    .to_image();

    if visible.dimensions() == (region.width, region.height) {
        return Ok(visible);
    }

    let mut out = RgbaImage::new(region.width, region.height);
    imageops::replace(&mut out, &visible, left - region.x, top - region.y);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_helpers::SolidRaster;
    use futures::executor::block_on;
    use image::Rgba;

    #[test]
    fn source_region_adds_scroll_then_scales() {
        let region = source_region(
            RenderRect::new(10.0, 20.0, 30.0, 40.0),
            RenderPoint::new(5.0, 100.0),
            2.0,
        );
        assert_eq!(
            region,
            SourceRegion {
                x: 30,
                y: 240,
                width: 60,
                height: 80
            }
        );
    }

    #[test]
    fn small_drag_is_rejected_before_rendering() {
        let source = SolidRaster::new(200, 200, 1.0);
        let out = block_on(
            RegionRasterizer::default().capture(&source, RenderRect::new(10.0, 10.0, 15.0, 15.0)),
        )
        .unwrap();
        assert!(out.is_none());
        assert_eq!(source.rasterize_calls(), 0);
    }

    #[test]
    fn capture_is_sized_in_device_pixels() {
        let source = SolidRaster::new(400, 400, 2.0);
        let blob = block_on(
            RegionRasterizer::default().capture(&source, RenderRect::new(10.0, 10.0, 25.0, 25.0)),
        )
        .unwrap()
        .unwrap();
        assert_eq!((blob.width, blob.height), (50, 50));
        assert_eq!(source.rasterize_calls(), 1);
    }

    #[test]
    fn capture_reads_from_scrolled_position() {
        // Top half red, bottom half blue; scrolling 150px lands in the blue half
        let mut raster = RgbaImage::from_pixel(100, 300, Rgba([255, 0, 0, 255]));
        for y in 150..300 {
            for x in 0..100 {
                raster.put_pixel(x, y, Rgba([0, 0, 255, 255]));
            }
        }
        let source = SolidRaster::from_image(raster, 1.0).with_scroll(RenderPoint::new(0.0, 150.0));
        let blob = block_on(
            RegionRasterizer::default().capture(&source, RenderRect::new(0.0, 0.0, 40.0, 40.0)),
        )
        .unwrap()
        .unwrap();
        let img = blob.decode().unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn unavailable_surface_fails_capture() {
        let source = SolidRaster::unavailable();
        let err = block_on(
            RegionRasterizer::default().capture(&source, RenderRect::new(0.0, 0.0, 50.0, 50.0)),
        )
        .unwrap_err();
        assert!(matches!(err, CaptureError::SurfaceUnavailable { .. }));
    }

    #[test]
    fn region_past_the_edge_is_padded() {
        let raster = RgbaImage::from_pixel(50, 50, Rgba([9, 9, 9, 255]));
        let out = copy_region(
            &raster,
            SourceRegion {
                x: 30,
                y: 30,
                width: 40,
                height: 40,
            },
        )
        .unwrap();
        assert_eq!(out.dimensions(), (40, 40));
        assert_eq!(out.get_pixel(0, 0), &Rgba([9, 9, 9, 255]));
        assert_eq!(out.get_pixel(39, 39), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn region_mostly_off_the_raster_is_an_error() {
        let raster = RgbaImage::new(10, 10);
        let err = copy_region(
            &raster,
            SourceRegion {
                x: 5,
                y: 5,
                width: 40_000,
                height: 40_000,
            },
        )
        .unwrap_err();
        assert!(matches!(err, CaptureError::RegionOutsideRaster));
    }

    #[test]
    fn region_fully_outside_is_an_error() {
        let raster = RgbaImage::new(10, 10);
        let err = copy_region(
            &raster,
            SourceRegion {
                x: 20,
                y: 20,
                width: 5,
                height: 5,
            },
        )
        .unwrap_err();
        assert!(matches!(err, CaptureError::RegionOutsideRaster));
    }
}
