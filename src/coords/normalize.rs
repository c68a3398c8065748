//! Rectangle-set normalization
//!
//! Turns the raw render-space rectangles a selection produced (one per
//! visual line, or a single drag box) into a zoom-independent set plus its
//! bounding box.

use log::debug;

use super::space::{RenderPoint, RenderRect};
use crate::highlight::DocumentLocation;
use crate::settings;

/// Thresholds for the noise filter and the page-coverage guard.
///
/// Widths and heights are render-space pixels, measured before the scale
/// is divided out.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizerConfig {
    pub min_width: f64,
    pub min_height: f64,
    /// Largest accepted share of the page's render area (0.0..=1.0)
    pub max_page_coverage: f64,
    /// Drop rectangles fully covered by another rectangle in the set
    pub merge_contained: bool,
}

impl NormalizerConfig {
    /// Defaults for drag-based region selection
    #[must_use]
    pub const fn region() -> Self {
        Self {
            min_width: 5.0,
            min_height: 5.0,
            max_page_coverage: 0.5,
            merge_contained: true,
        }
    }

    /// Looser defaults for native text-line rectangles
    #[must_use]
    pub const fn text_lines() -> Self {
        Self {
            min_width: 1.0,
            min_height: 3.0,
            max_page_coverage: 0.5,
            merge_contained: true,
        }
    }

    /// Region thresholds from the loaded settings
    #[must_use]
    pub fn region_from_settings() -> Self {
        let s = settings::current();
        Self {
            min_width: s.region_min_width,
            min_height: s.region_min_height,
            max_page_coverage: s.max_page_coverage,
            merge_contained: true,
        }
    }

    /// Text-line thresholds from the loaded settings
    #[must_use]
    pub fn text_from_settings() -> Self {
        let s = settings::current();
        Self {
            min_width: s.text_min_width,
            min_height: s.text_min_height,
            max_page_coverage: s.max_page_coverage,
            merge_contained: true,
        }
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self::region()
    }
}

/// Where a page currently sits on its rendering surface and how big it is
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    /// Top-left of the page element, in the same frame as the raw rects
    pub origin: RenderPoint,
    /// Rendered width in pixels
    pub width: f64,
    /// Rendered height in pixels
    pub height: f64,
    /// Active zoom factor
    pub scale: f64,
}

impl PageGeometry {
    #[must_use]
    pub fn new(origin: RenderPoint, width: f64, height: f64, scale: f64) -> Self {
        Self {
            origin,
            width,
            height,
            scale,
        }
    }

    /// A page rendered at the origin of its surface
    #[must_use]
    pub fn at_origin(width: f64, height: f64, scale: f64) -> Self {
        Self::new(RenderPoint::default(), width, height, scale)
    }

    /// A single scrolling page (embedded markup) whose content is scrolled
    /// by `scroll`. Rects relativized against it land in content space.
    #[must_use]
    pub fn scrolled_content(scroll: RenderPoint, width: f64, height: f64) -> Self {
        Self::new(RenderPoint::new(-scroll.x, -scroll.y), width, height, 1.0)
    }

    /// Page height in document units, recovered from the render height
    #[must_use]
    pub fn page_height(&self) -> f64 {
        self.height / self.scale
    }

    /// Page width in document units
    #[must_use]
    pub fn page_width(&self) -> f64 {
        self.width / self.scale
    }

    #[must_use]
    pub fn render_area(&self) -> f64 {
        self.width * self.height
    }
}

/// A filtered rectangle set, page-local and divided down to scale 1.0.
///
/// Still top-left oriented: feeding it back through the normalizer at
/// scale 1.0 yields the same set.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedRects {
    /// Tight bounding box of `highlight_rects`
    pub rect: RenderRect,
    /// Surviving rectangles, in input order
    pub highlight_rects: Vec<RenderRect>,
}

impl NormalizedRects {
    /// Flip into document space for a page of the given height
    #[must_use]
    pub fn into_location(self, page_index: usize, page_height: f64) -> DocumentLocation {
        DocumentLocation {
            page_index,
            rect: self.rect.to_document(page_height, 1.0),
            highlight_rects: self
                .highlight_rects
                .into_iter()
                .map(|r| r.to_document(page_height, 1.0))
                .collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RectSetNormalizer {
    config: NormalizerConfig,
}

impl RectSetNormalizer {
    #[must_use]
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a finished selection. Applies the page-coverage guard.
    ///
    /// Returns `None` when nothing survives the noise filter or the
    /// selection covers too much of the page. Callers treat that as a
    /// no-op.
    #[must_use]
    pub fn normalize(&self, raw: &[RenderRect], page: &PageGeometry) -> Option<NormalizedRects> {
        self.run(raw, page, true)
    }

    /// Normalize an in-progress selection (no coverage guard)
    #[must_use]
    pub fn normalize_live(
        &self,
        raw: &[RenderRect],
        page: &PageGeometry,
    ) -> Option<NormalizedRects> {
        self.run(raw, page, false)
    }

    /// Normalize a finished selection straight into a document location
    #[must_use]
    pub fn locate(
        &self,
        page_index: usize,
        raw: &[RenderRect],
        page: &PageGeometry,
    ) -> Option<DocumentLocation> {
        self.normalize(raw, page)
            .map(|n| n.into_location(page_index, page.page_height()))
    }

    fn run(&self, raw: &[RenderRect], page: &PageGeometry, guard: bool) -> Option<NormalizedRects> {
        let local: Vec<RenderRect> = raw
            .iter()
            .map(|r| r.relative_to(page.origin))
            .filter(|r| self.passes_noise_filter(r))
            .collect();

        if local.len() < raw.len() {
            debug!(
                "Dropped {} of {} selection rects below {}x{}",
                raw.len() - local.len(),
                raw.len(),
                self.config.min_width,
                self.config.min_height
            );
        }

        let local = if self.config.merge_contained {
            drop_contained(local)
        } else {
            local
        };

        if local.is_empty() {
            return None;
        }

        if guard && self.exceeds_coverage(&local, page) {
            return None;
        }

        let highlight_rects: Vec<RenderRect> =
            local.into_iter().map(|r| r.unscaled(page.scale)).collect();
        let rect = RenderRect::bounding(&highlight_rects)?;

        Some(NormalizedRects {
            rect,
            highlight_rects,
        })
    }

    fn passes_noise_filter(&self, rect: &RenderRect) -> bool {
        rect.width >= self.config.min_width && rect.height >= self.config.min_height
    }

    fn exceeds_coverage(&self, rects: &[RenderRect], page: &PageGeometry) -> bool {
        let page_area = page.render_area();
        if page_area <= 0.0 {
            return false;
        }
        let covered: f64 = rects.iter().map(RenderRect::area).sum();
        let ratio = covered / page_area;
        if ratio > self.config.max_page_coverage {
            debug!(
                "Discarding selection covering {:.0}% of the page (limit {:.0}%)",
                ratio * 100.0,
                self.config.max_page_coverage * 100.0
            );
            true
        } else {
            false
        }
    }
}

/// Drop every rectangle that another rectangle in the set covers. Of two
/// identical rectangles the first one stays.
fn drop_contained(rects: Vec<RenderRect>) -> Vec<RenderRect> {
    rects
        .iter()
        .enumerate()
        .filter(|&(i, r)| {
            !rects.iter().enumerate().any(|(j, other)| {
                j != i && other.contains(r) && (!r.contains(other) || j < i)
            })
        })
        .map(|(_, r)| *r)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::DocRect;

    fn page_800x600() -> PageGeometry {
        PageGeometry::at_origin(800.0, 600.0, 1.0)
    }

    fn region() -> RectSetNormalizer {
        RectSetNormalizer::new(NormalizerConfig::region())
    }

    #[test]
    fn tiny_rect_is_noise() {
        let out = region().normalize(&[RenderRect::new(10.0, 10.0, 2.0, 2.0)], &page_800x600());
        assert!(out.is_none());
    }

    #[test]
    fn ten_by_ten_is_kept() {
        let out = region()
            .normalize(&[RenderRect::new(10.0, 10.0, 10.0, 10.0)], &page_800x600())
            .unwrap();
        assert_eq!(out.highlight_rects.len(), 1);
        assert_eq!(out.rect, RenderRect::new(10.0, 10.0, 10.0, 10.0));
    }

    #[test]
    fn noise_is_dropped_but_neighbours_survive() {
        let raw = [
            RenderRect::new(10.0, 10.0, 100.0, 12.0),
            RenderRect::new(110.0, 10.0, 0.5, 12.0),
            RenderRect::new(10.0, 24.0, 80.0, 12.0),
        ];
        let out = region().normalize(&raw, &page_800x600()).unwrap();
        assert_eq!(out.highlight_rects, vec![raw[0], raw[2]]);
    }

    #[test]
    fn coverage_guard_rejects_ninety_percent() {
        let big = RenderRect::new(0.0, 0.0, 800.0, 540.0);
        assert!(region().normalize(&[big], &page_800x600()).is_none());
    }

    #[test]
    fn coverage_guard_accepts_ten_percent() {
        let small = RenderRect::new(0.0, 0.0, 80.0, 600.0);
        assert!(region().normalize(&[small], &page_800x600()).is_some());
    }

    #[test]
    fn live_normalization_skips_coverage_guard() {
        let big = RenderRect::new(0.0, 0.0, 800.0, 540.0);
        assert!(region().normalize_live(&[big], &page_800x600()).is_some());
    }

    #[test]
    fn rects_are_made_page_local_before_filtering() {
        let page = PageGeometry::new(RenderPoint::new(40.0, 300.0), 800.0, 600.0, 1.0);
        let out = region()
            .normalize(&[RenderRect::new(140.0, 400.0, 50.0, 20.0)], &page)
            .unwrap();
        assert_eq!(out.rect, RenderRect::new(100.0, 100.0, 50.0, 20.0));
    }

    #[test]
    fn scale_is_divided_out() {
        let page = PageGeometry::at_origin(1600.0, 1200.0, 2.0);
        let out = region()
            .normalize(&[RenderRect::new(200.0, 200.0, 100.0, 40.0)], &page)
            .unwrap();
        assert_eq!(out.rect, RenderRect::new(100.0, 100.0, 50.0, 20.0));
    }

    #[test]
    fn contained_duplicates_are_merged_in_order() {
        let line = RenderRect::new(10.0, 10.0, 200.0, 14.0);
        let span = RenderRect::new(40.0, 10.0, 30.0, 14.0);
        let second = RenderRect::new(10.0, 26.0, 120.0, 14.0);
        let out = region()
            .normalize(&[line, span, line, second], &page_800x600())
            .unwrap();
        assert_eq!(out.highlight_rects, vec![line, second]);
    }

    #[test]
    fn merge_can_be_disabled() {
        let config = NormalizerConfig {
            merge_contained: false,
            ..NormalizerConfig::region()
        };
        let line = RenderRect::new(10.0, 10.0, 200.0, 14.0);
        let out = RectSetNormalizer::new(config)
            .normalize(&[line, line], &page_800x600())
            .unwrap();
        assert_eq!(out.highlight_rects.len(), 2);
    }

    #[test]
    fn empty_input_is_a_noop() {
        assert!(region().normalize(&[], &page_800x600()).is_none());
    }

    #[test]
    fn location_is_flipped_into_document_space() {
        let loc = region()
            .locate(
                3,
                &[
                    RenderRect::new(0.0, 0.0, 10.0, 10.0),
                    RenderRect::new(20.0, 20.0, 5.0, 5.0),
                ],
                &PageGeometry::at_origin(800.0, 800.0, 1.0),
            )
            .unwrap();
        assert_eq!(loc.page_index, 3);
        assert_eq!(loc.rect, DocRect::new(0.0, 775.0, 25.0, 25.0));
        assert_eq!(loc.highlight_rects[0], DocRect::new(0.0, 790.0, 10.0, 10.0));
        assert_eq!(loc.highlight_rects[1], DocRect::new(20.0, 775.0, 5.0, 5.0));
    }

    #[test]
    fn text_preset_is_looser_than_region() {
        let thin = RenderRect::new(10.0, 10.0, 3.0, 4.0);
        let text = RectSetNormalizer::new(NormalizerConfig::text_lines());
        assert!(text.normalize(&[thin], &page_800x600()).is_some());
        assert!(region().normalize(&[thin], &page_800x600()).is_none());
    }

    #[test]
    fn scrolled_content_makes_rects_content_relative() {
        let page = PageGeometry::scrolled_content(RenderPoint::new(0.0, 400.0), 900.0, 3000.0);
        let n = region()
            .normalize(&[RenderRect::new(20.0, 30.0, 100.0, 40.0)], &page)
            .unwrap();
        assert_eq!(n.rect, RenderRect::new(20.0, 430.0, 100.0, 40.0));
    }
}
