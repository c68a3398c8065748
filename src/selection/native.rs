//! Native text-selection adapter
//!
//! Listens for "selection changed, pointer released" on one rendering
//! surface and turns the platform selection into a document location.
//! Every rejection here is silent: this is a best-effort heuristic, not
//! form validation.

use log::debug;

use crate::coords::{NormalizerConfig, PageGeometry, RectSetNormalizer, RenderRect};
use crate::highlight::DocumentLocation;
use crate::protocol::TextSelectionPayload;
use crate::settings;

/// Identifies one rendering surface instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Paginated vector document (one element per page)
    PaginatedDocument,
    /// Embedded markup document (one scrolling page)
    EmbeddedMarkup,
}

/// Snapshot of the platform's current text selection
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NativeSelection {
    pub text: String,
    pub is_collapsed: bool,
    /// Surface that holds the selection anchor, if any
    pub anchor_surface: Option<SurfaceId>,
    pub page_index: usize,
    /// Bounds of the page element, same frame as `client_rects`
    pub page_rect: RenderRect,
    /// One rectangle per rendered line
    pub client_rects: Vec<RenderRect>,
}

/// Platform seam: whatever exposes the live selection of a surface
pub trait SelectionSurface {
    fn current_selection(&self) -> Option<NativeSelection>;

    /// Drop the platform selection so its UI does not linger
    fn clear_selection(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdapterConfig {
    /// Shorter selections are treated as accidental
    pub min_chars: usize,
    pub normalizer: NormalizerConfig,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            min_chars: 3,
            normalizer: NormalizerConfig::text_lines(),
        }
    }
}

impl AdapterConfig {
    #[must_use]
    pub fn from_settings() -> Self {
        Self {
            min_chars: settings::current().min_selection_chars,
            normalizer: NormalizerConfig::text_from_settings(),
        }
    }
}

/// Selected text plus where it lives
#[derive(Clone, Debug, PartialEq)]
pub struct TextSnippet {
    pub text: String,
    pub location: DocumentLocation,
}

#[derive(Debug)]
pub struct NativeSelectionAdapter {
    surface: SurfaceId,
    kind: SurfaceKind,
    min_chars: usize,
    normalizer: RectSetNormalizer,
}

impl NativeSelectionAdapter {
    #[must_use]
    pub fn new(surface: SurfaceId, kind: SurfaceKind, config: AdapterConfig) -> Self {
        Self {
            surface,
            kind,
            min_chars: config.min_chars,
            normalizer: RectSetNormalizer::new(config.normalizer),
        }
    }

    #[must_use]
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    #[must_use]
    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    /// Handle pointer release on the owned surface.
    ///
    /// `scale` is the surface's zoom at the moment of release. On success
    /// the platform selection is cleared.
    pub fn on_pointer_released<S>(&self, surface: &mut S, scale: f64) -> Option<TextSnippet>
    where
        S: SelectionSurface + ?Sized,
    {
        let selection = surface.current_selection()?;

        if !self.is_intentional(&selection.text, selection.is_collapsed) {
            return None;
        }

        if selection.anchor_surface != Some(self.surface) {
            debug!(
                "Ignoring selection anchored outside surface {:?}",
                self.surface
            );
            return None;
        }

        let page_index = match self.kind {
            SurfaceKind::PaginatedDocument => selection.page_index,
            SurfaceKind::EmbeddedMarkup => 0,
        };
        let page = PageGeometry::new(
            selection.page_rect.origin(),
            selection.page_rect.width,
            selection.page_rect.height,
            scale,
        );
        let location = self
            .normalizer
            .locate(page_index, &selection.client_rects, &page)?;

        surface.clear_selection();
        Some(TextSnippet {
            text: selection.text,
            location,
        })
    }

    /// Handle a selection reported from inside an isolated surface.
    ///
    /// The bounding rect arrives surface-local; adding the scroll position
    /// makes it content-relative, so the stored location does not depend on
    /// how far the surface happened to be scrolled.
    #[must_use]
    pub fn on_surface_report(&self, report: &TextSelectionPayload) -> Option<TextSnippet> {
        if !self.is_intentional(&report.text, false) {
            return None;
        }
        let rect = report.bounding_rect.translated(report.scroll_position);
        let page = PageGeometry::at_origin(report.page_width, report.page_height, 1.0);
        let location = self.normalizer.locate(0, &[rect], &page)?;
        Some(TextSnippet {
            text: report.text.clone(),
            location,
        })
    }

    fn is_intentional(&self, text: &str, collapsed: bool) -> bool {
        if collapsed {
            return false;
        }
        let chars = text.trim().chars().count();
        if chars < self.min_chars {
            debug!("Ignoring {chars}-character selection");
            return false;
        }
        true
    }
}
