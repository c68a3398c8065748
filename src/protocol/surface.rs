//! Surface side of the highlight channel
//!
//! What runs inside the isolated surface: it announces readiness once,
//! repaints its overlay from scratch on every update, and reports
//! completed selections back to the host.

use log::debug;

use super::message::{
    HighlightUpdate, HostMessage, ProtocolError, SurfaceMessage, TextSelectionPayload,
};
use crate::coords::{RenderPoint, RenderRect};

/// One painted overlay box, in viewport coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayBox {
    pub highlight_id: String,
    pub rect: RenderRect,
    pub active: bool,
    pub color: Option<String>,
}

#[derive(Debug, Default)]
pub struct EmbeddedSurface {
    scroll: RenderPoint,
    current: Option<HighlightUpdate>,
    overlays: Vec<OverlayBox>,
    ready_announced: bool,
    repaints: usize,
}

impl EmbeddedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The READY message, produced once per surface instance
    pub fn announce_ready(&mut self) -> Option<SurfaceMessage> {
        if self.ready_announced {
            return None;
        }
        self.ready_announced = true;
        Some(SurfaceMessage::SelectionReady)
    }

    pub fn receive(&mut self, message: &HostMessage) {
        match message {
            HostMessage::UpdateHighlights(update) => {
                self.current = Some(update.clone());
                self.repaint();
            }
        }
    }

    pub fn receive_raw(&mut self, raw: &str) -> Result<(), ProtocolError> {
        let message = HostMessage::parse(raw)?;
        self.receive(&message);
        Ok(())
    }

    /// Scrolling moves every overlay, so the overlay is rebuilt
    pub fn set_scroll(&mut self, scroll: RenderPoint) {
        self.scroll = scroll;
        if self.current.is_some() {
            self.repaint();
        }
    }

    pub fn scroll(&self) -> RenderPoint {
        self.scroll
    }

    /// Build the TEXT_SELECTION report for a selection made in the surface.
    /// `bounding_rect` is viewport-relative.
    pub fn report_selection(
        &self,
        text: impl Into<String>,
        bounding_rect: RenderRect,
        page_width: f64,
        page_height: f64,
    ) -> SurfaceMessage {
        SurfaceMessage::TextSelection {
            payload: TextSelectionPayload {
                text: text.into(),
                bounding_rect,
                scroll_position: self.scroll,
                page_height,
                page_width,
            },
        }
    }

    pub fn overlays(&self) -> &[OverlayBox] {
        &self.overlays
    }

    /// Payload the overlay was last painted from
    pub fn current(&self) -> Option<&HighlightUpdate> {
        self.current.as_ref()
    }

    pub fn repaint_count(&self) -> usize {
        self.repaints
    }

    fn repaint(&mut self) {
        self.overlays.clear();
        let Some(update) = &self.current else {
            return;
        };
        let viewport_origin = self.scroll;
        for highlight in &update.highlights {
            let active = update.active_highlight_id.as_deref() == Some(highlight.id.as_str());
            for rect in &highlight.rects {
                self.overlays.push(OverlayBox {
                    highlight_id: highlight.id.clone(),
                    rect: rect.relative_to(viewport_origin),
                    active,
                    color: highlight.color.clone(),
                });
            }
        }
        self.repaints += 1;
        debug!("Painted {} overlay boxes", self.overlays.len());
    }
}
