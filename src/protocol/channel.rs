//! Host side of the highlight channel
//!
//! The embedded surface cannot be scripted, only messaged, and it says
//! when it is listening. Until then every publish overwrites a one-slot
//! outbox; the newest payload is flushed on readiness. Sends are
//! fire-and-forget.

use log::{debug, info, warn};

use super::message::{
    HighlightUpdate, HostMessage, ProtocolError, SurfaceMessage, TextSelectionPayload,
    WireHighlight,
};
use crate::coords::rect_to_render;
use crate::highlight::Highlight;

/// Transport into one embedded surface (e.g. a `postMessage` bridge)
pub trait SurfacePort {
    fn post(&mut self, message: &HostMessage) -> Result<(), ProtocolError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelState {
    #[default]
    NotReady,
    Ready,
}

pub struct HighlightChannel<P: SurfacePort> {
    port: P,
    state: ChannelState,
    document_id: String,
    /// Content height used to flip document rects back to render space
    page_height: f64,
    /// Newest payload, flushed on readiness and re-flushed after a reload
    latest: Option<HighlightUpdate>,
}

impl<P: SurfacePort> HighlightChannel<P> {
    pub fn new(port: P, document_id: impl Into<String>, page_height: f64) -> Self {
        Self {
            port,
            state: ChannelState::NotReady,
            document_id: document_id.into(),
            page_height,
            latest: None,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ChannelState::Ready
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn page_height(&self) -> f64 {
        self.page_height
    }

    pub fn set_page_height(&mut self, page_height: f64) {
        self.page_height = page_height;
    }

    /// The newest payload, whether or not it has been delivered
    pub fn latest(&self) -> Option<&HighlightUpdate> {
        self.latest.as_ref()
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    /// Push the current highlight set. Highlights for other documents are
    /// left out.
    pub fn publish<'a>(
        &mut self,
        highlights: impl IntoIterator<Item = &'a Highlight>,
        active_highlight_id: Option<&str>,
    ) {
        let update = self.build_update(highlights, active_highlight_id);
        self.latest = Some(update);
        match self.state {
            ChannelState::Ready => self.flush(),
            ChannelState::NotReady => {
                debug!(
                    "Surface for {} not ready, buffering highlight update",
                    self.document_id
                );
            }
        }
    }

    /// The surface is loading new content; wait for a fresh READY
    pub fn surface_navigated(&mut self) {
        debug!("Surface for {} navigated, awaiting READY", self.document_id);
        self.state = ChannelState::NotReady;
    }

    /// Parse and dispatch a raw message from the surface
    pub fn handle_raw(&mut self, raw: &str) -> Result<Option<TextSelectionPayload>, ProtocolError> {
        let message = SurfaceMessage::parse(raw)?;
        Ok(self.handle(message))
    }

    /// Dispatch a message from the surface. Returns the selection report
    /// for `TEXT_SELECTION`.
    pub fn handle(&mut self, message: SurfaceMessage) -> Option<TextSelectionPayload> {
        match message {
            SurfaceMessage::SelectionReady => {
                if self.is_ready() {
                    // Surface reloaded without us seeing the navigation
                    warn!("Repeated READY from surface for {}", self.document_id);
                } else {
                    info!("Surface for {} is ready", self.document_id);
                }
                self.state = ChannelState::Ready;
                self.flush();
                None
            }
            SurfaceMessage::TextSelection { payload } => {
                if payload.page_height > 0.0 {
                    self.page_height = payload.page_height;
                }
                Some(payload)
            }
        }
    }

    fn flush(&mut self) {
        let Some(update) = self.latest.clone() else {
            return;
        };
        let count = update.highlights.len();
        let message = HostMessage::UpdateHighlights(update);
        match self.port.post(&message) {
            Ok(()) => debug!("Sent {count} highlights to {}", self.document_id),
            Err(e) => warn!("Highlight update for {} not delivered: {e}", self.document_id),
        }
    }

    fn build_update<'a>(
        &self,
        highlights: impl IntoIterator<Item = &'a Highlight>,
        active_highlight_id: Option<&str>,
    ) -> HighlightUpdate {
        let highlights = highlights
            .into_iter()
            .filter(|h| h.document_id == self.document_id)
            .map(|h| WireHighlight {
                id: h.id.clone(),
                rects: h
                    .rects
                    .iter()
                    .map(|r| rect_to_render(*r, self.page_height, 1.0))
                    .collect(),
                color: h.color.as_ref().map(|c| c.as_css().to_string()),
            })
            .collect();
        HighlightUpdate {
            highlights,
            active_highlight_id: active_highlight_id.map(str::to_string),
        }
    }
}
