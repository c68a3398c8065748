//! Document-viewing context
//!
//! Wires selection, capture, the highlight channel and the emphasis timer
//! to the host's collaborators. This is the surface the rest of an
//! application talks to: it registers callbacks, reads the highlight list,
//! and asks to jump back to a highlight's source.

use std::time::Duration;

use log::{debug, error, info, warn};

use crate::capture::{CaptureConfig, CaptureError, ImageBlob, RasterSource, RegionRasterizer};
use crate::coords::{NormalizerConfig, PageGeometry, RectSetNormalizer, RenderPoint, RenderRect};
use crate::emphasis::{Clock, EmphasisTimer};
use crate::highlight::{
    Artifact, ArtifactKind, ArtifactStore, DocumentLocation, Highlight, HighlightColor,
    HighlightStore, StoreError,
};
use crate::protocol::{HighlightChannel, ProtocolError, SurfacePort};
use crate::selection::{
    AdapterConfig, NativeSelectionAdapter, SelectionController, SelectionSurface, SurfaceId,
    SurfaceKind, TextSnippet,
};
use crate::settings;

/// Scrolls or paginates a document so a page is in view
pub trait Navigator {
    fn goto_page(&mut self, document_id: &str, page_index: usize);
}

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("artifact store: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewerConfig {
    pub surface: SurfaceId,
    pub surface_kind: SurfaceKind,
    pub adapter: AdapterConfig,
    pub region: NormalizerConfig,
    pub capture: CaptureConfig,
    pub emphasis: Duration,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceId(0),
            surface_kind: SurfaceKind::PaginatedDocument,
            adapter: AdapterConfig::default(),
            region: NormalizerConfig::region(),
            capture: CaptureConfig::default(),
            emphasis: Duration::from_millis(3000),
        }
    }
}

impl ViewerConfig {
    pub fn from_settings(surface: SurfaceId, surface_kind: SurfaceKind) -> Self {
        Self {
            surface,
            surface_kind,
            adapter: AdapterConfig::from_settings(),
            region: NormalizerConfig::region_from_settings(),
            capture: CaptureConfig::from_settings(),
            emphasis: Duration::from_millis(settings::current().emphasis_duration_ms),
        }
    }
}

type SelectionCallback = Box<dyn FnMut(&DocumentLocation)>;
type CaptureCallback = Box<dyn FnMut(&ImageBlob, &DocumentLocation)>;

pub struct DocumentViewer<P: SurfacePort, C: Clock> {
    document_id: String,
    store: Box<dyn ArtifactStore>,
    navigator: Box<dyn Navigator>,
    highlights: HighlightStore,
    channel: Option<HighlightChannel<P>>,
    emphasis: EmphasisTimer<C>,
    region: SelectionController,
    region_normalizer: RectSetNormalizer,
    native: NativeSelectionAdapter,
    rasterizer: RegionRasterizer,
    selection_listeners: Vec<SelectionCallback>,
    capture_listeners: Vec<CaptureCallback>,
}

impl<P: SurfacePort, C: Clock> DocumentViewer<P, C> {
    pub fn new(
        document_id: impl Into<String>,
        store: Box<dyn ArtifactStore>,
        navigator: Box<dyn Navigator>,
        clock: C,
        config: ViewerConfig,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            store,
            navigator,
            highlights: HighlightStore::new(),
            channel: None,
            emphasis: EmphasisTimer::new(clock, config.emphasis),
            region: SelectionController::new(),
            region_normalizer: RectSetNormalizer::new(config.region),
            native: NativeSelectionAdapter::new(
                config.surface,
                config.surface_kind,
                config.adapter,
            ),
            rasterizer: RegionRasterizer::new(config.capture),
            selection_listeners: Vec::new(),
            capture_listeners: Vec::new(),
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Switch to another document. Any drag in progress is dropped and the
    /// embedded surface, which belonged to the old document, is detached.
    pub fn open_document(&mut self, document_id: impl Into<String>) {
        self.document_id = document_id.into();
        self.region.cancel();
        if self.channel.take().is_some() {
            debug!("Detached surface channel on switch to {}", self.document_id);
        }
    }

    /// Rebuild highlights from persisted artifacts
    pub fn restore<'a>(&mut self, artifacts: impl IntoIterator<Item = &'a Artifact>) {
        let mut restored = 0;
        for artifact in artifacts {
            let (Some(document_id), Some(location)) =
                (artifact.document_id.as_deref(), artifact.kind.location())
            else {
                continue;
            };
            let mut highlight = Highlight::from_location(&artifact.id, document_id, location);
            highlight.color = Some(HighlightColor::Placed);
            self.highlights.insert(highlight);
            restored += 1;
        }
        debug!("Restored {restored} highlights");
        self.publish();
    }

    // Read model

    pub fn highlights(&self) -> &[Highlight] {
        self.highlights.all()
    }

    pub fn highlights_for<'a>(&'a self, document_id: &'a str) -> impl Iterator<Item = &'a Highlight> {
        self.highlights.for_document(document_id)
    }

    pub fn active_highlight_id(&self) -> Option<&str> {
        self.emphasis.active_id()
    }

    pub fn channel(&self) -> Option<&HighlightChannel<P>> {
        self.channel.as_ref()
    }

    // Callback registration

    pub fn on_selection_finished(&mut self, callback: impl FnMut(&DocumentLocation) + 'static) {
        self.selection_listeners.push(Box::new(callback));
    }

    pub fn on_region_captured(
        &mut self,
        callback: impl FnMut(&ImageBlob, &DocumentLocation) + 'static,
    ) {
        self.capture_listeners.push(Box::new(callback));
    }

    // Embedded surface

    /// Connect the embedded surface showing the current document. The
    /// current highlight set is queued until the surface reports READY.
    pub fn attach_surface(&mut self, port: P, page_height: f64) {
        let mut channel = HighlightChannel::new(port, self.document_id.clone(), page_height);
        channel.publish(self.highlights.all(), self.emphasis.active_id());
        self.channel = Some(channel);
    }

    pub fn detach_surface(&mut self) -> Option<P> {
        self.channel.take().map(HighlightChannel::into_port)
    }

    /// The embedded surface started loading new content
    pub fn surface_navigated(&mut self) {
        if let Some(channel) = self.channel.as_mut() {
            channel.surface_navigated();
        }
    }

    pub fn set_page_height(&mut self, page_height: f64) {
        if let Some(channel) = self.channel.as_mut() {
            channel.set_page_height(page_height);
        }
    }

    /// Handle a raw message from the embedded surface. A `TEXT_SELECTION`
    /// becomes a snippet; the new artifact id is returned.
    pub fn handle_surface_message(&mut self, raw: &str) -> Result<Option<String>, ViewerError> {
        let Some(channel) = self.channel.as_mut() else {
            warn!("Surface message with no surface attached");
            return Ok(None);
        };
        let Some(report) = channel.handle_raw(raw).inspect_err(|e| {
            warn!("Unparseable surface message: {e}");
        })?
        else {
            return Ok(None);
        };
        match self.native.on_surface_report(&report) {
            Some(snippet) => self.create_snippet(snippet).map(Some),
            None => Ok(None),
        }
    }

    // Native text selection

    /// Pointer released over the owned surface at zoom `scale`
    pub fn handle_native_selection<S>(
        &mut self,
        surface: &mut S,
        scale: f64,
    ) -> Result<Option<String>, ViewerError>
    where
        S: SelectionSurface + ?Sized,
    {
        match self.native.on_pointer_released(surface, scale) {
            Some(snippet) => self.create_snippet(snippet).map(Some),
            None => Ok(None),
        }
    }

    // Region selection

    pub fn begin_region(&mut self, page_index: usize, point: RenderPoint) {
        self.region.start(page_index, point);
    }

    pub fn drag_region(&mut self, point: RenderPoint) -> Option<RenderRect> {
        self.region.update(point)
    }

    /// Pointer left the surface
    pub fn cancel_region(&mut self) {
        self.region.cancel();
    }

    pub fn is_selecting(&self) -> bool {
        self.region.is_active()
    }

    /// Finish a drag as a region selection. Listeners get the location;
    /// persisting it is up to them.
    pub fn finish_region(&mut self, page: &PageGeometry) -> Option<DocumentLocation> {
        let finished = self.region.finish()?;
        let location = self
            .region_normalizer
            .locate(finished.page_index, &[finished.rect], page)?;
        self.notify_selection(&location);
        Some(location)
    }

    /// Finish a drag as a region capture of `source`.
    ///
    /// `Ok(None)` for drags below the capture minimum or covering too much
    /// of the page; neither renders anything. On failure nothing is stored
    /// and the highlight list is unchanged.
    pub async fn finish_capture<S>(
        &mut self,
        source: &S,
        page: &PageGeometry,
    ) -> Result<Option<String>, ViewerError>
    where
        S: RasterSource + ?Sized,
    {
        let Some(finished) = self.region.finish() else {
            return Ok(None);
        };
        let Some(location) = self
            .region_normalizer
            .locate(finished.page_index, &[finished.rect], page)
        else {
            debug!("Capture region rejected before rendering");
            return Ok(None);
        };
        let Some(image) = self.rasterizer.capture(source, finished.rect).await? else {
            return Ok(None);
        };

        let id = self.store.create_artifact(
            Some(&self.document_id),
            ArtifactKind::ImageCapture {
                image: image.clone(),
                location: location.clone(),
            },
        )?;
        self.highlights
            .insert(Highlight::from_location(&id, &self.document_id, &location));
        self.publish();
        for listener in &mut self.capture_listeners {
            listener(&image, &location);
        }
        Ok(Some(id))
    }

    // Artifact lifecycle

    /// Delete an artifact and its highlight
    pub fn remove_artifact(&mut self, id: &str) -> Result<(), ViewerError> {
        self.store.delete_artifact(id)?;
        self.highlights.remove(id);
        if self.emphasis.active_id() == Some(id) {
            self.emphasis.clear();
        }
        self.publish();
        Ok(())
    }

    /// The canvas has taken the artifact; recolor its highlight
    pub fn mark_placed(&mut self, id: &str) -> bool {
        let changed = self.highlights.set_color(id, HighlightColor::Placed);
        if changed {
            self.publish();
        }
        changed
    }

    // Reverse navigation

    /// Bring a highlight into view and emphasize it. Returns false when the
    /// highlight is unknown.
    pub fn jump_to_source(&mut self, document_id: &str, highlight_id: &str) -> bool {
        let Some(highlight) = self
            .highlights
            .get(highlight_id)
            .filter(|h| h.document_id == document_id)
        else {
            warn!("No highlight {highlight_id} in {document_id} to jump to");
            return false;
        };
        let page_index = highlight.page_index;
        self.emphasis.arm(highlight_id);
        self.navigator.goto_page(document_id, page_index);
        info!("Jumped to {highlight_id} on page {page_index} of {document_id}");
        self.publish();
        true
    }

    /// Advance time-based state. Returns true when the emphasis expired.
    pub fn tick(&mut self) -> bool {
        let expired = self.emphasis.tick();
        if expired {
            self.publish();
        }
        expired
    }

    fn create_snippet(&mut self, snippet: TextSnippet) -> Result<String, ViewerError> {
        let TextSnippet { text, location } = snippet;
        let id = self
            .store
            .create_artifact(
                Some(&self.document_id),
                ArtifactKind::Snippet {
                    text,
                    location: location.clone(),
                },
            )
            .inspect_err(|e| error!("Snippet not saved: {e}"))?;
        self.highlights
            .insert(Highlight::from_location(&id, &self.document_id, &location));
        self.publish();
        self.notify_selection(&location);
        Ok(id)
    }

    fn notify_selection(&mut self, location: &DocumentLocation) {
        for listener in &mut self.selection_listeners {
            listener(location);
        }
    }

    fn publish(&mut self) {
        let active = self.emphasis.active_id();
        if let Some(channel) = self.channel.as_mut() {
            channel.publish(self.highlights.all(), active);
        }
    }
}
