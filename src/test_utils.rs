pub mod test_helpers {
    use std::cell::{Cell, RefCell};
    use std::future::{self, Future};
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use image::{Rgba, RgbaImage};

    use crate::capture::{CaptureError, RasterSource};
    use crate::coords::{RenderPoint, RenderRect};
    use crate::emphasis::Clock;
    use crate::highlight::{ArtifactKind, ArtifactStore, StoreError};
    use crate::protocol::{EmbeddedSurface, HostMessage, ProtocolError, SurfacePort};
    use crate::selection::{NativeSelection, SelectionSurface, SurfaceId};
    use crate::viewer::Navigator;

    /// Clock that only moves when told to
    #[derive(Debug)]
    pub struct ManualClock {
        base: Instant,
        elapsed: Cell<Duration>,
    }

    impl ManualClock {
        pub fn new() -> Self {
            Self {
                base: Instant::now(),
                elapsed: Cell::new(Duration::ZERO),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.elapsed.set(self.elapsed.get() + by);
        }

        /// Jump to an absolute offset from creation
        pub fn set_elapsed(&self, elapsed: Duration) {
            self.elapsed.set(elapsed);
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + self.elapsed.get()
        }
    }

    /// Port that keeps every message it was asked to send
    #[derive(Debug, Default)]
    pub struct RecordingPort {
        pub sent: Vec<HostMessage>,
        fail: bool,
    }

    impl RecordingPort {
        /// A port whose every send fails
        pub fn failing() -> Self {
            Self {
                sent: Vec::new(),
                fail: true,
            }
        }
    }

    impl SurfacePort for RecordingPort {
        fn post(&mut self, message: &HostMessage) -> Result<(), ProtocolError> {
            if self.fail {
                return Err(ProtocolError::send("surface window closed"));
            }
            self.sent.push(message.clone());
            Ok(())
        }
    }

    /// Port that delivers straight into an in-process surface, going
    /// through the JSON wire form on the way
    #[derive(Debug, Clone, Default)]
    pub struct LoopbackPort {
        pub surface: Rc<RefCell<EmbeddedSurface>>,
    }

    impl LoopbackPort {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl SurfacePort for LoopbackPort {
        fn post(&mut self, message: &HostMessage) -> Result<(), ProtocolError> {
            let raw = message.to_json()?;
            self.surface.borrow_mut().receive_raw(&raw)
        }
    }

    /// Selection surface holding at most one canned selection
    #[derive(Debug, Default)]
    pub struct FakeSelectionSurface {
        pub selection: Option<NativeSelection>,
        pub cleared: bool,
    }

    impl FakeSelectionSurface {
        pub fn with_selection(selection: NativeSelection) -> Self {
            Self {
                selection: Some(selection),
                cleared: false,
            }
        }

        /// A selection of `text` on `surface`, one rect per line, on a page
        /// element at the viewport origin
        pub fn with_lines(
            surface: SurfaceId,
            page_index: usize,
            text: &str,
            page_rect: RenderRect,
            lines: Vec<RenderRect>,
        ) -> Self {
            Self::with_selection(NativeSelection {
                text: text.to_string(),
                is_collapsed: false,
                anchor_surface: Some(surface),
                page_index,
                page_rect,
                client_rects: lines,
            })
        }
    }

    impl SelectionSurface for FakeSelectionSurface {
        fn current_selection(&self) -> Option<NativeSelection> {
            self.selection.clone()
        }

        fn clear_selection(&mut self) {
            self.selection = None;
            self.cleared = true;
        }
    }

    /// Raster source backed by an in-memory image
    #[derive(Debug)]
    pub struct SolidRaster {
        image: Option<RgbaImage>,
        dpr: f64,
        scroll: RenderPoint,
        calls: Cell<usize>,
    }

    impl SolidRaster {
        /// A uniformly grey raster of `width`x`height` device pixels
        pub fn new(width: u32, height: u32, dpr: f64) -> Self {
            Self::from_image(
                RgbaImage::from_pixel(width, height, Rgba([128, 128, 128, 255])),
                dpr,
            )
        }

        pub fn from_image(image: RgbaImage, dpr: f64) -> Self {
            Self {
                image: Some(image),
                dpr,
                scroll: RenderPoint::default(),
                calls: Cell::new(0),
            }
        }

        /// A surface that has not finished loading
        pub fn unavailable() -> Self {
            Self {
                image: None,
                dpr: 1.0,
                scroll: RenderPoint::default(),
                calls: Cell::new(0),
            }
        }

        pub fn with_scroll(mut self, scroll: RenderPoint) -> Self {
            self.scroll = scroll;
            self
        }

        pub fn rasterize_calls(&self) -> usize {
            self.calls.get()
        }
    }

    impl RasterSource for SolidRaster {
        fn device_pixel_ratio(&self) -> f64 {
            self.dpr
        }

        fn scroll_offset(&self) -> RenderPoint {
            self.scroll
        }

        fn rasterize(&self) -> impl Future<Output = Result<RgbaImage, CaptureError>> {
            self.calls.set(self.calls.get() + 1);
            future::ready(
                self.image
                    .clone()
                    .ok_or_else(|| CaptureError::unavailable("surface has not loaded")),
            )
        }
    }

    /// Navigator that remembers every page request. Clones share the log.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingNavigator {
        visits: Rc<RefCell<Vec<(String, usize)>>>,
    }

    impl RecordingNavigator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn visits(&self) -> Vec<(String, usize)> {
            self.visits.borrow().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn goto_page(&mut self, document_id: &str, page_index: usize) {
            self.visits
                .borrow_mut()
                .push((document_id.to_string(), page_index));
        }
    }

    /// Artifact store that refuses every write
    #[derive(Debug, Default)]
    pub struct FailingArtifactStore;

    impl ArtifactStore for FailingArtifactStore {
        fn create_artifact(
            &mut self,
            _document_id: Option<&str>,
            _kind: ArtifactKind,
        ) -> Result<String, StoreError> {
            Err(StoreError::backend("disk full"))
        }

        fn delete_artifact(&mut self, id: &str) -> Result<(), StoreError> {
            Err(StoreError::NotFound { id: id.to_string() })
        }
    }
}
