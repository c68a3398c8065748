//! Drag-based region selection
//!
//! `Idle -> Selecting -> (finished | cancelled) -> Idle`. One controller per
//! surface; it runs on the UI thread and never blocks.

use log::debug;

use crate::coords::{RenderPoint, RenderRect};

/// Live state between pointer-down and pointer-up
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelectionSession {
    pub page_index: usize,
    /// Anchor of the drag
    pub start_point: RenderPoint,
    /// Box spanning the anchor and the latest pointer position
    pub current_rect: RenderRect,
}

/// A completed drag, still in render space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FinishedRegion {
    pub page_index: usize,
    pub rect: RenderRect,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SelectionPhase {
    #[default]
    Idle,
    Selecting(SelectionSession),
}

#[derive(Debug, Default)]
pub struct SelectionController {
    phase: SelectionPhase,
}

impl SelectionController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a drag at `point`. Starting again while a drag is active
    /// throws the old drag away.
    pub fn start(&mut self, page_index: usize, point: RenderPoint) {
        if self.is_active() {
            debug!("Restarting region selection on page {page_index}");
        }
        self.phase = SelectionPhase::Selecting(SelectionSession {
            page_index,
            start_point: point,
            current_rect: RenderRect::new(point.x, point.y, 0.0, 0.0),
        });
    }

    /// Move the free corner. Returns the updated box, or `None` when idle.
    pub fn update(&mut self, point: RenderPoint) -> Option<RenderRect> {
        match &mut self.phase {
            SelectionPhase::Selecting(session) => {
                session.current_rect = RenderRect::from_corners(session.start_point, point);
                Some(session.current_rect)
            }
            SelectionPhase::Idle => None,
        }
    }

    /// End the drag and hand back the last box
    pub fn finish(&mut self) -> Option<FinishedRegion> {
        match std::mem::take(&mut self.phase) {
            SelectionPhase::Selecting(session) => Some(FinishedRegion {
                page_index: session.page_index,
                rect: session.current_rect,
            }),
            SelectionPhase::Idle => None,
        }
    }

    /// Drop the drag without producing anything (e.g. pointer left the surface)
    pub fn cancel(&mut self) {
        if self.is_active() {
            debug!("Region selection cancelled");
        }
        self.phase = SelectionPhase::Idle;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.phase, SelectionPhase::Selecting(_))
    }

    #[must_use]
    pub fn session(&self) -> Option<&SelectionSession> {
        match &self.phase {
            SelectionPhase::Selecting(session) => Some(session),
            SelectionPhase::Idle => None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SelectionPhase {
        self.phase
    }
}
