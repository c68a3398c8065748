//! Turning pointer input on a rendering surface into selections

mod native;
mod region;

pub use native::{
    AdapterConfig, NativeSelection, NativeSelectionAdapter, SelectionSurface, SurfaceId,
    SurfaceKind, TextSnippet,
};
pub use region::{FinishedRegion, SelectionController, SelectionPhase, SelectionSession};
