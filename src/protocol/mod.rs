//! Message protocol between the host and isolated rendering surfaces

mod channel;
mod message;
mod surface;

pub use channel::{ChannelState, HighlightChannel, SurfacePort};
pub use message::{
    HighlightUpdate, HostMessage, ProtocolError, SurfaceMessage, TextSelectionPayload,
    WireHighlight,
};
pub use surface::{EmbeddedSurface, OverlayBox};
