pub mod capture;
pub mod coords;
pub mod emphasis;
pub mod highlight;
pub mod panic_handler;
pub mod protocol;
pub mod selection;
pub mod settings;
pub mod viewer;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use coords::{DocRect, RenderPoint, RenderRect};
pub use highlight::{DocumentLocation, Highlight};
pub use viewer::{DocumentViewer, Navigator, ViewerConfig, ViewerError};
