//! Coordinate reconciliation between document and render space

mod normalize;
mod space;

pub use normalize::{NormalizedRects, NormalizerConfig, PageGeometry, RectSetNormalizer};
pub use space::*;
