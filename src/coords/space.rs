//! Document space and render space
//!
//! Document space is intrinsic to a page: origin bottom-left, y grows
//! upward, always stored at scale 1.0. Render space is whatever surface is
//! currently displaying the page: origin top-left, y grows downward,
//! multiplied by the active zoom factor.
//!
//! The two spaces get separate types so the conversions below are the only
//! way to move a rectangle from one to the other.

use serde::{Deserialize, Serialize};

/// Map a document-space x coordinate to render space
#[inline]
#[must_use]
pub fn to_render_x(doc_x: f64, scale: f64) -> f64 {
    doc_x * scale
}

/// Map a render-space x coordinate to document space
#[inline]
#[must_use]
pub fn to_document_x(render_x: f64, scale: f64) -> f64 {
    render_x / scale
}

/// Map a document-space y coordinate to render space (flips the axis)
#[inline]
#[must_use]
pub fn to_render_y(doc_y: f64, page_height: f64, scale: f64) -> f64 {
    (page_height - doc_y) * scale
}

/// Map a render-space y coordinate to document space (flips the axis)
#[inline]
#[must_use]
pub fn to_document_y(render_y: f64, page_height: f64, scale: f64) -> f64 {
    page_height - render_y / scale
}

/// Convert a document rectangle to render space.
///
/// Document rects anchor at their bottom edge, render rects at their top
/// edge, so the top edge (`y + height`) is what gets flipped.
#[must_use]
pub fn rect_to_render(rect: DocRect, page_height: f64, scale: f64) -> RenderRect {
    RenderRect {
        x: to_render_x(rect.x, scale),
        y: to_render_y(rect.y + rect.height, page_height, scale),
        width: rect.width * scale,
        height: rect.height * scale,
    }
}

/// Convert a render rectangle back to document space, anchoring at the
/// bottom edge again.
#[must_use]
pub fn rect_to_document(rect: RenderRect, page_height: f64, scale: f64) -> DocRect {
    let height = rect.height / scale;
    DocRect {
        x: to_document_x(rect.x, scale),
        y: to_document_y(rect.y, page_height, scale) - height,
        width: rect.width / scale,
        height,
    }
}

/// A point in render space
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderPoint {
    pub x: f64,
    pub y: f64,
}

impl RenderPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn offset_by(self, other: RenderPoint) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

/// Shared geometry for both rectangle types. The space a rectangle lives
/// in is carried by its type, never by a field.
macro_rules! rect_geometry {
    ($name:ident) => {
        impl $name {
            /// Create a rectangle, clamping negative extents to zero
            #[must_use]
            pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
                Self {
                    x,
                    y,
                    width: width.max(0.0),
                    height: height.max(0.0),
                }
            }

            #[must_use]
            pub fn right(&self) -> f64 {
                self.x + self.width
            }

            #[must_use]
            pub fn far_y(&self) -> f64 {
                self.y + self.height
            }

            #[must_use]
            pub fn area(&self) -> f64 {
                self.width * self.height
            }

            /// True when either extent is zero
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.width <= 0.0 || self.height <= 0.0
            }

            /// Whether `other` lies entirely inside this rectangle
            #[must_use]
            pub fn contains(&self, other: &Self) -> bool {
                const EPS: f64 = 1e-9;
                other.x + EPS >= self.x
                    && other.y + EPS >= self.y
                    && other.right() <= self.right() + EPS
                    && other.far_y() <= self.far_y() + EPS
            }

            /// Tight union of two rectangles
            #[must_use]
            pub fn union(&self, other: &Self) -> Self {
                let x = self.x.min(other.x);
                let y = self.y.min(other.y);
                Self::new(
                    x,
                    y,
                    self.right().max(other.right()) - x,
                    self.far_y().max(other.far_y()) - y,
                )
            }

            /// Tight bounding box over a set, `None` for an empty set
            #[must_use]
            pub fn bounding<'a>(rects: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
                rects
                    .into_iter()
                    .copied()
                    .reduce(|acc, r| acc.union(&r))
            }

            /// Approximate equality, used by round-trip checks
            #[must_use]
            pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
                (self.x - other.x).abs() <= tolerance
                    && (self.y - other.y).abs() <= tolerance
                    && (self.width - other.width).abs() <= tolerance
                    && (self.height - other.height).abs() <= tolerance
            }
        }
    };
}

/// Rectangle in document space (origin bottom-left, `y` is the bottom edge)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Rectangle in render space (origin top-left, `y` is the top edge)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

rect_geometry!(DocRect);
rect_geometry!(RenderRect);

impl DocRect {
    #[must_use]
    pub fn to_render(self, page_height: f64, scale: f64) -> RenderRect {
        rect_to_render(self, page_height, scale)
    }
}

impl RenderRect {
    /// Axis-aligned box spanning two points, in whichever direction
    /// they were given
    #[must_use]
    pub fn from_corners(a: RenderPoint, b: RenderPoint) -> Self {
        Self::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (a.x - b.x).abs(),
            (a.y - b.y).abs(),
        )
    }

    #[must_use]
    pub fn origin(&self) -> RenderPoint {
        RenderPoint::new(self.x, self.y)
    }

    /// Translate so that `origin` becomes (0, 0)
    #[must_use]
    pub fn relative_to(self, origin: RenderPoint) -> Self {
        Self { x: self.x - origin.x, y: self.y - origin.y, ..self }
    }

    /// Translate by `offset`
    #[must_use]
    pub fn translated(self, offset: RenderPoint) -> Self {
        Self { x: self.x + offset.x, y: self.y + offset.y, ..self }
    }

    /// Divide every coordinate and extent by `scale`
    #[must_use]
    pub fn unscaled(self, scale: f64) -> Self {
        Self {
            x: self.x / scale,
            y: self.y / scale,
            width: self.width / scale,
            height: self.height / scale,
        }
    }

    #[must_use]
    pub fn to_document(self, page_height: f64, scale: f64) -> DocRect {
        rect_to_document(self, page_height, scale)
    }
}
