//! Highlight and location types

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::coords::DocRect;

/// Where a selection lives on a document, independent of zoom.
///
/// `rect` is the tight bounding box of `highlight_rects` whenever the
/// latter is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLocation {
    pub page_index: usize,
    pub rect: DocRect,
    #[serde(default)]
    pub highlight_rects: Vec<DocRect>,
}

impl DocumentLocation {
    /// A location described by its bounding box alone
    #[must_use]
    pub fn from_rect(page_index: usize, rect: DocRect) -> Self {
        Self {
            page_index,
            rect,
            highlight_rects: Vec::new(),
        }
    }

    /// A location over several line rectangles; `None` when `rects` is empty
    #[must_use]
    pub fn from_rects(page_index: usize, rects: Vec<DocRect>) -> Option<Self> {
        let rect = DocRect::bounding(&rects)?;
        Some(Self {
            page_index,
            rect,
            highlight_rects: rects,
        })
    }

    /// The rectangles to paint: the line rectangles, or the bounding box
    /// when there are none
    #[must_use]
    pub fn paint_rects(&self) -> Vec<DocRect> {
        if self.highlight_rects.is_empty() {
            vec![self.rect]
        } else {
            self.highlight_rects.clone()
        }
    }

    /// Whether `rect` is still the bounding box of `highlight_rects`
    #[must_use]
    pub fn is_consistent(&self, tolerance: f64) -> bool {
        match DocRect::bounding(&self.highlight_rects) {
            Some(bounds) => bounds.approx_eq(&self.rect, tolerance),
            None => true,
        }
    }
}

/// Advisory highlight color. Geometry never depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HighlightColor {
    /// Artifact created but not yet placed on the canvas
    #[default]
    Staged,
    /// Artifact placed on the canvas
    Placed,
    Custom(String),
}

impl HighlightColor {
    pub const STAGED: &'static str = "rgba(250, 204, 21, 0.35)";
    pub const PLACED: &'static str = "rgba(59, 130, 246, 0.30)";

    pub fn as_css(&self) -> &str {
        match self {
            HighlightColor::Staged => Self::STAGED,
            HighlightColor::Placed => Self::PLACED,
            HighlightColor::Custom(css) => css,
        }
    }

    pub fn from_css(css: &str) -> Self {
        match css {
            Self::STAGED => HighlightColor::Staged,
            Self::PLACED => HighlightColor::Placed,
            other => HighlightColor::Custom(other.to_string()),
        }
    }
}

impl Serialize for HighlightColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_css())
    }
}

impl<'de> Deserialize<'de> for HighlightColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let css = String::deserialize(deserializer)?;
        Ok(HighlightColor::from_css(&css))
    }
}

/// A renderable set of document-space rectangles. `id` is the id of the
/// artifact it visualizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub id: String,
    pub document_id: String,
    pub page_index: usize,
    pub rects: Vec<DocRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HighlightColor>,
}

impl Highlight {
    #[must_use]
    pub fn from_location(
        id: impl Into<String>,
        document_id: impl Into<String>,
        location: &DocumentLocation,
    ) -> Self {
        Self {
            id: id.into(),
            document_id: document_id.into(),
            page_index: location.page_index,
            rects: location.paint_rects(),
            color: Some(HighlightColor::Staged),
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Option<DocRect> {
        DocRect::bounding(&self.rects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rects_computes_bounding_box() {
        let loc = DocumentLocation::from_rects(
            0,
            vec![
                DocRect::new(0.0, 0.0, 10.0, 10.0),
                DocRect::new(20.0, 20.0, 5.0, 5.0),
            ],
        )
        .unwrap();
        assert_eq!(loc.rect, DocRect::new(0.0, 0.0, 25.0, 25.0));
        assert!(loc.is_consistent(1e-9));
    }

    #[test]
    fn from_rects_rejects_empty_set() {
        assert!(DocumentLocation::from_rects(0, vec![]).is_none());
    }

    #[test]
    fn highlight_falls_back_to_bounding_rect() {
        let loc = DocumentLocation::from_rect(2, DocRect::new(1.0, 2.0, 3.0, 4.0));
        let h = Highlight::from_location("a1", "doc.pdf", &loc);
        assert_eq!(h.rects, vec![DocRect::new(1.0, 2.0, 3.0, 4.0)]);
        assert_eq!(h.page_index, 2);
        assert_eq!(h.color, Some(HighlightColor::Staged));
    }

    #[test]
    fn location_uses_camel_case_on_the_wire() {
        let loc = DocumentLocation::from_rect(1, DocRect::new(0.0, 0.0, 1.0, 1.0));
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(json["pageIndex"], 1);
        assert!(json["highlightRects"].as_array().unwrap().is_empty());
    }

    #[test]
    fn color_serializes_as_plain_css() {
        let json = serde_json::to_string(&HighlightColor::Placed).unwrap();
        assert_eq!(json, format!("\"{}\"", HighlightColor::PLACED));
        let custom: HighlightColor = serde_json::from_str("\"#ff0000\"").unwrap();
        assert_eq!(custom, HighlightColor::Custom("#ff0000".into()));
        let staged: HighlightColor =
            serde_json::from_str(&format!("\"{}\"", HighlightColor::STAGED)).unwrap();
        assert_eq!(staged, HighlightColor::Staged);
    }
}
