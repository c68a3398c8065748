//! Wire messages between the host and an embedded surface
//!
//! ```text
//! { type: "UPDATE_HIGHLIGHTS", highlights: [{id, rects, color?}], activeHighlightId }
//! { type: "TEXT_SELECTION", payload: { text, boundingRect, scrollPosition, pageHeight, pageWidth } }
//! { type: "SELECTION_READY" }
//! ```

use serde::{Deserialize, Serialize};

use crate::coords::{RenderPoint, RenderRect};

/// One highlight as the surface paints it: render space at scale 1.0,
/// content-relative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireHighlight {
    pub id: String,
    pub rects: Vec<RenderRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightUpdate {
    pub highlights: Vec<WireHighlight>,
    pub active_highlight_id: Option<String>,
}

/// Host to surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostMessage {
    #[serde(rename = "UPDATE_HIGHLIGHTS")]
    UpdateHighlights(HighlightUpdate),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSelectionPayload {
    pub text: String,
    /// Surface-local, excludes scroll
    pub bounding_rect: RenderRect,
    pub scroll_position: RenderPoint,
    pub page_height: f64,
    pub page_width: f64,
}

/// Surface to host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SurfaceMessage {
    /// Sent once the surface's listener is installed
    #[serde(rename = "SELECTION_READY", alias = "READY")]
    SelectionReady,
    #[serde(rename = "TEXT_SELECTION")]
    TextSelection { payload: TextSelectionPayload },
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed surface message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("failed to post message: {detail}")]
    Send { detail: String },
}

impl ProtocolError {
    pub fn send(msg: impl Into<String>) -> Self {
        Self::Send {
            detail: msg.into(),
        }
    }
}

impl HostMessage {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl SurfaceMessage {
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn update_highlights_wire_shape() {
        let msg = HostMessage::UpdateHighlights(HighlightUpdate {
            highlights: vec![WireHighlight {
                id: "h1".into(),
                rects: vec![RenderRect::new(1.0, 2.0, 3.0, 4.0)],
                color: None,
            }],
            active_highlight_id: None,
        });
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "UPDATE_HIGHLIGHTS",
                "highlights": [{"id": "h1", "rects": [{"x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0}]}],
                "activeHighlightId": null
            })
        );
    }

    #[test]
    fn parses_text_selection() {
        let raw = r#"{"type":"TEXT_SELECTION","payload":{"text":"hello world",
            "boundingRect":{"x":10,"y":20,"width":100,"height":16},
            "scrollPosition":{"x":0,"y":250},"pageHeight":4000,"pageWidth":960}}"#;
        let SurfaceMessage::TextSelection { payload } = SurfaceMessage::parse(raw).unwrap() else {
            panic!("expected TEXT_SELECTION");
        };
        assert_eq!(payload.text, "hello world");
        assert_eq!(payload.bounding_rect, RenderRect::new(10.0, 20.0, 100.0, 16.0));
        assert_eq!(payload.scroll_position, RenderPoint::new(0.0, 250.0));
        assert_eq!(payload.page_height, 4000.0);
    }

    #[test]
    fn ready_accepts_both_spellings() {
        assert_eq!(
            SurfaceMessage::parse(r#"{"type":"SELECTION_READY"}"#).unwrap(),
            SurfaceMessage::SelectionReady
        );
        assert_eq!(
            SurfaceMessage::parse(r#"{"type":"READY"}"#).unwrap(),
            SurfaceMessage::SelectionReady
        );
        assert_eq!(
            SurfaceMessage::SelectionReady.to_json().unwrap(),
            r#"{"type":"SELECTION_READY"}"#
        );
    }

    #[test]
    fn unknown_message_is_malformed() {
        assert!(matches!(
            SurfaceMessage::parse(r#"{"type":"RESIZE"}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }
}
