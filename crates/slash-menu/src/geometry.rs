use jotter_doc_core::CaretRect;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    #[default]
    BottomStart,
    BottomEnd,
    TopStart,
    TopEnd,
}

/// Reference box pinned to the caret. It reports zero width and height so
/// the panel lines up with the caret edge rather than its glyph box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Anchor {
    pub top: f32,
    pub bottom: f32,
    pub left: f32,
    pub right: f32,
}

impl Anchor {
    pub fn at_caret(rect: CaretRect) -> Self {
        Self {
            top: rect.top,
            bottom: rect.bottom,
            left: rect.left,
            right: rect.right,
        }
    }

    pub fn width(&self) -> f32 {
        0.0
    }

    pub fn height(&self) -> f32 {
        0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanelOrigin {
    pub x: f32,
    pub y: f32,
}

/// Corner of the panel that touches the anchor.
///
/// `TopStart` and `TopEnd` give the panel's bottom edge; the panel grows
/// upward from there.
pub fn origin(anchor: &Anchor, placement: Placement) -> PanelOrigin {
    match placement {
        Placement::BottomStart => PanelOrigin { x: anchor.left, y: anchor.bottom },
        Placement::BottomEnd => PanelOrigin { x: anchor.right, y: anchor.bottom },
        Placement::TopStart => PanelOrigin { x: anchor.left, y: anchor.top },
        Placement::TopEnd => PanelOrigin { x: anchor.right, y: anchor.top },
    }
}
