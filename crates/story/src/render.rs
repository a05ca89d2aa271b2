use std::cell::RefCell;
use std::rc::Rc;

use jotter_doc_core::{CaretGeometry, CaretRect, GeometryError, Point};
use jotter_slash_menu::{
    Anchor, FloatingPanel, ListProps, Placement, PopupBackend, Renderer, origin,
};

/// Output lines shared between the popup and the script runner.
#[derive(Clone, Default)]
pub struct Transcript(Rc<RefCell<Vec<String>>>);

impl Transcript {
    pub fn line(&self, line: impl Into<String>) {
        self.0.borrow_mut().push(line.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

/// Fixed-pitch layout: one row per top-level block.
pub struct MonospaceGeometry {
    pub char_width: f32,
    pub line_height: f32,
}

impl Default for MonospaceGeometry {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 20.0,
        }
    }
}

impl CaretGeometry for MonospaceGeometry {
    fn coords_at(&self, point: &Point) -> Result<CaretRect, GeometryError> {
        let Some(&row) = point.path.first() else {
            return Err(GeometryError::NotLaidOut(point.path.clone()));
        };
        let top = row as f32 * self.line_height;
        let left = point.offset as f32 * self.char_width;
        Ok(CaretRect {
            top,
            bottom: top + self.line_height,
            left,
            right: left,
        })
    }
}

pub struct TextBackend {
    transcript: Transcript,
}

impl TextBackend {
    pub fn new(transcript: Transcript) -> Self {
        Self { transcript }
    }
}

impl PopupBackend for TextBackend {
    fn create_renderer(&mut self) -> Box<dyn Renderer> {
        Box::new(TextList {
            transcript: self.transcript.clone(),
        })
    }

    fn create_panel(&mut self) -> Box<dyn FloatingPanel> {
        Box::new(TextPanel {
            transcript: self.transcript.clone(),
        })
    }
}

struct TextList {
    transcript: Transcript,
}

impl TextList {
    fn draw(&self, props: &ListProps) {
        if props.is_empty() {
            self.transcript.line(format!("  | {}", props.empty_label));
            return;
        }
        for (ix, item) in props.visible_items() {
            let marker = if props.highlighted == Some(ix) { '>' } else { ' ' };
            self.transcript.line(format!(
                "  |{marker} {:<4} {:<16} {}",
                item.icon, item.title, item.description
            ));
        }
    }
}

impl Renderer for TextList {
    fn mount(&mut self, props: &ListProps) {
        self.draw(props);
    }

    fn update(&mut self, props: &ListProps) {
        self.draw(props);
    }

    fn unmount(&mut self) {
        self.transcript.line("  popup unmounted");
    }
}

struct TextPanel {
    transcript: Transcript,
}

impl FloatingPanel for TextPanel {
    fn set_reference(&mut self, anchor: Anchor, placement: Placement) {
        let at = origin(&anchor, placement);
        self.transcript.line(format!("  popup at ({}, {})", at.x, at.y));
    }

    fn show(&mut self) {
        self.transcript.line("  popup shown");
    }

    fn hide(&mut self) {
        self.transcript.line("  popup hidden");
    }

    fn destroy(&mut self) {
        self.transcript.line("  popup destroyed");
    }
}
