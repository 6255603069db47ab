//! The in-progress note a client is typing.

use crate::config::BoardConfig;
use crate::note::NoteColor;
use kurbo::{Point, Rect};

/// Draft text and color for the next note.
///
/// The composition uses the larger editing size and never takes part in
/// collision tests or drags.
#[derive(Debug, Clone, PartialEq)]
pub struct Composer {
    text: String,
    color: NoteColor,
    open: bool,
}

impl Default for Composer {
    fn default() -> Self {
        Self {
            text: String::new(),
            color: NoteColor::default(),
            open: true,
        }
    }
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn color(&self) -> NoteColor {
        self.color
    }

    pub fn set_color(&mut self, color: NoteColor) {
        self.color = color;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Trimmed text, or `None` if there is nothing to post.
    pub fn postable_text(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Whether the post action should be enabled.
    pub fn can_post(&self) -> bool {
        self.open && self.postable_text().is_some()
    }

    /// Editing rectangle centered on `center` (client coordinates).
    pub fn rect(config: &BoardConfig, center: Point) -> Rect {
        Rect::from_center_size(center, config.edit_size)
    }

    /// Clear the draft after a successful post.
    pub(crate) fn finish(&mut self) {
        self.text.clear();
        self.color = NoteColor::default();
        self.open = false;
    }
}
