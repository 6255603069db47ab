//! Notes and their palette.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned note identifier. Opaque to the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the client that created a note.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(pub String);

impl AuthorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The five note swatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NoteColor {
    #[default]
    LightBlue,
    Pink,
    Yellow,
    LightGreen,
    Orange,
}

impl NoteColor {
    /// All swatches in palette order.
    pub const ALL: [NoteColor; 5] = [
        NoteColor::LightBlue,
        NoteColor::Pink,
        NoteColor::Yellow,
        NoteColor::LightGreen,
        NoteColor::Orange,
    ];

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            NoteColor::LightBlue => "Light Blue",
            NoteColor::Pink => "Pink",
            NoteColor::Yellow => "Yellow",
            NoteColor::LightGreen => "Light Green",
            NoteColor::Orange => "Orange",
        }
    }

    /// Fill color as `#RRGGBB`. This is also the persisted value.
    pub fn fill(self) -> &'static str {
        match self {
            NoteColor::LightBlue => "#B3E5FC",
            NoteColor::Pink => "#F8BBD9",
            NoteColor::Yellow => "#FFF59D",
            NoteColor::LightGreen => "#C8E6C9",
            NoteColor::Orange => "#FFCC80",
        }
    }

    /// Border color as `#RRGGBB`.
    pub fn border(self) -> &'static str {
        match self {
            NoteColor::LightBlue => "#81D4FA",
            NoteColor::Pink => "#F48FB1",
            NoteColor::Yellow => "#FFEB3B",
            NoteColor::LightGreen => "#A5D6A7",
            NoteColor::Orange => "#FFB74D",
        }
    }

    /// Look up a swatch by its fill value (case-insensitive).
    pub fn from_fill(fill: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.fill().eq_ignore_ascii_case(fill))
    }
}

impl Serialize for NoteColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.fill())
    }
}

impl<'de> Deserialize<'de> for NoteColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        // Unknown swatches from other clients fall back to the first palette entry.
        Ok(Self::from_fill(&value).unwrap_or_default())
    }
}

/// A pinned note as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub text: String,
    #[serde(default)]
    pub color: NoteColor,
    /// Top-left corner in board coordinates.
    pub position: Point,
    pub author_id: AuthorId,
    /// Store-assigned ordering key.
    pub created_at: u64,
}

impl Note {
    /// Whether `client` may delete this note.
    pub fn is_authored_by(&self, client: &AuthorId) -> bool {
        &self.author_id == client
    }
}

/// Fields sent to the store when posting a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNote {
    pub text: String,
    pub color: NoteColor,
    pub position: Point,
    pub author_id: AuthorId,
}

impl NewNote {
    /// Attach store-assigned fields.
    pub fn into_note(self, id: NoteId, created_at: u64) -> Note {
        Note {
            id,
            text: self.text,
            color: self.color,
            position: self.position,
            author_id: self.author_id,
            created_at,
        }
    }
}

/// Partial update merged into an existing note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<NoteColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
}

impl NotePatch {
    pub fn position(position: Point) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// Merge the present fields into `note`.
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(text) = &self.text {
            note.text = text.clone();
        }
        if let Some(color) = self.color {
            note.color = color;
        }
        if let Some(position) = self.position {
            note.position = position;
        }
    }
}
