//! Structured extraction payloads stored as JSON text on each page.
//!
//! The two shapes differ on purpose: consumers of single-image results
//! only ever read the language and text, while paged results carry
//! layout metadata reported by the recognition engine.

use serde::{Deserialize, Serialize};

/// Payload for a document that was a single image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub primary_language: String,
    pub natural_text: String,
}

impl ImagePayload {
    pub fn new(primary_language: impl Into<String>, natural_text: impl Into<String>) -> Self {
        Self {
            primary_language: primary_language.into(),
            natural_text: natural_text.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Payload for one page of a paged document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePayload {
    pub primary_language: String,
    /// True when no rotation correction is needed.
    pub is_rotation_valid: bool,
    /// Clockwise degrees needed to upright the page (0, 90, 180 or 270).
    pub rotation_correction: i32,
    pub is_table: bool,
    pub is_diagram: bool,
    pub natural_text: String,
}

impl PagePayload {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
