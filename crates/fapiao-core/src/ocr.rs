//! Tokens handed over by the upstream OCR / entity-recognition engine.
//!
//! Recognition itself happens elsewhere; this module only defines the token
//! contract and how token dumps are read from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::Rect;

/// A recognized text span with its bounding box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Recognized text (any Unicode, often several labels glued together).
    #[serde(alias = "transcription")]
    pub text: String,

    /// Raw box coordinates, expected as `[left, top, right, bottom]`.
    #[serde(alias = "box")]
    pub bbox: Vec<i32>,
}

impl Token {
    /// Create a token with a well-formed box.
    pub fn new(text: impl Into<String>, left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            text: text.into(),
            bbox: vec![left, top, right, bottom],
        }
    }

    /// The token box as a rectangle, if it has exactly four coordinates.
    pub fn rect(&self) -> Option<Rect> {
        Rect::from_bbox(&self.bbox)
    }
}

/// An ordered token dump for one invoice.
///
/// Order is OCR scan order and is significant to extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub tokens: Vec<Token>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TokenDump {
    Bare(Vec<Token>),
    Wrapped {
        #[serde(alias = "ocr_info")]
        tokens: Vec<Token>,
    },
}

impl TokenSet {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// Parse a token dump.
    ///
    /// Accepts a bare JSON array of tokens, `{"tokens": [...]}`, or the
    /// `{"ocr_info": [...]}` shape written by PaddleOCR's SER pipeline.
    pub fn from_json(json: &str) -> Result<Self> {
        let tokens = match serde_json::from_str(json)? {
            TokenDump::Bare(tokens) => tokens,
            TokenDump::Wrapped { tokens } => tokens,
        };
        Ok(Self { tokens })
    }

    /// Read a token dump from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
