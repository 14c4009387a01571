//! Paragraph store and loaded document metadata

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{RedactError, Result};

/// Ordinal position of a paragraph within its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParagraphId(pub u32);

impl fmt::Display for ParagraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub id: ParagraphId,
    text: String,
}

impl Paragraph {
    pub fn new(id: ParagraphId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters, the unit every span offset is expressed in
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Substring `[start, end)` by character offsets.
    pub fn slice(&self, start: usize, end: usize) -> Result<String> {
        let len = self.char_len();
        if start > end || end > len {
            return Err(RedactError::Validation(format!(
                "range {}..{} is outside paragraph {} (length {})",
                start, end, self.id, len
            )));
        }
        Ok(self.text.chars().skip(start).take(end - start).collect())
    }
}

/// Immutable ordered list of paragraphs, loaded once per document session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphStore {
    paragraphs: Vec<Paragraph>,
}

impl ParagraphStore {
    /// Build a store from ingestion output.
    ///
    /// Ids must be unique; the incoming order is kept as document order.
    pub fn new(paragraphs: Vec<Paragraph>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for paragraph in &paragraphs {
            if !seen.insert(paragraph.id) {
                return Err(RedactError::Validation(format!(
                    "duplicate paragraph id {}",
                    paragraph.id
                )));
            }
        }
        Ok(Self { paragraphs })
    }

    /// Assign ids by position.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let paragraphs = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Paragraph::new(ParagraphId(i as u32), text))
            .collect();
        Self { paragraphs }
    }

    pub fn get(&self, id: ParagraphId) -> Result<&Paragraph> {
        self.paragraphs
            .iter()
            .find(|p| p.id == id)
            .ok_or(RedactError::ParagraphNotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Paragraph> {
        self.paragraphs.iter()
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

/// A document returned by ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Server-side name, used for persistence and export
    pub filename: String,
    pub original_filename: String,
    pub paragraphs: ParagraphStore,
}

impl Document {
    pub fn new(filename: String, original_filename: String, paragraphs: ParagraphStore) -> Self {
        Self {
            filename,
            original_filename,
            paragraphs,
        }
    }
}
