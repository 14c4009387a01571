//! Selection tracking
//!
//! Holds at most one live selection candidate. A new selection always replaces
//! the previous one, whichever paragraph it came from.

use serde::{Deserialize, Serialize};

use crate::paragraph::{Paragraph, ParagraphId};
use crate::Result;

/// Offsets reported by whatever captured the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSelection {
    pub start: usize,
    pub end: usize,
}

/// Source of the user's current text selection.
///
/// Offsets may come from the rendered (masked) view. Masking never changes the
/// length of a paragraph, so those offsets line up with the original text.
pub trait SelectionSource {
    fn capture_selection(&self, paragraph_id: ParagraphId) -> Option<RawSelection>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCandidate {
    pub paragraph_id: ParagraphId,
    /// Highlighted text, for display before confirmation
    pub text: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    current: Option<SelectionCandidate>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a selection in `paragraph`.
    ///
    /// An empty range clears the candidate. An out-of-range selection is
    /// rejected and the previous candidate is kept.
    pub fn select(
        &mut self,
        paragraph: &Paragraph,
        start: usize,
        end: usize,
    ) -> Result<Option<&SelectionCandidate>> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let text = paragraph.slice(start, end)?;

        if text.is_empty() {
            self.current = None;
            return Ok(None);
        }

        self.current = Some(SelectionCandidate {
            paragraph_id: paragraph.id,
            text,
            start_offset: start,
            end_offset: end,
        });
        Ok(self.current.as_ref())
    }

    pub fn capture<S: SelectionSource + ?Sized>(
        &mut self,
        source: &S,
        paragraph: &Paragraph,
    ) -> Result<Option<&SelectionCandidate>> {
        match source.capture_selection(paragraph.id) {
            Some(raw) => self.select(paragraph, raw.start, raw.end),
            None => {
                self.current = None;
                Ok(None)
            }
        }
    }

    pub fn candidate(&self) -> Option<&SelectionCandidate> {
        self.current.as_ref()
    }

    pub fn take(&mut self) -> Option<SelectionCandidate> {
        self.current.take()
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}
