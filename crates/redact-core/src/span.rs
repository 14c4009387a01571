//! Redaction spans and the pending/applied redaction set

use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::paragraph::ParagraphId;
use crate::selection::SelectionCandidate;
use crate::{RedactError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(pub Uuid);

impl SpanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SpanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SpanId {
    type Err = RedactError;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(SpanId)
            .map_err(|e| RedactError::Validation(format!("invalid span id '{}': {}", s, e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanStatus {
    Pending,
    Applied,
}

/// A character range `[start_offset, end_offset)` in one paragraph's original text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub id: SpanId,
    pub paragraph_id: ParagraphId,
    pub start_offset: usize,
    pub end_offset: usize,
    /// Original substring at creation time; informational only
    pub captured_text: String,
    pub status: SpanStatus,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
}

impl Span {
    pub fn pending(candidate: SelectionCandidate) -> Self {
        Self {
            id: SpanId::new(),
            paragraph_id: candidate.paragraph_id,
            start_offset: candidate.start_offset,
            end_offset: candidate.end_offset,
            captured_text: candidate.text,
            status: SpanStatus::Pending,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn len(&self) -> usize {
        self.end_offset.saturating_sub(self.start_offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn key(&self) -> (ParagraphId, usize, usize) {
        (self.paragraph_id, self.start_offset, self.end_offset)
    }
}

/// Pending queue plus committed (applied) set
///
/// Applied spans keep commit order so persisted payloads are stable.
#[derive(Debug, Clone, Default)]
pub struct RedactionSet {
    pending: Vec<Span>,
    applied: Vec<Span>,
}

impl RedactionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a confirmed selection as a pending span.
    ///
    /// Identical `(paragraph, start, end)` triples are rejected whether the
    /// existing span is pending or applied.
    pub fn enqueue(&mut self, candidate: SelectionCandidate) -> Result<Span> {
        if candidate.start_offset >= candidate.end_offset {
            return Err(RedactError::Validation(
                "cannot queue an empty selection".to_string(),
            ));
        }

        let key = (
            candidate.paragraph_id,
            candidate.start_offset,
            candidate.end_offset,
        );
        if self.iter().any(|s| s.key() == key) {
            return Err(RedactError::DuplicateSpan {
                paragraph_id: key.0,
                start: key.1,
                end: key.2,
            });
        }

        let span = Span::pending(candidate);
        self.pending.push(span.clone());
        Ok(span)
    }

    /// Remove one pending span. Applied spans are never touched.
    pub fn dequeue(&mut self, id: SpanId) -> Option<Span> {
        let pos = self.pending.iter().position(|s| s.id == id)?;
        Some(self.pending.remove(pos))
    }

    pub fn clear_all(&mut self) {
        self.pending.clear();
        self.applied.clear();
    }

    pub fn pending(&self) -> &[Span] {
        &self.pending
    }

    pub fn applied(&self) -> &[Span] {
        &self.applied
    }

    pub fn iter(&self) -> impl Iterator<Item = &Span> {
        self.pending.iter().chain(self.applied.iter())
    }

    /// Pending and applied spans for one paragraph
    pub fn spans_for(&self, paragraph_id: ParagraphId) -> Vec<&Span> {
        self.iter()
            .filter(|s| s.paragraph_id == paragraph_id)
            .collect()
    }

    pub fn applied_for(&self, paragraph_id: ParagraphId) -> Vec<&Span> {
        self.applied
            .iter()
            .filter(|s| s.paragraph_id == paragraph_id)
            .collect()
    }

    /// `applied ∪ pending`, with status set to applied and ids de-duplicated.
    pub fn merged_applied(&self) -> Vec<Span> {
        let mut merged = self.applied.clone();
        for span in &self.pending {
            if merged.iter().any(|s| s.id == span.id) {
                continue;
            }
            let mut span = span.clone();
            span.status = SpanStatus::Applied;
            merged.push(span);
        }
        merged
    }

    /// Install a new applied set and drop the given pending spans.
    pub(crate) fn install_applied(&mut self, applied: Vec<Span>, committed: &[SpanId]) {
        self.applied = applied;
        self.pending.retain(|s| !committed.contains(&s.id));
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.applied.is_empty()
    }
}
