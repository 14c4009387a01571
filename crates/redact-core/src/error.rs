use thiserror::Error;

use crate::paragraph::ParagraphId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RedactError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Span {start}..{end} in paragraph {paragraph_id} is already marked")]
    DuplicateSpan {
        paragraph_id: ParagraphId,
        start: usize,
        end: usize,
    },

    #[error("Paragraph not found: {0}")]
    ParagraphNotFound(ParagraphId),

    #[error("No document loaded")]
    NoDocument,

    #[error("No pending redactions to commit")]
    EmptyQueue,

    #[error("A commit is already in progress")]
    CommitInProgress,

    #[error("External service error: {0}")]
    ExternalCall(String),
}

impl RedactError {
    /// Warnings leave the session untouched and need no recovery.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            RedactError::EmptyQueue | RedactError::CommitInProgress | RedactError::DuplicateSpan { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RedactError>;
