//! Core domain models and logic for redact
//!
//! This crate contains:
//! - Paragraph store and document metadata
//! - Selection tracking and the pending/applied span model
//! - Masking renderer (deterministic, length-preserving)
//! - The local half of committing spans
//!
//! Nothing in here performs I/O.

pub mod commit;
pub mod error;
pub mod format;
pub mod paragraph;
pub mod render;
pub mod selection;
pub mod session;
pub mod span;

pub use commit::{CommitOutcome, CommitPlan, CommitPolicy, SyncState};
pub use error::{RedactError, Result};
pub use format::ExportFormat;
pub use paragraph::{Document, Paragraph, ParagraphId, ParagraphStore};
pub use render::{render, MaskingRenderer, RenderView, RenderedDocument, RenderedParagraph, BLOCK};
pub use selection::{RawSelection, SelectionCandidate, SelectionSource, SelectionTracker};
pub use session::{CommitTicket, Session};
pub use span::{RedactionSet, Span, SpanId, SpanStatus};
