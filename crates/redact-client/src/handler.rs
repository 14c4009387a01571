//! Collaborator traits for the redaction backend

use async_trait::async_trait;
use redact_core::{Document, Span};
pub use redact_core::ExportFormat;
use std::path::Path;

use crate::Result;

/// What the backend reported after storing redactions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistReceipt {
    pub redaction_count: Option<usize>,
    pub message: Option<String>,
}

/// Turns an uploaded file into an ordered list of paragraphs
#[async_trait]
pub trait IngestionService: Send + Sync {
    async fn ingest(&self, path: &Path) -> Result<Document>;
}

/// Stores the full committed span set for a document
#[async_trait]
pub trait PersistenceService: Send + Sync {
    async fn persist(&self, filename: &str, redactions: &[Span]) -> Result<PersistReceipt>;
}

/// Produces the redacted artifact from the persisted spans
#[async_trait]
pub trait ExportService: Send + Sync {
    async fn export(&self, filename: &str, format: ExportFormat) -> Result<Vec<u8>>;
}

/// A backend providing all three services
pub trait DocumentBackend: IngestionService + PersistenceService + ExportService {}

impl<T> DocumentBackend for T where T: IngestionService + PersistenceService + ExportService {}
