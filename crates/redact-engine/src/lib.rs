//! Session orchestration
//!
//! [`Workbench`] owns one [`Session`] and drives it against the backend
//! collaborators: loading documents, committing spans and exporting the
//! redacted result.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use redact_client::{DocumentBackend, ExportFormat};
use redact_core::{
    CommitOutcome, CommitPolicy, CommitTicket, Document, MaskingRenderer, ParagraphId,
    RedactError, RenderView, RenderedDocument, Result, SelectionCandidate, Session, Span, SpanId,
    SyncState,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Session-level settings
#[derive(Debug, Clone)]
pub struct WorkbenchOptions {
    pub commit_policy: CommitPolicy,
    pub mask: char,
    /// Lowercase file extensions accepted for upload
    pub allowed_extensions: Vec<String>,
}

impl Default for WorkbenchOptions {
    fn default() -> Self {
        Self {
            commit_policy: CommitPolicy::Optimistic,
            mask: redact_core::BLOCK,
            allowed_extensions: vec!["docx".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    /// Pending spans moved by this commit
    pub committed: usize,
    /// Size of the applied set that was persisted
    pub applied_total: usize,
    /// Count acknowledged by the backend, if it sent one
    pub redaction_count: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    /// Set when spans had to be saved before downloading
    pub auto_commit: Option<CommitReport>,
}

/// Name for an exported file: `redacted_<original>` with the format's extension
pub fn export_file_name(original: &str, format: ExportFormat) -> String {
    let stem = match original.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => original,
    };
    format!("redacted_{}.{}", stem, format.extension())
}

/// Clears the commit flag even if the commit future is dropped mid-call
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Workbench {
    backend: Arc<dyn DocumentBackend>,
    session: Mutex<Session>,
    options: WorkbenchOptions,
    commit_in_flight: AtomicBool,
}

impl Workbench {
    pub fn new(backend: Arc<dyn DocumentBackend>, options: WorkbenchOptions) -> Self {
        let session = Session::new(options.commit_policy, MaskingRenderer::new(options.mask));
        Self {
            backend,
            session: Mutex::new(session),
            options,
            commit_in_flight: AtomicBool::new(false),
        }
    }

    pub fn options(&self) -> &WorkbenchOptions {
        &self.options
    }

    /// Upload `path` and make it the current document.
    ///
    /// Whatever was loaded before is discarded first, so a failed upload
    /// leaves the session empty.
    pub async fn load(&self, path: &Path) -> Result<Document> {
        self.validate_upload(path).await?;

        self.session.lock().await.reset();

        let document = self.backend.ingest(path).await.map_err(|e| {
            warn!(path = %path.display(), error = %e, "ingestion failed");
            RedactError::from(e)
        })?;

        info!(
            filename = %document.filename,
            paragraphs = document.paragraphs.len(),
            "document loaded"
        );
        self.session.lock().await.load(document.clone());
        Ok(document)
    }

    async fn validate_upload(&self, path: &Path) -> Result<()> {
        let is_file = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(RedactError::Validation(format!(
                "{} is not a readable file",
                path.display()
            )));
        }
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !self.options.allowed_extensions.contains(&extension) {
            return Err(RedactError::Validation(format!(
                "Invalid file type. Allowed: {}",
                self.options.allowed_extensions.join(", ")
            )));
        }
        Ok(())
    }

    pub async fn reset(&self) {
        self.session.lock().await.reset();
        debug!("session reset");
    }

    pub async fn document(&self) -> Option<Document> {
        self.session.lock().await.document().cloned()
    }

    pub async fn select(
        &self,
        paragraph_id: ParagraphId,
        start: usize,
        end: usize,
    ) -> Result<Option<SelectionCandidate>> {
        let mut session = self.session.lock().await;
        Ok(session.select(paragraph_id, start, end)?.cloned())
    }

    pub async fn candidate(&self) -> Option<SelectionCandidate> {
        self.session.lock().await.candidate().cloned()
    }

    /// Queue the current selection
    pub async fn enqueue_selection(&self) -> Result<Span> {
        let span = self.session.lock().await.enqueue_selection()?;
        debug!(span = %span.id, paragraph = %span.paragraph_id, "span queued");
        Ok(span)
    }

    pub async fn enqueue_range(
        &self,
        paragraph_id: ParagraphId,
        start: usize,
        end: usize,
    ) -> Result<Span> {
        let span = self
            .session
            .lock()
            .await
            .enqueue_range(paragraph_id, start, end)?;
        debug!(span = %span.id, paragraph = %span.paragraph_id, "span queued");
        Ok(span)
    }

    /// Remove a pending span; spans a staged commit is persisting are refused
    pub async fn dequeue(&self, id: SpanId) -> Result<Option<Span>> {
        let removed = self.session.lock().await.dequeue(id)?;
        if removed.is_some() {
            debug!(span = %id, "span removed from queue");
        }
        Ok(removed)
    }

    pub async fn clear_all(&self) {
        self.session.lock().await.clear_all();
        info!("all redactions cleared");
    }

    pub async fn pending(&self) -> Vec<Span> {
        self.session.lock().await.redactions().pending().to_vec()
    }

    pub async fn applied(&self) -> Vec<Span> {
        self.session.lock().await.redactions().applied().to_vec()
    }

    pub async fn sync_state(&self) -> SyncState {
        self.session.lock().await.sync_state().clone()
    }

    pub async fn render_paragraph(&self, id: ParagraphId) -> Result<String> {
        self.session.lock().await.render_paragraph(id)
    }

    pub async fn render(&self, view: RenderView) -> Result<RenderedDocument> {
        self.session.lock().await.render_document(view)
    }

    pub fn is_committing(&self) -> bool {
        self.commit_in_flight.load(Ordering::Acquire)
    }

    /// Move every pending span into the applied set and persist the full set.
    ///
    /// Only one commit runs at a time; a second call while one is in flight
    /// fails with [`RedactError::CommitInProgress`]. The session lock is not
    /// held during the backend call.
    pub async fn commit(&self) -> Result<CommitReport> {
        let _guard = self.acquire_commit()?;
        let ticket = self.session.lock().await.begin_commit()?;
        self.persist(ticket).await
    }

    /// Persist the applied set again after a failed save, moving no pending spans
    pub async fn resync(&self) -> Result<CommitReport> {
        let _guard = self.acquire_commit()?;
        let ticket = self.session.lock().await.begin_resync()?;
        info!("re-sending applied redactions after a failed save");
        self.persist(ticket).await
    }

    fn acquire_commit(&self) -> Result<InFlight<'_>> {
        if self
            .commit_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("commit requested while another is in flight");
            return Err(RedactError::CommitInProgress);
        }
        Ok(InFlight(&self.commit_in_flight))
    }

    async fn persist(&self, ticket: CommitTicket) -> Result<CommitReport> {
        let committed = ticket.plan.committed_count();
        let applied_total = ticket.plan.applied.len();

        info!(
            filename = %ticket.plan.filename,
            committed,
            applied_total,
            policy = ?ticket.plan.policy,
            "committing redactions"
        );

        let result = self
            .backend
            .persist(&ticket.plan.filename, &ticket.plan.applied)
            .await;

        let mut session = self.session.lock().await;
        match result {
            Ok(receipt) => {
                session.finish_commit(
                    ticket,
                    CommitOutcome::Persisted {
                        redaction_count: receipt.redaction_count,
                    },
                );
                Ok(CommitReport {
                    committed,
                    applied_total,
                    redaction_count: receipt.redaction_count,
                })
            }
            Err(e) => {
                let err = RedactError::from(e);
                let message = match &err {
                    RedactError::ExternalCall(message) => message.clone(),
                    other => other.to_string(),
                };
                warn!(error = %message, "persisting redactions failed");
                session.finish_commit(ticket, CommitOutcome::Failed { message });
                Err(err)
            }
        }
    }

    /// Export the redacted document.
    ///
    /// Pending spans are committed first. If the last save failed, the applied
    /// set is sent again. Either call failing aborts the export.
    pub async fn export(&self, format: ExportFormat) -> Result<ExportArtifact> {
        let (filename, original, has_pending, needs_resync) = {
            let session = self.session.lock().await;
            let document = session.document().ok_or(RedactError::NoDocument)?;
            (
                document.filename.clone(),
                document.original_filename.clone(),
                !session.redactions().pending().is_empty(),
                session.needs_resync(),
            )
        };

        let auto_commit = if has_pending {
            info!("pending redactions found, committing before export");
            Some(self.commit().await?)
        } else if needs_resync {
            Some(self.resync().await?)
        } else {
            None
        };

        let bytes = self.backend.export(&filename, format).await.map_err(|e| {
            warn!(filename = %filename, error = %e, "export failed");
            RedactError::from(e)
        })?;

        let file_name = export_file_name(&original, format);
        info!(file = %file_name, size = bytes.len(), "export ready");
        Ok(ExportArtifact {
            file_name,
            format,
            bytes,
            auto_commit,
        })
    }
}
