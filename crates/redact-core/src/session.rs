//! Document session: paragraphs, selection and redaction state for one document

use crate::commit::{CommitOutcome, CommitPlan, CommitPolicy, SyncState};
use crate::paragraph::{Document, Paragraph, ParagraphId, ParagraphStore};
use crate::render::{MaskingRenderer, RenderView, RenderedDocument};
use crate::selection::{SelectionCandidate, SelectionSource, SelectionTracker};
use crate::span::{RedactionSet, Span, SpanId};
use crate::{RedactError, Result};

/// In-memory state of one loaded document
///
/// Owned by whoever orchestrates the session; nothing here is global.
#[derive(Debug, Default)]
pub struct Session {
    document: Option<Document>,
    selection: SelectionTracker,
    redactions: RedactionSet,
    sync: SyncState,
    policy: CommitPolicy,
    renderer: MaskingRenderer,
    // Bumped whenever spans are discarded wholesale, so a commit started
    // before a reset cannot write into the new state.
    generation: u64,
    // Pending spans a staged commit is persisting; they cannot be dequeued
    // until the commit finishes.
    in_flight: Vec<SpanId>,
}

impl Session {
    pub fn new(policy: CommitPolicy, renderer: MaskingRenderer) -> Self {
        Self {
            policy,
            renderer,
            ..Default::default()
        }
    }

    /// Replace the current document. All spans and the selection are dropped.
    pub fn load(&mut self, document: Document) {
        self.reset();
        self.document = Some(document);
    }

    pub fn reset(&mut self) {
        self.document = None;
        self.selection.clear();
        self.redactions.clear_all();
        self.sync = SyncState::Clean;
        self.generation += 1;
        self.in_flight.clear();
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn paragraphs(&self) -> Result<&ParagraphStore> {
        self.document
            .as_ref()
            .map(|d| &d.paragraphs)
            .ok_or(RedactError::NoDocument)
    }

    pub fn paragraph(&self, id: ParagraphId) -> Result<&Paragraph> {
        self.paragraphs()?.get(id)
    }

    pub fn policy(&self) -> CommitPolicy {
        self.policy
    }

    pub fn sync_state(&self) -> &SyncState {
        &self.sync
    }

    pub fn redactions(&self) -> &RedactionSet {
        &self.redactions
    }

    pub fn candidate(&self) -> Option<&SelectionCandidate> {
        self.selection.candidate()
    }

    pub fn select(
        &mut self,
        paragraph_id: ParagraphId,
        start: usize,
        end: usize,
    ) -> Result<Option<&SelectionCandidate>> {
        let paragraph = self
            .document
            .as_ref()
            .ok_or(RedactError::NoDocument)?
            .paragraphs
            .get(paragraph_id)?;
        self.selection.select(paragraph, start, end)
    }

    pub fn capture<S: SelectionSource + ?Sized>(
        &mut self,
        source: &S,
        paragraph_id: ParagraphId,
    ) -> Result<Option<&SelectionCandidate>> {
        let paragraph = self
            .document
            .as_ref()
            .ok_or(RedactError::NoDocument)?
            .paragraphs
            .get(paragraph_id)?;
        self.selection.capture(source, paragraph)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Queue the active selection. The selection is cleared only on success.
    pub fn enqueue_selection(&mut self) -> Result<Span> {
        let candidate = self
            .selection
            .candidate()
            .cloned()
            .ok_or_else(|| RedactError::Validation("no active selection".to_string()))?;
        let span = self.redactions.enqueue(candidate)?;
        self.selection.clear();
        Ok(span)
    }

    /// Select `[start, end)` in a paragraph and queue it in one step.
    pub fn enqueue_range(
        &mut self,
        paragraph_id: ParagraphId,
        start: usize,
        end: usize,
    ) -> Result<Span> {
        if self.select(paragraph_id, start, end)?.is_none() {
            return Err(RedactError::Validation(format!(
                "empty range {}..{} in paragraph {}",
                start, end, paragraph_id
            )));
        }
        self.enqueue_selection()
    }

    /// Remove a pending span.
    ///
    /// Fails with [`RedactError::CommitInProgress`] while a staged commit is
    /// persisting that span.
    pub fn dequeue(&mut self, id: SpanId) -> Result<Option<Span>> {
        if self.in_flight.contains(&id) {
            return Err(RedactError::CommitInProgress);
        }
        Ok(self.redactions.dequeue(id))
    }

    /// Drop every pending and applied span. Not reversible.
    pub fn clear_all(&mut self) {
        self.redactions.clear_all();
        self.selection.clear();
        self.generation += 1;
        self.in_flight.clear();
    }

    pub fn render_paragraph(&self, id: ParagraphId) -> Result<String> {
        let paragraph = self.paragraph(id)?;
        Ok(self
            .renderer
            .render(paragraph.text(), self.redactions.spans_for(id)))
    }

    pub fn render_document(&self, view: RenderView) -> Result<RenderedDocument> {
        let paragraphs = self.paragraphs()?;
        Ok(self
            .renderer
            .render_document(paragraphs, &self.redactions, view))
    }

    /// Merge pending spans into the applied set and describe what to persist.
    ///
    /// Under [`CommitPolicy::Optimistic`] the merged set is installed and the
    /// queue emptied right away. Under [`CommitPolicy::Staged`] nothing changes
    /// until [`Session::finish_commit`] sees a successful outcome.
    pub fn begin_commit(&mut self) -> Result<CommitTicket> {
        let filename = self
            .document
            .as_ref()
            .ok_or(RedactError::NoDocument)?
            .filename
            .clone();

        if self.redactions.pending().is_empty() {
            return Err(RedactError::EmptyQueue);
        }

        let committed: Vec<SpanId> = self.redactions.pending().iter().map(|s| s.id).collect();
        let applied = self.redactions.merged_applied();

        match self.policy {
            CommitPolicy::Optimistic => {
                self.redactions.install_applied(applied.clone(), &committed);
            }
            CommitPolicy::Staged => self.in_flight = committed.clone(),
        }

        Ok(CommitTicket {
            plan: CommitPlan {
                filename,
                applied,
                committed,
                policy: self.policy,
            },
            generation: self.generation,
        })
    }

    /// Whether the applied set may differ from what the backend stored
    pub fn needs_resync(&self) -> bool {
        matches!(self.sync, SyncState::SyncFailed { .. })
    }

    /// Plan to persist the current applied set again, moving no pending spans.
    ///
    /// Used after a failed persistence call so the backend catches up before
    /// anything is exported.
    pub fn begin_resync(&mut self) -> Result<CommitTicket> {
        let filename = self
            .document
            .as_ref()
            .ok_or(RedactError::NoDocument)?
            .filename
            .clone();

        Ok(CommitTicket {
            plan: CommitPlan {
                filename,
                applied: self.redactions.applied().to_vec(),
                committed: Vec::new(),
                policy: self.policy,
            },
            generation: self.generation,
        })
    }

    pub fn finish_commit(&mut self, ticket: CommitTicket, outcome: CommitOutcome) {
        if ticket.generation != self.generation {
            // spans were discarded while the call was in flight
            return;
        }
        let CommitTicket { plan, .. } = ticket;
        self.in_flight.clear();

        match outcome {
            CommitOutcome::Persisted { .. } => {
                if plan.policy == CommitPolicy::Staged {
                    self.redactions
                        .install_applied(plan.applied, &plan.committed);
                }
                self.sync = SyncState::Synced;
            }
            CommitOutcome::Failed { message } => {
                self.sync = SyncState::SyncFailed { message };
            }
        }
    }
}

/// A commit in flight, handed back to [`Session::finish_commit`]
#[derive(Debug, Clone)]
pub struct CommitTicket {
    pub plan: CommitPlan,
    generation: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::BLOCK;
    use crate::selection::RawSelection;
    use crate::span::SpanStatus;

    const FOX: &str = "The quick brown fox";

    fn session(policy: CommitPolicy) -> Session {
        let mut session = Session::new(policy, MaskingRenderer::default());
        session.load(Document::new(
            "1700000000_abcd1234_fox.docx".to_string(),
            "fox.docx".to_string(),
            ParagraphStore::from_texts([FOX, "jumps over the lazy dog"]),
        ));
        session
    }

    #[test]
    fn test_select_then_enqueue_clears_selection() {
        let mut s = session(CommitPolicy::Optimistic);
        s.select(ParagraphId(0), 4, 9).unwrap();
        let span = s.enqueue_selection().unwrap();

        assert_eq!(span.captured_text, "quick");
        assert_eq!(span.status, SpanStatus::Pending);
        assert!(s.candidate().is_none());
        assert_eq!(s.render_paragraph(ParagraphId(0)).unwrap(), "The █████ brown fox");
    }

    #[test]
    fn test_duplicate_keeps_selection_and_queue() {
        let mut s = session(CommitPolicy::Optimistic);
        s.enqueue_range(ParagraphId(0), 4, 9).unwrap();

        s.select(ParagraphId(0), 4, 9).unwrap();
        let err = s.enqueue_selection().unwrap_err();
        assert!(matches!(err, RedactError::DuplicateSpan { .. }));
        assert!(err.is_warning());
        assert_eq!(s.redactions().pending().len(), 1);
        assert!(s.candidate().is_some());
    }

    #[test]
    fn test_enqueue_without_selection() {
        let mut s = session(CommitPolicy::Optimistic);
        assert!(matches!(
            s.enqueue_selection(),
            Err(RedactError::Validation(_))
        ));
        assert!(matches!(
            s.enqueue_range(ParagraphId(0), 3, 3),
            Err(RedactError::Validation(_))
        ));
        assert!(matches!(
            s.enqueue_range(ParagraphId(9), 0, 3),
            Err(RedactError::ParagraphNotFound(_))
        ));
    }

    #[test]
    fn test_selection_from_masked_view() {
        struct MaskedView;
        impl SelectionSource for MaskedView {
            fn capture_selection(&self, _id: ParagraphId) -> Option<RawSelection> {
                Some(RawSelection { start: 0, end: 9 })
            }
        }

        let mut s = session(CommitPolicy::Optimistic);
        s.enqueue_range(ParagraphId(0), 4, 9).unwrap();
        let candidate = s.capture(&MaskedView, ParagraphId(0)).unwrap().unwrap();
        // text comes from the original paragraph, not the masked render
        assert_eq!(candidate.text, "The quick");

        s.enqueue_selection().unwrap();
        let rendered = s.render_paragraph(ParagraphId(0)).unwrap();
        assert_eq!(rendered, format!("{} brown fox", BLOCK.to_string().repeat(9)));
    }

    #[test]
    fn test_no_document() {
        let mut s = Session::default();
        assert_eq!(s.select(ParagraphId(0), 0, 1).unwrap_err(), RedactError::NoDocument);
        assert_eq!(s.begin_commit().unwrap_err(), RedactError::NoDocument);
        assert!(s.render_document(RenderView::All).is_err());
    }

    #[test]
    fn test_optimistic_commit_installs_before_outcome() {
        let mut s = session(CommitPolicy::Optimistic);
        s.enqueue_range(ParagraphId(0), 4, 9).unwrap();

        let ticket = s.begin_commit().unwrap();
        assert_eq!(ticket.plan.filename, "1700000000_abcd1234_fox.docx");
        assert_eq!(ticket.plan.applied.len(), 1);
        assert_eq!(ticket.plan.committed_count(), 1);
        assert!(s.redactions().pending().is_empty());
        assert_eq!(s.redactions().applied().len(), 1);
        assert_eq!(s.redactions().applied()[0].status, SpanStatus::Applied);

        s.finish_commit(
            ticket,
            CommitOutcome::Failed {
                message: "backend down".to_string(),
            },
        );
        // not rolled back
        assert_eq!(s.redactions().applied().len(), 1);
        assert_eq!(
            s.sync_state(),
            &SyncState::SyncFailed {
                message: "backend down".to_string()
            }
        );
    }

    #[test]
    fn test_staged_commit_waits_for_success() {
        let mut s = session(CommitPolicy::Staged);
        s.enqueue_range(ParagraphId(0), 4, 9).unwrap();

        let ticket = s.begin_commit().unwrap();
        assert_eq!(s.redactions().pending().len(), 1);
        assert!(s.redactions().applied().is_empty());

        s.finish_commit(
            ticket,
            CommitOutcome::Failed {
                message: "timeout".to_string(),
            },
        );
        assert_eq!(s.redactions().pending().len(), 1);
        assert!(s.redactions().applied().is_empty());

        let ticket = s.begin_commit().unwrap();
        s.finish_commit(
            ticket,
            CommitOutcome::Persisted {
                redaction_count: Some(1),
            },
        );
        assert!(s.redactions().pending().is_empty());
        assert_eq!(s.redactions().applied().len(), 1);
        assert_eq!(s.sync_state(), &SyncState::Synced);
    }

    #[test]
    fn test_commit_accumulates_applied_set() {
        let mut s = session(CommitPolicy::Optimistic);
        s.enqueue_range(ParagraphId(0), 4, 9).unwrap();
        let ticket = s.begin_commit().unwrap();
        s.finish_commit(ticket, CommitOutcome::Persisted { redaction_count: Some(1) });

        s.enqueue_range(ParagraphId(1), 6, 10).unwrap();
        let ticket = s.begin_commit().unwrap();
        assert_eq!(ticket.plan.applied.len(), 2);
        assert_eq!(ticket.plan.committed_count(), 1);

        assert_eq!(s.begin_commit().unwrap_err(), RedactError::EmptyQueue);
    }

    #[test]
    fn test_clear_all_during_staged_commit_wins() {
        let mut s = session(CommitPolicy::Staged);
        s.enqueue_range(ParagraphId(0), 4, 9).unwrap();
        let ticket = s.begin_commit().unwrap();

        s.clear_all();
        s.finish_commit(ticket, CommitOutcome::Persisted { redaction_count: Some(1) });

        assert!(s.redactions().is_empty());
        assert_eq!(s.render_paragraph(ParagraphId(0)).unwrap(), FOX);
    }

    #[test]
    fn test_staged_commit_blocks_dequeue_of_committed_spans() {
        let mut s = session(CommitPolicy::Staged);
        let span = s.enqueue_range(ParagraphId(0), 4, 9).unwrap();
        let ticket = s.begin_commit().unwrap();

        // still pending while the call runs, but owned by the commit
        assert_eq!(s.redactions().pending().len(), 1);
        assert_eq!(s.dequeue(span.id).unwrap_err(), RedactError::CommitInProgress);

        // spans queued after the commit began stay removable
        let late = s.enqueue_range(ParagraphId(1), 0, 5).unwrap();
        assert_eq!(s.dequeue(late.id).unwrap().unwrap().id, late.id);

        s.finish_commit(ticket, CommitOutcome::Persisted { redaction_count: Some(1) });
        assert!(s.redactions().pending().is_empty());
        assert_eq!(s.redactions().applied().len(), 1);
        assert_eq!(s.dequeue(span.id).unwrap(), None);
    }

    #[test]
    fn test_failed_staged_commit_releases_spans() {
        let mut s = session(CommitPolicy::Staged);
        let span = s.enqueue_range(ParagraphId(0), 4, 9).unwrap();
        let ticket = s.begin_commit().unwrap();
        s.finish_commit(
            ticket,
            CommitOutcome::Failed {
                message: "down".to_string(),
            },
        );

        assert_eq!(s.dequeue(span.id).unwrap().unwrap().id, span.id);
        assert!(s.redactions().is_empty());
    }

    #[test]
    fn test_resync_after_failed_commit() {
        let mut s = session(CommitPolicy::Optimistic);
        assert!(!s.needs_resync());
        s.enqueue_range(ParagraphId(0), 4, 9).unwrap();
        let ticket = s.begin_commit().unwrap();
        s.finish_commit(
            ticket,
            CommitOutcome::Failed {
                message: "down".to_string(),
            },
        );
        assert!(s.needs_resync());

        let ticket = s.begin_resync().unwrap();
        assert_eq!(ticket.plan.applied.len(), 1);
        assert_eq!(ticket.plan.committed_count(), 0);

        s.finish_commit(ticket, CommitOutcome::Persisted { redaction_count: Some(1) });
        assert!(!s.needs_resync());
        assert_eq!(s.sync_state(), &SyncState::Synced);
        assert_eq!(s.redactions().applied().len(), 1);
    }

    #[test]
    fn test_clear_all_restores_original_render() {
        let mut s = session(CommitPolicy::Optimistic);
        s.enqueue_range(ParagraphId(0), 0, 3).unwrap();
        let ticket = s.begin_commit().unwrap();
        s.finish_commit(ticket, CommitOutcome::Persisted { redaction_count: None });
        s.enqueue_range(ParagraphId(1), 0, 5).unwrap();

        s.clear_all();
        assert!(s.redactions().pending().is_empty());
        assert!(s.redactions().applied().is_empty());
        let doc = s.render_document(RenderView::All).unwrap();
        assert_eq!(doc.paragraphs[0].text, FOX);
        assert_eq!(doc.paragraphs[1].text, "jumps over the lazy dog");
    }

    #[test]
    fn test_load_replaces_everything() {
        let mut s = session(CommitPolicy::Optimistic);
        s.enqueue_range(ParagraphId(0), 0, 3).unwrap();
        s.select(ParagraphId(1), 0, 5).unwrap();

        s.load(Document::new(
            "other.docx".to_string(),
            "other.docx".to_string(),
            ParagraphStore::from_texts(["fresh"]),
        ));
        assert!(s.redactions().is_empty());
        assert!(s.candidate().is_none());
        assert_eq!(s.paragraphs().unwrap().len(), 1);
        assert_eq!(s.sync_state(), &SyncState::Clean);

        s.reset();
        assert!(s.document().is_none());
    }
}
