//! Masking renderer - deterministic redacted views
//!
//! Masking is length-preserving: every masked character is replaced by exactly
//! one mask character. Spans are applied right-to-left by start offset, so the
//! offsets of spans still waiting to be applied stay valid against the
//! progressively masked text.

use serde::{Deserialize, Serialize};

use crate::paragraph::{ParagraphId, ParagraphStore};
use crate::span::{RedactionSet, Span};

/// Full block, U+2588
pub const BLOCK: char = '█';

/// Which spans a document render includes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderView {
    /// Pending and applied spans, as shown while editing
    #[default]
    All,
    /// Applied spans only, as reflected by an export
    Committed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskingRenderer {
    mask: char,
}

impl MaskingRenderer {
    pub fn new(mask: char) -> Self {
        Self { mask }
    }

    pub fn mask(&self) -> char {
        self.mask
    }

    /// Mask `spans` in `text`.
    ///
    /// Overlapping spans are not merged; each one is applied on its own in
    /// descending start order. Ranges past the end of the text are clamped and
    /// empty ranges are ignored.
    pub fn render<'a, I>(&self, text: &str, spans: I) -> String
    where
        I: IntoIterator<Item = &'a Span>,
    {
        self.apply(text, spans).0
    }

    /// Render and report whether any character was actually masked
    fn apply<'a, I>(&self, text: &str, spans: I) -> (String, bool)
    where
        I: IntoIterator<Item = &'a Span>,
    {
        let mut ordered: Vec<&Span> = spans.into_iter().collect();
        if ordered.is_empty() {
            return (text.to_string(), false);
        }
        ordered.sort_by(|a, b| b.start_offset.cmp(&a.start_offset));

        let mut chars: Vec<char> = text.chars().collect();
        let mut masked = false;
        for span in ordered {
            let end = span.end_offset.min(chars.len());
            if span.start_offset >= end {
                continue;
            }
            chars.splice(
                span.start_offset..end,
                std::iter::repeat_n(self.mask, end - span.start_offset),
            );
            masked = true;
        }
        (chars.into_iter().collect(), masked)
    }

    pub fn render_document(
        &self,
        paragraphs: &ParagraphStore,
        redactions: &RedactionSet,
        view: RenderView,
    ) -> RenderedDocument {
        let rendered: Vec<RenderedParagraph> = paragraphs
            .iter()
            .map(|p| {
                let spans = match view {
                    RenderView::All => redactions.spans_for(p.id),
                    RenderView::Committed => redactions.applied_for(p.id),
                };
                let (text, masked) = self.apply(p.text(), spans);
                RenderedParagraph {
                    id: p.id,
                    text,
                    masked,
                }
            })
            .collect();

        let mut hasher = blake3::Hasher::new();
        for (i, p) in rendered.iter().enumerate() {
            if i > 0 {
                hasher.update(b"\n");
            }
            hasher.update(p.text.as_bytes());
        }

        RenderedDocument {
            paragraphs: rendered,
            render_hash: hasher.finalize().to_hex().to_string(),
        }
    }
}

impl Default for MaskingRenderer {
    fn default() -> Self {
        Self::new(BLOCK)
    }
}

/// Render with the default block mask
pub fn render<'a, I>(text: &str, spans: I) -> String
where
    I: IntoIterator<Item = &'a Span>,
{
    MaskingRenderer::default().render(text, spans)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedParagraph {
    pub id: ParagraphId,
    pub text: String,
    /// At least one character of this paragraph was masked
    pub masked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub paragraphs: Vec<RenderedParagraph>,
    /// BLAKE3 of the masked paragraphs joined by newlines
    pub render_hash: String,
}

impl RenderedDocument {
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
