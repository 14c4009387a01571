//! JSON bodies exchanged with the redaction backend

use redact_core::{Paragraph, ParagraphId, ParagraphStore, Span};
use serde::{Deserialize, Serialize};

use crate::{ClientError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireParagraph {
    #[serde(rename = "type", default = "paragraph_kind")]
    pub kind: String,
    pub text: String,
    pub id: u32,
}

fn paragraph_kind() -> String {
    "paragraph".to_string()
}

/// Body of `POST /upload`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Missing on older backends, which only return `filename`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub content: Vec<WireParagraph>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResponse {
    pub fn into_parts(self) -> Result<(String, String, ParagraphStore)> {
        if !self.success {
            return Err(ClientError::Rejected(
                self.error.unwrap_or_else(|| "upload failed".to_string()),
            ));
        }
        let filename = self
            .filename
            .ok_or_else(|| ClientError::Decode("upload response has no filename".to_string()))?;
        let original = self.original_filename.unwrap_or_else(|| filename.clone());

        let paragraphs = self
            .content
            .into_iter()
            .filter(|p| p.kind == "paragraph")
            .map(|p| Paragraph::new(ParagraphId(p.id), p.text))
            .collect();
        let store = ParagraphStore::new(paragraphs).map_err(|e| ClientError::Decode(e.to_string()))?;

        Ok((filename, original, store))
    }
}

/// One committed span, in the backend's field names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRedaction {
    pub id: String,
    pub paragraph_id: u32,
    pub start_pos: usize,
    pub end_pos: usize,
    pub text: String,
}

impl From<&Span> for WireRedaction {
    fn from(span: &Span) -> Self {
        Self {
            id: span.id.to_string(),
            paragraph_id: span.paragraph_id.0,
            start_pos: span.start_offset,
            end_pos: span.end_offset,
            text: span.captured_text.clone(),
        }
    }
}

/// Body of `POST /redact`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactRequest {
    pub filename: String,
    pub redactions: Vec<WireRedaction>,
}

impl RedactRequest {
    pub fn new(filename: &str, spans: &[Span]) -> Self {
        Self {
            filename: filename.to_string(),
            redactions: spans.iter().map(WireRedaction::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedactResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redaction_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error body on non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use redact_core::SelectionCandidate;

    #[test]
    fn test_upload_response_parse() {
        let body = r#"{
            "success": true,
            "filename": "1700000000_abcd1234_memo.docx",
            "original_filename": "memo.docx",
            "content": [
                {"type": "paragraph", "text": "The quick brown fox", "id": 0},
                {"type": "paragraph", "text": "", "id": 1}
            ]
        }"#;
        let resp: UploadResponse = serde_json::from_str(body).unwrap();
        let (filename, original, store) = resp.into_parts().unwrap();
        assert_eq!(filename, "1700000000_abcd1234_memo.docx");
        assert_eq!(original, "memo.docx");
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(ParagraphId(1)).unwrap().text(), "");
    }

    #[test]
    fn test_upload_without_original_filename() {
        let body = r#"{"success": true, "filename": "memo.docx", "content": []}"#;
        let resp: UploadResponse = serde_json::from_str(body).unwrap();
        let (filename, original, store) = resp.into_parts().unwrap();
        assert_eq!(filename, original);
        assert!(store.is_empty());
    }

    #[test]
    fn test_upload_failure_surfaces_error() {
        let body = r#"{"success": false, "error": "Could not extract text from document"}"#;
        let resp: UploadResponse = serde_json::from_str(body).unwrap();
        match resp.into_parts() {
            Err(ClientError::Rejected(message)) => {
                assert_eq!(message, "Could not extract text from document")
            }
            other => panic!("unexpected: {:?}", other.map(|(f, _, _)| f)),
        }
    }

    #[test]
    fn test_redact_request_field_names() {
        let span = Span::pending(SelectionCandidate {
            paragraph_id: ParagraphId(3),
            text: "quick".to_string(),
            start_offset: 4,
            end_offset: 9,
        });
        let req = RedactRequest::new("memo.docx", std::slice::from_ref(&span));
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["filename"], "memo.docx");
        let r = &json["redactions"][0];
        assert_eq!(r["paragraphId"], 3);
        assert_eq!(r["startPos"], 4);
        assert_eq!(r["endPos"], 9);
        assert_eq!(r["text"], "quick");
        assert_eq!(r["id"], span.id.to_string());
    }
}
