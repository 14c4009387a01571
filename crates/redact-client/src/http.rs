use async_trait::async_trait;
use redact_core::{Document, Span};
use reqwest::{Response, Url, multipart};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::handler::{ExportFormat, ExportService, IngestionService, PersistReceipt, PersistenceService};
use crate::wire::{ErrorBody, RedactRequest, RedactResponse, UploadResponse};
use crate::{ClientError, Result};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// REST client for the redaction backend (`/upload`, `/redact`, `/download`)
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Turn a non-2xx response into an error, preferring the backend's `error` field
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    body.trim().to_string()
                }
            });

        Err(ClientError::Service {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl IngestionService for HttpBackend {
    async fn ingest(&self, path: &Path) -> Result<Document> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ClientError::Decode(format!("no file name in {}", path.display())))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        debug!(file = %file_name, size = bytes.len(), "uploading document");

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(DOCX_MIME)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint(&["upload"])?)
            .multipart(form)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        let (filename, original_filename, paragraphs) = body.into_parts()?;

        info!(
            filename = %filename,
            paragraphs = paragraphs.len(),
            "document ingested"
        );
        Ok(Document::new(filename, original_filename, paragraphs))
    }
}

#[async_trait]
impl PersistenceService for HttpBackend {
    async fn persist(&self, filename: &str, redactions: &[Span]) -> Result<PersistReceipt> {
        let request = RedactRequest::new(filename, redactions);

        let response = self
            .client
            .post(self.endpoint(&["redact"])?)
            .json(&request)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let body: RedactResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        if !body.success {
            return Err(ClientError::Rejected(
                body.error
                    .unwrap_or_else(|| "redactions were not saved".to_string()),
            ));
        }

        debug!(filename, count = ?body.redaction_count, "redactions persisted");
        Ok(PersistReceipt {
            redaction_count: body.redaction_count,
            message: body.message,
        })
    }
}

#[async_trait]
impl ExportService for HttpBackend {
    async fn export(&self, filename: &str, format: ExportFormat) -> Result<Vec<u8>> {
        let url = self.endpoint(&["download", format.as_str(), filename])?;

        let response = self.client.get(url).send().await?;
        let response = Self::check(response).await?;
        let bytes = response.bytes().await?;

        if bytes.is_empty() {
            return Err(ClientError::Decode("backend returned an empty file".to_string()));
        }
        debug!(filename, %format, size = bytes.len(), "export downloaded");
        Ok(bytes.to_vec())
    }
}
