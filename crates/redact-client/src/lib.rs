//! Redaction backend collaborators
//!
//! Traits for ingestion, persistence and export, plus the reqwest-based
//! [`HttpBackend`] that talks to the backend's REST API.

pub mod error;
pub mod handler;
pub mod http;
pub mod wire;

pub use error::{ClientError, Result};
pub use handler::{
    DocumentBackend, ExportFormat, ExportService, IngestionService, PersistReceipt,
    PersistenceService,
};
pub use http::HttpBackend;
