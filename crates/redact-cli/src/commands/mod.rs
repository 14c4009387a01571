pub mod apply;
pub mod config;
pub mod inspect;
pub mod preview;
pub mod session;

use anyhow::{Context, Result};
use redact_client::HttpBackend;
use redact_config::Config;
use redact_core::{ParagraphId, RenderedDocument};
use redact_engine::{ExportArtifact, Workbench, WorkbenchOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Load the config file and apply command-line overrides
pub fn load_config(path: Option<&Path>, backend: Option<&str>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load()?,
    };
    if let Some(url) = backend {
        config.backend.base_url = url.to_string();
    }
    config.validate()?;
    Ok(config)
}

pub fn build_workbench(config: &Config) -> Result<Workbench> {
    let backend = HttpBackend::new(
        &config.backend.base_url,
        Duration::from_secs(config.backend.timeout_secs),
        &config.backend.user_agent,
    )?;

    let options = WorkbenchOptions {
        commit_policy: config.session.commit_policy,
        mask: config.session.mask_char,
        allowed_extensions: config
            .session
            .allowed_extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect(),
    };

    Ok(Workbench::new(Arc::new(backend), options))
}

/// A span given on the command line as `PARAGRAPH:START-END`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanArg {
    pub paragraph: ParagraphId,
    pub start: usize,
    pub end: usize,
}

impl FromStr for SpanArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let err = || format!("invalid span '{}', expected PARAGRAPH:START-END", s);

        let (paragraph, range) = s.split_once(':').ok_or_else(err)?;
        let (start, end) = range.split_once('-').ok_or_else(err)?;

        let paragraph = paragraph.trim().parse::<u32>().map_err(|_| err())?;
        let start = start.trim().parse::<usize>().map_err(|_| err())?;
        let end = end.trim().parse::<usize>().map_err(|_| err())?;
        if start >= end {
            return Err(format!("invalid span '{}', START must be less than END", s));
        }

        Ok(Self {
            paragraph: ParagraphId(paragraph),
            start,
            end,
        })
    }
}

/// Queue every span, stopping at the first one that is not a warning
pub async fn enqueue_all(workbench: &Workbench, spans: &[SpanArg]) -> Result<usize> {
    let mut queued = 0;
    for span in spans {
        match workbench
            .enqueue_range(span.paragraph, span.start, span.end)
            .await
        {
            Ok(_) => queued += 1,
            Err(e) if e.is_warning() => eprintln!("! {}", e),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(queued)
}

pub fn print_document(doc: &RenderedDocument, only_masked: bool) {
    for paragraph in &doc.paragraphs {
        if only_masked && !paragraph.masked {
            continue;
        }
        println!("[{:>3}] {}", paragraph.id, paragraph.text);
    }
}

pub fn write_artifact(
    config: &Config,
    artifact: &ExportArtifact,
    output: Option<PathBuf>,
) -> Result<PathBuf> {
    let path = match output {
        Some(path) => path,
        None => config
            .export
            .output_dir
            .clone()
            .unwrap_or_default()
            .join(&artifact.file_name),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &artifact.bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use redact_client::ExportFormat;
    use redact_core::CommitPolicy;

    #[test]
    fn test_parse_span_arg() {
        let span: SpanArg = "3:4-9".parse().unwrap();
        assert_eq!(
            span,
            SpanArg {
                paragraph: ParagraphId(3),
                start: 4,
                end: 9
            }
        );
        assert!("3:9-4".parse::<SpanArg>().is_err());
        assert!("3:4".parse::<SpanArg>().is_err());
        assert!("x:1-2".parse::<SpanArg>().is_err());
        assert!("4-9".parse::<SpanArg>().is_err());
    }

    #[test]
    fn test_build_workbench_uses_configured_policy() {
        let mut config = Config::default();
        config.session.commit_policy = CommitPolicy::Staged;
        let workbench = build_workbench(&config).unwrap();
        assert_eq!(workbench.options().commit_policy, CommitPolicy::Staged);
    }

    #[test]
    fn test_build_workbench_normalizes_extensions() {
        let mut config = Config::default();
        config.session.allowed_extensions = vec![".DOCX".to_string()];
        let workbench = build_workbench(&config).unwrap();
        assert_eq!(workbench.options().allowed_extensions, vec!["docx".to_string()]);
    }

    #[test]
    fn test_write_artifact_to_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = ExportArtifact {
            file_name: "redacted_memo.docx".to_string(),
            format: ExportFormat::Docx,
            bytes: b"bytes".to_vec(),
            auto_commit: None,
        };

        let mut config = Config::default();
        config.export.output_dir = Some(dir.path().join("out"));
        let path = write_artifact(&config, &artifact, None).unwrap();
        assert_eq!(path, dir.path().join("out").join("redacted_memo.docx"));
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
    }
}
