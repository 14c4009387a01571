use anyhow::Result;
use redact_client::ExportFormat;
use redact_config::Config;
use std::path::PathBuf;
use tracing::debug;

use super::{SpanArg, build_workbench, enqueue_all, write_artifact};

pub async fn handle(
    config: &Config,
    file: PathBuf,
    spans: Vec<SpanArg>,
    format: Option<ExportFormat>,
    output: Option<PathBuf>,
) -> Result<()> {
    let format = format.unwrap_or(config.export.format);

    let workbench = build_workbench(config)?;
    workbench.load(&file).await?;

    let queued = enqueue_all(&workbench, &spans).await?;
    if queued == 0 {
        anyhow::bail!("no spans to redact");
    }
    debug!(queued, format = %format, "exporting redacted document");

    // export commits the queue before downloading
    let artifact = workbench.export(format).await?;
    let path = write_artifact(config, &artifact, output)?;

    if let Some(report) = &artifact.auto_commit {
        println!("✓ Committed {} redaction(s)", report.committed);
    }
    println!("✓ Wrote {}", path.display());

    Ok(())
}
