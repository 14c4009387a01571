use anyhow::Result;
use redact_config::Config;
use redact_core::RenderView;
use std::path::PathBuf;

use super::{SpanArg, build_workbench, enqueue_all, print_document};

pub async fn handle(
    config: &Config,
    file: PathBuf,
    spans: Vec<SpanArg>,
    only_masked: bool,
) -> Result<()> {
    let workbench = build_workbench(config)?;
    workbench.load(&file).await?;

    let queued = enqueue_all(&workbench, &spans).await?;
    let doc = workbench.render(RenderView::All).await?;

    print_document(&doc, only_masked);
    println!();
    println!("{} span(s) previewed, nothing committed", queued);
    println!("Render hash: {}", doc.render_hash);

    Ok(())
}
