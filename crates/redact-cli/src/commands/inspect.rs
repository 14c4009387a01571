use anyhow::Result;
use redact_config::Config;
use serde::Serialize;
use std::path::PathBuf;

use super::build_workbench;

#[derive(Serialize)]
struct ParagraphRow<'a> {
    id: u32,
    chars: usize,
    text: &'a str,
}

pub async fn handle(config: &Config, file: PathBuf, json: bool) -> Result<()> {
    let workbench = build_workbench(config)?;
    let document = workbench.load(&file).await?;

    if json {
        let rows: Vec<ParagraphRow<'_>> = document
            .paragraphs
            .iter()
            .map(|p| ParagraphRow {
                id: p.id.0,
                chars: p.char_len(),
                text: p.text(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Document: {}", document.original_filename);
    println!("  Server name: {}", document.filename);
    println!("  Paragraphs: {}", document.paragraphs.len());
    println!();
    for paragraph in document.paragraphs.iter() {
        println!("[{:>3}] ({} chars) {}", paragraph.id, paragraph.char_len(), paragraph.text());
    }

    Ok(())
}
