use clap::{Parser, Subcommand};
use redact_client::ExportFormat;
use std::path::PathBuf;

use crate::commands::SpanArg;

#[derive(Parser)]
#[command(name = "redact")]
#[command(about = "Mark character ranges in documents and export redacted copies", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true, env = "REDACT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend base URL, overrides the config file
    #[arg(long, global = true, env = "REDACT_BACKEND")]
    pub backend: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a document and list its paragraphs
    Inspect {
        /// Document to upload (.docx)
        file: PathBuf,

        /// Print paragraphs as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a document with spans masked, without committing anything
    Preview {
        /// Document to upload (.docx)
        file: PathBuf,

        /// Span to mask as PARAGRAPH:START-END (character offsets, end exclusive)
        #[arg(short, long = "span")]
        spans: Vec<SpanArg>,

        /// Only print paragraphs touched by a span
        #[arg(long)]
        only_masked: bool,
    },

    /// Commit spans and download the redacted document
    Apply {
        /// Document to upload (.docx)
        file: PathBuf,

        /// Span to redact as PARAGRAPH:START-END (character offsets, end exclusive)
        #[arg(short, long = "span", required = true)]
        spans: Vec<SpanArg>,

        /// Export format (default from config: docx)
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Output file (default: redacted_<name> in the export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Interactive session: select, queue, commit and export
    Session {
        /// Document to upload (.docx)
        file: PathBuf,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Print the config file location
    Path,
}
