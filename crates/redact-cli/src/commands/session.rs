//! Interactive session: one document, commands read line by line from stdin

use anyhow::Result;
use redact_client::ExportFormat;
use redact_config::Config;
use redact_core::{ParagraphId, RedactError, RenderView, Span, SpanId, SyncState};
use redact_engine::Workbench;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use super::{build_workbench, print_document, write_artifact};

const HELP: &str = "\
Commands:
  show [P]               show the document (or paragraph P) with spans masked
  committed              show only committed redactions, as an export would
  select P START END     select characters START..END of paragraph P
  add                    queue the current selection
  mark P START END       select and queue in one step
  queue                  list pending spans
  applied                list committed spans
  remove SPAN_ID         drop a pending span
  commit                 commit pending spans
  export [docx|pdf] [PATH]
                         download the redacted document (commits first)
  status                 show sync state
  clear                  drop all pending and committed spans
  reset                  unload the document
  help                   show this help
  quit                   leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplCommand {
    Show(Option<ParagraphId>),
    Committed,
    Select(ParagraphId, usize, usize),
    Add,
    Mark(ParagraphId, usize, usize),
    Queue,
    Applied,
    Remove(SpanId),
    Commit,
    Export(Option<ExportFormat>, Option<PathBuf>),
    Status,
    Clear,
    Reset,
    Help,
    Quit,
}

impl ReplCommand {
    fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (name, args.as_slice()) {
            ("show", []) => ReplCommand::Show(None),
            ("show", [p]) => ReplCommand::Show(Some(parse_paragraph(p)?)),
            ("committed", []) => ReplCommand::Committed,
            ("select", [p, s, e]) => {
                ReplCommand::Select(parse_paragraph(p)?, parse_offset(s)?, parse_offset(e)?)
            }
            ("add", []) => ReplCommand::Add,
            ("mark", [p, s, e]) => {
                ReplCommand::Mark(parse_paragraph(p)?, parse_offset(s)?, parse_offset(e)?)
            }
            ("queue", []) => ReplCommand::Queue,
            ("applied", []) => ReplCommand::Applied,
            ("remove", [id]) => {
                ReplCommand::Remove(id.parse().map_err(|e: RedactError| e.to_string())?)
            }
            ("commit", []) => ReplCommand::Commit,
            ("export", rest) if rest.len() <= 2 => {
                let mut format = None;
                let mut path = None;
                for arg in rest {
                    match arg.parse::<ExportFormat>() {
                        Ok(f) if format.is_none() && path.is_none() => format = Some(f),
                        _ if path.is_none() => path = Some(PathBuf::from(arg)),
                        _ => return Err("usage: export [docx|pdf] [PATH]".to_string()),
                    }
                }
                ReplCommand::Export(format, path)
            }
            ("status", []) => ReplCommand::Status,
            ("clear", []) => ReplCommand::Clear,
            ("reset", []) => ReplCommand::Reset,
            ("help" | "?", []) => ReplCommand::Help,
            ("quit" | "exit" | "q", []) => ReplCommand::Quit,
            _ => return Err(format!("unknown command '{}', try 'help'", line.trim())),
        };
        Ok(Some(command))
    }
}

fn parse_paragraph(s: &str) -> std::result::Result<ParagraphId, String> {
    s.parse::<u32>()
        .map(ParagraphId)
        .map_err(|_| format!("invalid paragraph '{}'", s))
}

fn parse_offset(s: &str) -> std::result::Result<usize, String> {
    s.parse::<usize>()
        .map_err(|_| format!("invalid offset '{}'", s))
}

pub async fn handle(config: &Config, file: PathBuf) -> Result<()> {
    let workbench = build_workbench(config)?;
    let document = workbench.load(&file).await?;
    println!(
        "Loaded {} ({} paragraphs). Type 'help' for commands.",
        document.original_filename,
        document.paragraphs.len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("redact> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match ReplCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("✗ {}", message);
                continue;
            }
        };
        if command == ReplCommand::Quit {
            break;
        }

        if let Err(e) = run(&workbench, config, command, &mut lines).await {
            match e.downcast_ref::<RedactError>() {
                Some(err) if err.is_warning() => println!("! {}", err),
                _ => println!("✗ {}", e),
            }
        }
    }

    if !workbench.pending().await.is_empty() {
        println!("! Leaving with uncommitted spans; they were not saved");
    }
    Ok(())
}

async fn run(
    workbench: &Workbench,
    config: &Config,
    command: ReplCommand,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    match command {
        ReplCommand::Show(None) => {
            print_document(&workbench.render(RenderView::All).await?, false);
        }
        ReplCommand::Show(Some(id)) => {
            println!("[{:>3}] {}", id, workbench.render_paragraph(id).await?);
        }
        ReplCommand::Committed => {
            print_document(&workbench.render(RenderView::Committed).await?, false);
        }
        ReplCommand::Select(id, start, end) => match workbench.select(id, start, end).await? {
            Some(candidate) => println!(
                "Selected \"{}\" ({}..{} in paragraph {})",
                candidate.text, candidate.start_offset, candidate.end_offset, candidate.paragraph_id
            ),
            None => println!("Selection cleared"),
        },
        ReplCommand::Add => {
            let span = workbench.enqueue_selection().await?;
            print_queued(&span);
        }
        ReplCommand::Mark(id, start, end) => {
            let span = workbench.enqueue_range(id, start, end).await?;
            print_queued(&span);
        }
        ReplCommand::Queue => print_spans("Pending", &workbench.pending().await),
        ReplCommand::Applied => print_spans("Committed", &workbench.applied().await),
        ReplCommand::Remove(id) => match workbench.dequeue(id).await? {
            Some(span) => println!("✓ Removed \"{}\"", span.captured_text),
            None => println!("No pending span {}", id),
        },
        ReplCommand::Commit => {
            let report = workbench.commit().await?;
            println!(
                "✓ Committed {} span(s), {} redaction(s) saved",
                report.committed,
                report.redaction_count.unwrap_or(report.applied_total)
            );
        }
        ReplCommand::Export(format, path) => {
            let format = format.unwrap_or(config.export.format);
            let artifact = workbench.export(format).await?;
            if let Some(report) = &artifact.auto_commit {
                println!(
                    "✓ Saved {} redaction(s) before export ({} newly committed)",
                    report.applied_total, report.committed
                );
            }
            let path = write_artifact(config, &artifact, path)?;
            println!("✓ Wrote {}", path.display());
        }
        ReplCommand::Status => {
            let pending = workbench.pending().await.len();
            let applied = workbench.applied().await.len();
            println!("Pending: {}  Committed: {}", pending, applied);
            match workbench.sync_state().await {
                SyncState::Clean => println!("Nothing committed yet"),
                SyncState::Synced => println!("Committed spans are saved"),
                SyncState::SyncFailed { message } => {
                    println!("! Last save failed: {} (local spans kept)", message)
                }
            }
        }
        ReplCommand::Clear => {
            print!("Drop all pending and committed spans? [y/N] ");
            std::io::stdout().flush()?;
            let answer = lines.next_line().await?.unwrap_or_default();
            if matches!(answer.trim(), "y" | "Y" | "yes") {
                workbench.clear_all().await;
                println!("✓ Cleared");
            } else {
                println!("Cancelled");
            }
        }
        ReplCommand::Reset => {
            workbench.reset().await;
            println!("✓ Document unloaded; start a new session to load another");
        }
        ReplCommand::Help => println!("{}", HELP),
        ReplCommand::Quit => {}
    }
    Ok(())
}

fn print_queued(span: &Span) {
    println!(
        "✓ Queued \"{}\" ({}..{} in paragraph {}) as {}",
        span.captured_text, span.start_offset, span.end_offset, span.paragraph_id, span.id
    );
}

fn print_spans(label: &str, spans: &[Span]) {
    if spans.is_empty() {
        println!("{}: none", label);
        return;
    }
    println!("{} ({}):", label, spans.len());
    for span in spans {
        println!(
            "  {}  [{}] {}..{} \"{}\"",
            span.id, span.paragraph_id, span.start_offset, span.end_offset, span.captured_text
        );
    }
}
