mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = commands::load_config(cli.config.as_deref(), cli.backend.as_deref())?;

    // Initialize tracing; logs go to stderr so stdout stays clean for output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Inspect { file, json } => commands::inspect::handle(&config, file, json).await,
        cli::Commands::Preview {
            file,
            spans,
            only_masked,
        } => commands::preview::handle(&config, file, spans, only_masked).await,
        cli::Commands::Apply {
            file,
            spans,
            format,
            output,
        } => commands::apply::handle(&config, file, spans, format, output).await,
        cli::Commands::Session { file } => commands::session::handle(&config, file).await,
        cli::Commands::Config(cmd) => commands::config::handle(cmd, &config, cli.config.as_deref()),
    }
}
