use anyhow::Result;
use redact_config::Config;
use std::path::Path;

use crate::cli::ConfigCommands;

pub fn handle(cmd: ConfigCommands, config: &Config, path: Option<&Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            print!("{}", toml::to_string_pretty(config)?);
        }
        ConfigCommands::Path => {
            let path = path
                .map(Path::to_path_buf)
                .unwrap_or_else(Config::config_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}
