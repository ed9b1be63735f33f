use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Terminal todo list backed by a remote todo service.
/// The service URL comes from --api, $API_ENDPOINT or the config file.
#[derive(Parser)]
#[command(name = "todo", version, about = "Todo list synced with a remote service")]
pub struct Cli {
    /// Base URL of the todo service.
    #[arg(long, global = true)]
    pub api: Option<String>,

    /// Path to a YAML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Defaults to `ui`.
    #[command(subcommand)]
    pub command: Option<Commands>,
}
