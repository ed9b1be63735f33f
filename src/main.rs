use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use todo_list::api::{HttpTodoApi, TodoApi};
use todo_list::cli::Cli;
use todo_list::cmd::*;
use todo_list::config::Config;
use todo_list::logging;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Completions need neither config nor network.
    if let Some(Commands::Completions { shell }) = &cli.command {
        cmd_completions(*shell);
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(true) => ExitCode::FAILURE,
        Ok(false) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns true when the command surfaced an error notification.
fn run(cli: Cli) -> Result<bool> {
    let config = Config::resolve(cli.config.as_deref(), cli.api.as_deref())?;
    let _log_guard = logging::init(&config.log_dir());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let api: Arc<dyn TodoApi> = Arc::new(
        HttpTodoApi::new(&config.api_endpoint, config.request_timeout())
            .context("failed to build HTTP client")?,
    );
    info!(api = %config.api_endpoint, "resolved configuration");

    let command = cli.command.unwrap_or(Commands::Ui);
    if let Commands::Ui = command {
        cmd_ui(&config, api, runtime.handle().clone())?;
        return Ok(false);
    }

    let mut headless = Headless::new(api, runtime.handle().clone(), &config);
    match command {
        Commands::Ui => unreachable!("UI command handled above"),
        Commands::Completions { .. } => unreachable!("completions handled in main"),
        Commands::List { json } => cmd_list(&mut headless, json),
        Commands::Add { title } => cmd_add(&mut headless, &title),
        Commands::Complete { id } => cmd_complete(&mut headless, &id),
        Commands::Delete { id } => cmd_delete(&mut headless, &id),
        Commands::CompleteAll => cmd_complete_all(&mut headless),
        Commands::ClearCompleted => cmd_clear_completed(&mut headless),
    }
}
