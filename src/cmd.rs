//! Command implementations for the CLI interface.
//!
//! The non-interactive commands drive the same gesture, execute and apply path the
//! terminal UI uses, one action at a time, then print the notifications and the
//! reloaded list.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use tokio::runtime::Handle;

use crate::api::TodoApi;
use crate::cli::Cli;
use crate::config::Config;
use crate::notify::{Toast, ToastLevel};
use crate::sync::{self, Action, ViewState};
use crate::todo::{format_local, Todo, TITLE_MAX_CHARS};
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive UI (default).
    Ui,

    /// Print the current list.
    List {
        /// Print the raw items as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add a new todo.
    Add {
        /// Title, trimmed before sending. At most 200 characters.
        title: String,
    },

    /// Mark a todo completed.
    Complete {
        /// Server-assigned identifier.
        id: String,
    },

    /// Delete a todo.
    Delete {
        /// Server-assigned identifier.
        id: String,
    },

    /// Mark every open todo completed.
    CompleteAll,

    /// Delete every completed todo.
    ClearCompleted,

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// One-shot driver for the non-interactive commands.
pub struct Headless {
    api: Arc<dyn TodoApi>,
    runtime: Handle,
    pub state: ViewState,
}

impl Headless {
    pub fn new(api: Arc<dyn TodoApi>, runtime: Handle, config: &Config) -> Self {
        Self {
            api,
            runtime,
            state: ViewState::new(config.toast_lifetime()),
        }
    }

    /// Fetch the list so the guards see current counts.
    pub fn load(&mut self) {
        let action = self.state.request_load();
        self.run(action);
    }

    /// Run a gesture's action to completion. `None` means the guard refused it.
    /// Returns the notifications it produced, oldest first.
    pub fn perform(&mut self, action: Option<Action>) -> Option<Vec<Toast>> {
        let action = action?;
        self.run(action);
        Some(self.state.toasts.drain())
    }

    fn run(&mut self, action: Action) {
        let api = Arc::clone(&self.api);
        let events = self
            .runtime
            .block_on(async move { sync::run(api.as_ref(), action).await });
        for event in events {
            self.state.apply(event);
        }
    }
}

/// Print the toasts and the list. Returns true when any toast was an error.
fn report(headless: &mut Headless, toasts: Vec<Toast>) -> bool {
    let mut failed = false;
    for toast in toasts {
        match toast.level {
            ToastLevel::Success => println!("{}", toast.message),
            ToastLevel::Error => {
                failed = true;
                eprintln!("Error: {}", toast.message);
            }
        }
    }
    print_table(&headless.state.todos, headless.state.remaining);
    failed
}

/// Run one gesture end to end, printing `skipped` if its guard refused it.
fn perform_and_report(
    headless: &mut Headless,
    action: Option<Action>,
    skipped: &str,
) -> Result<bool> {
    // Errors from the initial load are reported alongside the action's own.
    let load_toasts = headless.state.toasts.drain();
    match headless.perform(action) {
        Some(toasts) => Ok(report(
            headless,
            load_toasts.into_iter().chain(toasts).collect(),
        )),
        None => {
            println!("{skipped}");
            Ok(report(headless, load_toasts))
        }
    }
}

pub fn cmd_ui(config: &Config, api: Arc<dyn TodoApi>, runtime: Handle) -> Result<()> {
    run_tui(config, api, runtime).context("terminal UI failed")
}

pub fn cmd_list(headless: &mut Headless, json: bool) -> Result<bool> {
    headless.load();
    let toasts = headless.state.toasts.drain();
    if json {
        let failed = toasts.iter().any(|t| t.level == ToastLevel::Error);
        for toast in toasts.iter().filter(|t| t.level == ToastLevel::Error) {
            eprintln!("Error: {}", toast.message);
        }
        let out = serde_json::to_string_pretty(&headless.state.todos)
            .context("failed to serialize todo list")?;
        println!("{out}");
        return Ok(failed);
    }
    Ok(report(headless, toasts))
}

pub fn cmd_add(headless: &mut Headless, title: &str) -> Result<bool> {
    let len = title.trim().chars().count();
    if len > TITLE_MAX_CHARS {
        bail!("title is {len} characters, the limit is {TITLE_MAX_CHARS}");
    }
    headless.load();
    headless.state.input.set(title.trim());
    let action = headless.state.request_add();
    perform_and_report(headless, action, "Nothing to add: title is empty")
}

pub fn cmd_complete(headless: &mut Headless, id: &str) -> Result<bool> {
    headless.load();
    let action = headless.state.request_complete(id);
    let skipped = format!("Nothing to do: no open todo with id {id}");
    perform_and_report(headless, action, &skipped)
}

pub fn cmd_delete(headless: &mut Headless, id: &str) -> Result<bool> {
    headless.load();
    let action = headless.state.request_delete(id);
    perform_and_report(headless, action, "Nothing to delete")
}

pub fn cmd_complete_all(headless: &mut Headless) -> Result<bool> {
    headless.load();
    let action = headless.state.request_complete_all();
    perform_and_report(headless, action, "Nothing to do: no open todos")
}

pub fn cmd_clear_completed(headless: &mut Headless) -> Result<bool> {
    headless.load();
    let action = headless.state.request_clear_completed();
    perform_and_report(headless, action, "Nothing to do: no completed todos")
}

pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
}

/// Print todos in a table followed by the remaining count.
pub fn print_table(todos: &[Todo], remaining: usize) {
    for line in format_table(todos, remaining) {
        println!("{line}");
    }
}

pub fn format_table(todos: &[Todo], remaining: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(todos.len() + 2);
    if todos.is_empty() {
        lines.push("Please add a todo item".to_string());
    } else {
        lines.push(format!("{:<24} {:<4} {:<40} {}", "ID", "Done", "Title", "When"));
        for t in todos {
            let when = match (t.completed, t.completed_at) {
                (true, Some(at)) => format_local(at),
                _ => format_local(t.created_at),
            };
            lines.push(format!(
                "{:<24} {:<4} {:<40} {}",
                truncate(&t.id, 24),
                if t.completed { "[x]" } else { "[ ]" },
                truncate(&t.title, 40),
                when
            ));
        }
    }
    lines.push(format!("{remaining} items left"));
    lines
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}
