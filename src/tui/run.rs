//! TUI entry point and terminal setup.

use std::io;
use std::sync::Arc;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tokio::runtime::Handle;
use tracing::info;

use crate::api::TodoApi;
use crate::config::Config;
use crate::tui::app::App;

/// Initialise the terminal, run the UI until the user quits, then restore the terminal.
pub fn run_tui(config: &Config, api: Arc<dyn TodoApi>, runtime: Handle) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!(api = %config.api_endpoint, "starting terminal UI");
    let mut app = App::new(config, api, runtime);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
