//! Main application logic for the terminal user interface.
//!
//! `App` owns the [`ViewState`] and the [`Synchronizer`]. Key presses become gestures,
//! gestures become background actions, and every loop iteration folds finished
//! actions back into the state before drawing.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::runtime::Handle;

use crate::api::TodoApi;
use crate::config::Config;
use crate::notify::ToastLevel;
use crate::sync::{Synchronizer, ViewState};
use crate::tui::{
    colors::{ACCENT, ERROR_RED, MUTED, SUCCESS_GREEN},
    enums::Focus,
    utils::{bottom_center_rect, centered_rect},
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];
const PLACEHOLDER: &str = "Press Enter to add a new todo";
const EMPTY_LIST: &str = "Please add a todo item";
const TOAST_WIDTH: u16 = 44;
const MAX_VISIBLE_TOASTS: usize = 3;

/// Main application state for the terminal user interface.
pub struct App {
    state: ViewState,
    sync: Synchronizer,
    focus: Focus,
    list_state: ListState,
    show_help: bool,
    spinner: usize,
}

impl App {
    /// Create the app and start the initial list load.
    pub fn new(config: &Config, api: Arc<dyn TodoApi>, runtime: Handle) -> Self {
        let app = App {
            state: ViewState::new(config.toast_lifetime()),
            sync: Synchronizer::new(api, runtime),
            focus: Focus::Input,
            list_state: ListState::default(),
            show_help: false,
            spinner: 0,
        };
        app.sync.dispatch(Some(app.state.request_load()));
        app
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    fn selected_id(&self) -> Option<String> {
        self.list_state
            .selected()
            .and_then(|i| self.state.todos.get(i))
            .map(|t| t.id.clone())
    }

    /// Keep the same item selected across a list replacement when it still exists.
    fn sync_selection(&mut self, previous: Option<String>) {
        let todos = &self.state.todos;
        if todos.is_empty() {
            self.list_state.select(None);
            return;
        }
        let idx = previous
            .and_then(|id| todos.iter().position(|t| t.id == id))
            .or_else(|| self.list_state.selected().map(|i| i.min(todos.len() - 1)))
            .unwrap_or(0);
        self.list_state.select(Some(idx));
    }

    /// Apply finished actions, expire toasts and advance the spinner.
    pub fn tick(&mut self) {
        let previous = self.selected_id();
        if self.sync.drain(&mut self.state) > 0 {
            self.sync_selection(previous);
        }
        self.state.toasts.prune(Instant::now());
        self.spinner = self.spinner.wrapping_add(1);
    }

    /// Handle one key press. Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        if self.show_help {
            self.show_help = false;
            return false;
        }
        if key == KeyCode::Tab {
            self.focus = self.focus.toggle();
            return false;
        }
        match self.focus {
            Focus::Input => self.handle_input_key(key, modifiers),
            Focus::List => self.handle_list_key(key),
        }
    }

    fn handle_input_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        match key {
            KeyCode::Enter => {
                let action = self.state.request_add();
                self.sync.dispatch(action);
            }
            KeyCode::Esc | KeyCode::Down => self.focus = Focus::List,
            KeyCode::Backspace => self.state.input.handle_backspace(),
            KeyCode::Delete => self.state.input.handle_delete(),
            KeyCode::Left => self.state.input.move_cursor_left(),
            KeyCode::Right => self.state.input.move_cursor_right(),
            KeyCode::Home => self.state.input.move_home(),
            KeyCode::End => self.state.input.move_end(),
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.input.handle_char(c)
            }
            _ => {}
        }
        false
    }

    fn handle_list_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('i') => self.focus = Focus::Input,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(selected) = self.list_state.selected() {
                    if selected > 0 {
                        self.list_state.select(Some(selected - 1));
                    } else {
                        self.focus = Focus::Input;
                    }
                } else {
                    self.focus = Focus::Input;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(selected) = self.list_state.selected() {
                    if selected + 1 < self.state.todos.len() {
                        self.list_state.select(Some(selected + 1));
                    }
                } else if !self.state.todos.is_empty() {
                    self.list_state.select(Some(0));
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('c') => {
                if let Some(id) = self.selected_id() {
                    let action = self.state.request_complete(&id);
                    self.sync.dispatch(action);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_id() {
                    let action = self.state.request_delete(&id);
                    self.sync.dispatch(action);
                }
            }
            KeyCode::Char('A') => {
                let action = self.state.request_complete_all();
                self.sync.dispatch(action);
            }
            KeyCode::Char('C') => {
                let action = self.state.request_clear_completed();
                self.sync.dispatch(action);
            }
            KeyCode::Char('r') => {
                let action = self.state.request_load();
                self.sync.dispatch(Some(action));
            }
            _ => {}
        }
        false
    }

    /// Poll for a key press and handle it. Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    fn spinner_frame(&self) -> &'static str {
        SPINNER[self.spinner % SPINNER.len()]
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let header = Paragraph::new(Line::from(Span::styled(
            "TODO List",
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_input(&self, f: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Input;
        let title = if self.state.is_adding() {
            format!(" New todo {} ", self.spinner_frame())
        } else {
            " New todo ".to_string()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(if focused {
                Style::default().fg(ACCENT)
            } else {
                Style::default()
            });
        let inner = block.inner(area);
        f.render_widget(block, area);

        let input = &self.state.input;
        let (visible, column) = input.view(inner.width as usize);
        let line = if input.value.is_empty() {
            Line::from(Span::styled(
                PLACEHOLDER,
                Style::default().fg(MUTED).add_modifier(Modifier::ITALIC),
            ))
        } else {
            Line::from(visible)
        };
        f.render_widget(Paragraph::new(line), inner);

        if focused && !self.show_help {
            f.set_cursor_position((inner.x + column as u16, inner.y));
        }
    }

    fn render_list(&mut self, f: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::List;
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Todos ({}) ", self.state.todos.len()))
            .border_style(if focused {
                Style::default().fg(ACCENT)
            } else {
                Style::default()
            });

        if self.state.todos.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(
                EMPTY_LIST,
                Style::default().fg(MUTED).add_modifier(Modifier::ITALIC),
            )))
            .block(block)
            .alignment(Alignment::Center);
            f.render_widget(empty, area);
            return;
        }

        let spinner = self.spinner_frame();
        let items: Vec<ListItem> = self
            .state
            .todos
            .iter()
            .map(|todo| {
                let (checkbox, title_style) = if todo.completed {
                    (
                        "[x] ",
                        Style::default().fg(MUTED).add_modifier(Modifier::CROSSED_OUT),
                    )
                } else {
                    ("[ ] ", Style::default())
                };
                let mut first = vec![Span::raw(checkbox), Span::styled(todo.title.clone(), title_style)];
                if self.state.is_item_busy(&todo.id) {
                    first.push(Span::styled(format!(" {spinner}"), Style::default().fg(ACCENT)));
                }
                let second = Line::from(Span::styled(
                    format!("    {}", todo.timestamp_label()),
                    Style::default().fg(MUTED),
                ));
                ListItem::new(Text::from(vec![Line::from(first), second]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        f.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn render_footer(&self, f: &mut Frame, area: Rect) {
        let action_style = |enabled: bool| {
            if enabled {
                Style::default().add_modifier(Modifier::UNDERLINED)
            } else {
                Style::default().fg(MUTED)
            }
        };
        let spinner = self.spinner_frame();

        let complete_all = if self.state.is_completing_all() {
            Span::styled(format!("     {spinner}      "), Style::default().fg(ACCENT))
        } else {
            Span::styled("Complete All", action_style(self.state.remaining > 0))
        };
        let clear_completed = if self.state.is_clearing_completed() {
            Span::styled(format!("       {spinner}       "), Style::default().fg(ACCENT))
        } else {
            Span::styled("Clear Completed", action_style(self.state.has_completed()))
        };

        let footer = Line::from(vec![
            Span::raw(format!(" {} items left", self.state.remaining)),
            Span::raw("    "),
            complete_all,
            Span::raw(" (A)    "),
            clear_completed,
            Span::raw(" (C)"),
        ]);
        f.render_widget(Paragraph::new(footer), area);
    }

    fn render_toasts(&self, f: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .state
            .toasts
            .iter()
            .take(MAX_VISIBLE_TOASTS)
            .map(|toast| {
                let bg = match toast.level {
                    ToastLevel::Success => SUCCESS_GREEN,
                    ToastLevel::Error => ERROR_RED,
                };
                Line::from(Span::styled(
                    format!(" {} ", toast.message),
                    Style::default().bg(bg).fg(Color::White),
                ))
            })
            .collect();
        if lines.is_empty() {
            return;
        }

        let rect = bottom_center_rect(TOAST_WIDTH, lines.len() as u16 + 2, area);
        f.render_widget(Clear, rect);
        let toasts = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(toasts, rect);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("Input", bold)),
            Line::from("  Enter        Add todo"),
            Line::from("  Tab/Esc/Down Go to list"),
            Line::from(""),
            Line::from(Span::styled("List", bold)),
            Line::from("  Up/k Down/j  Move selection"),
            Line::from("  Enter/Space  Complete selected"),
            Line::from("  d/Del        Delete selected"),
            Line::from("  A            Complete all"),
            Line::from("  C            Clear completed"),
            Line::from("  r            Reload list"),
            Line::from("  i/Tab        Back to input"),
            Line::from("  q/Esc        Quit"),
            Line::from(""),
            Line::from("  Ctrl+C       Quit from anywhere"),
        ];

        let rect = centered_rect(60, 70, area);
        f.render_widget(Clear, rect);
        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press any key to return"),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, rect);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = match self.focus {
            Focus::Input => "Enter add | Tab list | ? help (from list) | Ctrl+C quit",
            Focus::List => "Space complete | d delete | A complete all | C clear completed | r reload | ? help | q quit",
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(ACCENT).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Draw the whole screen.
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // title
                Constraint::Length(3), // input
                Constraint::Min(3),    // list
                Constraint::Length(1), // footer
                Constraint::Length(1), // status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_input(f, chunks[1]);
        self.render_list(f, chunks[2]);
        self.render_footer(f, chunks[3]);
        self.render_status_bar(f, chunks[4]);
        self.render_toasts(f, chunks[2]);

        if self.show_help {
            self.render_help(f, f.area());
        }
    }

    /// Main event loop for the TUI application.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.tick();
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}
