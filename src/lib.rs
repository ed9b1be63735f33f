//! # todo - terminal todo list for a remote todo service
//!
//! A terminal user interface (plus a handful of scripting commands) over an HTTP JSON
//! todo API. The service owns all data: identifiers, timestamps, validation and
//! persistence. This crate only renders the latest list, turns key presses into
//! requests, and re-fetches the full list after every change.
//!
//! ## Quick Start
//!
//! ```bash
//! # Launch the UI against a local service
//! todo --api http://localhost:8080
//!
//! # Script it
//! todo add "write report"
//! todo list
//! todo complete-all
//! ```
//!
//! The service URL resolves from `--api`, then `$API_ENDPOINT`, then
//! `~/.config/todo-list/config.yaml`, then `http://localhost:8080`.

pub mod api;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod logging;
pub mod notify;
pub mod sync;
pub mod todo;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod utils;
}
