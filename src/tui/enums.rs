//! Enumerations for TUI state management.

/// Which part of the screen receives key presses.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Focus {
    /// The new-todo input line. Default on startup.
    Input,
    /// The todo list.
    List,
}

impl Focus {
    pub fn toggle(self) -> Self {
        match self {
            Focus::Input => Focus::List,
            Focus::List => Focus::Input,
        }
    }
}
