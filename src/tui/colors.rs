//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Title bar and focused borders
pub const ACCENT: Color = Color::Rgb(70, 110, 200);
/// Success notifications
pub const SUCCESS_GREEN: Color = Color::Rgb(0, 110, 40);
/// Error notifications and the delete hint
pub const ERROR_RED: Color = Color::Rgb(170, 20, 20);
/// Completed items, placeholders, timestamps
pub const MUTED: Color = Color::Rgb(130, 130, 130);
