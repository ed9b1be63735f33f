//! Single-line text input for the new-todo field.

use unicode_width::UnicodeWidthChar;

use crate::todo::TITLE_MAX_CHARS;

fn cells(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// A text input field with a character-indexed cursor and a length cap.
#[derive(Debug, Clone)]
pub struct InputField {
    pub value: String,
    /// Cursor position in characters, not bytes.
    pub cursor: usize,
    pub max_chars: usize,
}

impl InputField {
    /// Create a new empty input field capped at the title limit.
    pub fn new() -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            max_chars: TITLE_MAX_CHARS,
        }
    }

    /// Replace the whole value, truncating to the cap, and park the cursor at the end.
    pub fn set(&mut self, value: &str) {
        self.value = value.chars().take(self.max_chars).collect();
        self.cursor = self.char_len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Insert a character at the cursor. Ignored once the cap is reached.
    pub fn handle_char(&mut self, c: char) {
        if self.char_len() >= self.max_chars {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn handle_backspace(&mut self) {
        if self.cursor > 0 {
            let at = self.byte_index(self.cursor - 1);
            self.value.remove(at);
            self.cursor -= 1;
        }
    }

    /// Delete the character at the cursor position.
    pub fn handle_delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// The text visible in a field `width` terminal cells wide, and the cursor's
    /// column within it. Scrolls so the cursor always has a cell to sit in.
    pub fn view(&self, width: usize) -> (String, usize) {
        let width = width.max(1);
        let chars: Vec<char> = self.value.chars().collect();
        let mut start = 0;
        let mut column: usize = chars[..self.cursor].iter().map(|&c| cells(c)).sum();
        while start < self.cursor && column >= width {
            column -= cells(chars[start]);
            start += 1;
        }

        let mut used = 0;
        let mut visible = String::new();
        for &c in &chars[start..] {
            used += cells(c);
            if used > width {
                break;
            }
            visible.push(c);
        }
        (visible, column)
    }
}

impl Default for InputField {
    fn default() -> Self {
        Self::new()
    }
}
