//! # Text Buffer Management
//!
//! Core text buffer that represents the single open document.
//!
//! ## What it does
//!
//! - Stores text as lines in memory
//! - Tracks the cursor as a `(row, column)` pair of byte offsets
//! - Handles file loading/saving with LF normalization
//!
//! ## Invariants
//!
//! - There is always at least one line; an empty document is one empty line.
//! - `row < content.len()` and `col <= content[row].len()`.
//! - `col` always sits on a UTF-8 character boundary, so edits never split a
//!   multi-byte character.
//!
//! Undo history lives in [`crate::history`]; the buffer itself never
//! snapshots.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct Buffer {
    pub content: Vec<String>,
    pub path: Option<PathBuf>,
    pub name: String,
    pub modified: bool,
    pub cursor_pos: (usize, usize), // (row, column)
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            content: vec![String::new()],
            path: None,
            name: String::from("untitled"),
            modified: false,
            cursor_pos: (0, 0),
        }
    }

    /// Build a buffer from raw file bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut buffer = Self::new();
        buffer.load_from_bytes(data)?;
        Ok(buffer)
    }

    /// Read a file into a new buffer bound to `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = std::fs::read(&path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        let mut buffer = Self::from_bytes(&data)
            .with_context(|| format!("cannot open {}", path.display()))?;
        buffer.set_path(path);
        Ok(buffer)
    }

    /// Replace the content with `data`, normalizing CRLF to LF and splitting
    /// on LF. The cursor returns to the origin.
    ///
    /// Fails without touching the buffer when `data` is not UTF-8.
    pub fn load_from_bytes(&mut self, data: &[u8]) -> Result<()> {
        let text = std::str::from_utf8(data).map_err(|e| anyhow!("not a UTF-8 text file: {}", e))?;
        let normalized = text.replace("\r\n", "\n");

        self.content = normalized.split('\n').map(str::to_owned).collect();
        self.cursor_pos = (0, 0);
        self.modified = false;
        Ok(())
    }

    /// Join the lines with LF. No trailing newline is added.
    pub fn serialize(&self) -> Vec<u8> {
        self.content_as_string().into_bytes()
    }

    /// Get buffer content as a string without allocating intermediate strings
    pub fn content_as_string(&self) -> String {
        let total: usize = self.content.iter().map(|line| line.len() + 1).sum();
        let mut result = String::with_capacity(total.saturating_sub(1));

        for (i, line) in self.content.iter().enumerate() {
            result.push_str(line);
            if i < self.content.len() - 1 {
                result.push('\n');
            }
        }

        result
    }

    pub fn set_path(&mut self, path: PathBuf) {
        self.name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("untitled")
            .to_string();
        self.path = Some(path);
    }

    pub fn line_count(&self) -> usize {
        self.content.len()
    }

    /// Whether `cursor_pos` points at a char boundary inside the content.
    /// Edits refuse to run from an invalid position.
    pub fn cursor_is_valid(&self) -> bool {
        let (row, col) = self.cursor_pos;
        self.content
            .get(row)
            .is_some_and(|line| col <= line.len() && line.is_char_boundary(col))
    }

    /// Insert `c` at the cursor. Returns false if the cursor is invalid.
    pub fn insert_char(&mut self, c: char) -> bool {
        if !self.cursor_is_valid() {
            return false;
        }
        let (row, col) = self.cursor_pos;
        self.content[row].insert(col, c);
        self.cursor_pos.1 += c.len_utf8();
        self.modified = true;
        true
    }

    pub fn insert_newline(&mut self) -> bool {
        if !self.cursor_is_valid() {
            return false;
        }
        let (row, col) = self.cursor_pos;
        let tail = self.content[row].split_off(col);
        self.content.insert(row + 1, tail);
        self.cursor_pos = (row + 1, 0);
        self.modified = true;
        true
    }

    /// Delete the character before the cursor, or join with the previous
    /// line at column zero. Returns whether anything changed.
    pub fn backspace(&mut self) -> bool {
        if !self.cursor_is_valid() {
            return false;
        }
        let (row, col) = self.cursor_pos;
        if col > 0 {
            let line = &mut self.content[row];
            let start = prev_boundary(line, col);
            line.replace_range(start..col, "");
            self.cursor_pos.1 = start;
        } else if row > 0 {
            let current_line = self.content.remove(row);
            let prev_line = &mut self.content[row - 1];
            let new_col = prev_line.len();
            prev_line.push_str(&current_line);
            self.cursor_pos = (row - 1, new_col);
        } else {
            return false;
        }
        self.modified = true;
        true
    }

    pub fn move_cursor(&mut self, direction: CursorMovement) {
        if !self.cursor_is_valid() {
            return;
        }
        let (mut row, mut col) = self.cursor_pos;

        match direction {
            CursorMovement::Up => {
                if row > 0 {
                    row -= 1;
                    col = clamp_to_boundary(&self.content[row], col);
                }
            }
            CursorMovement::Down => {
                if row + 1 < self.content.len() {
                    row += 1;
                    col = clamp_to_boundary(&self.content[row], col);
                }
            }
            // Left/Right stay on the current line.
            CursorMovement::Left => {
                if col > 0 {
                    col = prev_boundary(&self.content[row], col);
                }
            }
            CursorMovement::Right => {
                let line = &self.content[row];
                if col < line.len() {
                    col = next_boundary(line, col);
                }
            }
        }

        self.cursor_pos = (row, col);
    }

    /// Move the cursor to `row`, keeping the column where the line allows.
    /// Out-of-range rows are rejected.
    pub fn jump_to_row(&mut self, row: usize) -> bool {
        if row >= self.content.len() {
            return false;
        }
        let col = clamp_to_boundary(&self.content[row], self.cursor_pos.1);
        self.cursor_pos = (row, col);
        true
    }

    /// Restore lines and cursor wholesale (used by undo/redo). A state that
    /// would break the buffer invariants is rejected.
    pub fn restore(&mut self, lines: &[String], cursor: (usize, usize)) -> bool {
        let (row, col) = cursor;
        let valid = lines
            .get(row)
            .is_some_and(|line| col <= line.len() && line.is_char_boundary(col));
        if !valid {
            return false;
        }
        self.content = lines.to_vec();
        self.cursor_pos = cursor;
        self.modified = true;
        true
    }

    pub fn save(&mut self) -> Result<PathBuf> {
        let path = self
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("untitled.txt"));
        self.save_to_path(&path)?;
        Ok(path)
    }

    /// Write the serialized content to `path` and adopt it as the buffer path.
    pub fn save_to_path(&mut self, path: &Path) -> Result<()> {
        std::fs::write(path, self.serialize())
            .with_context(|| format!("cannot save {}", path.display()))?;
        self.modified = false;
        self.set_path(path.to_path_buf());
        Ok(())
    }

    /// Check if the buffer has unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.modified
    }

    /// Count the number of digits in a number
    pub fn count_digits(mut n: usize) -> usize {
        if n == 0 {
            return 1;
        }
        let mut digits = 0;
        while n > 0 {
            digits += 1;
            n /= 10;
        }
        digits
    }

    /// Width of the line-number gutter. Reserves at least 4 digits so the
    /// text does not shift while the document grows.
    pub fn line_number_width(&self) -> usize {
        let total_lines = self.content.len().max(1);
        Self::count_digits(total_lines).max(4) + 1
    }
}

fn prev_boundary(line: &str, col: usize) -> usize {
    line[..col]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_boundary(line: &str, col: usize) -> usize {
    line[col..]
        .chars()
        .next()
        .map(|c| col + c.len_utf8())
        .unwrap_or(col)
}

fn clamp_to_boundary(line: &str, col: usize) -> usize {
    let mut col = col.min(line.len());
    while !line.is_char_boundary(col) {
        col -= 1;
    }
    col
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMovement {
    Up,
    Down,
    Left,
    Right,
}
