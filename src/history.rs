//! Bounded undo/redo history built from whole-buffer snapshots.

use std::path::PathBuf;

use crate::buffer::Buffer;

/// Default and maximum number of snapshots kept on the undo stack.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Immutable point-in-time copy of the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub lines: Vec<String>,
    pub row: usize,
    pub col: usize,
    pub path: Option<PathBuf>,
}

impl Snapshot {
    pub fn capture(buffer: &Buffer) -> Self {
        Self {
            lines: buffer.content.clone(),
            row: buffer.cursor_pos.0,
            col: buffer.cursor_pos.1,
            path: buffer.path.clone(),
        }
    }
}

/// Undo and redo stacks. After construction `undo` always holds at least
/// one snapshot, the known-good baseline.
#[derive(Debug, Clone)]
pub struct History {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    limit: usize,
}

impl History {
    pub fn new(buffer: &Buffer) -> Self {
        Self::with_limit(buffer, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(buffer: &Buffer, limit: usize) -> Self {
        Self {
            undo: vec![Snapshot::capture(buffer)],
            redo: Vec::new(),
            limit: limit.clamp(1, DEFAULT_HISTORY_LIMIT),
        }
    }

    /// Discard everything and start over from `buffer`, e.g. after opening
    /// another file.
    pub fn reset(&mut self, buffer: &Buffer) {
        self.undo.clear();
        self.redo.clear();
        self.undo.push(Snapshot::capture(buffer));
    }

    pub fn push_snapshot(&mut self, buffer: &Buffer) {
        self.undo.push(Snapshot::capture(buffer));
        if self.undo.len() > self.limit {
            let excess = self.undo.len() - self.limit;
            self.undo.drain(..excess);
        }
        self.redo.clear();
    }

    /// Step back one snapshot. The oldest snapshot is never popped.
    pub fn undo(&mut self, buffer: &mut Buffer) -> bool {
        if self.undo.len() <= 1 {
            return false;
        }
        if let Some(current) = self.undo.pop() {
            self.redo.push(current);
        }
        match self.undo.last() {
            Some(top) => buffer.restore(&top.lines, (top.row, top.col)),
            None => false,
        }
    }

    pub fn redo(&mut self, buffer: &mut Buffer) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let restored = buffer.restore(&next.lines, (next.row, next.col));
        self.undo.push(next);
        restored
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_drops_oldest() {
        let mut buffer = Buffer::new();
        let mut history = History::with_limit(&buffer, 3);
        for c in "abcde".chars() {
            buffer.insert_char(c);
            history.push_snapshot(&buffer);
        }
        assert_eq!(history.undo_len(), 3);

        // Only two steps back are possible; the oldest kept state is "abc".
        assert!(history.undo(&mut buffer));
        assert!(history.undo(&mut buffer));
        assert!(!history.undo(&mut buffer));
        assert_eq!(buffer.content[0], "abc");
    }

    #[test]
    fn test_limit_is_capped() {
        let mut buffer = Buffer::new();
        let mut history = History::with_limit(&buffer, 500);
        for _ in 0..400 {
            buffer.insert_char('a');
            history.push_snapshot(&buffer);
        }
        assert_eq!(history.undo_len(), DEFAULT_HISTORY_LIMIT);

        let history = History::with_limit(&buffer, 0);
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn test_push_clears_redo() {
        let mut buffer = Buffer::new();
        let mut history = History::new(&buffer);
        buffer.insert_char('x');
        history.push_snapshot(&buffer);
        history.undo(&mut buffer);
        assert_eq!(history.redo_len(), 1);

        buffer.insert_char('y');
        history.push_snapshot(&buffer);
        assert_eq!(history.redo_len(), 0);
        assert!(!history.redo(&mut buffer));
    }

    #[test]
    fn test_reset_keeps_single_baseline() {
        let mut buffer = Buffer::new();
        let mut history = History::new(&buffer);
        buffer.insert_char('x');
        history.push_snapshot(&buffer);

        let other = Buffer::from_bytes(b"fresh").unwrap();
        history.reset(&other);
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.redo_len(), 0);
    }
}
