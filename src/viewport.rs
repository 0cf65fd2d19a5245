/// Vertical window over the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub top: usize,
    pub rows: usize,
}

/// Rows of chrome around the editor body: header, status line and the
/// editor block padding.
const CHROME_ROWS: usize = 4;
const MIN_ROWS: usize = 5;
const MIN_TERMINAL_ROWS: usize = 6;

impl Default for Viewport {
    fn default() -> Self {
        Self { top: 0, rows: 25 }
    }
}

impl Viewport {
    pub fn new(rows: usize) -> Self {
        Self {
            top: 0,
            rows: rows.max(1),
        }
    }

    /// Scroll the minimum amount needed for `row` to be visible.
    pub fn ensure_visible(&mut self, row: usize) {
        if row < self.top {
            self.top = row;
        } else if row >= self.top + self.rows {
            self.top = row + 1 - self.rows;
        }
    }

    /// Recompute the editor height for a window `height` rows tall.
    pub fn resize(&mut self, height: u16, terminal_visible: bool) {
        let height = height as usize;
        let pane = terminal_pane_height(height as u16, terminal_visible) as usize;
        self.rows = height.saturating_sub(pane + CHROME_ROWS).max(MIN_ROWS);
    }

    /// Visible row range, clipped to `line_count`.
    pub fn visible_range(&self, line_count: usize) -> std::ops::Range<usize> {
        let start = self.top.min(line_count);
        let end = (self.top + self.rows).min(line_count);
        start..end
    }
}

/// Height of the shell pane: zero when hidden, else a quarter of the
/// window with a floor of six rows.
pub fn terminal_pane_height(height: u16, visible: bool) -> u16 {
    if visible {
        (height / 4).max(MIN_TERMINAL_ROWS as u16)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_visible_scrolls_down_minimally() {
        let mut viewport = Viewport::new(10);
        viewport.ensure_visible(15);
        assert_eq!(viewport.top, 6);
        viewport.ensure_visible(3);
        assert_eq!(viewport.top, 3);
        viewport.ensure_visible(7);
        assert_eq!(viewport.top, 3);
    }

    #[test]
    fn test_resize_geometry() {
        let mut viewport = Viewport::default();
        viewport.resize(40, false);
        assert_eq!(viewport.rows, 36);

        viewport.resize(40, true);
        assert_eq!(terminal_pane_height(40, true), 10);
        assert_eq!(viewport.rows, 26);

        viewport.resize(12, true);
        assert_eq!(viewport.rows, 5);
    }

    #[test]
    fn test_visible_range_clips() {
        let viewport = Viewport { top: 3, rows: 10 };
        assert_eq!(viewport.visible_range(5), 3..5);
        assert_eq!(viewport.visible_range(2), 2..2);
    }
}
