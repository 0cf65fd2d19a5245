use std::ops::Range;

use ratatui::{
    buffer::Buffer as TuiBuffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::buffer::Buffer;
use crate::search::SearchIndex;
use crate::syntax::{Highlighter, Language, Segment};
use crate::viewport::Viewport;

pub fn match_style() -> Style {
    Style::default().bg(Color::Rgb(0x00, 0x5a, 0x9e)).fg(Color::White)
}

pub fn cursor_style() -> Style {
    Style::default()
        .bg(Color::Rgb(0x00, 0x5f, 0x87))
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

fn gutter_style() -> Style {
    Style::default().fg(Color::Rgb(100, 100, 120))
}

pub struct Editor<'a> {
    pub buffer: &'a Buffer,
    pub viewport: Viewport,
    pub highlighter: &'a Highlighter,
    pub language: Language,
    pub search: Option<&'a SearchIndex>,
    pub show_line_numbers: bool,
    /// Draw the cursor cell; false while another pane has focus
    pub show_cursor: bool,
    pub focused: bool,
}

impl<'a> Editor<'a> {
    pub fn new(buffer: &'a Buffer, highlighter: &'a Highlighter) -> Self {
        Self {
            buffer,
            viewport: Viewport::default(),
            highlighter,
            language: Language::PlainText,
            search: None,
            show_line_numbers: true,
            show_cursor: true,
            focused: true,
        }
    }

    pub fn viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn search(mut self, search: Option<&'a SearchIndex>) -> Self {
        self.search = search;
        self
    }

    pub fn show_line_numbers(mut self, show: bool) -> Self {
        self.show_line_numbers = show;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self.show_cursor = focused;
        self
    }

    /// Characters scrolled off the left edge so the cursor column stays
    /// inside a text area `text_width` cells wide.
    fn horizontal_offset(&self, text_width: usize) -> usize {
        let (row, col) = self.buffer.cursor_pos;
        let Some(line) = self.buffer.content.get(row) else {
            return 0;
        };
        let cursor_chars = line[..col.min(line.len())].chars().count();
        (cursor_chars + 1).saturating_sub(text_width.max(1))
    }
}

/// Styled spans for one line. Search matches override syntax colours and
/// the cursor cell overrides both; `skip` characters are dropped from the
/// left.
pub fn compose_line<'l>(
    line: &'l str,
    segments: &[Segment],
    matches: &[Range<usize>],
    cursor: Option<usize>,
    skip: usize,
) -> Vec<Span<'l>> {
    let mut spans: Vec<Span<'l>> = Vec::new();
    let mut run: Option<(usize, usize, Style)> = None;
    let mut seg = segments.iter().peekable();

    for (index, (start, c)) in line.char_indices().enumerate() {
        let end = start + c.len_utf8();
        while seg.next_if(|s| s.range.end <= start).is_some() {}

        let mut style = match seg.peek() {
            Some(s) if s.range.start <= start => s.style,
            _ => Style::default(),
        };
        if matches.iter().any(|m| m.start <= start && start < m.end) {
            style = match_style();
        }
        if cursor == Some(start) {
            style = cursor_style();
        }
        if index < skip {
            continue;
        }

        run = match run {
            Some((run_start, _, run_style)) if run_style == style => Some((run_start, end, style)),
            Some((run_start, run_end, run_style)) => {
                spans.push(Span::styled(&line[run_start..run_end], run_style));
                Some((start, end, style))
            }
            None => Some((start, end, style)),
        };
    }
    if let Some((run_start, run_end, run_style)) = run {
        spans.push(Span::styled(&line[run_start..run_end], run_style));
    }
    if cursor == Some(line.len()) {
        spans.push(Span::styled(" ", cursor_style()));
    }
    spans
}

impl Widget for Editor<'_> {
    fn render(self, area: Rect, buf: &mut TuiBuffer) {
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::TOP | Borders::BOTTOM)
            .border_style(border_style);
        let inner_area = block.inner(area);
        block.render(area, buf);

        let line_number_width = if self.show_line_numbers {
            self.buffer.line_number_width()
        } else {
            0
        };
        let text_width = (inner_area.width as usize).saturating_sub(line_number_width);
        let h_offset = self.horizontal_offset(text_width);
        let (cursor_row, cursor_col) = self.buffer.cursor_pos;

        let mut lines = Vec::new();
        for i in self.viewport.visible_range(self.buffer.line_count()) {
            let line = self.buffer.content[i].as_str();
            let segments = self.highlighter.highlight(line, self.language);
            let matches = match self.search {
                Some(search) => search.match_ranges(line),
                None => Vec::new(),
            };
            let cursor = (self.show_cursor && i == cursor_row).then_some(cursor_col);

            let mut spans = Vec::new();
            if self.show_line_numbers {
                spans.push(Span::styled(
                    format!("{:>width$} ", i + 1, width = line_number_width - 1),
                    gutter_style(),
                ));
            }
            spans.extend(compose_line(line, &segments, &matches, cursor, h_offset));
            lines.push(Line::from(spans));
        }

        Paragraph::new(lines)
            .style(Style::default().fg(Color::White))
            .render(inner_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_line_plain() {
        let spans = compose_line("hello", &[], &[], None, 0);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "hello");
    }

    #[test]
    fn test_compose_line_match_and_cursor() {
        let spans = compose_line("a foo b", &[], &[2..5], Some(0), 0);
        let texts: Vec<&str> = spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(texts, vec!["a", " ", "foo", " b"]);
        assert_eq!(spans[0].style, cursor_style());
        assert_eq!(spans[2].style, match_style());
    }

    #[test]
    fn test_compose_line_cursor_at_end_adds_cell() {
        let spans = compose_line("ab", &[], &[], Some(2), 0);
        assert_eq!(spans.last().unwrap().content, " ");
    }

    #[test]
    fn test_compose_line_skips_characters() {
        let spans = compose_line("héllo", &[], &[], None, 2);
        assert_eq!(spans[0].content, "llo");
    }
}
