use ratatui::{
    buffer::Buffer as TuiBuffer,
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Shell pane drawn from the emulated screen.
pub struct TerminalPane<'a> {
    screen: &'a vt100::Screen,
    closed: bool,
}

impl<'a> TerminalPane<'a> {
    pub fn new(screen: &'a vt100::Screen) -> Self {
        Self {
            screen,
            closed: false,
        }
    }

    pub fn closed(mut self, closed: bool) -> Self {
        self.closed = closed;
        self
    }
}

impl Widget for TerminalPane<'_> {
    fn render(self, area: Rect, buf: &mut TuiBuffer) {
        let title = if self.closed {
            " Terminal (closed) "
        } else {
            " Terminal "
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green));
        let inner_area = block.inner(area);
        block.render(area, buf);

        let (_, cols) = self.screen.size();
        let lines: Vec<Line> = self
            .screen
            .rows(0, cols)
            .take(inner_area.height as usize)
            .map(Line::from)
            .collect();
        Paragraph::new(lines).render(inner_area, buf);
    }
}
