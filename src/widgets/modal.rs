use ratatui::{
    buffer::Buffer as TuiBuffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::extensions::ExtensionsOverlay;

/// Rectangle of `width` x `height` centered in `area`, clipped to it.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height - height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((area.width - width) / 2),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .split(vertical[1])[1]
}

/// Modal listing installable extensions with their state.
pub struct ExtensionsPanel<'a> {
    overlay: &'a ExtensionsOverlay,
    width: u16,
    height: u16,
}

impl<'a> ExtensionsPanel<'a> {
    pub fn new(overlay: &'a ExtensionsOverlay) -> Self {
        Self {
            overlay,
            width: 72,
            height: 20,
        }
    }

    pub fn size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    fn body(&self) -> Vec<Line<'a>> {
        let overlay = self.overlay;
        let mut lines = Vec::new();

        let search_line = if overlay.is_searching() {
            format!("Search: {}_", overlay.search_query())
        } else if overlay.search_query().is_empty() {
            "Press / to search".to_string()
        } else {
            format!("Filter: {}", overlay.search_query())
        };
        lines.push(Line::from(Span::styled(search_line, Style::default().fg(Color::Gray))));
        lines.push(Line::from(""));

        if overlay.filtered().is_empty() {
            lines.push(Line::from(Span::styled(
                "No matching extensions",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for (position, &index) in overlay.filtered().iter().enumerate() {
            let Some(ext) = overlay.items().get(index) else {
                continue;
            };
            let selected = position == overlay.selected();
            let marker = if selected { "> " } else { "  " };
            let (badge, badge_style) = if ext.installed {
                ("[installed]", Style::default().fg(Color::Green))
            } else {
                ("[not installed]", Style::default().fg(Color::Yellow))
            };
            let name_style = if selected {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            lines.push(Line::from(vec![
                Span::styled(marker, name_style),
                Span::styled(ext.name.as_str(), name_style),
                Span::raw(" "),
                Span::styled(badge, badge_style),
            ]));
            lines.push(Line::from(Span::styled(
                format!("    {}", ext.description),
                Style::default().fg(Color::DarkGray),
            )));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            overlay.status(),
            Style::default().fg(Color::Magenta),
        )));
        lines
    }
}

impl Widget for ExtensionsPanel<'_> {
    fn render(self, area: Rect, buf: &mut TuiBuffer) {
        let modal_area = centered_rect(self.width, self.height, area);
        Clear.render(modal_area, buf);

        let title_style = Style::default()
            .fg(Color::White)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let block = Block::default()
            .title(Span::styled(" Extensions ", title_style))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Color::Black));

        let inner_area = block.inner(modal_area);
        block.render(modal_area, buf);

        Paragraph::new(self.body())
            .wrap(Wrap { trim: false })
            .render(inner_area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_fits_inside_area() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(60, 20, area);
        assert_eq!(rect, Rect::new(20, 10, 60, 20));

        let small = Rect::new(0, 0, 30, 10);
        assert_eq!(centered_rect(60, 20, small), small);
    }
}
