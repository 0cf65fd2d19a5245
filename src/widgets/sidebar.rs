use ratatui::{
    buffer::Buffer as TuiBuffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::directory::DirectoryView;

/// Listing of the sidebar directory. The selected row is marked only while
/// the sidebar has focus.
pub struct Sidebar<'a> {
    view: &'a DirectoryView,
    focused: bool,
}

impl<'a> Sidebar<'a> {
    pub fn new(view: &'a DirectoryView) -> Self {
        Self {
            view,
            focused: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for Sidebar<'_> {
    fn render(self, area: Rect, buf: &mut TuiBuffer) {
        let title = self
            .view
            .dir()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.view.dir().display().to_string());
        let border_style = if self.focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner_area = block.inner(area);
        block.render(area, buf);

        // Keep the selection on screen in long directories.
        let rows = inner_area.height as usize;
        let first = (self.view.selected() + 1).saturating_sub(rows.max(1));

        let lines: Vec<Line> = self
            .view
            .entries()
            .iter()
            .enumerate()
            .skip(first)
            .take(rows)
            .map(|(i, entry)| {
                let selected = self.focused && i == self.view.selected();
                let marker = if selected { "→ " } else { "  " };
                let label = if entry.is_dir {
                    format!("{}📁 {}/", marker, entry.name)
                } else {
                    format!("{}  {}", marker, entry.name)
                };
                let style = if selected {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else if entry.is_dir {
                    Style::default().fg(Color::LightBlue)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(Span::styled(label, style))
            })
            .collect();

        Paragraph::new(lines).render(inner_area, buf);
    }
}
