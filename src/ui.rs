use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{BaseMode, Mode};
use crate::viewport::terminal_pane_height;
use crate::widgets::{Editor, ExtensionsPanel, Sidebar, SlotAlignment, StatusSlot, TerminalPane};
use crate::App;

fn header_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

impl App {
    /// Main render function for the application UI
    pub fn render(&mut self, f: &mut Frame) {
        let area = f.area();
        let pane_height = terminal_pane_height(area.height, self.terminal_visible());

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),           // Header or search bar
                Constraint::Min(1),              // Sidebar + editor
                Constraint::Length(1),           // Status line
                Constraint::Length(pane_height), // Shell pane
            ])
            .split(area);

        self.render_header(f, chunks[0]);
        self.render_body(f, chunks[1]);
        self.render_status_line(f, chunks[2]);

        if pane_height > 0 {
            let pane = TerminalPane::new(self.terminal_screen.screen()).closed(self.pty_closed());
            f.render_widget(pane, chunks[3]);
        }

        if matches!(self.mode, Mode::ExtensionsOverlay(_)) {
            let width = area.width.saturating_sub(4).min(90);
            let height = area.height.saturating_sub(2);
            f.render_widget(ExtensionsPanel::new(&self.extensions).size(width, height), area);
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let line = if matches!(self.mode, Mode::SearchOverlay(_)) {
            let counter = match self.search.matches().len() {
                0 => String::new(),
                n => format!("  ({}/{})", self.search.current() + 1, n),
            };
            Line::from(vec![
                Span::styled(" Search: ", header_style()),
                Span::raw(format!("{}_", self.search.query())),
                Span::styled(counter, Style::default().fg(Color::Gray)),
            ])
        } else {
            Line::from(Span::styled(
                format!(" termpad: {} ", self.buffer.name),
                header_style(),
            ))
        };
        f.render_widget(Paragraph::new(line), area);
    }

    fn render_body(&self, f: &mut Frame, area: Rect) {
        let sidebar_width = self.config.ui.sidebar_width.min(area.width / 2);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(sidebar_width), Constraint::Min(1)])
            .split(area);

        let sidebar_focused = self.mode == Mode::Sidebar;
        f.render_widget(
            Sidebar::new(&self.directory).focused(sidebar_focused),
            columns[0],
        );

        let editor_focused = self.mode.base() == BaseMode::Editor
            && !matches!(self.mode, Mode::TerminalFocus(_) | Mode::ExtensionsOverlay(_));
        let editor = Editor::new(&self.buffer, &self.highlighter)
            .viewport(self.viewport)
            .language(self.language)
            .search(Some(&self.search))
            .show_line_numbers(self.config.ui.show_line_numbers)
            .focused(editor_focused);
        f.render_widget(editor, columns[1]);
    }

    /// Render the status line using the StatusBar widget
    fn render_status_line(&mut self, f: &mut Frame, area: Rect) {
        self.update_status_bar();
        f.render_widget(self.status_bar.clone(), area);
    }

    pub(crate) fn init_status_bar(&mut self) {
        let accent = Style::default().fg(Color::Black).bg(Color::Cyan);
        let plain = Style::default().fg(Color::White).bg(Color::Blue);

        self.status_bar.set_slot(
            StatusSlot::new("mode", "")
                .with_priority(100)
                .with_style(accent.add_modifier(Modifier::BOLD)),
        );
        self.status_bar
            .set_slot(StatusSlot::new("file", "").with_priority(90).with_style(plain));
        self.status_bar.set_slot(
            StatusSlot::new("message", "")
                .with_priority(80)
                .with_style(plain.fg(Color::Yellow)),
        );
        self.status_bar.set_slot(
            StatusSlot::new("hints", "")
                .with_alignment(SlotAlignment::Right)
                .with_priority(50)
                .with_style(plain.fg(Color::Gray)),
        );
        self.status_bar.set_slot(
            StatusSlot::new("language", "")
                .with_alignment(SlotAlignment::Right)
                .with_priority(70)
                .with_style(plain),
        );
        self.status_bar.set_slot(
            StatusSlot::new("position", "")
                .with_alignment(SlotAlignment::Right)
                .with_priority(60)
                .with_style(plain),
        );
    }

    /// Refresh every status slot from the current state
    pub fn update_status_bar(&mut self) {
        let (row, col) = self.buffer.cursor_pos;
        let dirty = if self.buffer.is_dirty() { " [+]" } else { "" };
        let file = format!(" {}{} ", self.buffer.name, dirty);
        let hints = match self.mode {
            Mode::Editor | Mode::Sidebar => {
                "^S save ^F find ^T term ^E ext ^Z/^Y undo/redo Tab focus Esc quit"
            }
            Mode::SearchOverlay(_) => "Enter next  Esc close",
            Mode::TerminalFocus(_) => "Esc/^T leave terminal",
            Mode::ExtensionsOverlay(_) => "Enter install  Esc close",
        };

        self.status_bar
            .update_slot_content("mode", format!(" {} ", self.mode.label()));
        self.status_bar.update_slot_content("file", file);
        self.status_bar
            .update_slot_content("message", self.status_message.clone());
        self.status_bar
            .update_slot_content("language", format!(" {} ", self.language));
        self.status_bar
            .update_slot_content("position", format!(" Ln {}, Col {} ", row + 1, col + 1));
        self.status_bar
            .update_slot_content("hints", format!(" {} ", hints));
    }
}
