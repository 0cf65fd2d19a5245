use ratatui::{
    buffer::Buffer as TuiBuffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Which end of the status line a slot is drawn at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAlignment {
    Left,
    Right,
}

/// Represents a single slot in the status bar
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSlot {
    pub id: String,
    pub content: String,
    pub alignment: SlotAlignment,
    pub priority: u8, // Higher priority = drawn first within its side
    pub style: Style,
    pub visible: bool,
}

impl StatusSlot {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            alignment: SlotAlignment::Left,
            priority: 50,
            style: Style::default().fg(Color::White).bg(Color::Blue),
            visible: true,
        }
    }

    pub fn with_alignment(mut self, alignment: SlotAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

/// One-line status bar made of named slots. Left slots win when the line is
/// too narrow for everything.
#[derive(Debug, Clone)]
pub struct StatusBar {
    slots: Vec<StatusSlot>,
    background_style: Style,
    separator: String,
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBar {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            background_style: Style::default().bg(Color::Blue).fg(Color::White),
            separator: " | ".to_string(),
        }
    }

    /// Add or replace a slot
    pub fn set_slot(&mut self, slot: StatusSlot) {
        match self.slots.iter_mut().find(|s| s.id == slot.id) {
            Some(existing) => *existing = slot,
            None => self.slots.push(slot),
        }
    }

    pub fn get_slot(&self, id: &str) -> Option<&StatusSlot> {
        self.slots.iter().find(|s| s.id == id)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Update the content of a slot
    pub fn update_slot_content(&mut self, id: &str, content: impl Into<String>) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.id == id) {
            slot.content = content.into();
        }
    }

    pub fn set_slot_visible(&mut self, id: &str, visible: bool) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.id == id) {
            slot.visible = visible;
        }
    }

    fn side(&self, alignment: SlotAlignment) -> Vec<&StatusSlot> {
        let mut slots: Vec<&StatusSlot> = self
            .slots
            .iter()
            .filter(|s| s.visible && s.alignment == alignment && !s.content.is_empty())
            .collect();
        slots.sort_by(|a, b| b.priority.cmp(&a.priority));
        slots
    }

    fn spans_for<'a>(&'a self, slots: &[&'a StatusSlot]) -> Vec<Span<'a>> {
        let mut spans = Vec::new();
        for (i, &slot) in slots.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(self.separator.as_str(), self.background_style));
            }
            spans.push(Span::styled(slot.content.as_str(), slot.style));
        }
        spans
    }
}

fn spans_width(spans: &[Span]) -> usize {
    spans.iter().map(|s| s.width()).sum()
}

impl Widget for StatusBar {
    fn render(self, area: Rect, buf: &mut TuiBuffer) {
        if area.width == 0 {
            return;
        }
        let left = self.side(SlotAlignment::Left);
        let mut right = self.side(SlotAlignment::Right);
        let mut spans = self.spans_for(&left);

        let available = area.width as usize;
        let used = spans_width(&spans);
        // Drop the lowest priority right slots until the rest fit.
        let mut right_spans = self.spans_for(&right);
        while !right.is_empty() && used + spans_width(&right_spans) >= available {
            right.pop();
            right_spans = self.spans_for(&right);
        }
        let right_width = spans_width(&right_spans);
        if !right_spans.is_empty() {
            spans.push(Span::styled(
                " ".repeat(available - used - right_width),
                self.background_style,
            ));
            spans.extend(right_spans);
        }

        Paragraph::new(Line::from(spans))
            .style(self.background_style)
            .render(area, buf);
    }
}
