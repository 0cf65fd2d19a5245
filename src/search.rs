//! Incremental in-buffer search.
//!
//! Matching is Unicode case-insensitive. Highlight ranges are mapped back
//! from the lowercased text onto whole characters of the original line.

use std::ops::Range;

use crate::buffer::Buffer;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchIndex {
    query: String,
    matches: Vec<usize>,
    current: usize,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[usize] {
        &self.matches
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Row of the current match, if any.
    pub fn current_row(&self) -> Option<usize> {
        self.matches.get(self.current).copied()
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.current = 0;
    }

    /// Replace the query and rescan every line. `current` resets to 0.
    pub fn set_query(&mut self, query: &str, buffer: &Buffer) {
        self.query = query.to_string();
        self.scan(buffer);
        self.current = 0;
    }

    pub fn push_char(&mut self, c: char, buffer: &Buffer) {
        let mut query = std::mem::take(&mut self.query);
        query.push(c);
        self.set_query(&query, buffer);
    }

    /// Drop the last query character. Returns false if the query was empty.
    pub fn pop_char(&mut self, buffer: &Buffer) -> bool {
        let mut query = std::mem::take(&mut self.query);
        let popped = query.pop().is_some();
        self.set_query(&query, buffer);
        popped
    }

    /// Rescan after the buffer changed, keeping `current` clamped.
    pub fn refresh(&mut self, buffer: &Buffer) {
        self.scan(buffer);
        if self.current >= self.matches.len() {
            self.current = 0;
        }
    }

    /// Advance to the next match, wrapping around. Returns the target row.
    pub fn next(&mut self) -> Option<usize> {
        if self.matches.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.matches.len();
        self.current_row()
    }

    /// Non-overlapping, leftmost-first byte ranges of the query in `line`.
    pub fn match_ranges(&self, line: &str) -> Vec<Range<usize>> {
        find_all(line, &self.query)
    }

    fn scan(&mut self, buffer: &Buffer) {
        self.matches.clear();
        if self.query.is_empty() {
            return;
        }
        let needle = self.query.to_lowercase();
        self.matches.extend(
            buffer
                .content
                .iter()
                .enumerate()
                .filter(|(_, line)| line.to_lowercase().contains(&needle))
                .map(|(row, _)| row),
        );
    }
}

/// Lowercased `line` plus, for every byte of it, the byte range of the
/// original character it came from.
fn fold_case(line: &str) -> (String, Vec<Range<usize>>) {
    let mut folded = String::with_capacity(line.len());
    let mut origin = Vec::with_capacity(line.len());
    for (start, c) in line.char_indices() {
        let source = start..start + c.len_utf8();
        for lower in c.to_lowercase() {
            folded.push(lower);
            origin.extend(std::iter::repeat(source.clone()).take(lower.len_utf8()));
        }
    }
    (folded, origin)
}

fn find_all(line: &str, query: &str) -> Vec<Range<usize>> {
    if query.is_empty() {
        return Vec::new();
    }
    let (haystack, origin) = fold_case(line);
    let needle = query.to_lowercase();
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for (start, m) in haystack.match_indices(&needle) {
        let (Some(first), Some(last)) = (origin.get(start), origin.get(start + m.len() - 1)) else {
            continue;
        };
        let range = first.start..last.end;
        // Two matches inside one expanded character collapse onto it.
        if ranges.last().is_some_and(|prev| prev.end > range.start) {
            continue;
        }
        ranges.push(range);
    }
    ranges
}
