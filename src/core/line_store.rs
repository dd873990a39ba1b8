//! Scrollback line store
//!
//! A fixed-capacity ring of colored rows. The store is always full: it is
//! pre-filled with empty rows and every push evicts the oldest one. Index 0
//! is the oldest row, `capacity - 1` the newest.

use std::collections::VecDeque;

use crate::config::Color;
use super::wrap::wrap;

/// A single rendered row of output
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColoredLine {
    pub color: Color,
    pub text: String,
}

impl ColoredLine {
    /// The canonical blank row
    pub const EMPTY: ColoredLine = ColoredLine {
        color: Color::Reset,
        text: String::new(),
    };

    pub fn new(color: Color, text: impl Into<String>) -> Self {
        Self {
            color,
            text: text.into(),
        }
    }
}

impl Default for ColoredLine {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Scrollback buffer with an open-line flag and a view cursor
#[derive(Debug)]
pub struct LineStore {
    /// Rows, oldest first; always `capacity` long
    lines: VecDeque<ColoredLine>,
    capacity: usize,
    /// Width used for wrapping appended text
    width: usize,
    /// Rows visible in the viewport (window height minus the prompt row)
    view_rows: usize,
    /// One past the last row shown at the bottom of the viewport
    view_end: usize,
    /// The newest row was closed by a line-terminating write
    closed: bool,
    /// Keep a scrolled-back view on the same content while new rows arrive
    anchor_scrollback: bool,
}

impl LineStore {
    /// Create a store filled with `capacity` empty rows.
    ///
    /// `view_rows` is clamped to the capacity.
    pub fn new(capacity: usize, width: usize, view_rows: usize, anchor_scrollback: bool) -> Self {
        let view_rows = view_rows.min(capacity);
        Self {
            lines: std::iter::repeat(ColoredLine::EMPTY).take(capacity).collect(),
            capacity,
            width,
            view_rows,
            view_end: capacity,
            closed: false,
            anchor_scrollback,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn view_rows(&self) -> usize {
        self.view_rows
    }

    /// Index one past the bottom row of the viewport
    pub fn view_end(&self) -> usize {
        self.view_end
    }

    /// Whether the viewport shows the newest rows
    pub fn at_tail(&self) -> bool {
        self.view_end == self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&ColoredLine> {
        self.lines.get(index)
    }

    /// Newest row
    pub fn last(&self) -> Option<&ColoredLine> {
        self.lines.back()
    }

    /// All rows, oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ColoredLine> + '_ {
        self.lines.iter()
    }

    /// Rows currently in the viewport, top to bottom
    pub fn visible(&self) -> impl DoubleEndedIterator<Item = &ColoredLine> + '_ {
        let start = self.view_end - self.view_rows;
        self.lines.range(start..self.view_end)
    }

    /// Drop the oldest row and append `line` as the newest.
    pub fn push(&mut self, line: ColoredLine) {
        if self.capacity == 0 {
            return;
        }
        self.lines.pop_front();
        self.lines.push_back(line);

        if self.anchor_scrollback && !self.at_tail() {
            self.view_end = self.view_end.saturating_sub(1).max(self.view_rows);
        }
    }

    /// Append `text` to the newest row, wrapping the result.
    ///
    /// If the previous append closed its row, a fresh empty row is pushed
    /// first. The merged row takes `color`. With `close` set the tail is
    /// closed afterwards, otherwise it stays open for further appends.
    /// Returns the number of rows pushed.
    pub fn append(&mut self, text: &str, color: Color, close: bool) -> usize {
        if self.capacity == 0 {
            return 0;
        }

        let mut pushed = 0;
        if self.closed {
            self.push(ColoredLine::EMPTY);
            self.closed = false;
            pushed += 1;
        }

        let merged = match self.lines.back() {
            Some(last) => format!("{}{}", last.text, text),
            None => text.to_string(),
        };
        let mut rows = wrap(&merged, self.width).into_iter();

        if let Some(last) = self.lines.back_mut() {
            *last = ColoredLine::new(color, rows.next().unwrap_or_default());
        }
        for row in rows {
            self.push(ColoredLine::new(color, row));
            pushed += 1;
        }

        self.closed = close;
        pushed
    }

    /// Move the viewport one page toward older rows.
    pub fn scroll_up(&mut self) -> usize {
        self.view_end = self
            .view_end
            .saturating_sub(self.view_rows)
            .max(self.view_rows);
        self.view_end
    }

    /// Move the viewport one page toward newer rows.
    pub fn scroll_down(&mut self) -> usize {
        self.view_end = (self.view_end + self.view_rows).min(self.capacity);
        self.view_end
    }
}
