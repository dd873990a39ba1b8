//! Console renderer
//!
//! Paints the scrollback viewport on rows `0..height-1` and the prompt on
//! the bottom row. Every row is written at full width (`width - 1` columns)
//! so stale characters never survive a repaint, and nothing is printed in
//! the last column, which keeps the terminal from scrolling.

use std::io;

use crate::config::Color;
use crate::core::LineStore;
use crate::term::Terminal;

/// Viewport and prompt painter for a fixed geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderer {
    width: u16,
    height: u16,
}

impl Renderer {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Columns used on every row
    fn columns(&self) -> usize {
        self.width.saturating_sub(1) as usize
    }

    /// Row index of the prompt
    pub fn prompt_row(&self) -> u16 {
        self.height.saturating_sub(1)
    }

    /// Pad or truncate `text` to exactly the row width
    pub fn fit(&self, text: &str) -> String {
        let columns = self.columns();
        let mut row: String = text.chars().take(columns).collect();
        let used = row.chars().count();
        row.extend(std::iter::repeat(' ').take(columns - used));
        row
    }

    /// Draw the visible slice of `store`, each row in its own color
    pub fn draw_viewport(&self, terminal: &mut dyn Terminal, store: &LineStore) -> io::Result<()> {
        for (row, line) in store.visible().take(self.prompt_row() as usize).enumerate() {
            terminal.draw_row(row as u16, &self.fit(&line.text), line.color)?;
        }
        terminal.flush()
    }

    /// Draw the pending command on the prompt row
    ///
    /// When the command is wider than the row its tail is shown, not its
    /// start: plain truncation would hide the characters being typed.
    pub fn draw_prompt(&self, terminal: &mut dyn Terminal, pending: &str, color: Color) -> io::Result<()> {
        let overflow = pending.chars().count().saturating_sub(self.columns());
        let visible: String = pending.chars().skip(overflow).collect();
        terminal.draw_row(self.prompt_row(), &self.fit(&visible), color)?;
        terminal.flush()
    }
}
