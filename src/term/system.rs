//! Real devices: crossterm terminal and keyboard, arboard clipboard

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{self, Clear, ClearType, DisableLineWrap, EnableLineWrap, SetSize},
};

use super::{ClipboardSource, KeySource, Terminal};
use crate::config::Color;

/// Terminal on stdout
pub struct CrosstermTerminal {
    stdout: io::Stdout,
    /// Whether the terminal has been prepared
    initialized: bool,
}

impl Default for CrosstermTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermTerminal {
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            initialized: false,
        }
    }
}

impl Terminal for CrosstermTerminal {
    fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn prepare(&mut self, width: u16, height: u16) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        self.initialized = true;

        execute!(
            self.stdout,
            SetSize(width, height),
            Hide,
            DisableLineWrap,
            Clear(ClearType::All),
            MoveTo(0, 0)
        )?;
        tracing::debug!("terminal prepared at {}x{}", width, height);
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;

        // Reset all attributes first
        let _ = execute!(self.stdout, ResetColor, SetAttribute(Attribute::Reset));
        let _ = execute!(self.stdout, Show, EnableLineWrap);
        let _ = self.stdout.flush();

        // Disable raw mode - this is the most important part
        terminal::disable_raw_mode()?;

        // Leave the shell prompt on a fresh line
        println!();
        Ok(())
    }

    fn draw_row(&mut self, row: u16, text: &str, color: Color) -> io::Result<()> {
        queue!(
            self.stdout,
            MoveTo(0, row),
            SetForegroundColor(color.to_crossterm()),
            Print(text),
            ResetColor
        )
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stdout.flush()
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Key presses from crossterm's event queue
#[derive(Debug, Default, Clone, Copy)]
pub struct CrosstermKeys;

impl KeySource for CrosstermKeys {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
            _ => Ok(None),
        }
    }
}

/// The system clipboard
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSource for SystemClipboard {
    fn text(&mut self) -> Option<String> {
        let mut clipboard = match arboard::Clipboard::new() {
            Ok(clipboard) => clipboard,
            Err(e) => {
                tracing::warn!("Clipboard unavailable: {}", e);
                return None;
            }
        };
        match clipboard.get_text() {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("Clipboard has no text: {}", e);
                None
            }
        }
    }
}
