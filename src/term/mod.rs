//! Terminal, keyboard and clipboard seams.
//!
//! The console never talks to a device directly. It draws through a
//! [`Terminal`], reads keys from a [`KeySource`] and pastes from a
//! [`ClipboardSource`]:
//!
//! - **system**: the real terminal, key polling and the system clipboard
//! - **memory**: in-memory implementations for headless embedding and tests

pub mod system;
pub mod memory;

use std::io;
use std::time::Duration;

use crossterm::event::KeyEvent;

use crate::config::Color;

pub use self::system::{CrosstermKeys, CrosstermTerminal, SystemClipboard};
pub use self::memory::{ChannelKeys, MemoryTerminal, StaticClipboard};

/// Output device the console draws on
pub trait Terminal: Send {
    /// Current size as (columns, rows)
    fn size(&self) -> io::Result<(u16, u16)>;

    /// Take over the device: raw mode, resize, hidden cursor, cleared screen
    fn prepare(&mut self, width: u16, height: u16) -> io::Result<()>;

    /// Give the device back; calling it twice is harmless
    fn restore(&mut self) -> io::Result<()>;

    /// Draw `text` at column 0 of `row` in `color`
    ///
    /// Must not emit a newline, the screen never scrolls.
    fn draw_row(&mut self, row: u16, text: &str, color: Color) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

/// Source of key events
pub trait KeySource: Send {
    /// Wait up to `timeout` for the next key press; `Ok(None)` on timeout
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>>;
}

/// Source of pasted text
pub trait ClipboardSource: Send {
    fn text(&mut self) -> Option<String>;
}

/// The devices a command console is built on
pub struct Backend {
    pub terminal: Box<dyn Terminal>,
    pub keys: Box<dyn KeySource>,
    pub clipboard: Box<dyn ClipboardSource>,
}

impl Backend {
    pub fn new(
        terminal: impl Terminal + 'static,
        keys: impl KeySource + 'static,
        clipboard: impl ClipboardSource + 'static,
    ) -> Self {
        Self {
            terminal: Box::new(terminal),
            keys: Box::new(keys),
            clipboard: Box::new(clipboard),
        }
    }

    /// Stdout, crossterm key events and the system clipboard
    pub fn crossterm() -> Self {
        Self::new(CrosstermTerminal::new(), CrosstermKeys, SystemClipboard)
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}
