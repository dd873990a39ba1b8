//! In-memory devices
//!
//! `MemoryTerminal` keeps a character grid that behaves like a terminal with
//! line wrap disabled: drawing at column 0 overwrites the start of a row and
//! leaves the rest untouched. Handles are cheap clones sharing one grid, so a
//! caller can hand one to the console and inspect the screen through another.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::{ClipboardSource, KeySource, Terminal};
use crate::config::Color;

#[derive(Debug, Default)]
struct Grid {
    width: u16,
    height: u16,
    rows: Vec<Vec<char>>,
    colors: Vec<Color>,
    prepared: bool,
    unavailable: bool,
    draws: usize,
    flushes: usize,
}

impl Grid {
    fn reset(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.rows = vec![vec![' '; width as usize]; height as usize];
        self.colors = vec![Color::Reset; height as usize];
    }
}

/// Terminal backed by an in-memory grid
#[derive(Debug, Clone, Default)]
pub struct MemoryTerminal {
    grid: Arc<Mutex<Grid>>,
}

impl MemoryTerminal {
    /// A terminal reporting `width` x `height`
    pub fn new(width: u16, height: u16) -> Self {
        let mut grid = Grid::default();
        grid.reset(width, height);
        Self {
            grid: Arc::new(Mutex::new(grid)),
        }
    }

    /// A terminal whose `prepare` always fails
    pub fn unavailable(width: u16, height: u16) -> Self {
        let terminal = Self::new(width, height);
        terminal.lock().unavailable = true;
        terminal
    }

    fn lock(&self) -> MutexGuard<'_, Grid> {
        self.grid.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Text of every row, trailing blanks removed
    pub fn rows(&self) -> Vec<String> {
        self.lock()
            .rows
            .iter()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect()
    }

    /// Text of one row, trailing blanks removed
    pub fn row(&self, row: usize) -> Option<String> {
        self.rows().into_iter().nth(row)
    }

    /// Color last used on `row`
    pub fn row_color(&self, row: usize) -> Option<Color> {
        self.lock().colors.get(row).copied()
    }

    pub fn is_prepared(&self) -> bool {
        self.lock().prepared
    }

    /// Number of rows drawn so far
    pub fn draw_count(&self) -> usize {
        self.lock().draws
    }

    pub fn flush_count(&self) -> usize {
        self.lock().flushes
    }
}

impl Terminal for MemoryTerminal {
    fn size(&self) -> io::Result<(u16, u16)> {
        let grid = self.lock();
        Ok((grid.width, grid.height))
    }

    fn prepare(&mut self, width: u16, height: u16) -> io::Result<()> {
        let mut grid = self.lock();
        if grid.unavailable {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "terminal unavailable"));
        }
        grid.reset(width, height);
        grid.prepared = true;
        Ok(())
    }

    fn restore(&mut self) -> io::Result<()> {
        self.lock().prepared = false;
        Ok(())
    }

    fn draw_row(&mut self, row: u16, text: &str, color: Color) -> io::Result<()> {
        let mut grid = self.lock();
        let index = row as usize;
        if index >= grid.rows.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("row {} outside a {}-row screen", row, grid.height),
            ));
        }

        let cells = &mut grid.rows[index];
        for (cell, ch) in cells.iter_mut().zip(text.chars()) {
            *cell = ch;
        }
        grid.colors[index] = color;
        grid.draws += 1;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flushes += 1;
        Ok(())
    }
}

/// Key events fed through a channel
#[derive(Debug)]
pub struct ChannelKeys {
    rx: Receiver<KeyEvent>,
}

impl ChannelKeys {
    /// A key source and the feed that drives it
    pub fn channel() -> (KeyFeed, ChannelKeys) {
        let (tx, rx) = mpsc::channel();
        (KeyFeed { tx }, ChannelKeys { rx })
    }
}

impl KeySource for ChannelKeys {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyEvent>> {
        match self.rx.recv_timeout(timeout) {
            Ok(key) => Ok(Some(key)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                // Nothing will ever arrive; behave like an idle keyboard
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}

/// Sending half of [`ChannelKeys`]
#[derive(Debug, Clone)]
pub struct KeyFeed {
    tx: Sender<KeyEvent>,
}

impl KeyFeed {
    /// Send one key event; false once the console side is gone
    pub fn send(&self, key: KeyEvent) -> bool {
        self.tx.send(key).is_ok()
    }

    pub fn press(&self, code: KeyCode) -> bool {
        self.send(KeyEvent::new(code, KeyModifiers::NONE))
    }

    pub fn ctrl(&self, ch: char) -> bool {
        self.send(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
    }

    /// Type every character of `text`
    pub fn type_str(&self, text: &str) -> bool {
        text.chars().all(|ch| self.press(KeyCode::Char(ch)))
    }

    /// Type `command` followed by Enter
    pub fn submit(&self, command: &str) -> bool {
        self.type_str(command) && self.press(KeyCode::Enter)
    }
}

/// Clipboard with fixed contents
#[derive(Debug, Clone, Default)]
pub struct StaticClipboard(pub Option<String>);

impl StaticClipboard {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Some(text.into()))
    }
}

impl ClipboardSource for StaticClipboard {
    fn text(&mut self) -> Option<String> {
        self.0.clone()
    }
}
