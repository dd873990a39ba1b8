//! cmdconsole - an embeddable interactive console
//!
//! A long-running process gets a scrollable log view and an editable
//! command prompt on the same terminal. Output written from any thread lands
//! in a bounded scrollback buffer and is repainted in place, so a half-typed
//! command is never disturbed.
//!
//! # Features
//!
//! - **Scrollback**: fixed-capacity ring of colored, width-wrapped rows
//! - **Prompt**: line editing, Up/Down history recall, Ctrl+V paste
//! - **Paging**: PageUp/PageDown through the scrollback
//! - **Pass-through mode**: the same API over plain stdin/stdout
//!
//! # Keys
//!
//! | Key | Action |
//! |-----|--------|
//! | Enter | Submit the command |
//! | Backspace | Delete the last character |
//! | Up/Down | Older/newer command from history |
//! | Ctrl+V, Shift+Insert | Replace the command with the clipboard |
//! | PageUp/PageDown | Scroll the output one page |

pub mod config;
pub mod console;
pub mod core;
pub mod error;
pub mod history;
pub mod term;
pub mod ui;

pub use config::{Color, ConsoleConfig};
pub use console::{
    command::ConsoleOptions, CommandConsole, CommandHandler, Console, ConsoleKind,
    ConsoleRegistry, PassThroughConsole,
};
pub use crate::core::{ColoredLine, LineStore};
pub use error::ConsoleError;
pub use history::HistoryStore;
pub use term::{Backend, ClipboardSource, KeySource, Terminal};
