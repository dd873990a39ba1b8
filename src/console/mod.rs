//! Console contract and implementations.
//!
//! - **command**: `CommandConsole`, the scrollback view with a live prompt
//! - **passthrough**: `PassThroughConsole`, plain line in / line out
//! - **registry**: `ConsoleRegistry`, one cached instance per [`ConsoleKind`]
//!
//! # Threads
//!
//! ```text
//! producers ──write/write_line──┐
//!                               ├─► buffer lock ─► LineStore / HistoryStore ─► Terminal
//! input thread ──keys/redraw────┘
//!        └─► command handler (called without the lock held)
//! ```

pub mod command;
pub mod passthrough;
pub mod registry;

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::config::Color;
use crate::error::Result;

pub use command::CommandConsole;
pub use passthrough::PassThroughConsole;
pub use registry::ConsoleRegistry;

/// Receives every completed, trimmed, non-empty command line
pub type CommandHandler = Box<dyn FnMut(&str) + Send>;

/// Holder for the single command handler
#[derive(Default)]
pub(crate) struct HandlerSlot {
    handler: Mutex<Option<CommandHandler>>,
}

impl HandlerSlot {
    fn lock(&self) -> MutexGuard<'_, Option<CommandHandler>> {
        self.handler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set(&self, handler: CommandHandler) {
        *self.lock() = Some(handler);
    }

    /// Drop the handler, releasing whatever it captured
    pub(crate) fn clear(&self) {
        self.lock().take();
    }

    /// Call the handler with no lock held, so it may replace itself or
    /// stop the console. It is put back unless it was replaced meanwhile
    /// or `keep` says otherwise once it returns.
    pub(crate) fn dispatch(&self, command: &str, keep: impl FnOnce() -> bool) {
        let handler = self.lock().take();
        let Some(mut handler) = handler else {
            tracing::debug!(command, "no command handler installed");
            return;
        };

        handler(command);

        let mut slot = self.lock();
        if slot.is_none() && keep() {
            *slot = Some(handler);
        }
    }
}

/// Console implementations the registry can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsoleKind {
    /// Scrollback buffer with an editable prompt
    #[default]
    Command,
    /// Line-based stdin/stdout
    PassThrough,
}

/// Lifecycle, output and command API shared by all consoles
///
/// Output written while the console is not alive (before `run`, after
/// `stop`) is dropped silently.
pub trait Console: Send + Sync {
    /// Set the geometry and prompt color; allowed once
    fn init(&self, width: u16, height: u16, command_color: Color) -> Result<()>;

    /// `init` with the terminal's current size
    fn init_from_terminal(&self, command_color: Color) -> Result<()>;

    /// Start reading commands; with `blocking` wait here until `stop`
    fn run(&self, blocking: bool) -> Result<()>;

    /// Stop reading commands and release a blocked `run`; final
    fn stop(&self);

    fn is_alive(&self) -> bool;
    fn width(&self) -> u16;
    fn height(&self) -> u16;
    fn command_color(&self) -> Color;
    fn set_command_color(&self, color: Color);

    /// Install the command handler, replacing any previous one
    fn on_command(&self, handler: CommandHandler);

    /// Append text in `color` without ending the line
    fn write_colored(&self, text: &str, color: Color);

    /// Append text in `color` and end the line
    fn write_line_colored(&self, text: &str, color: Color);

    fn write(&self, text: &str) {
        self.write_colored(text, Color::Reset);
    }

    fn write_line(&self, text: &str) {
        self.write_line_colored(text, Color::Reset);
    }

    /// Formatted `write`; see [`console_write!`](crate::console_write)
    fn write_args(&self, args: fmt::Arguments<'_>) {
        if self.is_alive() {
            self.write(&fmt::format(args));
        }
    }

    /// Formatted `write_line`; see [`console_writeln!`](crate::console_writeln)
    fn write_line_args(&self, args: fmt::Arguments<'_>) {
        if self.is_alive() {
            self.write_line(&fmt::format(args));
        }
    }
}

/// Formatted write without a line break
///
/// ```ignore
/// console_write!(console, "  local time {}", now);
/// console_write!(console, Color::Red, "failed: {}", err);
/// ```
#[macro_export]
macro_rules! console_write {
    ($console:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $console.write_args(format_args!($fmt $(, $arg)*))
    };
    ($console:expr, $color:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        if $console.is_alive() {
            $console.write_colored(&format!($fmt $(, $arg)*), $color)
        }
    };
}

/// Formatted write that ends the line
#[macro_export]
macro_rules! console_writeln {
    ($console:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $console.write_line_args(format_args!($fmt $(, $arg)*))
    };
    ($console:expr, $color:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        if $console.is_alive() {
            $console.write_line_colored(&format!($fmt $(, $arg)*), $color)
        }
    };
}
