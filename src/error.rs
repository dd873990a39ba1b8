//! Console lifecycle errors

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("Invalid console size {width}x{height}: need at least 2x2")]
    InvalidGeometry { width: u16, height: u16 },

    #[error("Invalid capacity: scrollback {scrollback} must cover {rows} rows, history {history} must be non-zero")]
    InvalidCapacity {
        scrollback: usize,
        history: usize,
        rows: usize,
    },

    #[error("Console is already initialized")]
    AlreadyInitialized,

    #[error("Console must be initialized before it runs")]
    NotInitialized,

    #[error("Console is already running")]
    AlreadyRunning,

    #[error("Console has been stopped")]
    Stopped,

    #[error("Terminal unavailable: {0}")]
    Terminal(#[source] io::Error),

    #[error("Failed to spawn input thread: {0}")]
    Thread(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
