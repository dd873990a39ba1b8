//! Pass-through console
//!
//! Same contract as the command console without a screen of its own:
//! output goes straight to the writer and every input line is a command.
//! There is no scrollback, no wrapping and no redraw.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;

use tracing::{debug, error, info, warn};

use super::{CommandHandler, Console, HandlerSlot};
use crate::config::Color;
use crate::error::{ConsoleError, Result};

struct Shared {
    alive: AtomicBool,
    stopped: AtomicBool,
    geometry: OnceLock<(u16, u16)>,
    command_color: Mutex<Color>,
    output: Mutex<Box<dyn Write + Send>>,
    handler: HandlerSlot,
}

impl Shared {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn output(&self) -> MutexGuard<'_, Box<dyn Write + Send>> {
        self.output.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, text: &str, newline: bool) {
        if !self.is_alive() {
            return;
        }
        let mut output = self.output();
        let result = if newline {
            writeln!(output, "{}", text)
        } else {
            write!(output, "{}", text)
        };
        if let Err(e) = result.and_then(|_| output.flush()) {
            warn!("Console output failed: {}", e);
        }
    }
}

/// Line-based console over any reader/writer pair
///
/// A blocked line read cannot be interrupted: after `stop` the reader
/// finishes at the next line or end of input.
pub struct PassThroughConsole {
    shared: Arc<Shared>,
    input: Mutex<Option<Box<dyn BufRead + Send>>>,
}

impl PassThroughConsole {
    pub fn new(input: impl BufRead + Send + 'static, output: impl Write + Send + 'static) -> Self {
        Self {
            shared: Arc::new(Shared {
                alive: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                geometry: OnceLock::new(),
                command_color: Mutex::new(Color::White),
                output: Mutex::new(Box::new(output)),
                handler: HandlerSlot::default(),
            }),
            input: Mutex::new(Some(Box::new(input))),
        }
    }

    /// Console on stdin and stdout
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl Console for PassThroughConsole {
    fn init(&self, width: u16, height: u16, command_color: Color) -> Result<()> {
        if width < 2 || height < 2 {
            return Err(ConsoleError::InvalidGeometry { width, height });
        }
        if self.shared.stopped.load(Ordering::SeqCst) {
            return Err(ConsoleError::Stopped);
        }
        self.shared
            .geometry
            .set((width, height))
            .map_err(|_| ConsoleError::AlreadyInitialized)?;
        self.set_command_color(command_color);
        info!("pass-through console initialized at {}x{}", width, height);
        Ok(())
    }

    fn init_from_terminal(&self, command_color: Color) -> Result<()> {
        let (width, height) = crossterm::terminal::size().map_err(ConsoleError::Terminal)?;
        self.init(width, height, command_color)
    }

    fn run(&self, blocking: bool) -> Result<()> {
        let shared = &self.shared;
        if shared.stopped.load(Ordering::SeqCst) {
            return Err(ConsoleError::Stopped);
        }
        if shared.geometry.get().is_none() {
            return Err(ConsoleError::NotInitialized);
        }
        let input = self
            .input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ConsoleError::AlreadyRunning)?;

        shared.alive.store(true, Ordering::SeqCst);
        info!(blocking, "pass-through console running");

        if blocking {
            read_loop(shared, input);
        } else {
            let loop_shared = Arc::clone(shared);
            thread::Builder::new()
                .name("cmdconsole-lines".to_string())
                .spawn(move || read_loop(&loop_shared, input))
                .map_err(|e| {
                    shared.alive.store(false, Ordering::SeqCst);
                    ConsoleError::Thread(e)
                })?;
        }
        Ok(())
    }

    fn stop(&self) {
        self.shared.alive.store(false, Ordering::SeqCst);
        if !self.shared.stopped.swap(true, Ordering::SeqCst) {
            self.shared.handler.clear();
            info!("pass-through console stopped");
        }
    }

    fn is_alive(&self) -> bool {
        self.shared.is_alive()
    }

    fn width(&self) -> u16 {
        self.shared.geometry.get().map_or(0, |g| g.0)
    }

    fn height(&self) -> u16 {
        self.shared.geometry.get().map_or(0, |g| g.1)
    }

    fn command_color(&self) -> Color {
        *self
            .shared
            .command_color
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_command_color(&self, color: Color) {
        *self
            .shared
            .command_color
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = color;
    }

    fn on_command(&self, handler: CommandHandler) {
        self.shared.handler.set(handler);
    }

    fn write_colored(&self, text: &str, _color: Color) {
        self.shared.emit(text, false);
    }

    fn write_line_colored(&self, text: &str, _color: Color) {
        self.shared.emit(text, true);
    }
}

impl Drop for PassThroughConsole {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Turn input lines into commands until stopped or the input ends
fn read_loop(shared: &Shared, mut input: Box<dyn BufRead + Send>) {
    let mut line = String::new();
    while shared.is_alive() {
        line.clear();
        match input.read_line(&mut line) {
            Ok(0) => {
                debug!("console input closed");
                break;
            }
            Ok(_) => {
                let command = line.trim();
                if command.is_empty() || !shared.is_alive() {
                    continue;
                }
                debug!(command, "command entered");
                shared
                    .handler
                    .dispatch(command, || !shared.stopped.load(Ordering::SeqCst));
            }
            Err(e) => {
                error!("Console input failed: {}", e);
                break;
            }
        }
    }
}
