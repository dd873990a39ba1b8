//! Command console
//!
//! A scrollback view on rows `0..height-1` with an editable prompt on the
//! bottom row. Producers append output from any thread while a dedicated
//! input thread turns key presses into commands.
//!
//! All scrollback and history state, and every draw, sit behind one mutex
//! (the "screen"), so a repaint never observes a half-applied append. The
//! pending command lives on the input thread only. The command handler is
//! called with no lock held and may freely write or stop the console.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::{CommandHandler, Console, HandlerSlot};
use crate::config::{Color, ConsoleConfig, BUF_SIZE, HISTORY_SIZE};
use crate::core::{ColoredLine, LineStore};
use crate::error::{ConsoleError, Result};
use crate::history::HistoryStore;
use crate::term::{Backend, ClipboardSource, KeySource, Terminal};
use crate::ui::{KeyAction, KeyMapper, LineEditor, Renderer};

/// Capacities and timing of a command console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleOptions {
    /// Scrollback capacity in rows
    pub scrollback_lines: usize,
    /// Command history capacity
    pub history_size: usize,
    /// Key poll timeout; `stop` waits at most about this long for the input thread
    pub poll_interval: Duration,
    /// Keep a scrolled-back view on the same rows while output arrives
    pub anchor_scrollback: bool,
}

impl Default for ConsoleOptions {
    fn default() -> Self {
        Self {
            scrollback_lines: BUF_SIZE,
            history_size: HISTORY_SIZE,
            poll_interval: Duration::from_millis(50),
            anchor_scrollback: true,
        }
    }
}

impl From<&ConsoleConfig> for ConsoleOptions {
    fn from(config: &ConsoleConfig) -> Self {
        Self {
            scrollback_lines: config.scrollback_lines,
            history_size: config.history_size,
            poll_interval: config.poll_interval(),
            anchor_scrollback: config.anchor_scrollback,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Geometry {
    width: u16,
    height: u16,
}

/// Everything guarded by the buffer lock
struct Screen {
    terminal: Box<dyn Terminal>,
    lines: LineStore,
    history: HistoryStore,
    renderer: Renderer,
    command_color: Color,
}

impl Screen {
    fn draw_viewport(&mut self) {
        let renderer = self.renderer;
        if let Err(e) = renderer.draw_viewport(self.terminal.as_mut(), &self.lines) {
            warn!("Viewport redraw failed: {}", e);
        }
    }

    fn draw_prompt(&mut self, pending: &str) {
        let renderer = self.renderer;
        if let Err(e) = renderer.draw_prompt(self.terminal.as_mut(), pending, self.command_color) {
            warn!("Prompt redraw failed: {}", e);
        }
    }

    fn restore(&mut self) {
        if let Err(e) = self.terminal.restore() {
            warn!("Failed to restore terminal: {}", e);
        }
    }
}

/// One-shot wake-up for a blocked `run`
#[derive(Default)]
struct Signal {
    released: Mutex<bool>,
    cond: Condvar,
}

impl Signal {
    fn release(&self) {
        let mut released = self.released.lock().unwrap_or_else(PoisonError::into_inner);
        *released = true;
        self.cond.notify_all();
    }

    fn wait(&self) {
        let mut released = self.released.lock().unwrap_or_else(PoisonError::into_inner);
        while !*released {
            released = self
                .cond
                .wait(released)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// State shared between the facade, producers and the input thread
struct Shared {
    alive: AtomicBool,
    stopped: AtomicBool,
    geometry: OnceLock<Geometry>,
    options: ConsoleOptions,
    screen: Mutex<Screen>,
    handler: HandlerSlot,
    stop_signal: Signal,
}

impl Shared {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn lock_screen(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append(&self, text: &str, color: Color, close: bool) {
        if !self.is_alive() {
            return;
        }
        let mut screen = self.lock_screen();
        // stop() may have restored the terminal while we waited
        if !self.is_alive() {
            return;
        }
        screen.lines.append(text, color, close);
        screen.draw_viewport();
    }

    fn redraw_prompt(&self, pending: &str) {
        self.lock_screen().draw_prompt(pending);
    }

    fn scroll(&self, up: bool) {
        let mut screen = self.lock_screen();
        let view_end = if up {
            screen.lines.scroll_up()
        } else {
            screen.lines.scroll_down()
        };
        debug!(view_end, up, "scrollback moved");
        screen.draw_viewport();
    }

    fn dispatch(&self, command: &str) {
        self.handler.dispatch(command, || !self.is_stopped());
    }
}

/// Devices owned by the input thread while it runs
struct InputDevices {
    keys: Box<dyn KeySource>,
    clipboard: Box<dyn ClipboardSource>,
}

/// Scrollback console with a live command prompt
///
/// ```no_run
/// use cmdconsole::{Backend, Color, CommandConsole, Console};
///
/// let console = std::sync::Arc::new(CommandConsole::new(Backend::crossterm()));
/// console.init(80, 24, Color::Yellow)?;
/// let handle = console.clone();
/// console.on_command(Box::new(move |cmd| {
///     if cmd == "quit" {
///         handle.stop();
///     }
/// }));
/// console.run(true)?;
/// # Ok::<(), cmdconsole::ConsoleError>(())
/// ```
pub struct CommandConsole {
    shared: Arc<Shared>,
    input: Mutex<Option<InputDevices>>,
    input_thread: Mutex<Option<JoinHandle<()>>>,
}

impl CommandConsole {
    /// Create a console with default capacities
    pub fn new(backend: Backend) -> Self {
        Self::with_options(backend, ConsoleOptions::default())
    }

    /// Create a console from the configuration file settings
    pub fn with_config(backend: Backend, config: &ConsoleConfig) -> Self {
        Self::with_options(backend, ConsoleOptions::from(config))
    }

    pub fn with_options(backend: Backend, options: ConsoleOptions) -> Self {
        let Backend {
            terminal,
            keys,
            clipboard,
        } = backend;

        // Real stores are built by init once the geometry is known
        let screen = Screen {
            terminal,
            lines: LineStore::new(0, 0, 0, options.anchor_scrollback),
            history: HistoryStore::new(0),
            renderer: Renderer::new(0, 0),
            command_color: Color::White,
        };

        Self {
            shared: Arc::new(Shared {
                alive: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                geometry: OnceLock::new(),
                options,
                screen: Mutex::new(screen),
                handler: HandlerSlot::default(),
                stop_signal: Signal::default(),
            }),
            input: Mutex::new(Some(InputDevices { keys, clipboard })),
            input_thread: Mutex::new(None),
        }
    }

    pub fn options(&self) -> ConsoleOptions {
        self.shared.options
    }

    /// Copy of the scrollback, oldest row first
    pub fn scrollback(&self) -> Vec<ColoredLine> {
        self.shared.lock_screen().lines.iter().cloned().collect()
    }

    /// Rows currently shown in the viewport, top to bottom
    pub fn visible_lines(&self) -> Vec<ColoredLine> {
        self.shared.lock_screen().lines.visible().cloned().collect()
    }

    /// Most recent commands, newest first
    pub fn recent_commands(&self, count: usize) -> Vec<String> {
        let screen = self.shared.lock_screen();
        screen.history.recent(count).into_iter().map(str::to_string).collect()
    }

    /// Commands containing `query`, newest first
    pub fn search_history(&self, query: &str) -> Vec<String> {
        let screen = self.shared.lock_screen();
        screen.history.search(query).into_iter().map(str::to_string).collect()
    }

    fn validate(&self, width: u16, height: u16) -> Result<()> {
        if width < 2 || height < 2 {
            return Err(ConsoleError::InvalidGeometry { width, height });
        }
        let options = &self.shared.options;
        let rows = (height - 1) as usize;
        if options.scrollback_lines < rows || options.history_size == 0 {
            return Err(ConsoleError::InvalidCapacity {
                scrollback: options.scrollback_lines,
                history: options.history_size,
                rows,
            });
        }
        Ok(())
    }
}

impl Console for CommandConsole {
    fn init(&self, width: u16, height: u16, command_color: Color) -> Result<()> {
        let shared = &self.shared;
        let mut screen = shared.lock_screen();
        if shared.geometry.get().is_some() {
            return Err(ConsoleError::AlreadyInitialized);
        }
        if shared.is_stopped() {
            return Err(ConsoleError::Stopped);
        }
        self.validate(width, height)?;

        screen
            .terminal
            .prepare(width, height)
            .map_err(ConsoleError::Terminal)?;

        let options = shared.options;
        screen.lines = LineStore::new(
            options.scrollback_lines,
            width as usize,
            (height - 1) as usize,
            options.anchor_scrollback,
        );
        screen.history = HistoryStore::new(options.history_size);
        screen.renderer = Renderer::new(width, height);
        screen.command_color = command_color;

        // Only this call can get here: the screen lock is held
        let _ = shared.geometry.set(Geometry { width, height });
        info!("console initialized at {}x{}", width, height);
        Ok(())
    }

    fn init_from_terminal(&self, command_color: Color) -> Result<()> {
        let (width, height) = self
            .shared
            .lock_screen()
            .terminal
            .size()
            .map_err(ConsoleError::Terminal)?;
        self.init(width, height, command_color)
    }

    fn run(&self, blocking: bool) -> Result<()> {
        let shared = &self.shared;
        // Held until the input thread is recorded, so a concurrent stop
        // sees either no run at all or a fully started one
        let mut input_thread = self.input_thread.lock().unwrap_or_else(PoisonError::into_inner);
        if shared.is_stopped() {
            return Err(ConsoleError::Stopped);
        }
        if shared.geometry.get().is_none() {
            return Err(ConsoleError::NotInitialized);
        }
        let devices = self
            .input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ConsoleError::AlreadyRunning)?;

        shared.alive.store(true, Ordering::SeqCst);
        {
            let mut screen = shared.lock_screen();
            screen.draw_viewport();
            screen.draw_prompt("");
        }

        let loop_shared = Arc::clone(shared);
        let handle = thread::Builder::new()
            .name("cmdconsole-input".to_string())
            .spawn(move || input_loop(loop_shared, devices))
            .map_err(|e| {
                shared.alive.store(false, Ordering::SeqCst);
                ConsoleError::Thread(e)
            })?;
        *input_thread = Some(handle);
        drop(input_thread);
        info!(blocking, "console running");

        if blocking {
            shared.stop_signal.wait();
        }
        Ok(())
    }

    fn stop(&self) {
        let shared = &self.shared;
        let handle = {
            let mut input_thread = self.input_thread.lock().unwrap_or_else(PoisonError::into_inner);
            shared.alive.store(false, Ordering::SeqCst);
            if shared.stopped.swap(true, Ordering::SeqCst) {
                return;
            }
            input_thread.take()
        };
        shared.stop_signal.release();

        if let Some(handle) = handle {
            // From inside the handler the loop exits on its own after dispatch
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                warn!("input thread panicked before stop");
            }
        }

        shared.handler.clear();
        shared.lock_screen().restore();
        info!("console stopped");
    }

    fn is_alive(&self) -> bool {
        self.shared.is_alive()
    }

    fn width(&self) -> u16 {
        self.shared.geometry.get().map_or(0, |g| g.width)
    }

    fn height(&self) -> u16 {
        self.shared.geometry.get().map_or(0, |g| g.height)
    }

    fn command_color(&self) -> Color {
        self.shared.lock_screen().command_color
    }

    fn set_command_color(&self, color: Color) {
        self.shared.lock_screen().command_color = color;
    }

    fn on_command(&self, handler: CommandHandler) {
        self.shared.handler.set(handler);
    }

    fn write_colored(&self, text: &str, color: Color) {
        self.shared.append(text, color, false);
    }

    fn write_line_colored(&self, text: &str, color: Color) {
        self.shared.append(text, color, true);
    }
}

impl Drop for CommandConsole {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read keys until the console stops
fn input_loop(shared: Arc<Shared>, mut devices: InputDevices) {
    let mut editor = LineEditor::new();
    let poll_interval = shared.options.poll_interval;

    while shared.is_alive() {
        let key = match devices.keys.next_key(poll_interval) {
            Ok(Some(key)) => key,
            Ok(None) => continue,
            Err(e) => {
                error!("Key input failed, command prompt disabled: {}", e);
                break;
            }
        };

        let action = KeyMapper::map(&key);
        match action {
            KeyAction::Submit => {
                if let Some(command) = editor.submit() {
                    debug!(command = command.as_str(), "command entered");
                    shared.dispatch(&command);
                    shared.lock_screen().history.commit(&command);
                }
            }
            KeyAction::Backspace => editor.backspace(),
            KeyAction::HistoryOlder => {
                let recalled = shared.lock_screen().history.older();
                editor.replace(&recalled);
            }
            KeyAction::HistoryNewer => {
                let recalled = shared.lock_screen().history.newer();
                editor.replace(&recalled);
            }
            KeyAction::Paste => {
                if let Some(text) = devices.clipboard.text() {
                    editor.paste(&text);
                }
            }
            KeyAction::ScrollUp => shared.scroll(true),
            KeyAction::ScrollDown => shared.scroll(false),
            KeyAction::Insert(ch) => editor.insert(ch),
            KeyAction::Ignore => {}
        }

        if action.redraws_prompt() && shared.is_alive() {
            shared.redraw_prompt(editor.as_str());
        }
    }

    // Stopped from inside the handler, or the keyboard failed
    if shared.is_stopped() {
        shared.lock_screen().restore();
    }
    debug!("input loop finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{ChannelKeys, MemoryTerminal, StaticClipboard};

    fn console(width: u16, height: u16) -> (CommandConsole, MemoryTerminal) {
        let terminal = MemoryTerminal::new(width, height);
        let (_feed, keys) = ChannelKeys::channel();
        let backend = Backend::new(terminal.clone(), keys, StaticClipboard::default());
        (CommandConsole::new(backend), terminal)
    }

    #[test]
    fn test_init_rejects_degenerate_geometry() {
        let (console, _) = console(80, 24);
        assert!(matches!(
            console.init(1, 24, Color::White),
            Err(ConsoleError::InvalidGeometry { width: 1, height: 24 })
        ));
        assert!(matches!(
            console.init(80, 0, Color::White),
            Err(ConsoleError::InvalidGeometry { .. })
        ));
        // A failed init does not count
        assert!(console.init(80, 24, Color::White).is_ok());
    }

    #[test]
    fn test_init_rejects_small_capacities() {
        let terminal = MemoryTerminal::new(80, 24);
        let (_feed, keys) = ChannelKeys::channel();
        let options = ConsoleOptions {
            scrollback_lines: 10,
            ..ConsoleOptions::default()
        };
        let console = CommandConsole::with_options(
            Backend::new(terminal, keys, StaticClipboard::default()),
            options,
        );
        assert!(matches!(
            console.init(80, 24, Color::White),
            Err(ConsoleError::InvalidCapacity { scrollback: 10, rows: 23, .. })
        ));
    }

    #[test]
    fn test_init_twice_is_an_error() {
        let (console, terminal) = console(40, 10);
        console.init(40, 10, Color::Yellow).unwrap();
        assert!(terminal.is_prepared());
        assert_eq!((console.width(), console.height()), (40, 10));
        assert_eq!(console.command_color(), Color::Yellow);
        assert!(matches!(
            console.init(40, 10, Color::Yellow),
            Err(ConsoleError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_init_propagates_terminal_failure() {
        let terminal = MemoryTerminal::unavailable(80, 24);
        let (_feed, keys) = ChannelKeys::channel();
        let console = CommandConsole::new(Backend::new(terminal, keys, StaticClipboard::default()));
        assert!(matches!(
            console.init(80, 24, Color::White),
            Err(ConsoleError::Terminal(_))
        ));
        assert_eq!(console.width(), 0);
    }

    #[test]
    fn test_init_from_terminal_uses_its_size() {
        let (console, _) = console(64, 20);
        console.init_from_terminal(Color::Cyan).unwrap();
        assert_eq!((console.width(), console.height()), (64, 20));
    }

    #[test]
    fn test_run_requires_init() {
        let (console, _) = console(80, 24);
        assert!(matches!(console.run(false), Err(ConsoleError::NotInitialized)));
    }

    #[test]
    fn test_stop_before_run() {
        let (console, terminal) = console(80, 24);
        console.init(80, 24, Color::White).unwrap();
        console.stop();
        assert!(!console.is_alive());
        assert!(!terminal.is_prepared());
        assert!(matches!(console.run(false), Err(ConsoleError::Stopped)));
        console.stop();
    }

    #[test]
    fn test_writes_are_dropped_unless_alive() {
        let (console, _) = console(20, 5);
        console.init(20, 5, Color::White).unwrap();
        console.write_line("too early");
        assert!(console.scrollback().iter().all(|l| l.text.is_empty()));

        console.run(false).unwrap();
        assert!(matches!(console.run(false), Err(ConsoleError::AlreadyRunning)));
        console.write_line("on time");
        console.stop();
        console.write_line("too late");

        let texts: Vec<_> = console
            .scrollback()
            .into_iter()
            .map(|l| l.text)
            .filter(|t| !t.is_empty())
            .collect();
        assert_eq!(texts, vec!["on time"]);
    }

    #[test]
    fn test_write_lands_on_screen() {
        let (console, terminal) = console(20, 4);
        console.init(20, 4, Color::White).unwrap();
        console.run(false).unwrap();

        console.write("ab");
        console.write("cd");
        console.write_line_colored("ef", Color::Green);
        console.write_line("next");

        assert_eq!(terminal.rows(), vec!["", "abcdef", "next", ""]);
        assert_eq!(terminal.row_color(1), Some(Color::Green));
        console.stop();
    }

    #[test]
    fn test_formatting_macros() {
        let (console, _) = console(40, 4);
        console.init(40, 4, Color::White).unwrap();
        console.run(false).unwrap();

        crate::console_write!(console, "{}+{}", 1, 2);
        crate::console_writeln!(console, "={}", 3);
        crate::console_writeln!(console, Color::Red, "error {}", 42);

        let visible: Vec<_> = console.visible_lines();
        assert_eq!(visible[1], ColoredLine::new(Color::Reset, "1+2=3"));
        assert_eq!(visible[2], ColoredLine::new(Color::Red, "error 42"));
        console.stop();
    }

    #[test]
    fn test_stop_racing_run_leaves_console_stopped() {
        for _ in 0..50 {
            let (console, terminal) = console(20, 5);
            let console = Arc::new(console);
            console.init(20, 5, Color::White).unwrap();

            let barrier = Arc::new(std::sync::Barrier::new(2));
            let runner = Arc::clone(&console);
            let start = Arc::clone(&barrier);
            let run = thread::spawn(move || {
                start.wait();
                runner.run(false)
            });
            barrier.wait();
            console.stop();

            let result = run.join().unwrap();
            assert!(matches!(result, Ok(()) | Err(ConsoleError::Stopped)));
            assert!(!console.is_alive());
            assert!(!terminal.is_prepared());
            console.write_line("dropped");
            assert!(console.scrollback().iter().all(|l| l.text.is_empty()));
        }
    }
}
