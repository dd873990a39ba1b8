//! cmdconsole - demo host for the interactive console
//!
//! Runs a worker that prints the time ten times a second while the prompt
//! stays usable underneath it.
//!
//! # Quick Start
//!
//! ```text
//! cmdconsole                  # Scrollback console with a prompt
//! cmdconsole --pass-through   # Plain stdin/stdout console
//! ```
//!
//! # Commands
//!
//! | Command | Action |
//! |---------|--------|
//! | help | List commands |
//! | echo TEXT | Print TEXT in the prompt color |
//! | color NAME | Change the prompt color |
//! | pause / resume | Stop/restart the worker output |
//! | quit / exit | Stop the console |

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cmdconsole::{console_write, console_writeln};
use cmdconsole::{Color, CommandHandler, Console, ConsoleConfig, ConsoleKind, ConsoleRegistry};

/// Command line options
#[derive(Default)]
struct Args {
    /// Console kind forced on the command line
    kind: Option<ConsoleKind>,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_help() {
    eprintln!("cmdconsole {} - interactive console demo", VERSION);
    eprintln!();
    eprintln!("Usage: cmdconsole [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  (default)             Console kind from config.toml (command)");
    eprintln!("  -c, --command         Scrollback console with a prompt");
    eprintln!("  -p, --pass-through    Plain line-based console");
    eprintln!("  -V, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Keys: Enter submit, Up/Down history, Ctrl+V paste, PageUp/PageDown scroll");
    eprintln!();
    eprintln!("Configuration: ~/.cmdconsole/config.toml");
    eprintln!("Log file:      ~/.cmdconsole/cmdconsole.log");
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args::default();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                eprintln!("cmdconsole {}", VERSION);
                std::process::exit(0);
            }
            "-c" | "--command" => args.kind = Some(ConsoleKind::Command),
            "-p" | "--pass-through" => args.kind = Some(ConsoleKind::PassThrough),
            other => return Err(format!("Unknown option: {}", other)),
        }
    }
    Ok(args)
}

/// Log to a file; stdout belongs to the console
fn init_logging(config: &ConsoleConfig) {
    let log_path = ConsoleConfig::config_dir()
        .map(|dir| dir.join("cmdconsole.log"))
        .unwrap_or_else(|| std::path::PathBuf::from("cmdconsole.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

/// Background producer writing the time
struct Worker {
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    fn start(console: Arc<dyn Console>) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let paused = Arc::new(AtomicBool::new(false));

        let (run_flag, pause_flag) = (running.clone(), paused.clone());
        let thread = thread::spawn(move || {
            let started = Instant::now();
            while run_flag.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(100));
                if pause_flag.load(Ordering::SeqCst) {
                    continue;
                }
                let unix = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0);
                console_writeln!(console, "Current time (unix) {}", unix);
                console_write!(console, Color::DarkGrey, "  uptime {:.1}s", started.elapsed().as_secs_f64());
            }
        });

        Self {
            running,
            paused,
            thread: Some(thread),
        }
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("worker thread panicked");
            }
        }
    }
}

fn command_handler(console: Arc<dyn Console>, paused: Arc<AtomicBool>) -> CommandHandler {
    Box::new(move |cmd| {
        let (name, rest) = cmd.split_once(' ').unwrap_or((cmd, ""));
        match name {
            "quit" | "exit" => {
                info!("quit requested");
                console.stop();
            }
            "help" => {
                console.write_line_colored(
                    "commands: help, echo TEXT, color NAME, pause, resume, quit",
                    Color::Cyan,
                );
            }
            "echo" => console.write_line_colored(rest, console.command_color()),
            "color" => match rest.parse::<Color>() {
                Ok(color) => console.set_command_color(color),
                Err(e) => console.write_line_colored(&e, Color::Red),
            },
            "pause" => paused.store(true, Ordering::SeqCst),
            "resume" => paused.store(false, Ordering::SeqCst),
            _ => console_writeln!(console, Color::Red, "unknown command: {}", cmd),
        }
    })
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let mut config = ConsoleConfig::load();
    if let Some(kind) = args.kind {
        config.kind = kind;
    }
    init_logging(&config);
    info!("cmdconsole starting...");

    let kind = config.kind;
    let (width, height, color) = (config.width, config.height, config.command_color);
    let console = ConsoleRegistry::global(move || config).get(kind);

    match (width, height) {
        (Some(width), Some(height)) => console.init(width, height, color)?,
        _ => console.init_from_terminal(color)?,
    }

    let mut worker = Worker::start(Arc::clone(&console));
    console.on_command(command_handler(Arc::clone(&console), worker.paused.clone()));

    console.run(true)?;

    worker.stop();
    console.stop();
    info!("cmdconsole exiting");
    Ok(())
}
