use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use cmdconsole::term::memory::KeyFeed;
use cmdconsole::term::{ChannelKeys, MemoryTerminal, StaticClipboard};
use cmdconsole::{Backend, Color, CommandConsole, Console, ConsoleOptions};

const WIDTH: u16 = 40;
const HEIGHT: u16 = 6;
const PROMPT_ROW: usize = HEIGHT as usize - 1;

struct Harness {
    console: Arc<CommandConsole>,
    terminal: MemoryTerminal,
    keys: KeyFeed,
    commands: Arc<Mutex<Vec<String>>>,
}

impl Harness {
    fn new(clipboard: StaticClipboard, options: ConsoleOptions) -> Self {
        let terminal = MemoryTerminal::new(WIDTH, HEIGHT);
        let (keys, source) = ChannelKeys::channel();
        let backend = Backend::new(terminal.clone(), source, clipboard);
        let console = Arc::new(CommandConsole::with_options(backend, options));
        console.init(WIDTH, HEIGHT, Color::Yellow).unwrap();

        let commands = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&commands);
        console.on_command(Box::new(move |cmd| sink.lock().unwrap().push(cmd.to_string())));

        Self {
            console,
            terminal,
            keys,
            commands,
        }
    }

    fn started() -> Self {
        let harness = Self::new(StaticClipboard::default(), fast_options());
        harness.console.run(false).unwrap();
        harness
    }

    fn prompt(&self) -> String {
        self.terminal.row(PROMPT_ROW).unwrap_or_default()
    }

    fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.console.stop();
    }
}

fn fast_options() -> ConsoleOptions {
    ConsoleOptions {
        poll_interval: Duration::from_millis(5),
        ..ConsoleOptions::default()
    }
}

fn wait_for(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn test_typed_command_reaches_handler_and_history() {
    let h = Harness::started();
    h.keys.type_str("  statuz");
    h.keys.press(KeyCode::Backspace);
    h.keys.type_str("s  ");
    wait_for("prompt echo", || h.prompt() == "  status");
    assert_eq!(h.terminal.row_color(PROMPT_ROW), Some(Color::Yellow));

    h.keys.press(KeyCode::Enter);
    wait_for("dispatch", || h.commands() == vec!["status"]);
    wait_for("history commit", || h.console.recent_commands(5) == vec!["status"]);
    wait_for("prompt cleared", || h.prompt().is_empty());
}

#[test]
fn test_blank_command_is_discarded() {
    let h = Harness::started();
    h.keys.type_str("   ");
    h.keys.press(KeyCode::Enter);
    h.keys.submit("real");
    wait_for("dispatch", || h.commands() == vec!["real"]);
    wait_for("history commit", || h.console.recent_commands(5) == vec!["real"]);
}

#[test]
fn test_up_and_down_recall_history() {
    let h = Harness::started();
    h.keys.submit("first");
    h.keys.submit("second");
    h.keys.submit("first");
    wait_for("dispatch", || h.commands().len() == 3);
    wait_for("history", || h.console.recent_commands(5) == vec!["second", "first"]);
    assert_eq!(h.console.search_history("SEC"), vec!["second"]);
    assert_eq!(h.console.search_history("i"), vec!["first"]);

    h.keys.press(KeyCode::Up);
    wait_for("newest recalled", || h.prompt() == "second");
    h.keys.press(KeyCode::Up);
    wait_for("older recalled", || h.prompt() == "first");
    h.keys.press(KeyCode::Up);
    thread::sleep(Duration::from_millis(30));
    assert_eq!(h.prompt(), "first");
    h.keys.press(KeyCode::Down);
    wait_for("newer recalled", || h.prompt() == "second");
    h.keys.press(KeyCode::Down);
    wait_for("past newest", || h.prompt().is_empty());

    // A recalled command can be edited and resubmitted
    h.keys.press(KeyCode::Up);
    h.keys.type_str(" --all");
    h.keys.press(KeyCode::Enter);
    wait_for("edited dispatch", || h.commands().last().map(String::as_str) == Some("second --all"));
}

#[test]
fn test_paste_replaces_pending_command() {
    let h = Harness::new(StaticClipboard::new("deploy\nnow"), fast_options());
    h.console.run(false).unwrap();

    h.keys.type_str("discard me");
    h.keys.ctrl('v');
    wait_for("pasted", || h.prompt() == "deploy now");
    h.keys.press(KeyCode::Enter);
    wait_for("dispatch", || h.commands() == vec!["deploy now"]);
}

#[test]
fn test_empty_clipboard_keeps_pending_command() {
    let h = Harness::started();
    h.keys.type_str("keep");
    h.keys.ctrl('v');
    h.keys.press(KeyCode::Enter);
    wait_for("dispatch", || h.commands() == vec!["keep"]);
}

#[test]
fn test_page_keys_scroll_output_without_touching_prompt() {
    let h = Harness::started();
    for i in 0..20 {
        h.console.write_line(&format!("line {}", i));
    }
    let rows = HEIGHT as usize - 1;
    let tail: Vec<String> = (15..20).map(|i| format!("line {}", i)).collect();
    assert_eq!(h.terminal.rows()[..rows], tail[..]);

    h.keys.type_str("half");
    wait_for("prompt echo", || h.prompt() == "half");

    h.keys.press(KeyCode::PageUp);
    let page: Vec<String> = (10..15).map(|i| format!("line {}", i)).collect();
    wait_for("scrolled up", || h.terminal.rows()[..rows] == page[..]);
    assert_eq!(h.prompt(), "half");

    // Output while scrolled back leaves the view where it is
    h.console.write_line("line 20");
    assert_eq!(h.terminal.rows()[..rows], page[..]);

    h.keys.press(KeyCode::PageDown);
    let next: Vec<String> = (15..20).map(|i| format!("line {}", i)).collect();
    wait_for("next page", || h.terminal.rows()[..rows] == next[..]);
    h.keys.press(KeyCode::PageDown);
    let tail: Vec<String> = (16..21).map(|i| format!("line {}", i)).collect();
    wait_for("back at tail", || h.terminal.rows()[..rows] == tail[..]);

    h.keys.press(KeyCode::Enter);
    wait_for("dispatch", || h.commands() == vec!["half"]);
}

#[test]
fn test_scrolling_stops_at_oldest_page() {
    let options = ConsoleOptions {
        scrollback_lines: 12,
        ..fast_options()
    };
    let h = Harness::new(StaticClipboard::default(), options);
    h.console.run(false).unwrap();
    for i in 0..30 {
        h.console.write_line(&format!("row {}", i));
    }

    for _ in 0..5 {
        h.keys.press(KeyCode::PageUp);
    }
    let oldest: Vec<String> = (18..23).map(|i| format!("row {}", i)).collect();
    wait_for("oldest page", || h.terminal.rows()[..5] == oldest[..]);
}

#[test]
fn test_long_output_is_wrapped_to_width() {
    let h = Harness::started();
    let long = "x".repeat(100);
    h.console.write_line_colored(&long, Color::Magenta);

    let visible = h.console.visible_lines();
    let wrapped: Vec<_> = visible.iter().filter(|l| !l.text.is_empty()).collect();
    assert_eq!(wrapped.len(), 3);
    assert_eq!(wrapped[0].text.len(), WIDTH as usize - 1);
    assert_eq!(wrapped[2].text.len(), 100 - 2 * (WIDTH as usize - 1));
    assert!(wrapped.iter().all(|l| l.color == Color::Magenta));
}

#[test]
fn test_handler_output_lands_in_scrollback() {
    let h = Harness::started();
    let console = Arc::clone(&h.console);
    h.console.on_command(Box::new(move |cmd| {
        console.write_line_colored(&format!("> {}", cmd), Color::Cyan);
    }));

    h.keys.submit("ping");
    wait_for("echo", || {
        h.console
            .visible_lines()
            .last()
            .map_or(false, |l| l.text == "> ping" && l.color == Color::Cyan)
    });
}

#[test]
fn test_stop_from_handler_releases_blocking_run() {
    let h = Harness::new(StaticClipboard::default(), fast_options());
    let console = Arc::clone(&h.console);
    h.console.on_command(Box::new(move |cmd| {
        if cmd == "quit" {
            console.stop();
        }
    }));

    let (done_tx, done_rx) = mpsc::channel();
    let runner = Arc::clone(&h.console);
    thread::spawn(move || {
        let result = runner.run(true);
        let _ = done_tx.send(result.is_ok());
    });

    wait_for("running", || h.console.is_alive());
    assert!(h.terminal.is_prepared());
    h.keys.submit("quit");

    assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)), Ok(true));
    assert!(!h.console.is_alive());
    wait_for("terminal restored", || !h.terminal.is_prepared());

    h.console.write_line("after stop");
    assert!(h.console.scrollback().iter().all(|l| l.text != "after stop"));
}

#[test]
fn test_stop_from_another_thread_releases_blocking_run() {
    let h = Harness::new(StaticClipboard::default(), fast_options());
    let (done_tx, done_rx) = mpsc::channel();
    let runner = Arc::clone(&h.console);
    thread::spawn(move || {
        let _ = done_tx.send(runner.run(true).is_ok());
    });

    wait_for("running", || h.console.is_alive());
    h.console.stop();
    assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)), Ok(true));
    assert!(!h.terminal.is_prepared());
}

#[test]
fn test_concurrent_producers_never_tear_rows() {
    const PRODUCERS: usize = 4;
    const LINES: usize = 1000;

    let h = Harness::started();
    let (done_tx, done_rx) = mpsc::channel();

    for p in 0..PRODUCERS {
        let console = Arc::clone(&h.console);
        let done = done_tx.clone();
        thread::spawn(move || {
            for n in 0..LINES {
                console.write_line(&format!("p{}-{:04}", p, n));
            }
            let _ = done.send(p);
        });
    }

    // Keep the input thread busy at the same time
    for i in 0..50 {
        h.keys.submit(&format!("cmd{}", i));
        h.keys.press(if i % 2 == 0 { KeyCode::PageUp } else { KeyCode::PageDown });
    }

    for _ in 0..PRODUCERS {
        done_rx
            .recv_timeout(Duration::from_secs(30))
            .expect("producer deadlocked");
    }
    wait_for("all commands", || h.commands().len() == 50);

    let valid_row = |row: &str| {
        row.is_empty()
            || (row.len() == 7
                && row.starts_with('p')
                && row[1..2].parse::<usize>().map_or(false, |p| p < PRODUCERS)
                && &row[2..3] == "-"
                && row[3..].parse::<usize>().map_or(false, |n| n < LINES))
    };
    for row in &h.terminal.rows()[..PROMPT_ROW] {
        assert!(valid_row(row.as_str()), "torn row on screen: {:?}", row);
    }

    // The scrollback keeps the newest lines, each producer's in order
    let scrollback = h.console.scrollback();
    assert_eq!(scrollback.len(), h.console.options().scrollback_lines);
    let mut last_seen = [None::<usize>; PRODUCERS];
    for line in &scrollback {
        assert!(valid_row(line.text.as_str()), "torn row in scrollback: {:?}", line.text);
        if line.text.is_empty() {
            continue;
        }
        let p: usize = line.text[1..2].parse().unwrap();
        let n: usize = line.text[3..].parse().unwrap();
        if let Some(prev) = last_seen[p] {
            assert!(n > prev, "producer {} out of order: {} after {}", p, n, prev);
        }
        last_seen[p] = Some(n);
    }
    let newest = scrollback.last().map(|l| l.text.as_str()).unwrap_or_default();
    assert!(newest.ends_with(&format!("-{:04}", LINES - 1)), "newest row {:?}", newest);
}

#[test]
fn test_independent_instances_do_not_share_state() {
    let a = Harness::started();
    let b = Harness::started();

    a.console.write_line("only in a");
    a.keys.submit("cmd-a");
    wait_for("a dispatch", || a.commands() == vec!["cmd-a"]);

    assert!(b.console.scrollback().iter().all(|l| l.text.is_empty()));
    assert!(b.commands().is_empty());
    assert!(b.console.recent_commands(5).is_empty());
}
