//! Key mapping for the command prompt
//!
//! Converts key events to the actions the input loop performs.

use bitflags::bitflags;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

bitflags! {
    /// Modifier keys
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        let mut result = Modifiers::empty();
        if mods.contains(KeyModifiers::SHIFT) {
            result |= Modifiers::SHIFT;
        }
        if mods.contains(KeyModifiers::CONTROL) {
            result |= Modifiers::CTRL;
        }
        if mods.contains(KeyModifiers::ALT) {
            result |= Modifiers::ALT;
        }
        result
    }
}

/// What a key press does at the prompt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Finish the pending command
    Submit,
    /// Delete the last character
    Backspace,
    /// Recall an older command
    HistoryOlder,
    /// Recall a newer command
    HistoryNewer,
    /// Replace the pending command with the clipboard
    Paste,
    /// Show the previous page of output
    ScrollUp,
    /// Show the next page of output
    ScrollDown,
    /// Append a character
    Insert(char),
    /// Nothing to do
    Ignore,
}

impl KeyAction {
    /// Whether the prompt must be redrawn after this action
    pub fn redraws_prompt(self) -> bool {
        !matches!(self, KeyAction::ScrollUp | KeyAction::ScrollDown)
    }
}

/// Key mapper for converting key events to prompt actions
pub struct KeyMapper;

impl KeyMapper {
    /// Map a crossterm KeyEvent to an action
    pub fn map(event: &KeyEvent) -> KeyAction {
        // Only key presses count
        if event.kind == KeyEventKind::Release {
            return KeyAction::Ignore;
        }

        let mods = Modifiers::from(event.modifiers);

        match event.code {
            KeyCode::Enter => KeyAction::Submit,
            KeyCode::Backspace => KeyAction::Backspace,
            KeyCode::Up => KeyAction::HistoryOlder,
            KeyCode::Down => KeyAction::HistoryNewer,
            KeyCode::PageUp => KeyAction::ScrollUp,
            KeyCode::PageDown => KeyAction::ScrollDown,
            KeyCode::Insert if mods.contains(Modifiers::SHIFT) => KeyAction::Paste,
            KeyCode::Char(ch) => Self::map_char(ch, mods),
            _ => KeyAction::Ignore,
        }
    }

    /// Map a character with modifiers
    fn map_char(ch: char, mods: Modifiers) -> KeyAction {
        if mods.contains(Modifiers::CTRL) {
            if ch.eq_ignore_ascii_case(&'v') && !mods.contains(Modifiers::ALT) {
                return KeyAction::Paste;
            }
            return KeyAction::Ignore;
        }
        if mods.contains(Modifiers::ALT) || ch.is_control() {
            return KeyAction::Ignore;
        }
        KeyAction::Insert(ch)
    }
}
