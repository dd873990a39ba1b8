//! Pending command editing

/// The command being typed at the prompt
///
/// Owned by the input loop alone; producers never see it.
#[derive(Debug, Default, Clone)]
pub struct LineEditor {
    pending: String,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.pending
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn insert(&mut self, ch: char) {
        self.pending.push(ch);
    }

    /// Remove the last character, if any
    pub fn backspace(&mut self) {
        self.pending.pop();
    }

    /// Replace the whole pending command
    pub fn replace(&mut self, text: &str) {
        self.pending = text.to_string();
    }

    /// Replace the pending command with pasted text
    ///
    /// Line breaks become spaces so the prompt stays on one row.
    pub fn paste(&mut self, text: &str) {
        self.pending = text
            .chars()
            .filter(|&ch| ch != '\r')
            .map(|ch| if ch == '\n' { ' ' } else { ch })
            .filter(|ch| !ch.is_control())
            .collect();
    }

    /// Take the finished command, trimmed; `None` if it is blank
    pub fn submit(&mut self) -> Option<String> {
        let command = std::mem::take(&mut self.pending);
        let trimmed = command.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}
