//! Command history for cmdconsole
//!
//! Provides a fixed-capacity command history with de-duplication and
//! up/down recall.

use std::collections::VecDeque;

/// Command history ring
///
/// Always holds `capacity` slots, oldest first, pre-filled with empty
/// strings. The recall cursor starts one past the newest slot.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: VecDeque<String>,
    capacity: usize,
    /// Slot shown by the last recall; `capacity` means "past the newest"
    cursor: usize,
}

impl HistoryStore {
    /// Create an empty history with `capacity` slots
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: std::iter::repeat(String::new()).take(capacity).collect(),
            capacity,
            cursor: capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a command to history
    ///
    /// A command already present anywhere in the store is not added again.
    /// Either way the recall cursor goes back past the newest entry.
    pub fn commit(&mut self, command: &str) {
        self.cursor = self.capacity;

        if self.capacity == 0 || command.is_empty() {
            return;
        }
        if self.entries.iter().any(|e| e == command) {
            return;
        }

        self.entries.pop_front();
        self.entries.push_back(command.to_string());
    }

    /// Step toward older commands and return the one recalled
    ///
    /// Stops at the oldest non-empty entry and keeps returning it.
    pub fn older(&mut self) -> String {
        if self.cursor > 0 && !self.entries[self.cursor - 1].is_empty() {
            self.cursor -= 1;
        }
        self.current()
    }

    /// Step toward newer commands and return the one recalled
    ///
    /// Returns an empty string once the cursor moves past the newest entry.
    pub fn newer(&mut self) -> String {
        if self.cursor < self.capacity {
            self.cursor += 1;
        }
        self.current()
    }

    fn current(&self) -> String {
        self.entries.get(self.cursor).cloned().unwrap_or_default()
    }

    /// Search history by query (newest first)
    pub fn search(&self, query: &str) -> Vec<&str> {
        let query_lower = query.to_lowercase();
        self.entries
            .iter()
            .rev()
            .filter(|e| !e.is_empty() && e.to_lowercase().contains(&query_lower))
            .map(String::as_str)
            .collect()
    }

    /// Get recent history (newest first)
    pub fn recent(&self, count: usize) -> Vec<&str> {
        self.entries
            .iter()
            .rev()
            .filter(|e| !e.is_empty())
            .take(count)
            .map(String::as_str)
            .collect()
    }

    /// All slots, oldest first, including empty ones
    pub fn slots(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(String::as_str)
    }

    /// Number of stored commands
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_empty()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_with(commands: &[&str]) -> HistoryStore {
        let mut history = HistoryStore::new(10);
        for cmd in commands {
            history.commit(cmd);
        }
        history
    }

    #[test]
    fn test_duplicates_are_not_reinserted() {
        let history = history_with(&["foo", "bar", "foo"]);
        let stored: Vec<_> = history.slots().filter(|s| !s.is_empty()).collect();
        assert_eq!(stored, vec!["foo", "bar"]);
        assert_eq!(history.slots().count(), 10);
    }

    #[test]
    fn test_recall_sequence() {
        let mut history = history_with(&["a", "b", "c"]);
        assert_eq!(history.older(), "c");
        assert_eq!(history.older(), "b");
        assert_eq!(history.older(), "a");
        assert_eq!(history.older(), "a");
        assert_eq!(history.newer(), "b");
        assert_eq!(history.newer(), "c");
        assert_eq!(history.newer(), "");
        assert_eq!(history.newer(), "");
    }

    #[test]
    fn test_recall_on_empty_history() {
        let mut history = HistoryStore::new(5);
        assert_eq!(history.older(), "");
        assert_eq!(history.newer(), "");
        assert!(history.is_empty());
    }

    #[test]
    fn test_commit_resets_cursor() {
        let mut history = history_with(&["a", "b"]);
        assert_eq!(history.older(), "b");
        assert_eq!(history.older(), "a");
        history.commit("c");
        assert_eq!(history.older(), "c");
    }

    #[test]
    fn test_oldest_entries_are_evicted() {
        let mut history = HistoryStore::new(3);
        for cmd in ["one", "two", "three", "four"] {
            history.commit(cmd);
        }
        let stored: Vec<_> = history.slots().collect();
        assert_eq!(stored, vec!["two", "three", "four"]);
        assert_eq!(history.older(), "four");
        assert_eq!(history.older(), "three");
        assert_eq!(history.older(), "two");
        assert_eq!(history.older(), "two");
    }

    #[test]
    fn test_search_and_recent() {
        let history = history_with(&["git status", "ls", "git log"]);
        assert_eq!(history.search("GIT"), vec!["git log", "git status"]);
        assert_eq!(history.recent(2), vec!["git log", "ls"]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_zero_capacity_is_inert() {
        let mut history = HistoryStore::new(0);
        history.commit("x");
        assert_eq!(history.older(), "");
        assert_eq!(history.newer(), "");
    }
}
