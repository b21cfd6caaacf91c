//! Browsable submission history for [`TextInput`](crate::text_input::TextInput).

use std::collections::VecDeque;

/// Previously submitted inputs, browsed newest-first like a shell.
///
/// When browsing starts, the unsent input is kept as a draft and comes back
/// once the user steps past the newest entry.
///
/// ```
/// use steep_widgets::history::History;
///
/// let mut history = History::new(10);
/// history.push("first");
/// history.push("second");
///
/// assert_eq!(history.older("draft"), Some("second"));
/// assert_eq!(history.older(""), Some("first"));
/// assert_eq!(history.older(""), None);
/// assert_eq!(history.newer(), Some("second"));
/// assert_eq!(history.newer(), Some("draft"));
/// assert_eq!(history.newer(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<String>,
    /// `None` while not browsing.
    index: Option<usize>,
    draft: String,
    capacity: usize,
}

impl History {
    /// Keep at most `capacity` entries, dropping the oldest.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Record a submission. Empty strings and repeats of the newest entry
    /// are skipped. Always ends browsing.
    pub fn push(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        self.index = None;
        self.draft.clear();
        if entry.is_empty() || self.entries.back() == Some(&entry) || self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Step to the previous entry, saving `current` as the draft on the
    /// first step. `None` at the oldest entry.
    pub fn older(&mut self, current: &str) -> Option<&str> {
        let idx = match self.index {
            _ if self.entries.is_empty() => return None,
            None => {
                self.draft = current.to_string();
                self.entries.len() - 1
            }
            Some(0) => return None,
            Some(i) => i - 1,
        };
        self.index = Some(idx);
        Some(&self.entries[idx])
    }

    /// Step to the next entry, or back to the draft after the newest.
    /// `None` when not browsing.
    pub fn newer(&mut self) -> Option<&str> {
        let i = self.index?;
        if i + 1 < self.entries.len() {
            self.index = Some(i + 1);
            Some(&self.entries[i + 1])
        } else {
            self.index = None;
            Some(&self.draft)
        }
    }

    /// Whether an entry (rather than the draft) is being viewed.
    pub fn is_browsing(&self) -> bool {
        self.index.is_some()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &VecDeque<String> {
        &self.entries
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_empty_and_repeated() {
        let mut h = History::new(5);
        h.push("");
        h.push("a");
        h.push("a");
        h.push("b");
        h.push("a");
        assert_eq!(h.entries(), &["a", "b", "a"]);
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut h = History::new(2);
        h.push("1");
        h.push("2");
        h.push("3");
        assert_eq!(h.entries(), &["2", "3"]);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn full_history_keeps_browsing_order() {
        let mut h = History::new(3);
        for entry in ["1", "2", "3", "4", "5"] {
            h.push(entry);
        }
        assert_eq!(h.entries(), &["3", "4", "5"]);
        assert_eq!(h.older(""), Some("5"));
        assert_eq!(h.older(""), Some("4"));
        assert_eq!(h.older(""), Some("3"));
        assert_eq!(h.older(""), None);
    }

    #[test]
    fn zero_capacity_stores_nothing() {
        let mut h = History::new(0);
        h.push("x");
        assert!(h.is_empty());
        assert_eq!(h.older(""), None);
    }

    #[test]
    fn push_ends_browsing() {
        let mut h = History::new(5);
        h.push("a");
        h.older("draft");
        assert!(h.is_browsing());
        h.push("b");
        assert!(!h.is_browsing());
        assert_eq!(h.newer(), None);
        assert_eq!(h.older(""), Some("b"));
    }
}
