//! Bounded, human-readable game log.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::constants::{JOURNAL_CAPACITY, JOURNAL_EMPTY_LINE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for GameLog {
    fn default() -> Self {
        Self::with_capacity(JOURNAL_CAPACITY)
    }
}

impl GameLog {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(JOURNAL_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    /// Append a line, evicting the oldest once full.
    pub fn push(&mut self, line: impl Into<String>) {
        self.entries.push_back(line.into());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// The last `count` lines, oldest first. Empty logs yield an opening line.
    #[must_use]
    pub fn recent(&self, count: usize) -> Vec<String> {
        if self.entries.is_empty() {
            return vec![JOURNAL_EMPTY_LINE.to_string()];
        }
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).cloned().collect()
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the contents, keeping only the newest `capacity` lines.
    pub(crate) fn replace(&mut self, lines: Vec<String>) {
        self.entries.clear();
        for line in lines {
            self.push(line);
        }
    }
}
