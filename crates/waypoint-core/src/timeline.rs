//! Per-trip undo/redo timeline.
//!
//! The timeline keeps every journal entry of a trip plus an ordered list of
//! the reducer-eligible entries on the current branch. `head` says how many
//! of those are applied:
//!
//! ```text
//! entries:  [create, add A, add B, /undo, add C]
//! ordered:  [0, 1, 4]            (add B was discarded by add C)
//! head:     3                    total: 3
//! ```
//!
//! Every change is split in two steps. [`TimelineState::plan`] computes a
//! [`Transition`] without touching anything; the engine persists the journal
//! line, and only then calls [`TimelineState::commit`]. A failed write
//! therefore never leaves a half-updated timeline behind.

use serde::{Deserialize, Serialize};

use crate::{command::Command, journal::JournalEntry};

/// The effect a command would have on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A new journalable entry; `discards` future entries are dropped first.
    Append { discards: usize },
    /// Head moves from `from` to `to` (undo or redo).
    Move { from: usize, to: usize },
    /// Nothing would change; nothing is journaled.
    Unchanged,
}

impl Transition {
    /// True if the transition persists a line.
    pub fn is_journaled(&self) -> bool {
        !matches!(self, Transition::Unchanged)
    }
}

/// How a journal entry relates to the current head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Replayed into the current model
    Applied,
    /// On the current branch but beyond head; reachable by redo
    Undone,
    /// Cut off by branch truncation; unreachable
    Discarded,
    /// An undo/redo marker
    Marker,
}

/// In-memory timeline of one trip.
#[derive(Debug, Clone, Default)]
pub struct TimelineState {
    head: usize,
    total: usize,
    ordered: Vec<usize>,
    entries: Vec<JournalEntry>,
    revision: u64,
}

impl TimelineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the timeline by walking a loaded journal.
    pub fn from_entries(entries: Vec<JournalEntry>) -> Self {
        let mut timeline = Self::new();
        for entry in entries {
            match timeline.plan(&entry.command) {
                // a marker that moves nothing is kept as a line only
                Transition::Unchanged => timeline.entries.push(entry),
                transition => timeline.commit(transition, entry),
            }
        }
        timeline
    }

    /// Number of applied entries.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Number of reducer-eligible entries on the current branch.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of journal lines, including markers and discarded entries.
    pub fn journal_len(&self) -> usize {
        self.entries.len()
    }

    /// Sequence number the next journal line will get.
    pub fn next_sequence(&self) -> u64 {
        self.entries.last().map_or(1, |entry| entry.sequence + 1)
    }

    /// Bumped on every commit; lets caches detect staleness.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Commands replayed into the current model, in order.
    pub fn applied(&self) -> impl Iterator<Item = &Command> + '_ {
        self.ordered[..self.head]
            .iter()
            .map(move |&index| &self.entries[index].command)
    }

    /// Commands at ordered positions `[start, end)`.
    pub fn span(&self, start: usize, end: usize) -> impl Iterator<Item = &Command> + '_ {
        let end = end.min(self.ordered.len());
        let start = start.min(end);
        self.ordered[start..end]
            .iter()
            .map(move |&index| &self.entries[index].command)
    }

    /// Ids of every item ever added, including undone and discarded adds.
    pub fn item_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().filter_map(|entry| match &entry.command {
            Command::AddItem { id: Some(id), .. } => Some(id.as_str()),
            _ => None,
        })
    }

    /// Computes the effect of `command` without applying it.
    pub fn plan(&self, command: &Command) -> Transition {
        match command {
            Command::Undo { count } => {
                let to = self.head.saturating_sub(*count).max(self.floor().min(self.head));
                self.move_to(to)
            }
            Command::Redo { count } => {
                let to = self.head.saturating_add(*count).min(self.total);
                self.move_to(to)
            }
            c if c.is_journalable() => Transition::Append {
                discards: self.total - self.head,
            },
            _ => Transition::Unchanged,
        }
    }

    /// Lowest head undo may reach: a trip's `/create-trip` is never undone.
    fn floor(&self) -> usize {
        match self.ordered.first() {
            Some(&index) if matches!(self.entries[index].command, Command::CreateTrip { .. }) => 1,
            _ => 0,
        }
    }

    fn move_to(&self, to: usize) -> Transition {
        if to == self.head {
            Transition::Unchanged
        } else {
            Transition::Move {
                from: self.head,
                to,
            }
        }
    }

    /// Applies a planned transition, recording `entry` as its journal line.
    pub fn commit(&mut self, transition: Transition, entry: JournalEntry) {
        match transition {
            Transition::Append { .. } => {
                self.ordered.truncate(self.head);
                self.ordered.push(self.entries.len());
                self.entries.push(entry);
                self.total = self.ordered.len();
                self.head = self.total;
            }
            Transition::Move { to, .. } => {
                self.entries.push(entry);
                self.head = to.min(self.total);
            }
            Transition::Unchanged => return,
        }
        self.revision += 1;
    }

    /// State of every entry, parallel to [`Self::entries`].
    pub fn entry_states(&self) -> Vec<EntryState> {
        let mut states: Vec<EntryState> = self
            .entries
            .iter()
            .map(|entry| {
                if entry.command.is_timeline_marker() {
                    EntryState::Marker
                } else {
                    EntryState::Discarded
                }
            })
            .collect();
        for (position, &index) in self.ordered.iter().enumerate() {
            states[index] = if position < self.head {
                EntryState::Applied
            } else {
                EntryState::Undone
            };
        }
        states
    }
}
