//! Results returned by engine operations.

use serde::{Deserialize, Serialize};

use super::TripModel;
use crate::timeline::EntryState;

/// Outcome of one command batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub trip: String,
    /// Commands processed, including no-op undo/redo and session commands
    pub executed: usize,
    /// The model after the batch
    pub model: TripModel,
    /// Informational messages, one or more per command
    pub messages: Vec<String>,
    /// Work the caller is expected to act on
    pub effects: Vec<Effect>,
    pub head: usize,
    pub total: usize,
    /// Journal lines, including undo/redo markers
    pub journal_len: usize,
    /// Ids marked in this session
    pub marked: Vec<String>,
}

/// Session-level consequence of a command that the engine does not carry
/// out by itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "kebab-case")]
pub enum Effect {
    /// The caller's current trip is now `trip`.
    SwitchTrip { trip: String },
    /// AI requests for this trip use model `name`.
    SwitchAiModel { name: String },
    /// The assistant asked for a web search.
    WebSearch { query: String },
    /// Every journal was rewritten to its parallel canonical file.
    Renormalized { trips: usize, skipped: usize },
}

/// A trip's journal annotated with the timeline position of every line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLog {
    pub trip: String,
    pub head: usize,
    pub total: usize,
    pub entries: Vec<LoggedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEntry {
    pub sequence: u64,
    pub line: String,
    pub state: EntryState,
}

/// Result of rewriting every journal into canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    pub trips: Vec<TripReport>,
}

impl MaintenanceReport {
    /// Lines skipped across all trips.
    pub fn skipped(&self) -> usize {
        self.trips.iter().map(|trip| trip.skipped.len()).sum()
    }
}

/// Renormalization result for one trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripReport {
    pub trip: String,
    /// Lines read from the live journal
    pub lines: usize,
    /// Lines written to the canonical file
    pub rewritten: usize,
    /// Lines whose canonical form differs from the stored text
    pub changed: usize,
    pub skipped: Vec<SkippedLine>,
}

/// A journal line the maintenance rewrite could not parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    /// 1-based line number
    pub line: usize,
    pub text: String,
    pub reason: String,
}
