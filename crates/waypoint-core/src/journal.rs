//! Journal store: the append-only, canonical command log of each trip.
//!
//! A journal is a text document of `\n`-terminated canonical command lines
//! stored under `trips/<trip>/journal`. It is the only source of truth for a
//! trip; every model is a replay of it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    command::{self, Command},
    error::{EngineError, Result, StorageResultExt},
    storage::Storage,
};

const TRIPS_PREFIX: &str = "trips/";
const JOURNAL_SUFFIX: &str = "/journal";

/// One persisted line of a trip's journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// 1-based position in the journal; never reused
    pub sequence: u64,
    pub command: Command,
}

impl JournalEntry {
    /// The canonical line this entry is stored as.
    pub fn line(&self) -> String {
        command::format(&self.command)
    }
}

/// Storage key of a trip's journal.
pub fn journal_key(trip: &str) -> String {
    format!("{TRIPS_PREFIX}{trip}{JOURNAL_SUFFIX}")
}

/// Storage key of an ancillary per-trip document.
pub fn trip_key(trip: &str, name: &str) -> String {
    format!("{TRIPS_PREFIX}{trip}/{name}")
}

/// Reads and appends journals through a [`Storage`] backend.
///
/// All methods block; async callers go through `spawn_blocking`.
#[derive(Clone)]
pub struct JournalStore {
    storage: Arc<dyn Storage>,
}

impl JournalStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// True if the trip has a journal.
    pub fn exists(&self, trip: &str) -> Result<bool> {
        self.storage
            .exists(&journal_key(trip))
            .storage_context("Failed to check journal")
    }

    /// Raw journal lines, or `None` if the trip has no journal.
    pub fn read_lines(&self, trip: &str) -> Result<Option<Vec<String>>> {
        let text = self
            .storage
            .read(&journal_key(trip))
            .storage_context("Failed to read journal")?;
        Ok(text.map(|text| {
            text.lines()
                .filter(|line| !line.trim().is_empty())
                .map(String::from)
                .collect()
        }))
    }

    /// Parses the whole journal. Any unparsable line is a fatal
    /// [`EngineError::Replay`] for this trip.
    pub fn load(&self, trip: &str) -> Result<Option<Vec<JournalEntry>>> {
        let Some(lines) = self.read_lines(trip)? else {
            return Ok(None);
        };
        let mut entries = Vec::with_capacity(lines.len());
        for (index, line) in lines.iter().enumerate() {
            let command = parse_persisted(line).map_err(|reason| {
                EngineError::replay(trip, index + 1, reason)
            })?;
            entries.push(JournalEntry {
                sequence: index as u64 + 1,
                command,
            });
        }
        Ok(Some(entries))
    }

    /// Creates the journal with its first line. Fails if it already exists.
    pub fn create(&self, trip: &str, line: &str) -> Result<()> {
        if self.exists(trip)? {
            return Err(EngineError::TripAlreadyExists {
                trip: trip.to_string(),
            });
        }
        self.storage
            .write(&journal_key(trip), &format!("{line}\n"))
            .storage_context("Failed to create journal")
    }

    /// Appends one canonical line.
    pub fn append(&self, trip: &str, line: &str) -> Result<()> {
        self.storage
            .append(&journal_key(trip), &format!("{line}\n"))
            .storage_context("Failed to append to journal")
    }

    /// Reads an ancillary per-trip document.
    pub fn read_document(&self, trip: &str, name: &str) -> Result<Option<String>> {
        self.storage
            .read(&trip_key(trip, name))
            .storage_context("Failed to read trip document")
    }

    /// Replaces an ancillary per-trip document.
    pub fn write_document(&self, trip: &str, name: &str, text: &str) -> Result<()> {
        self.storage
            .write(&trip_key(trip, name), text)
            .storage_context("Failed to write trip document")
    }

    /// Ids of every trip that has a journal.
    pub fn trips(&self) -> Result<Vec<String>> {
        let keys = self
            .storage
            .keys(TRIPS_PREFIX)
            .storage_context("Failed to list trips")?;
        Ok(keys
            .iter()
            .filter_map(|key| {
                key.strip_prefix(TRIPS_PREFIX)?
                    .strip_suffix(JOURNAL_SUFFIX)
                    .filter(|trip| !trip.contains('/'))
                    .map(String::from)
            })
            .collect())
    }
}

/// Parses a journal line, additionally rejecting commands that cannot have
/// been written by the engine.
pub(crate) fn parse_persisted(line: &str) -> std::result::Result<Command, String> {
    let command = command::parse_line(line).map_err(|e| e.to_string())?;
    match &command {
        Command::AddItem { id: None, .. } => Err("/add without an item id".to_string()),
        c if c.is_journalable() || c.is_timeline_marker() => Ok(command),
        c => Err(format!("/{} is not a journal command", c.keyword())),
    }
}
