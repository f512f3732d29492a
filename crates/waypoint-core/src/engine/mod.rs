//! The engine: one façade over grammar, journal, timeline, cache and
//! serializer.
//!
//! ```text
//! text ──parse──▶ Command ──plan──▶ Transition
//!                                      │
//!                      format + append ▼ (blocking pool)
//!                                   Journal
//!                                      │ ok
//!                           commit ◀───┘
//!                 Timeline ──────▶ ModelCache ──▶ BatchOutcome
//! ```
//!
//! Every batch for a trip runs while holding that trip's single-flight lock,
//! which also owns the trip's in-memory [`TimelineState`] and
//! [`ModelCache`]. Different trips run concurrently.
//!
//! # Examples
//!
//! ```rust
//! use waypoint_core::{EngineBuilder, SequentialIds};
//!
//! # async fn example() -> waypoint_core::Result<()> {
//! let engine = EngineBuilder::new()
//!     .with_memory_storage()
//!     .with_id_generator(SequentialIds::new())
//!     .build()
//!     .await?;
//!
//! engine
//!     .apply_batch("rome", "/create-trip rome name=\"Rome\"\n/add name=Colosseum")
//!     .await?;
//! let model = engine.current_model("rome").await?;
//! assert_eq!(model.items[0].id, "1");
//! # Ok(())
//! # }
//! ```

use std::{collections::BTreeSet, sync::Arc};

use log::debug;
use tokio::task;

use crate::{
    assistant::Assistant,
    cache::ModelCache,
    command::validate_identifier,
    error::{join_error, EngineError, Result, StorageResultExt},
    ids::IdGenerator,
    journal::{JournalEntry, JournalStore},
    models::{JournalLog, LoggedEntry, TripModel},
    serializer::{TaskRegistry, TaskSerializer},
    storage::Storage,
    timeline::TimelineState,
};

mod batch;
pub mod builder;
mod maintenance;
mod tasks;

#[cfg(test)]
mod tests;

pub use builder::EngineBuilder;

const CURRENT_TRIP_KEY: &str = "session/current-trip";
const AI_MODEL_DOCUMENT: &str = "ai-model";

/// Who submitted a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Origin {
    #[default]
    Human,
    Assistant,
}

/// In-memory state of one trip, owned by its single-flight lock.
#[derive(Debug, Default)]
struct TripSlot {
    state: Option<TripState>,
}

#[derive(Debug, Default)]
struct TripState {
    timeline: TimelineState,
    cache: ModelCache,
    /// Ephemeral marks; never journaled
    marked: BTreeSet<String>,
}

impl TripState {
    fn new(timeline: TimelineState) -> Self {
        Self {
            timeline,
            ..Self::default()
        }
    }

    fn model(&mut self) -> &TripModel {
        self.cache.model(&self.timeline)
    }

    /// Drops marks whose item left the model.
    fn prune_marks(&mut self) {
        if self.marked.is_empty() {
            return;
        }
        let model = self.cache.model(&self.timeline);
        self.marked.retain(|id| model.contains_item(id));
    }
}

struct Inner {
    journal: JournalStore,
    ids: Arc<dyn IdGenerator>,
    trips: TaskSerializer<TripSlot>,
    tasks: TaskRegistry,
    assistant: Option<Arc<dyn Assistant>>,
    max_ai_steps: usize,
}

/// Command journal and timeline engine. Cheap to clone.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl Engine {
    pub(crate) fn new(
        storage: Arc<dyn Storage>,
        ids: Arc<dyn IdGenerator>,
        assistant: Option<Arc<dyn Assistant>>,
        max_ai_steps: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                journal: JournalStore::new(storage),
                ids,
                trips: TaskSerializer::new(),
                tasks: TaskRegistry::new(),
                assistant,
                max_ai_steps,
            }),
        }
    }

    /// The storage collaborator behind this engine.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        self.inner.journal.storage()
    }

    /// Runs a journal operation on the blocking thread pool.
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&JournalStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let journal = self.inner.journal.clone();
        task::spawn_blocking(move || f(&journal))
            .await
            .map_err(join_error)?
    }

    /// Loads the trip's journal into `slot` unless already loaded.
    async fn ensure_loaded(&self, trip: &str, slot: &mut TripSlot) -> Result<()> {
        if slot.state.is_some() {
            return Ok(());
        }
        let owned = trip.to_string();
        if let Some(entries) = self.blocking(move |journal| journal.load(&owned)).await? {
            debug!("loaded {} journal lines for trip '{trip}'", entries.len());
            slot.state = Some(TripState::new(TimelineState::from_entries(entries)));
        }
        Ok(())
    }

    /// Acquires the trip and runs `f` on its loaded state.
    async fn with_trip<T>(
        &self,
        trip: &str,
        f: impl FnOnce(&mut TripState) -> T,
    ) -> Result<T> {
        validate_identifier("trip", trip)?;
        let mut slot = self.inner.trips.acquire(trip).await;
        let result = self
            .ensure_loaded(trip, &mut slot)
            .await
            .and_then(|()| slot.state.as_mut().map(f).ok_or_else(|| not_found(trip)));
        let missing = slot.state.is_none();
        self.inner.trips.release(trip, slot, missing);
        result
    }

    /// The model at the trip's current head.
    pub async fn current_model(&self, trip: &str) -> Result<TripModel> {
        self.with_trip(trip, |state| state.model().clone()).await
    }

    /// Every journal line of the trip, in order.
    pub async fn journal_entries(&self, trip: &str) -> Result<Vec<JournalEntry>> {
        self.with_trip(trip, |state| state.timeline.entries().to_vec()).await
    }

    /// The journal annotated with each line's timeline state.
    pub async fn journal_log(&self, trip: &str) -> Result<JournalLog> {
        self.with_trip(trip, |state| {
            let timeline = &state.timeline;
            let entries = timeline
                .entries()
                .iter()
                .zip(timeline.entry_states())
                .map(|(entry, state)| LoggedEntry {
                    sequence: entry.sequence,
                    line: entry.line(),
                    state,
                })
                .collect();
            JournalLog {
                trip: trip.to_string(),
                head: timeline.head(),
                total: timeline.total(),
                entries,
            }
        })
        .await
    }

    /// Ids of every trip with a journal.
    pub async fn list_trips(&self) -> Result<Vec<String>> {
        self.blocking(|journal| journal.trips()).await
    }

    /// The trip selected by the last `/switch-trip`, if any.
    pub async fn current_trip(&self) -> Result<Option<String>> {
        self.blocking(|journal| {
            Ok(journal
                .storage()
                .read(CURRENT_TRIP_KEY)
                .storage_context("Failed to read current trip")?
                .map(|trip| trip.trim().to_string())
                .filter(|trip| !trip.is_empty()))
        })
        .await
    }

    /// Selects the current trip. The trip must exist.
    pub async fn set_current_trip(&self, trip: &str) -> Result<()> {
        let owned = trip.to_string();
        self.blocking(move |journal| {
            if !journal.exists(&owned)? {
                return Err(not_found(&owned));
            }
            journal
                .storage()
                .write(CURRENT_TRIP_KEY, &owned)
                .storage_context("Failed to write current trip")
        })
        .await
    }

    /// The AI model selected for the trip with `/model`.
    pub async fn ai_model(&self, trip: &str) -> Result<Option<String>> {
        let owned = trip.to_string();
        self.blocking(move |journal| journal.read_document(&owned, AI_MODEL_DOCUMENT))
            .await
    }
}

fn not_found(trip: &str) -> EngineError {
    EngineError::TripNotFound {
        trip: trip.to_string(),
    }
}
