//! Memoized trip model.
//!
//! A [`ModelCache`] belongs to exactly one trip and is only touched while
//! that trip's single-flight lock is held. It remembers the model for one
//! timeline revision. Appends extend it with one reducer step; any other
//! head movement drops it, and the next read replays the timeline.

use log::debug;

use crate::{
    command::Command,
    models::TripModel,
    reducer,
    timeline::{TimelineState, Transition},
};

#[derive(Debug, Clone)]
struct Snapshot {
    revision: u64,
    model: TripModel,
}

/// Per-trip model snapshot keyed on the timeline revision.
#[derive(Debug, Clone, Default)]
pub struct ModelCache {
    snapshot: Option<Snapshot>,
    rebuilds: u64,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The model at the timeline's head, replaying if the snapshot is stale.
    pub fn model(&mut self, timeline: &TimelineState) -> &TripModel {
        let revision = timeline.revision();
        if self
            .snapshot
            .as_ref()
            .is_some_and(|snapshot| snapshot.revision != revision)
        {
            self.snapshot = None;
        }
        if self.snapshot.is_none() {
            debug!("replaying {} entries", timeline.head());
            self.rebuilds += 1;
        }
        let snapshot = self.snapshot.get_or_insert_with(|| Snapshot {
            revision,
            model: reducer::replay(timeline.applied()),
        });
        &snapshot.model
    }

    /// Brings the snapshot up to date after `timeline` committed
    /// `transition` for `command`.
    ///
    /// An append onto a fresh snapshot is applied incrementally; undo and
    /// redo invalidate.
    pub fn advance(&mut self, timeline: &TimelineState, transition: Transition, command: &Command) {
        let Some(snapshot) = self.snapshot.take() else {
            return;
        };
        if let Transition::Append { .. } = transition {
            if snapshot.revision + 1 == timeline.revision() {
                self.snapshot = Some(Snapshot {
                    revision: timeline.revision(),
                    model: reducer::apply(snapshot.model, command),
                });
            }
        }
    }

    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    /// Number of full replays performed so far.
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{command::parse_line, journal::JournalEntry};

    fn commit(timeline: &mut TimelineState, cache: &mut ModelCache, line: &str) {
        let command = parse_line(line).unwrap();
        let transition = timeline.plan(&command);
        let entry = JournalEntry {
            sequence: timeline.next_sequence(),
            command: command.clone(),
        };
        timeline.commit(transition, entry);
        cache.advance(timeline, transition, &command);
    }

    #[test]
    fn appends_are_applied_incrementally() {
        let mut timeline = TimelineState::new();
        let mut cache = ModelCache::new();
        commit(&mut timeline, &mut cache, "/create-trip t name=Trip");
        assert_eq!(cache.model(&timeline).name, "Trip");
        assert_eq!(cache.rebuilds(), 1);

        commit(&mut timeline, &mut cache, r#"/add id=1 name="A""#);
        commit(&mut timeline, &mut cache, r#"/add id=2 name="B""#);
        assert_eq!(cache.model(&timeline).items.len(), 2);
        assert_eq!(cache.rebuilds(), 1);
    }

    #[test]
    fn undo_forces_a_replay() {
        let mut timeline = TimelineState::new();
        let mut cache = ModelCache::new();
        commit(&mut timeline, &mut cache, r#"/add id=1 name="A""#);
        commit(&mut timeline, &mut cache, r#"/add id=2 name="B""#);
        assert_eq!(cache.model(&timeline).items.len(), 2);

        commit(&mut timeline, &mut cache, "/undo");
        assert_eq!(cache.model(&timeline).items.len(), 1);
        assert_eq!(cache.rebuilds(), 2);
    }

    #[test]
    fn incremental_model_matches_full_replay() {
        let mut timeline = TimelineState::new();
        let mut cache = ModelCache::new();
        commit(&mut timeline, &mut cache, "/create-trip t");
        cache.model(&timeline);
        for line in [
            r#"/add id=1 name="A" date=2025-03-01"#,
            r#"/edit 1 notes="window seat""#,
            "/insert-gap 2025-02-01",
            "/refresh-countries",
        ] {
            commit(&mut timeline, &mut cache, line);
        }
        let incremental = cache.model(&timeline).clone();
        cache.invalidate();
        assert_eq!(cache.model(&timeline), &incremental);
    }
}
