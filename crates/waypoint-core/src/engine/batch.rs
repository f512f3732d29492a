//! Command batch execution.

use std::collections::HashSet;

use log::{debug, info};

use super::{not_found, Engine, Origin, TripSlot, TripState, AI_MODEL_DOCUMENT};
use crate::{
    command::{
        format, format_with, parse_batch, validate_identifier, Command, CommandError,
        FormatContext,
    },
    display::HelpText,
    error::{EngineError, Result},
    journal::{parse_persisted, JournalEntry},
    models::{BatchOutcome, Effect, Value},
    timeline::Transition,
};

/// Attempts before giving up on an id generator that keeps colliding.
const MAX_ID_ATTEMPTS: usize = 1000;

/// Messages and effects collected while a batch runs.
#[derive(Default)]
struct BatchRun {
    executed: usize,
    messages: Vec<String>,
    effects: Vec<Effect>,
}

impl BatchRun {
    fn finish(self, trip: &str, state: &mut TripState) -> BatchOutcome {
        BatchOutcome {
            trip: trip.to_string(),
            executed: self.executed,
            model: state.model().clone(),
            messages: self.messages,
            effects: self.effects,
            head: state.timeline.head(),
            total: state.timeline.total(),
            journal_len: state.timeline.journal_len(),
            marked: state.marked.iter().cloned().collect(),
        }
    }
}

impl Engine {
    /// Applies a human-submitted batch of command lines to `trip`.
    ///
    /// The whole text is parsed and validated first; a Command Error rejects
    /// the batch before anything runs. Commands then execute in order. If
    /// one fails at runtime the batch stops there and the error is returned;
    /// commands before it stay committed.
    pub async fn apply_batch(&self, trip: &str, text: &str) -> Result<BatchOutcome> {
        self.apply_batch_as(trip, text, Origin::Human).await
    }

    /// Applies a batch on behalf of `origin`.
    pub async fn apply_batch_as(
        &self,
        trip: &str,
        text: &str,
        origin: Origin,
    ) -> Result<BatchOutcome> {
        validate_identifier("trip", trip)?;
        let commands = parse_batch(text)?;
        check_batch(trip, &commands, origin)?;

        let mut slot = self.inner.trips.acquire(trip).await;
        let result = self.run_batch(trip, &mut slot, commands).await;
        let missing = slot.state.is_none();
        self.inner.trips.release(trip, slot, missing);
        result
    }

    async fn run_batch(
        &self,
        trip: &str,
        slot: &mut TripSlot,
        commands: Vec<Command>,
    ) -> Result<BatchOutcome> {
        self.ensure_loaded(trip, slot).await?;
        if slot.state.is_none() && !matches!(commands.first(), Some(Command::CreateTrip { .. })) {
            return Err(not_found(trip));
        }

        let mut run = BatchRun::default();
        for command in commands {
            self.execute(trip, slot, command, &mut run).await?;
            run.executed += 1;
        }
        let state = slot.state.as_mut().ok_or_else(|| not_found(trip))?;
        Ok(run.finish(trip, state))
    }

    async fn execute(
        &self,
        trip: &str,
        slot: &mut TripSlot,
        command: Command,
        run: &mut BatchRun,
    ) -> Result<()> {
        debug!("trip '{trip}': /{}", command.keyword());
        if slot.state.is_none() {
            return match command {
                Command::CreateTrip { .. } => self.create_trip(trip, slot, &command, run).await,
                _ => Err(not_found(trip)),
            };
        }
        let state = slot.state.as_mut().ok_or_else(|| not_found(trip))?;

        match command {
            Command::CreateTrip { .. } => {
                return Err(EngineError::TripAlreadyExists {
                    trip: trip.to_string(),
                });
            }
            Command::AddItem { .. }
            | Command::EditItem { .. }
            | Command::DeleteItem { .. }
            | Command::MoveRange { .. }
            | Command::InsertGap { .. }
            | Command::RemoveRange { .. }
            | Command::AddCountry { .. }
            | Command::RefreshCountries
            | Command::SetPreference { .. } => {
                self.record(trip, state, &command, run).await?;
                state.prune_marks();
            }
            Command::Undo { .. } | Command::Redo { .. } => {
                self.move_head(trip, state, &command, run).await?;
                state.prune_marks();
            }
            Command::Mark { ids } => {
                ensure_items(trip, state, &ids)?;
                run.messages.push(format!("Marked {}.", ids.join(", ")));
                state.marked.extend(ids);
            }
            Command::Unmark { ids } => {
                for id in &ids {
                    state.marked.remove(id);
                }
                run.messages.push(format!("Unmarked {}.", ids.join(", ")));
            }
            Command::DeclareIntent { text } => run.messages.push(format!("Intent: {text}")),
            Command::SwitchTrip { trip: target } => {
                self.set_current_trip(&target).await?;
                run.messages.push(format!("Switched to trip '{target}'."));
                run.effects.push(Effect::SwitchTrip { trip: target });
            }
            Command::SwitchAiModel { name } => {
                let (owned, document) = (trip.to_string(), name.clone());
                self.blocking(move |journal| {
                    journal.write_document(&owned, AI_MODEL_DOCUMENT, &document)
                })
                .await?;
                run.messages.push(format!("AI model set to '{name}'."));
                run.effects.push(Effect::SwitchAiModel { name });
            }
            Command::WebSearch { query } => {
                run.messages.push(format!("Search requested: {query}"));
                run.effects.push(Effect::WebSearch { query });
            }
            Command::Help { topic } => {
                run.messages.push(HelpText::new(topic.as_deref()).to_string());
            }
            Command::Renormalize => {
                let report = self.renormalize_all().await?;
                run.messages.push(format!(
                    "Renormalized {} trip(s); {} line(s) skipped.",
                    report.trips.len(),
                    report.skipped()
                ));
                run.effects.push(Effect::Renormalized {
                    trips: report.trips.len(),
                    skipped: report.skipped(),
                });
            }
        }
        Ok(())
    }

    async fn create_trip(
        &self,
        trip: &str,
        slot: &mut TripSlot,
        command: &Command,
        run: &mut BatchRun,
    ) -> Result<()> {
        let line = format(command);
        let entry = JournalEntry {
            sequence: 1,
            command: canonical(trip, 1, &line)?,
        };
        let (owned, text) = (trip.to_string(), line);
        self.blocking(move |journal| journal.create(&owned, &text)).await?;

        let mut state = TripState::default();
        let transition = state.timeline.plan(&entry.command);
        state.timeline.commit(transition, entry);
        slot.state = Some(state);
        info!("created trip '{trip}'");
        run.messages.push(format!("Created trip '{trip}'."));
        Ok(())
    }

    /// Persists a journalable command, then commits it to the timeline.
    async fn record(
        &self,
        trip: &str,
        state: &mut TripState,
        command: &Command,
        run: &mut BatchRun,
    ) -> Result<()> {
        let context = self.format_context(trip, state, command)?;
        let line = format_with(command, &context);
        let sequence = state.timeline.next_sequence();
        let command = canonical(trip, state.timeline.journal_len() + 1, &line)?;
        let transition = state.timeline.plan(&command);

        self.append(trip, &line).await?;

        if let Transition::Append { discards } = transition {
            if discards > 0 {
                run.messages.push(format!("Discarded {discards} undone command(s)."));
            }
        }
        run.messages.push(match &command {
            Command::AddItem { id: Some(id), fields } => format!(
                "Added item {id}: {}",
                fields.get("name").map(Value::to_text).unwrap_or_default()
            ),
            _ => line,
        });
        state.timeline.commit(
            transition,
            JournalEntry {
                sequence,
                command: command.clone(),
            },
        );
        state.cache.advance(&state.timeline, transition, &command);
        Ok(())
    }

    /// Undo and redo: move head, journaling a marker with the effective count.
    async fn move_head(
        &self,
        trip: &str,
        state: &mut TripState,
        command: &Command,
        run: &mut BatchRun,
    ) -> Result<()> {
        let undo = matches!(command, Command::Undo { .. });
        let Transition::Move { from, to } = state.timeline.plan(command) else {
            run.messages.push(
                if undo { "Nothing to undo." } else { "Nothing to redo." }.to_string(),
            );
            return Ok(());
        };
        let (marker, verb) = if undo {
            (Command::Undo { count: from - to }, "Undid")
        } else {
            (Command::Redo { count: to - from }, "Redid")
        };
        let line = format(&marker);
        let moved: Vec<String> = state
            .timeline
            .span(from.min(to), from.max(to))
            .map(format)
            .collect();

        self.append(trip, &line).await?;

        let entry = JournalEntry {
            sequence: state.timeline.next_sequence(),
            command: marker,
        };
        let transition = Transition::Move { from, to };
        state.timeline.commit(transition, entry.clone());
        state.cache.advance(&state.timeline, transition, &entry.command);
        run.messages.push(format!(
            "{verb} {} command{}: {}",
            moved.len(),
            if moved.len() == 1 { "" } else { "s" },
            moved.join("; ")
        ));
        Ok(())
    }

    /// Fills in what the canonical line needs beyond the command itself,
    /// verifying referenced items exist.
    fn format_context(
        &self,
        trip: &str,
        state: &mut TripState,
        command: &Command,
    ) -> Result<FormatContext> {
        match command {
            Command::AddItem { id: Some(id), .. } => {
                if state.timeline.item_ids().any(|used| used == id) {
                    return Err(EngineError::ItemAlreadyExists {
                        trip: trip.to_string(),
                        id: id.clone(),
                    });
                }
                Ok(FormatContext::default())
            }
            Command::AddItem { id: None, .. } => {
                let used: HashSet<&str> = state.timeline.item_ids().collect();
                let id = (0..MAX_ID_ATTEMPTS)
                    .map(|_| self.inner.ids.next())
                    .find(|id| !used.contains(id.as_str()))
                    .ok_or_else(|| EngineError::Configuration {
                        message: "id generator produced no unused id".to_string(),
                    })?;
                validate_identifier("id", &id)?;
                Ok(FormatContext::with_item_id(id))
            }
            Command::EditItem { id, .. } => {
                ensure_items(trip, state, std::slice::from_ref(id))?;
                Ok(FormatContext::default())
            }
            Command::DeleteItem { id, .. } => {
                let item = state
                    .model()
                    .item(id)
                    .ok_or_else(|| item_not_found(trip, id))?;
                Ok(FormatContext::with_snapshot(item.fields.clone()))
            }
            _ => Ok(FormatContext::default()),
        }
    }

    async fn append(&self, trip: &str, line: &str) -> Result<()> {
        let (owned, text) = (trip.to_string(), line.to_string());
        self.blocking(move |journal| journal.append(&owned, &text)).await?;
        debug!("trip '{trip}': appended {line}");
        Ok(())
    }
}

/// Batch-level rules that do not depend on trip state.
fn check_batch(trip: &str, commands: &[Command], origin: Origin) -> Result<()> {
    for (index, command) in commands.iter().enumerate() {
        if origin == Origin::Assistant && command.is_human_only() {
            return Err(EngineError::Forbidden {
                keyword: command.keyword().to_string(),
            });
        }
        let reason = match command {
            Command::CreateTrip { trip: target, .. } if target != trip => {
                format!("/create-trip {target} was sent for trip '{trip}'")
            }
            Command::CreateTrip { .. } if index > 0 => {
                "/create-trip must be the first command of a batch".to_string()
            }
            Command::SwitchTrip { .. } if index + 1 < commands.len() => {
                "/switch-trip must be the last command of a batch".to_string()
            }
            _ => continue,
        };
        return Err(CommandError::InvalidBatch { reason }.into());
    }
    Ok(())
}

/// Re-parses a canonical line so the in-memory entry is exactly what a
/// later replay will read.
fn canonical(trip: &str, line_number: usize, line: &str) -> Result<Command> {
    parse_persisted(line).map_err(|reason| EngineError::replay(trip, line_number, reason))
}

fn ensure_items(trip: &str, state: &mut TripState, ids: &[String]) -> Result<()> {
    let model = state.model();
    match ids.iter().find(|id| !model.contains_item(id)) {
        Some(id) => Err(item_not_found(trip, id)),
        None => Ok(()),
    }
}

fn item_not_found(trip: &str, id: &str) -> EngineError {
    EngineError::ItemNotFound {
        trip: trip.to_string(),
        id: id.to_string(),
    }
}
