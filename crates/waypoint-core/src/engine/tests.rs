//! Tests for the engine module.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use tokio::sync::Notify;

use super::*;
use crate::{
    assistant::{AssistantError, AssistantRequest, BoxFuture},
    command::CommandError,
    ids::SequentialIds,
    models::Effect,
    serializer::{TaskStatus, TaskToken},
    storage::MemoryStorage,
    timeline::EntryState,
};

async fn create_test_engine() -> Engine {
    EngineBuilder::new()
        .with_memory_storage()
        .with_id_generator(SequentialIds::new())
        .build()
        .await
        .expect("Failed to create engine")
}

async fn create_trip(engine: &Engine, trip: &str) {
    engine
        .apply_batch(trip, &format!("/create-trip {trip} name=\"Test trip\""))
        .await
        .expect("Failed to create trip");
}

fn item_names(model: &TripModel) -> Vec<(String, String)> {
    model
        .items
        .iter()
        .map(|item| (item.id.clone(), item.name()))
        .collect()
}

#[tokio::test]
async fn test_undo_after_delete_then_diverge() {
    let engine = create_test_engine().await;
    create_trip(&engine, "rome").await;

    let outcome = engine
        .apply_batch("rome", "/add name=\"A\"\n/add name=\"B\"\n/delete 1")
        .await
        .expect("Failed to apply batch");
    assert_eq!(outcome.executed, 3);
    assert_eq!(item_names(&outcome.model), [("2".into(), "B".into())]);

    let outcome = engine.apply_batch("rome", "/undo").await.expect("undo");
    assert_eq!(
        item_names(&outcome.model),
        [("1".into(), "A".into()), ("2".into(), "B".into())]
    );
    assert!(outcome.messages[0].starts_with("Undid 1 command: /delete id=\"1\""));

    let outcome = engine.apply_batch("rome", "/add name=\"C\"").await.expect("add");
    assert_eq!(outcome.messages[0], "Discarded 1 undone command(s).");
    assert_eq!(outcome.messages[1], "Added item 3: C");

    let outcome = engine.apply_batch("rome", "/redo").await.expect("redo");
    assert_eq!(outcome.executed, 1);
    assert_eq!(outcome.messages, ["Nothing to redo."]);
    assert_eq!(
        item_names(&outcome.model),
        [
            ("1".into(), "A".into()),
            ("2".into(), "B".into()),
            ("3".into(), "C".into())
        ]
    );

    let log = engine.journal_log("rome").await.expect("journal log");
    let states: Vec<EntryState> = log.entries.iter().map(|entry| entry.state).collect();
    assert_eq!(
        states,
        [
            EntryState::Applied,
            EntryState::Applied,
            EntryState::Applied,
            EntryState::Discarded,
            EntryState::Marker,
            EntryState::Applied,
        ]
    );
    assert_eq!((log.head, log.total), (4, 4));
    assert_eq!(outcome.journal_len, 6);
}

#[tokio::test]
async fn test_move_range_single_day() {
    let engine = create_test_engine().await;
    create_trip(&engine, "rome").await;

    let outcome = engine
        .apply_batch(
            "rome",
            "/add name=Forum date=2025-03-01\n\
             /add name=Vatican date=2025-03-02\n\
             /move-range from=2025-03-01 to=2025-03-01 days=1",
        )
        .await
        .expect("Failed to apply batch");

    let dates: Vec<String> = outcome.model.items.iter().map(|item| item.text("date")).collect();
    assert_eq!(dates, ["2025-03-02", "2025-03-02"]);
}

#[tokio::test]
async fn test_undo_redo_inverse() {
    let engine = create_test_engine().await;
    create_trip(&engine, "kyoto").await;
    let applied = engine
        .apply_batch(
            "kyoto",
            "/add name=Fushimi date=2025-04-01\n\
             /edit 1 notes=\"early\"\n\
             /insert-gap 2025-04-01\n\
             /set-preference pace value=slow",
        )
        .await
        .expect("Failed to apply batch")
        .model;

    let undone = engine.apply_batch("kyoto", "/undo 4").await.expect("undo");
    assert!(undone.model.items.is_empty());
    assert_eq!(undone.messages[0].split(": ").next(), Some("Undid 4 commands"));

    let redone = engine.apply_batch("kyoto", "/redo 4").await.expect("redo");
    assert_eq!(redone.model, applied);
}

#[tokio::test]
async fn test_undo_clamps_and_records_effective_count() {
    let engine = create_test_engine().await;
    create_trip(&engine, "oslo").await;
    engine.apply_batch("oslo", "/add name=Fjord").await.expect("add");

    let outcome = engine.apply_batch("oslo", "/undo 10").await.expect("undo");
    assert_eq!(outcome.head, 1);
    let entries = engine.journal_entries("oslo").await.expect("entries");
    assert_eq!(entries.last().map(JournalEntry::line).as_deref(), Some("/undo count=1"));

    let outcome = engine.apply_batch("oslo", "/undo").await.expect("undo");
    assert_eq!(outcome.messages, ["Nothing to undo."]);
    assert_eq!(outcome.journal_len, 3);
}

#[tokio::test]
async fn test_undo_keeps_trip_identity() {
    let engine = create_test_engine().await;
    engine
        .apply_batch("rome", "/create-trip rome name=Roma\n/add name=A")
        .await
        .expect("Failed to create trip");

    let undone = engine.apply_batch("rome", "/undo 5").await.expect("undo");
    assert_eq!((undone.model.id.as_str(), undone.model.name.as_str()), ("rome", "Roma"));

    let outcome = engine.apply_batch("rome", "/add name=B").await.expect("add");
    assert_eq!((outcome.model.id.as_str(), outcome.model.name.as_str()), ("rome", "Roma"));
    assert_eq!(item_names(&outcome.model), [("2".to_string(), "B".to_string())]);
    assert_eq!((outcome.head, outcome.total), (2, 2));

    let reloaded = EngineBuilder::new()
        .with_storage(engine.storage().clone())
        .build()
        .await
        .expect("Failed to reopen engine");
    let model = reloaded.current_model("rome").await.expect("model");
    assert_eq!(model, outcome.model);
}

#[tokio::test]
async fn test_missing_trip() {
    let engine = create_test_engine().await;

    let result = engine.apply_batch("nowhere", "/add name=Nothing").await;
    assert!(matches!(result, Err(EngineError::TripNotFound { trip }) if trip == "nowhere"));
    assert!(matches!(
        engine.current_model("nowhere").await,
        Err(EngineError::TripNotFound { .. })
    ));
    assert!(engine.list_trips().await.expect("list").is_empty());
    // Lookups of missing trips leave no slot behind.
    assert!(engine.inner.trips.keys().is_empty());

    create_trip(&engine, "rome").await;
    assert_eq!(engine.inner.trips.keys(), ["rome"]);
}

#[tokio::test]
async fn test_create_trip_twice() {
    let engine = create_test_engine().await;
    create_trip(&engine, "rome").await;

    let result = engine.apply_batch("rome", "/create-trip rome").await;
    assert!(matches!(result, Err(EngineError::TripAlreadyExists { .. })));
}

#[tokio::test]
async fn test_command_error_rejects_whole_batch() {
    let engine = create_test_engine().await;
    create_trip(&engine, "rome").await;

    let result = engine
        .apply_batch("rome", "/add name=Pantheon\n/edit 1\n/add name=Trevi")
        .await;
    match result {
        Err(EngineError::Command(CommandError::AtLine { line, .. })) => assert_eq!(line, 2),
        other => panic!("expected a command error, got {other:?}"),
    }
    assert!(engine.current_model("rome").await.expect("model").items.is_empty());
}

#[tokio::test]
async fn test_runtime_error_keeps_earlier_commands() {
    let engine = create_test_engine().await;
    create_trip(&engine, "rome").await;

    let result = engine
        .apply_batch("rome", "/add name=Pantheon\n/edit 42 name=Trevi\n/add name=Spagna")
        .await;
    assert!(matches!(result, Err(EngineError::ItemNotFound { id, .. }) if id == "42"));

    let model = engine.current_model("rome").await.expect("model");
    assert_eq!(item_names(&model), [("1".into(), "Pantheon".into())]);
}

#[tokio::test]
async fn test_explicit_ids_are_never_reused() {
    let engine = create_test_engine().await;
    create_trip(&engine, "rome").await;
    engine
        .apply_batch("rome", "/add id=alpha name=First\n/undo")
        .await
        .expect("batch");
    engine.apply_batch("rome", "/add name=Second").await.expect("add");

    let result = engine.apply_batch("rome", "/add id=alpha name=Again").await;
    assert!(matches!(result, Err(EngineError::ItemAlreadyExists { id, .. }) if id == "alpha"));
}

#[tokio::test]
async fn test_generated_ids_skip_used_ids() {
    let engine = create_test_engine().await;
    create_trip(&engine, "rome").await;

    let outcome = engine
        .apply_batch("rome", "/add id=1 name=Manual\n/add name=Generated")
        .await
        .expect("batch");
    assert_eq!(
        item_names(&outcome.model),
        [("1".into(), "Manual".into()), ("2".into(), "Generated".into())]
    );
}

#[tokio::test]
async fn test_batch_rules() {
    let engine = create_test_engine().await;
    create_trip(&engine, "rome").await;
    create_trip(&engine, "paris").await;

    let result = engine.apply_batch("rome", "/switch-trip paris\n/add name=X").await;
    assert!(matches!(
        result,
        Err(EngineError::Command(CommandError::InvalidBatch { .. }))
    ));

    let result = engine.apply_batch("rome", "/create-trip paris").await;
    assert!(matches!(
        result,
        Err(EngineError::Command(CommandError::InvalidBatch { .. }))
    ));

    let result = engine
        .apply_batch_as("rome", "/add name=X\n/renormalize", Origin::Assistant)
        .await;
    assert!(matches!(result, Err(EngineError::Forbidden { keyword }) if keyword == "renormalize"));
    assert!(engine.current_model("rome").await.expect("model").items.is_empty());
}

#[tokio::test]
async fn test_session_commands() {
    let engine = create_test_engine().await;
    create_trip(&engine, "rome").await;
    create_trip(&engine, "paris").await;

    let outcome = engine
        .apply_batch(
            "rome",
            "/add name=Colosseum\n/mark 1\n/intent \"plan day one\"\n/help undo\n/model gpt-large\n/search \"rome rain\"\n/switch-trip paris",
        )
        .await
        .expect("batch");

    assert_eq!(outcome.executed, 7);
    assert_eq!(outcome.marked, ["1"]);
    assert!(outcome.messages.contains(&"Intent: plan day one".to_string()));
    assert!(outcome.messages.contains(&"/undo [count]".to_string()));
    assert_eq!(
        outcome.effects,
        [
            Effect::SwitchAiModel {
                name: "gpt-large".into()
            },
            Effect::WebSearch {
                query: "rome rain".into()
            },
            Effect::SwitchTrip {
                trip: "paris".into()
            },
        ]
    );
    assert_eq!(engine.current_trip().await.expect("current").as_deref(), Some("paris"));
    assert_eq!(engine.ai_model("rome").await.expect("model").as_deref(), Some("gpt-large"));

    // Marks and session commands never reach the journal.
    assert_eq!(outcome.journal_len, 2);

    let outcome = engine.apply_batch("rome", "/unmark 1").await.expect("unmark");
    assert!(outcome.marked.is_empty());

    let result = engine.apply_batch("rome", "/mark 9").await;
    assert!(matches!(result, Err(EngineError::ItemNotFound { .. })));
}

#[tokio::test]
async fn test_marks_follow_the_model() {
    let engine = create_test_engine().await;
    create_trip(&engine, "rome").await;

    let outcome = engine
        .apply_batch("rome", "/add name=A\n/add name=B\n/mark 1,2\n/delete 1")
        .await
        .expect("batch");
    assert_eq!(outcome.marked, ["2"]);

    let outcome = engine.apply_batch("rome", "/undo 2").await.expect("undo");
    assert!(outcome.model.contains_item("1"));
    assert!(outcome.marked.is_empty());
}

#[tokio::test]
async fn test_switch_to_missing_trip() {
    let engine = create_test_engine().await;
    create_trip(&engine, "rome").await;

    let result = engine.apply_batch("rome", "/switch-trip atlantis").await;
    assert!(matches!(result, Err(EngineError::TripNotFound { trip }) if trip == "atlantis"));
    assert_eq!(engine.current_trip().await.expect("current"), None);
}

#[tokio::test]
async fn test_reload_from_storage_matches_live_model() {
    let storage = Arc::new(MemoryStorage::new());
    let engine = EngineBuilder::new()
        .with_storage(storage.clone())
        .with_id_generator(SequentialIds::new())
        .build()
        .await
        .expect("engine");
    create_trip(&engine, "rome").await;
    engine
        .apply_batch("rome", "/add name=A\n/add name=B\n/delete 1\n/undo\n/add-country Italy code=IT")
        .await
        .expect("batch");
    let live = engine.current_model("rome").await.expect("model");

    let restarted = EngineBuilder::new()
        .with_storage(storage)
        .build()
        .await
        .expect("engine");
    assert_eq!(restarted.current_model("rome").await.expect("model"), live);
    assert_eq!(
        restarted.journal_entries("rome").await.expect("entries"),
        engine.journal_entries("rome").await.expect("entries")
    );
}

#[tokio::test]
async fn test_corrupt_journal_is_fatal_for_trip() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .write("trips/rome/journal", "/create-trip trip=\"rome\" name=\"\"\nnot a command\n")
        .expect("write");
    let engine = EngineBuilder::new()
        .with_storage(storage)
        .build()
        .await
        .expect("engine");

    let result = engine.current_model("rome").await;
    assert!(matches!(result, Err(EngineError::Replay { line: 2, .. })));
}

#[tokio::test]
async fn test_renormalize_writes_parallel_documents() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .write(
            "trips/rome/journal",
            "/create-trip rome\n/add id=1 name=Pantheon   type=sight\n/frobnicate\n",
        )
        .expect("write");
    let engine = EngineBuilder::new()
        .with_storage(storage.clone())
        .build()
        .await
        .expect("engine");

    let report = engine.renormalize_all().await.expect("renormalize");
    assert_eq!(report.trips.len(), 1);
    let trip = &report.trips[0];
    assert_eq!((trip.lines, trip.rewritten, trip.changed), (3, 2, 2));
    assert_eq!(trip.skipped[0].line, 3);

    let canonical = storage
        .read("trips/rome/journal.canonical")
        .expect("read")
        .expect("canonical document");
    assert_eq!(
        canonical,
        "/create-trip trip=\"rome\" name=\"\"\n/add id=\"1\" type=\"sight\" name=\"Pantheon\" date=\"\"\n"
    );
    assert!(storage
        .read("trips/rome/journal.report")
        .expect("read")
        .is_some_and(|report| report.contains("line 3: /frobnicate")));
    assert_eq!(
        storage.read("trips/rome/journal").expect("read").as_deref(),
        Some("/create-trip rome\n/add id=1 name=Pantheon   type=sight\n/frobnicate\n")
    );
}

#[tokio::test]
async fn test_cache_follows_head() {
    let engine = create_test_engine().await;
    create_trip(&engine, "rome").await;
    engine.apply_batch("rome", "/add name=A\n/add name=B").await.expect("batch");

    let slot = engine.inner.trips.acquire("rome").await;
    let state = slot.state.as_ref().expect("loaded");
    assert_eq!(state.cache.rebuilds(), 1);
    drop(slot);

    engine.apply_batch("rome", "/undo").await.expect("undo");
    assert_eq!(engine.current_model("rome").await.expect("model").items.len(), 1);
    let slot = engine.inner.trips.acquire("rome").await;
    assert_eq!(slot.state.as_ref().expect("loaded").cache.rebuilds(), 2);
}

/// Replies with scripted command text and records every request.
#[derive(Default)]
struct ScriptedAssistant {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<AssistantRequest>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedAssistant {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            ..Self::default()
        }
    }

    fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

impl Assistant for ScriptedAssistant {
    fn respond<'a>(
        &'a self,
        request: &'a AssistantRequest,
    ) -> BoxFuture<'a, std::result::Result<String, AssistantError>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or(AssistantError::InvalidResponse {
                    message: "script exhausted".into(),
                })
        })
    }

    fn search<'a>(
        &'a self,
        query: &'a str,
    ) -> BoxFuture<'a, std::result::Result<String, AssistantError>> {
        Box::pin(async move { Ok(format!("results for {query}")) })
    }
}

async fn create_ai_engine(assistant: Arc<ScriptedAssistant>, max_steps: usize) -> Engine {
    EngineBuilder::new()
        .with_memory_storage()
        .with_id_generator(SequentialIds::new())
        .with_assistant(assistant)
        .with_max_ai_steps(max_steps)
        .build()
        .await
        .expect("engine")
}

#[tokio::test]
async fn test_ai_task_with_search_follow_up() {
    let assistant = Arc::new(ScriptedAssistant::new(&[
        "/intent \"find gelato\"\n/search \"best gelato rome\"",
        "/add name=\"Giolitti\" type=food",
    ]));
    let engine = create_ai_engine(assistant.clone(), 4).await;
    create_trip(&engine, "rome").await;

    let token = engine.submit_ai_task("rome", "Where should we eat?").await.expect("submit");
    let status = engine.wait_for_task(token).await.expect("wait");
    match status {
        TaskStatus::Completed { executed, summary } => {
            assert_eq!(executed, 3);
            assert!(summary.contains("Added item 1: Giolitti"));
        }
        other => panic!("expected completion, got {other:?}"),
    }

    let requests = assistant.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].prompt, "Where should we eat?");
    assert!(requests[0].itinerary.starts_with("# Test trip"));
    assert_eq!(requests[1].step, 1);
    assert_eq!(requests[1].search_results[0].text, "results for best gelato rome");

    let model = engine.current_model("rome").await.expect("model");
    assert_eq!(item_names(&model), [("1".into(), "Giolitti".into())]);
}

#[tokio::test]
async fn test_ai_task_step_limit() {
    let assistant = Arc::new(ScriptedAssistant::new(&["/search \"anything\""]));
    let engine = create_ai_engine(assistant.clone(), 1).await;
    create_trip(&engine, "rome").await;

    let token = engine.submit_ai_task("rome", "go").await.expect("submit");
    let status = engine.wait_for_task(token).await.expect("wait");
    assert!(
        matches!(status, TaskStatus::Completed { ref summary, .. } if summary.contains("Step limit reached"))
    );
    assert_eq!(assistant.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_ai_task_cannot_renormalize() {
    let assistant = Arc::new(ScriptedAssistant::new(&["/renormalize"]));
    let engine = create_ai_engine(assistant, 4).await;
    create_trip(&engine, "rome").await;

    let token = engine.submit_ai_task("rome", "tidy up").await.expect("submit");
    let status = engine.wait_for_task(token).await.expect("wait");
    assert!(matches!(status, TaskStatus::Failed { ref error } if error.contains("/renormalize")));
}

#[tokio::test]
async fn test_ai_task_cancelled_before_applying() {
    let gate = Arc::new(Notify::new());
    let assistant = Arc::new(ScriptedAssistant::new(&["/add name=Late"]).gated(gate.clone()));
    let engine = create_ai_engine(assistant, 4).await;
    create_trip(&engine, "rome").await;

    let token = engine.submit_ai_task("rome", "add something").await.expect("submit");
    assert!(engine.cancel_task(token).expect("cancel"));
    gate.notify_one();

    assert_eq!(engine.wait_for_task(token).await.expect("wait"), TaskStatus::Cancelled);
    assert!(engine.current_model("rome").await.expect("model").items.is_empty());
    assert!(!engine.cancel_task(token).expect("cancel finished task"));
}

#[tokio::test]
async fn test_ai_task_requires_assistant_and_trip() {
    let engine = create_test_engine().await;
    assert!(matches!(
        engine.submit_ai_task("rome", "hi").await,
        Err(EngineError::Configuration { .. })
    ));

    let engine = create_ai_engine(Arc::new(ScriptedAssistant::default()), 4).await;
    assert!(matches!(
        engine.submit_ai_task("rome", "hi").await,
        Err(EngineError::TripNotFound { .. })
    ));
    assert!(matches!(
        engine.task_status(TaskToken(99)),
        Err(EngineError::TaskNotFound { token: 99 })
    ));
}
