//! Core library for Waypoint, a command-journaled travel itinerary engine.
//!
//! A trip's itinerary is never stored. Every change is a `/command` line
//! appended to the trip's journal, and the itinerary is whatever replaying
//! that journal produces. Undo and redo move a head pointer along the
//! journaled timeline; a new command after an undo discards the redoable
//! future.
//!
//! # Architecture
//!
//! - **Grammar** ([`command`]): parse text into a [`Command`] and format it
//!   back into one canonical line
//! - **Reducer** ([`reducer`]): pure `apply(model, command) -> model`
//! - **Journal** ([`journal`]): append-only canonical lines over a
//!   [`storage::Storage`] backend
//! - **Timeline** ([`timeline`]): head, total and branch truncation
//! - **Cache** ([`cache`]): memoized model per trip
//! - **Serializer** ([`serializer`]): single-flight lock per trip plus the
//!   AI task registry
//! - **Engine** ([`engine`]): the façade tying them together
//!
//! # Display Architecture
//!
//! Models and engine results implement [`std::fmt::Display`] as markdown
//! ([`display`]); the CLI renders that markdown in the terminal and the MCP
//! server returns it as text.
//!
//! # Quick Start
//!
//! ```rust
//! use waypoint_core::{EngineBuilder, SequentialIds};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = EngineBuilder::new()
//!     .with_memory_storage()
//!     .with_id_generator(SequentialIds::new())
//!     .build()
//!     .await?;
//!
//! let outcome = engine
//!     .apply_batch(
//!         "rome",
//!         "/create-trip rome name=\"Rome in May\"\n\
//!          /add name=\"Colosseum\" type=sight date=2025-05-02\n\
//!          /add name=\"Trastevere dinner\" type=food date=2025-05-02",
//!     )
//!     .await?;
//! assert_eq!(outcome.executed, 3);
//!
//! let outcome = engine.apply_batch("rome", "/undo").await?;
//! println!("{}", outcome.model);
//! # Ok(())
//! # }
//! ```

pub mod assistant;
pub mod cache;
pub mod command;
pub mod display;
pub mod engine;
pub mod error;
pub mod ids;
pub mod journal;
pub mod models;
pub mod params;
pub mod reducer;
pub mod serializer;
pub mod storage;
pub mod timeline;

// Re-export commonly used types
pub use assistant::{Assistant, AssistantError, AssistantRequest, ProcessAssistant};
pub use command::{format, parse_batch, parse_line, Command, CommandError, CommandKind};
pub use display::{HelpText, ItemDate, TripList};
pub use engine::{Engine, EngineBuilder, Origin};
pub use error::{EngineError, Result};
pub use ids::{ClockIds, IdGenerator, SequentialIds};
pub use journal::JournalEntry;
pub use models::{BatchOutcome, Effect, Item, JournalLog, MaintenanceReport, TripModel, Value};
pub use params::{ApplyCommands, HelpTopic, SubmitTask, TaskRef, TripRef};
pub use serializer::{TaskStatus, TaskToken};
pub use storage::{DirectoryStorage, MemoryStorage, SqliteStorage, Storage, StorageError};
pub use timeline::EntryState;
