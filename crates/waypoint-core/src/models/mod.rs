//! Data models for trips and their items.
//!
//! A [`TripModel`] is never stored: it is the result of replaying a trip's
//! journal through the [`crate::reducer`]. Display implementations live in
//! [`crate::display::models`].

pub mod outcome;
pub mod trip;
pub mod value;

pub use outcome::{
    BatchOutcome, Effect, JournalLog, LoggedEntry, MaintenanceReport, SkippedLine, TripReport,
};
pub use trip::{Country, Item, TripModel, REQUIRED_FIELDS};
pub use value::{Fields, Value};
