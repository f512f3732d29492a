//! Markdown formatting for models and engine results.
//!
//! Domain models implement [`std::fmt::Display`] directly; collections and
//! engine results go through the wrapper and result types here. Output is
//! markdown so the CLI can render it in the terminal and MCP clients can
//! show it as-is.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Trip models,   │    │ Display impls & │    │   Formatted     │
//! │ engine results  │───▶│ wrapper types   │───▶│    Output       │
//! │                 │    │                 │    │  (Terminal/MCP) │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`collections`]: Collection wrapper types (TripList)
//! - [`results`]: Batch outcomes, journal logs, maintenance reports, task status
//! - [`dates`]: Itinerary date formatting
//! - [`help`]: `/help` text
//! - [`models`]: Display implementations for trip models
//!
//! # Examples
//!
//! ```rust
//! use waypoint_core::{command::parse_line, models::TripModel, reducer};
//!
//! let model = reducer::replay(&[
//!     parse_line("/create-trip rome name=\"Rome in May\"").unwrap(),
//!     parse_line("/add id=1 name=\"Colosseum\" type=sight date=2025-05-02").unwrap(),
//! ]);
//! let output = model.to_string();
//! assert!(output.contains("# Rome in May"));
//! assert!(output.contains("Colosseum"));
//! ```

pub mod collections;
pub mod dates;
pub mod help;
pub mod models;
pub mod results;

pub use collections::TripList;
pub use dates::ItemDate;
pub use help::HelpText;
