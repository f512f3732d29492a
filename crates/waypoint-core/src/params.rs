//! Parameter structures shared by the CLI and the MCP server.
//!
//! Interface layers wrap these with their own derives: the MCP server wraps
//! them in `#[serde(transparent)]` request types, the CLI builds them from
//! clap arguments.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │    │   MCP Params    │    │  Core Params    │
//! │  (clap derives) │───▶│ (serde derives) │───▶│ (minimal deps)  │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::command::{validate_identifier, CommandError};

/// Parameters for operations on one trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct TripRef {
    /// Trip id: 1-64 letters, digits, '-' or '_'
    pub trip: String,
}

/// Parameters for applying a command batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ApplyCommands {
    /// Trip id the batch applies to
    pub trip: String,
    /// Command lines, one per line, each starting with '/'.
    ///
    /// Example: "/add name=\"Colosseum\" type=sight date=2025-05-02"
    pub commands: String,
}

impl ApplyCommands {
    /// Checks the trip id and that there is at least one command line.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use waypoint_core::params::ApplyCommands;
    ///
    /// let params = ApplyCommands {
    ///     trip: "rome".to_string(),
    ///     commands: "/add name=Colosseum".to_string(),
    /// };
    /// assert!(params.validate().is_ok());
    ///
    /// let params = ApplyCommands {
    ///     trip: "rome".to_string(),
    ///     commands: "  \n".to_string(),
    /// };
    /// assert!(params.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), CommandError> {
        validate_identifier("trip", &self.trip)?;
        if self.commands.trim().is_empty() {
            return Err(CommandError::EmptyCommand);
        }
        Ok(())
    }
}

/// Parameters for command syntax help.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct HelpTopic {
    /// Command keyword such as "add" or "undo"; omit for every command
    #[serde(default)]
    pub topic: Option<String>,
}

/// Parameters for starting an AI task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct SubmitTask {
    /// Trip id the assistant works on
    pub trip: String,
    /// What the assistant should do
    pub prompt: String,
}

/// Parameters for operations on an AI task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct TaskRef {
    /// Token returned when the task was submitted
    pub token: u64,
}
