//! Error handling utilities for MCP server

use rmcp::ErrorData;
use waypoint_core::EngineError;

/// Converts engine errors to MCP errors.
///
/// Rejected input is reported as invalid parameters so the client can fix
/// its commands; everything else is an internal error.
pub fn to_mcp_error(message: &str, error: &EngineError) -> ErrorData {
    let text = format!("{message}: {error}");
    match error {
        EngineError::Command(_)
        | EngineError::Forbidden { .. }
        | EngineError::TripNotFound { .. }
        | EngineError::TripAlreadyExists { .. }
        | EngineError::ItemNotFound { .. }
        | EngineError::ItemAlreadyExists { .. } => ErrorData::invalid_params(text, None),
        _ => ErrorData::internal_error(text, None),
    }
}
