//! MCP server implementation for Waypoint
//!
//! Exposes trip journals to MCP clients. Batches submitted through
//! `apply_commands` run as assistant-originated batches, so they share the
//! per-trip single-flight queue with human edits and may not issue
//! operator-only commands.

use std::future::Future;

use anyhow::Result;
use log::{debug, error, info};
use rmcp::{
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{
        GetPromptRequestParam, GetPromptResult, Implementation, ListPromptsResult,
        PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler,
};
use tokio::signal::unix::{signal, SignalKind};
use waypoint_core::Engine;

pub mod errors;
pub mod handlers;
pub mod prompts;

use handlers::{ApplyCommands, HelpTopic, McpHandlers, McpResult, TripRef};

/// MCP server for Waypoint
#[derive(Clone)]
pub struct WaypointMcpServer {
    engine: Engine,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl WaypointMcpServer {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            tool_router: Self::tool_router(),
        }
    }

    fn handlers(&self) -> McpHandlers {
        McpHandlers::new(self.engine.clone())
    }

    #[tool(
        name = "apply_commands",
        description = "Apply a batch of itinerary commands to a trip, one command per line, each starting with '/'. The whole batch is parsed first; a syntax error rejects it without changing anything. Returns one message per command followed by the updated itinerary with item ids. Use command_help for the grammar."
    )]
    async fn apply_commands(&self, params: Parameters<ApplyCommands>) -> McpResult {
        self.handlers().apply_commands(params).await
    }

    #[tool(
        name = "show_trip",
        description = "Show a trip's current itinerary as markdown: items with ids, dates and fields, then countries and preferences."
    )]
    async fn show_trip(&self, params: Parameters<TripRef>) -> McpResult {
        self.handlers().show_trip(params).await
    }

    #[tool(
        name = "show_journal",
        description = "Show a trip's journal: every persisted command line with whether it is applied, undone, discarded by a later change, or an undo/redo marker."
    )]
    async fn show_journal(&self, params: Parameters<TripRef>) -> McpResult {
        self.handlers().show_journal(params).await
    }

    #[tool(name = "list_trips", description = "List the ids of every trip.")]
    async fn list_trips(&self) -> McpResult {
        self.handlers().list_trips().await
    }

    #[tool(
        name = "command_help",
        description = "Show the syntax of every itinerary command, or of one command when topic is given."
    )]
    async fn command_help(&self, params: Parameters<HelpTopic>) -> McpResult {
        self.handlers().command_help(params).await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for WaypointMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: "waypoint".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(r#"Waypoint keeps travel itineraries as journals of text commands. The itinerary is rebuilt by replaying the journal, so every change you make is a command line.

## Workflow
1. `list_trips` to find the trip id, `show_trip` to read the itinerary and item ids.
2. `apply_commands` with one command per line, e.g.
   /intent "add a food stop on day two"
   /add name="Trattoria da Enzo" type=food date=2025-05-03
3. `show_journal` to audit what changed; `/undo` reverts the last change.

## Rules
- Item ids come from the itinerary; never invent one for /edit or /delete.
- `field=""` clears a field. Fields are never removed.
- A new command after /undo discards the redo history.
- /renormalize is reserved for human operators."#.to_string()),
        }
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(self.handlers().list_prompts())
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        self.handlers().get_prompt(&request)
    }
}

/// Run the MCP server with stdio transport
pub async fn run_stdio_server(server: WaypointMcpServer) -> Result<()> {
    use rmcp::{transport::stdio, ServiceExt};

    info!("Starting Waypoint MCP server on stdio");
    debug!(
        "Server created with {} tools",
        server.tool_router.list_all().len()
    );

    let service = server.serve(stdio()).await.inspect_err(|e| {
        error!("serving error: {e:?}");
    })?;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = service.waiting() => {
            match result {
                Ok(_) => info!("MCP server stopped normally"),
                Err(e) => error!("MCP server error: {e:?}"),
            }
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    info!("MCP server shutdown complete");
    Ok(())
}
