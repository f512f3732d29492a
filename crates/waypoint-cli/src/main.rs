//! Waypoint CLI Application
//!
//! Command-line interface and MCP server for the waypoint itinerary journal.

mod args;
mod cli;
mod mcp;
mod renderer;

use std::time::Duration;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use mcp::{run_stdio_server, WaypointMcpServer};
use renderer::TerminalRenderer;
use waypoint_core::{EngineBuilder, ProcessAssistant};
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        storage_dir,
        sqlite,
        no_color,
        json,
        command,
    } = Args::parse();

    let mut builder = match (storage_dir, sqlite) {
        (_, Some(path)) => EngineBuilder::new().with_sqlite_path(path),
        (Some(dir), None) => EngineBuilder::new().with_storage_dir(dir),
        (None, None) => EngineBuilder::new(),
    };
    if let Some(Ask(ask)) = &command {
        let assistant = ProcessAssistant::from_command_line(&ask.assistant_cmd)
            .context("--assistant-cmd is empty")?
            .with_timeout(Duration::from_secs(ask.timeout));
        builder = builder
            .with_assistant(assistant)
            .with_max_ai_steps(ask.max_steps);
    }
    let engine = builder.build().await.context("Failed to initialize engine")?;

    let renderer = TerminalRenderer::new(!no_color, json);

    info!("Waypoint started");

    let cli = Cli::new(engine.clone(), renderer);
    match command {
        Some(Run(args)) => cli.run(args).await,
        Some(Show(args)) => cli.show(args).await,
        Some(Log(args)) => cli.log(args).await,
        Some(Trips) | None => cli.list_trips().await,
        Some(Use { trip }) => cli.use_trip(&trip).await,
        Some(Renormalize) => cli.renormalize().await,
        Some(Ask(args)) => cli.ask(args).await,
        Some(Syntax { topic }) => {
            cli.syntax(topic.as_deref());
            Ok(())
        }
        Some(Serve) => {
            info!("Starting Waypoint MCP server");
            run_stdio_server(WaypointMcpServer::new(engine))
                .await
                .context("MCP server failed")
        }
    }
}
