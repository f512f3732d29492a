//! Subcommand handlers.
//!
//! Each handler resolves the trip, calls one engine operation and hands the
//! result to the [`TerminalRenderer`].

use anyhow::{bail, Context, Result};
use log::{debug, info};
use tokio::io::AsyncReadExt;
use waypoint_core::{
    params::{ApplyCommands, SubmitTask},
    Effect, Engine, HelpText, TaskStatus, TripList,
};

use crate::{
    args::{created_trip, AskArgs, RunArgs, TripArgs},
    renderer::TerminalRenderer,
};

pub struct Cli {
    engine: Engine,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(engine: Engine, renderer: TerminalRenderer) -> Self {
        Self { engine, renderer }
    }

    /// `trip` if given, otherwise the current trip.
    async fn resolve_trip(&self, trip: Option<String>) -> Result<String> {
        if let Some(trip) = trip {
            return Ok(trip);
        }
        match self.engine.current_trip().await? {
            Some(trip) => Ok(trip),
            None => bail!("No trip selected; pass --trip <trip> or run `wp use <trip>`"),
        }
    }

    pub async fn run(&self, args: RunArgs) -> Result<()> {
        let batch = match args.batch() {
            Some(batch) => batch,
            None => {
                let mut text = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut text)
                    .await
                    .context("Failed to read commands from stdin")?;
                text
            }
        };
        let trip = match args.trip.trip.clone().or_else(|| created_trip(&batch)) {
            Some(trip) => trip,
            None => self.resolve_trip(None).await?,
        };
        let params = ApplyCommands {
            trip,
            commands: batch,
        };
        self.apply(&params, args.show).await
    }

    async fn apply(&self, params: &ApplyCommands, show: bool) -> Result<()> {
        params.validate()?;
        debug!("applying batch to trip '{}'", params.trip);
        let outcome = self
            .engine
            .apply_batch(&params.trip, &params.commands)
            .await
            .with_context(|| format!("Failed to apply commands to trip '{}'", params.trip))?;

        for effect in &outcome.effects {
            if let Effect::WebSearch { query } = effect {
                info!("search requested but no assistant is attached: {query}");
            }
        }
        self.renderer.show(&outcome)?;
        if show && !self.renderer.is_json() {
            self.renderer.render(&outcome.model.to_string());
        }
        Ok(())
    }

    pub async fn show(&self, args: TripArgs) -> Result<()> {
        let trip = self.resolve_trip(args.trip).await?;
        let model = self.engine.current_model(&trip).await?;
        self.renderer.show(&model)
    }

    pub async fn log(&self, args: TripArgs) -> Result<()> {
        let trip = self.resolve_trip(args.trip).await?;
        let log = self.engine.journal_log(&trip).await?;
        self.renderer.show(&log)
    }

    pub async fn list_trips(&self) -> Result<()> {
        let trips = self.engine.list_trips().await?;
        if self.renderer.is_json() {
            println!("{}", serde_json::to_string_pretty(&trips)?);
            return Ok(());
        }
        let current = self.engine.current_trip().await?;
        let list = TripList::new(trips).with_current(current.as_deref());
        self.renderer.render(&list.to_string());
        Ok(())
    }

    pub async fn use_trip(&self, trip: &str) -> Result<()> {
        self.engine.set_current_trip(trip).await?;
        self.renderer.render(&format!("Current trip is now '{trip}'."));
        Ok(())
    }

    pub async fn renormalize(&self) -> Result<()> {
        let report = self.engine.renormalize_all().await?;
        self.renderer.show(&report)
    }

    pub async fn ask(&self, args: AskArgs) -> Result<()> {
        let trip = self.resolve_trip(args.trip.trip.clone()).await?;
        let SubmitTask { trip, prompt } = args.to_params(trip);
        let token = self.engine.submit_ai_task(&trip, &prompt).await?;
        info!("waiting for AI task {token}");

        let status = tokio::select! {
            status = self.engine.wait_for_task(token) => status?,
            _ = tokio::signal::ctrl_c() => {
                self.engine.cancel_task(token)?;
                self.engine.wait_for_task(token).await?
            }
        };
        self.renderer.show(&status)?;
        match status {
            TaskStatus::Failed { error } => bail!("AI task failed: {error}"),
            _ => Ok(()),
        }
    }

    pub fn syntax(&self, topic: Option<&str>) {
        self.renderer.render(&HelpText::new(topic).to_string());
    }
}
