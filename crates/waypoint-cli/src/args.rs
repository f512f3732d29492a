use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use waypoint_core::params::SubmitTask;

/// Command journal for travel itineraries
///
/// Every change to a trip is a `/command` line appended to the trip's
/// journal; the itinerary is rebuilt by replaying it. Run `wp syntax` for
/// the command grammar.
#[derive(Parser)]
#[command(version, about, name = "wp")]
pub struct Args {
    /// Directory holding trip journals. Defaults to
    /// $XDG_DATA_HOME/waypoint/journals
    #[arg(long, global = true, env = "WAYPOINT_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Keep journals in a SQLite database file instead of plain files
    #[arg(long, global = true, env = "WAYPOINT_SQLITE", conflicts_with = "storage_dir")]
    pub sqlite: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands for the Waypoint CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Apply command lines to a trip
    #[command(alias = "r")]
    Run(RunArgs),
    /// Show a trip's itinerary
    #[command(alias = "s")]
    Show(TripArgs),
    /// Show a trip's journal with the timeline state of every line
    Log(TripArgs),
    /// List trips
    Trips,
    /// Select the current trip
    Use {
        /// Trip id
        trip: String,
    },
    /// Rewrite every journal into canonical form alongside the original
    Renormalize,
    /// Ask an external assistant program to edit a trip
    Ask(AskArgs),
    /// Show command syntax
    Syntax {
        /// Command keyword, e.g. `add` or `/undo`
        topic: Option<String>,
    },
    /// Start the MCP server
    Serve,
}

/// Trip selection shared by commands that read one trip.
#[derive(ClapArgs)]
pub struct TripArgs {
    /// Trip id. Defaults to the current trip
    #[arg(short, long, env = "WAYPOINT_TRIP")]
    pub trip: Option<String>,
}

/// Apply command lines to a trip
///
/// Each argument is one command line. With no arguments, lines are read
/// from standard input. The whole batch is parsed before anything runs.
#[derive(ClapArgs)]
pub struct RunArgs {
    #[command(flatten)]
    pub trip: TripArgs,
    /// Command lines, e.g. '/add name="Colosseum" date=2025-05-02'
    pub commands: Vec<String>,
    /// Print the itinerary after the batch
    #[arg(long)]
    pub show: bool,
}

impl RunArgs {
    /// The command arguments as one batch, or `None` to read stdin.
    pub fn batch(&self) -> Option<String> {
        (!self.commands.is_empty()).then(|| self.commands.join("\n"))
    }
}

/// The trip a leading `/create-trip` in `batch` names, if any.
pub fn created_trip(batch: &str) -> Option<String> {
    let first = batch.lines().map(str::trim).find(|line| !line.is_empty())?;
    match waypoint_core::parse_line(first) {
        Ok(waypoint_core::Command::CreateTrip { trip, .. }) => Some(trip),
        _ => None,
    }
}

/// Ask an external assistant program to edit a trip
///
/// The program receives one JSON request on stdin and must print command
/// lines on stdout.
#[derive(ClapArgs)]
pub struct AskArgs {
    #[command(flatten)]
    pub trip: TripArgs,
    /// What the assistant should do
    pub prompt: String,
    /// Assistant program and its arguments, split on whitespace
    #[arg(long, env = "WAYPOINT_ASSISTANT")]
    pub assistant_cmd: String,
    /// Seconds before one assistant call times out
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,
    /// Chained steps the assistant may take
    #[arg(long, default_value_t = waypoint_core::engine::builder::DEFAULT_MAX_AI_STEPS)]
    pub max_steps: usize,
}

impl AskArgs {
    pub fn to_params(&self, trip: String) -> SubmitTask {
        SubmitTask {
            trip,
            prompt: self.prompt.clone(),
        }
    }
}
