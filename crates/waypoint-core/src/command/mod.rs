//! Command grammar: the text commands that are the only way to change a trip.
//!
//! A command is one line of the form
//!
//! ```text
//! /<keyword> [positional] [key=value | key="quoted value"]*
//! ```
//!
//! [`parse_line`] turns such a line into a [`Command`]; [`format`] renders a
//! command back into its canonical line. Journals only ever store canonical
//! lines, so cosmetic differences in what the user typed (aliases, spacing,
//! positional vs keyed arguments, quoting) never reach replay.
//!
//! # Examples
//!
//! ```rust
//! use waypoint_core::command::{format, parse_line, Command};
//!
//! let command = parse_line("/edit 7 name=\"Hotel Lutetia\"").unwrap();
//! assert!(matches!(command, Command::EditItem { .. }));
//! assert_eq!(format(&command), "/edit id=\"7\" name=\"Hotel Lutetia\"");
//! ```

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::models::{Fields, Value};

mod error;
mod format;
mod lexer;
mod parse;


pub use error::CommandError;
pub use format::{format, format_with, FormatContext};
pub use parse::{parse_batch, parse_line, validate_identifier};

/// A parsed command. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Command {
    /// Starts a trip's journal.
    CreateTrip { trip: String, name: String },
    /// Appends an item. `id` is `None` until the engine assigns one.
    AddItem { id: Option<String>, fields: Fields },
    /// Replaces the named fields of an item.
    EditItem { id: String, changes: Fields },
    /// Removes an item. `snapshot` holds its fields for the audit trail.
    DeleteItem { id: String, snapshot: Fields },
    /// Moves every item dated within `[from, to]` by `days`.
    MoveRange { from: Date, to: Date, days: i64 },
    /// Pushes every item on or after `date` one day later.
    InsertGap { date: Date },
    /// Pulls every item on or after `date` one day earlier.
    RemoveRange { date: Date },
    AddCountry { name: String, code: Option<String> },
    /// Rebuilds the country list from the items' `country` fields.
    RefreshCountries,
    SetPreference { key: String, value: Value },
    Mark { ids: Vec<String> },
    Unmark { ids: Vec<String> },
    DeclareIntent { text: String },
    Undo { count: usize },
    Redo { count: usize },
    SwitchTrip { trip: String },
    SwitchAiModel { name: String },
    WebSearch { query: String },
    Help { topic: Option<String> },
    Renormalize,
}

/// The keyword of a command, without its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    CreateTrip,
    AddItem,
    EditItem,
    DeleteItem,
    MoveRange,
    InsertGap,
    RemoveRange,
    AddCountry,
    RefreshCountries,
    SetPreference,
    Mark,
    Unmark,
    DeclareIntent,
    Undo,
    Redo,
    SwitchTrip,
    SwitchAiModel,
    WebSearch,
    Help,
    Renormalize,
}

/// Every accepted keyword, canonical names first.
const KEYWORDS: &[(&str, CommandKind)] = &[
    ("create-trip", CommandKind::CreateTrip),
    ("add", CommandKind::AddItem),
    ("edit", CommandKind::EditItem),
    ("delete", CommandKind::DeleteItem),
    ("move-range", CommandKind::MoveRange),
    ("insert-gap", CommandKind::InsertGap),
    ("remove-range", CommandKind::RemoveRange),
    ("add-country", CommandKind::AddCountry),
    ("refresh-countries", CommandKind::RefreshCountries),
    ("set-preference", CommandKind::SetPreference),
    ("mark", CommandKind::Mark),
    ("unmark", CommandKind::Unmark),
    ("intent", CommandKind::DeclareIntent),
    ("undo", CommandKind::Undo),
    ("redo", CommandKind::Redo),
    ("switch-trip", CommandKind::SwitchTrip),
    ("model", CommandKind::SwitchAiModel),
    ("search", CommandKind::WebSearch),
    ("help", CommandKind::Help),
    ("renormalize", CommandKind::Renormalize),
    // aliases
    ("new-trip", CommandKind::CreateTrip),
    ("add-item", CommandKind::AddItem),
    ("edit-item", CommandKind::EditItem),
    ("delete-item", CommandKind::DeleteItem),
    ("rm", CommandKind::DeleteItem),
    ("move", CommandKind::MoveRange),
    ("pref", CommandKind::SetPreference),
    ("declare-intent", CommandKind::DeclareIntent),
    ("trip", CommandKind::SwitchTrip),
    ("switch-ai-model", CommandKind::SwitchAiModel),
    ("web-search", CommandKind::WebSearch),
];

impl CommandKind {
    /// Resolves a keyword or alias (case-insensitive).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let keyword = keyword.to_ascii_lowercase();
        KEYWORDS
            .iter()
            .find(|(word, _)| *word == keyword)
            .map(|(_, kind)| *kind)
    }

    /// The keyword used in canonical form.
    pub fn keyword(self) -> &'static str {
        match self {
            CommandKind::CreateTrip => "create-trip",
            CommandKind::AddItem => "add",
            CommandKind::EditItem => "edit",
            CommandKind::DeleteItem => "delete",
            CommandKind::MoveRange => "move-range",
            CommandKind::InsertGap => "insert-gap",
            CommandKind::RemoveRange => "remove-range",
            CommandKind::AddCountry => "add-country",
            CommandKind::RefreshCountries => "refresh-countries",
            CommandKind::SetPreference => "set-preference",
            CommandKind::Mark => "mark",
            CommandKind::Unmark => "unmark",
            CommandKind::DeclareIntent => "intent",
            CommandKind::Undo => "undo",
            CommandKind::Redo => "redo",
            CommandKind::SwitchTrip => "switch-trip",
            CommandKind::SwitchAiModel => "model",
            CommandKind::WebSearch => "search",
            CommandKind::Help => "help",
            CommandKind::Renormalize => "renormalize",
        }
    }

    /// The argument a leading positional value stands for, if any.
    pub fn positional(self) -> Option<&'static str> {
        match self {
            CommandKind::CreateTrip | CommandKind::SwitchTrip => Some("trip"),
            CommandKind::EditItem
            | CommandKind::DeleteItem
            | CommandKind::Mark
            | CommandKind::Unmark => Some("id"),
            CommandKind::InsertGap | CommandKind::RemoveRange => Some("date"),
            CommandKind::AddCountry | CommandKind::SwitchAiModel => Some("name"),
            CommandKind::SetPreference => Some("key"),
            CommandKind::DeclareIntent => Some("text"),
            CommandKind::Undo | CommandKind::Redo => Some("count"),
            CommandKind::WebSearch => Some("query"),
            CommandKind::Help => Some("topic"),
            CommandKind::AddItem
            | CommandKind::MoveRange
            | CommandKind::RefreshCountries
            | CommandKind::Renormalize => None,
        }
    }

    /// One-line usage string shown by `/help`.
    pub fn usage(self) -> &'static str {
        match self {
            CommandKind::CreateTrip => "/create-trip <trip> [name=\"...\"]",
            CommandKind::AddItem => "/add name=\"...\" [type=...] [date=YYYY-MM-DD] [field=value]*",
            CommandKind::EditItem => "/edit <id> field=value [field=value]*",
            CommandKind::DeleteItem => "/delete <id>",
            CommandKind::MoveRange => "/move-range from=YYYY-MM-DD to=YYYY-MM-DD days=N",
            CommandKind::InsertGap => "/insert-gap <YYYY-MM-DD>",
            CommandKind::RemoveRange => "/remove-range <YYYY-MM-DD>",
            CommandKind::AddCountry => "/add-country <name> [code=XX]",
            CommandKind::RefreshCountries => "/refresh-countries",
            CommandKind::SetPreference => "/set-preference <key> value=...",
            CommandKind::Mark => "/mark <id>[,<id>]*",
            CommandKind::Unmark => "/unmark <id>[,<id>]*",
            CommandKind::DeclareIntent => "/intent \"what you are about to do\"",
            CommandKind::Undo => "/undo [count]",
            CommandKind::Redo => "/redo [count]",
            CommandKind::SwitchTrip => "/switch-trip <trip>",
            CommandKind::SwitchAiModel => "/model <name>",
            CommandKind::WebSearch => "/search \"query\"",
            CommandKind::Help => "/help [command]",
            CommandKind::Renormalize => "/renormalize",
        }
    }

    /// All kinds, in help order.
    pub fn all() -> impl Iterator<Item = CommandKind> {
        KEYWORDS
            .iter()
            .take_while(|(word, kind)| kind.keyword() == *word)
            .map(|(_, kind)| *kind)
    }
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::CreateTrip { .. } => CommandKind::CreateTrip,
            Command::AddItem { .. } => CommandKind::AddItem,
            Command::EditItem { .. } => CommandKind::EditItem,
            Command::DeleteItem { .. } => CommandKind::DeleteItem,
            Command::MoveRange { .. } => CommandKind::MoveRange,
            Command::InsertGap { .. } => CommandKind::InsertGap,
            Command::RemoveRange { .. } => CommandKind::RemoveRange,
            Command::AddCountry { .. } => CommandKind::AddCountry,
            Command::RefreshCountries => CommandKind::RefreshCountries,
            Command::SetPreference { .. } => CommandKind::SetPreference,
            Command::Mark { .. } => CommandKind::Mark,
            Command::Unmark { .. } => CommandKind::Unmark,
            Command::DeclareIntent { .. } => CommandKind::DeclareIntent,
            Command::Undo { .. } => CommandKind::Undo,
            Command::Redo { .. } => CommandKind::Redo,
            Command::SwitchTrip { .. } => CommandKind::SwitchTrip,
            Command::SwitchAiModel { .. } => CommandKind::SwitchAiModel,
            Command::WebSearch { .. } => CommandKind::WebSearch,
            Command::Help { .. } => CommandKind::Help,
            Command::Renormalize => CommandKind::Renormalize,
        }
    }

    pub fn keyword(&self) -> &'static str {
        self.kind().keyword()
    }

    /// True for commands that are persisted and replayed through the reducer.
    ///
    /// Undo and redo are persisted as timeline markers but are not
    /// journalable in this sense: the reducer never sees them.
    pub fn is_journalable(&self) -> bool {
        match self {
            Command::CreateTrip { .. }
            | Command::AddItem { .. }
            | Command::EditItem { .. }
            | Command::DeleteItem { .. }
            | Command::MoveRange { .. }
            | Command::InsertGap { .. }
            | Command::RemoveRange { .. }
            | Command::AddCountry { .. }
            | Command::RefreshCountries
            | Command::SetPreference { .. } => true,
            Command::Mark { .. }
            | Command::Unmark { .. }
            | Command::DeclareIntent { .. }
            | Command::Undo { .. }
            | Command::Redo { .. }
            | Command::SwitchTrip { .. }
            | Command::SwitchAiModel { .. }
            | Command::WebSearch { .. }
            | Command::Help { .. }
            | Command::Renormalize => false,
        }
    }

    /// True for the undo/redo markers kept in the journal.
    pub fn is_timeline_marker(&self) -> bool {
        matches!(self, Command::Undo { .. } | Command::Redo { .. })
    }

    /// True for commands an AI assistant may not issue.
    pub fn is_human_only(&self) -> bool {
        matches!(self, Command::Renormalize)
    }
}
