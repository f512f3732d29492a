//! [`Command`] to canonical text.
//!
//! Canonical lines always use the canonical keyword and keyed arguments in a
//! fixed order. Text is always quoted; numbers and booleans are bare. An empty
//! string is written as `""` and means "cleared", never "absent".

use super::Command;
use crate::models::{Fields, Value, REQUIRED_FIELDS};

/// Extra information the engine knows at persistence time.
#[derive(Debug, Clone, Default)]
pub struct FormatContext {
    /// Id assigned to an `/add` that did not carry one.
    pub item_id: Option<String>,
    /// Fields of the item a `/delete` removes, recorded for the audit trail.
    pub snapshot: Option<Fields>,
}

impl FormatContext {
    pub fn with_item_id(id: impl Into<String>) -> Self {
        Self {
            item_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_snapshot(snapshot: Fields) -> Self {
        Self {
            snapshot: Some(snapshot),
            ..Self::default()
        }
    }
}

/// Renders the canonical line for a command.
pub fn format(command: &Command) -> String {
    format_with(command, &FormatContext::default())
}

/// Renders the canonical line, filling in what `context` supplies.
pub fn format_with(command: &Command, context: &FormatContext) -> String {
    let mut line = Line::new(command.keyword());
    match command {
        Command::CreateTrip { trip, name } => {
            line.text("trip", trip);
            line.text("name", name);
        }
        Command::AddItem { id, fields } => {
            if let Some(id) = id.as_ref().or(context.item_id.as_ref()) {
                line.text("id", id);
            }
            for key in REQUIRED_FIELDS {
                line.value(key, fields.get(key).unwrap_or(&Value::blank()));
            }
            line.fields(fields, &REQUIRED_FIELDS);
        }
        Command::EditItem { id, changes } => {
            line.text("id", id);
            line.fields(changes, &[]);
        }
        Command::DeleteItem { id, snapshot } => {
            line.text("id", id);
            line.fields(context.snapshot.as_ref().unwrap_or(snapshot), &["id"]);
        }
        Command::MoveRange { from, to, days } => {
            line.text("from", &from.to_string());
            line.text("to", &to.to_string());
            line.bare("days", &days.to_string());
        }
        Command::InsertGap { date } | Command::RemoveRange { date } => {
            line.text("date", &date.to_string());
        }
        Command::AddCountry { name, code } => {
            line.text("name", name);
            if let Some(code) = code {
                line.text("code", code);
            }
        }
        Command::RefreshCountries | Command::Renormalize => {}
        Command::SetPreference { key, value } => {
            line.text("key", key);
            line.value("value", value);
        }
        Command::Mark { ids } | Command::Unmark { ids } => {
            line.text("id", &ids.join(","));
        }
        Command::DeclareIntent { text } => line.text("text", text),
        Command::Undo { count } | Command::Redo { count } => {
            line.bare("count", &count.to_string());
        }
        Command::SwitchTrip { trip } => line.text("trip", trip),
        Command::SwitchAiModel { name } => line.text("name", name),
        Command::WebSearch { query } => line.text("query", query),
        Command::Help { topic } => {
            if let Some(topic) = topic {
                line.text("topic", topic);
            }
        }
    }
    line.finish()
}

/// Quotes and escapes a text value.
pub(crate) fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

struct Line(String);

impl Line {
    fn new(keyword: &str) -> Self {
        Self(format!("/{keyword}"))
    }

    fn text(&mut self, key: &str, text: &str) {
        self.0.push_str(&format!(" {key}={}", quote(text)));
    }

    fn bare(&mut self, key: &str, token: &str) {
        self.0.push_str(&format!(" {key}={token}"));
    }

    fn value(&mut self, key: &str, value: &Value) {
        match value {
            Value::Text(text) => self.text(key, text),
            Value::Number(number) => self.bare(key, number),
            Value::Bool(flag) => self.bare(key, &flag.to_string()),
        }
    }

    /// Appends fields in key order, skipping keys already written.
    fn fields(&mut self, fields: &Fields, skip: &[&str]) {
        for (key, value) in fields {
            if !skip.contains(&key.as_str()) {
                self.value(key, value);
            }
        }
    }

    fn finish(self) -> String {
        self.0
    }
}
