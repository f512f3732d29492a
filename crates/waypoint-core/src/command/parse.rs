//! Text to [`Command`].

use jiff::civil::Date;

use super::{
    lexer::{lex, RawArgs},
    Command, CommandError, CommandKind,
};
use crate::models::{Fields, Value, REQUIRED_FIELDS};

const MAX_IDENTIFIER_LEN: usize = 64;

/// Parses a single command line.
///
/// Leading and trailing whitespace is ignored. The keyword is matched
/// case-insensitively against canonical names and aliases.
pub fn parse_line(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let rest = line.strip_prefix('/').ok_or_else(|| CommandError::MissingSlash {
        input: line.to_string(),
    })?;
    let (keyword, tail) = rest
        .split_once(char::is_whitespace)
        .unwrap_or((rest, ""));
    if keyword.is_empty() {
        return Err(CommandError::EmptyCommand);
    }
    let kind = CommandKind::from_keyword(keyword).ok_or_else(|| CommandError::UnknownKeyword {
        keyword: keyword.to_string(),
    })?;

    let args = Args::new(kind, lex(tail)?)?;
    build(kind, args)
}

/// Parses a block of command lines.
///
/// Blank lines and lines starting with `#` are skipped. The first bad line
/// rejects the whole batch, and the error names its 1-based line number.
pub fn parse_batch(text: &str) -> Result<Vec<Command>, CommandError> {
    let mut commands = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        commands.push(parse_line(line).map_err(|e| e.at_line(index + 1))?);
    }
    Ok(commands)
}

fn build(kind: CommandKind, mut args: Args) -> Result<Command, CommandError> {
    let command = match kind {
        CommandKind::CreateTrip => {
            let trip = args.identifier("trip")?;
            let name = args.optional_text("name").unwrap_or_default();
            args.finish()?;
            Command::CreateTrip { trip, name }
        }
        CommandKind::AddItem => {
            let id = args.optional_identifier("id")?;
            if !args.has("name") {
                return Err(CommandError::missing(kind.keyword(), "name"));
            }
            let mut fields = args.rest();
            for key in REQUIRED_FIELDS {
                fields.entry(key.to_string()).or_insert_with(Value::blank);
            }
            Command::AddItem { id, fields }
        }
        CommandKind::EditItem => {
            let id = args.identifier("id")?;
            let changes = args.rest();
            if changes.is_empty() {
                return Err(CommandError::NoChanges { id });
            }
            Command::EditItem { id, changes }
        }
        CommandKind::DeleteItem => {
            let id = args.identifier("id")?;
            Command::DeleteItem {
                id,
                snapshot: args.rest(),
            }
        }
        CommandKind::MoveRange => {
            let from = args.date("from")?;
            let to = args.date("to")?;
            let days = args
                .integer("days")?
                .ok_or_else(|| CommandError::missing(kind.keyword(), "days"))?;
            if days == 0 {
                return Err(CommandError::InvalidNumber {
                    key: "days".into(),
                    value: "0".into(),
                    reason: "offset must be non-zero".into(),
                });
            }
            if from > to {
                return Err(CommandError::InvalidRange {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            args.finish()?;
            Command::MoveRange { from, to, days }
        }
        CommandKind::InsertGap => {
            let date = args.date("date")?;
            args.finish()?;
            Command::InsertGap { date }
        }
        CommandKind::RemoveRange => {
            let date = args.date("date")?;
            args.finish()?;
            Command::RemoveRange { date }
        }
        CommandKind::AddCountry => {
            let name = args.nonblank("name")?;
            let code = args.optional_text("code").filter(|code| !code.is_empty());
            args.finish()?;
            Command::AddCountry { name, code }
        }
        CommandKind::RefreshCountries => {
            args.finish()?;
            Command::RefreshCountries
        }
        CommandKind::SetPreference => {
            let key = args.nonblank("key")?;
            let value = args.require("value")?;
            args.finish()?;
            Command::SetPreference { key, value }
        }
        CommandKind::Mark | CommandKind::Unmark => {
            let ids = args.identifier_list("id")?;
            args.finish()?;
            if kind == CommandKind::Mark {
                Command::Mark { ids }
            } else {
                Command::Unmark { ids }
            }
        }
        CommandKind::DeclareIntent => {
            let text = args.nonblank("text")?;
            args.finish()?;
            Command::DeclareIntent { text }
        }
        CommandKind::Undo | CommandKind::Redo => {
            let count = args.count("count")?;
            args.finish()?;
            if kind == CommandKind::Undo {
                Command::Undo { count }
            } else {
                Command::Redo { count }
            }
        }
        CommandKind::SwitchTrip => {
            let trip = args.identifier("trip")?;
            args.finish()?;
            Command::SwitchTrip { trip }
        }
        CommandKind::SwitchAiModel => {
            let name = args.nonblank("name")?;
            args.finish()?;
            Command::SwitchAiModel { name }
        }
        CommandKind::WebSearch => {
            let query = args.nonblank("query")?;
            args.finish()?;
            Command::WebSearch { query }
        }
        CommandKind::Help => {
            let topic = args.optional_text("topic").filter(|t| !t.is_empty());
            args.finish()?;
            Command::Help { topic }
        }
        CommandKind::Renormalize => {
            args.finish()?;
            Command::Renormalize
        }
    };
    Ok(command)
}

/// Validates an identifier: 1-64 of `[A-Za-z0-9_-]`.
pub fn validate_identifier(key: &str, value: &str) -> Result<(), CommandError> {
    let valid = !value.is_empty()
        && value.len() <= MAX_IDENTIFIER_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(CommandError::InvalidIdentifier {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

/// Keyed arguments with the positional value already merged in.
struct Args {
    kind: CommandKind,
    pairs: Vec<(String, Value)>,
}

impl Args {
    fn new(kind: CommandKind, raw: RawArgs) -> Result<Self, CommandError> {
        let RawArgs { positional, mut pairs } = raw;
        if let Some(value) = positional {
            let slot = kind
                .positional()
                .ok_or_else(|| CommandError::UnexpectedPositional {
                    keyword: kind.keyword().to_string(),
                })?;
            if pairs.iter().any(|(key, _)| key == slot) {
                return Err(CommandError::ConflictingArgument {
                    key: slot.to_string(),
                });
            }
            pairs.insert(0, (slot.to_string(), value));
        }
        Ok(Self { kind, pairs })
    }

    fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    fn take(&mut self, key: &str) -> Option<Value> {
        let index = self.pairs.iter().position(|(k, _)| k == key)?;
        Some(self.pairs.remove(index).1)
    }

    fn require(&mut self, key: &str) -> Result<Value, CommandError> {
        self.take(key)
            .ok_or_else(|| CommandError::missing(self.kind.keyword(), key))
    }

    fn optional_text(&mut self, key: &str) -> Option<String> {
        self.take(key).map(Value::into_text)
    }

    fn nonblank(&mut self, key: &str) -> Result<String, CommandError> {
        let text = self.require(key)?.into_text();
        if text.trim().is_empty() {
            return Err(CommandError::missing(self.kind.keyword(), key));
        }
        Ok(text)
    }

    fn identifier(&mut self, key: &str) -> Result<String, CommandError> {
        let value = self.require(key)?.into_text();
        validate_identifier(key, &value)?;
        Ok(value)
    }

    fn optional_identifier(&mut self, key: &str) -> Result<Option<String>, CommandError> {
        match self.optional_text(key) {
            Some(value) => {
                validate_identifier(key, &value)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn identifier_list(&mut self, key: &str) -> Result<Vec<String>, CommandError> {
        let raw = self.require(key)?.into_text();
        let ids: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect();
        if ids.is_empty() {
            return Err(CommandError::missing(self.kind.keyword(), key));
        }
        for id in &ids {
            validate_identifier(key, id)?;
        }
        Ok(ids)
    }

    fn date(&mut self, key: &str) -> Result<Date, CommandError> {
        let value = self.require(key)?.into_text();
        parse_iso_date(value.trim()).ok_or_else(|| CommandError::InvalidDate {
            key: key.to_string(),
            value,
        })
    }

    fn integer(&mut self, key: &str) -> Result<Option<i64>, CommandError> {
        let Some(value) = self.take(key) else {
            return Ok(None);
        };
        let text = value.into_text();
        text.trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| CommandError::InvalidNumber {
                key: key.to_string(),
                value: text.clone(),
                reason: e.to_string(),
            })
    }

    /// A positive step count, defaulting to 1.
    fn count(&mut self, key: &str) -> Result<usize, CommandError> {
        match self.integer(key)? {
            None => Ok(1),
            Some(n) if n > 0 => usize::try_from(n).map_err(|e| CommandError::InvalidNumber {
                key: key.to_string(),
                value: n.to_string(),
                reason: e.to_string(),
            }),
            Some(n) => Err(CommandError::InvalidNumber {
                key: key.to_string(),
                value: n.to_string(),
                reason: "must be a positive integer".into(),
            }),
        }
    }

    /// Remaining pairs as free-form fields.
    fn rest(self) -> Fields {
        self.pairs.into_iter().collect()
    }

    /// Rejects any argument the command did not consume.
    fn finish(self) -> Result<(), CommandError> {
        match self.pairs.into_iter().next() {
            None => Ok(()),
            Some((key, _)) => Err(CommandError::UnexpectedArgument {
                keyword: self.kind.keyword().to_string(),
                key,
            }),
        }
    }
}

/// Parses a strict `YYYY-MM-DD` date; times, offsets and other shapes are
/// rejected.
fn parse_iso_date(text: &str) -> Option<Date> {
    let bytes = text.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    text.parse::<Date>().ok()
}
