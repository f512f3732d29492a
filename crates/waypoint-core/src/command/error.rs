//! Errors raised while parsing or validating command text.

use thiserror::Error;

/// A command line was rejected before anything was executed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("commands must start with '/': {input}")]
    MissingSlash { input: String },

    #[error("empty command")]
    EmptyCommand,

    #[error("unknown command '/{keyword}' (try /help)")]
    UnknownKeyword { keyword: String },

    #[error("unterminated quoted value")]
    UnterminatedQuote,

    #[error("unsupported escape '\\{escape}' in quoted value")]
    InvalidEscape { escape: char },

    #[error("invalid argument name '{key}'")]
    InvalidKey { key: String },

    #[error("argument '{key}' given more than once")]
    DuplicateKey { key: String },

    #[error("argument '{key}' has no value")]
    MissingValue { key: String },

    #[error("bare value '{value}' may not contain '=' or '\"'; quote it")]
    InvalidBareValue { value: String },

    #[error("/{keyword} does not take a positional value")]
    UnexpectedPositional { keyword: String },

    #[error("positional value must come before key=value arguments")]
    MisplacedPositional,

    #[error("unexpected extra value '{value}'; quote values that contain spaces")]
    ExtraPositional { value: String },

    #[error("expected whitespace after quoted value \"{value}\"")]
    MissingSeparator { value: String },

    #[error("'{key}' given both positionally and as {key}=")]
    ConflictingArgument { key: String },

    #[error("/{keyword} does not accept argument '{key}'")]
    UnexpectedArgument { keyword: String, key: String },

    #[error("/{keyword} requires '{key}'")]
    MissingArgument { keyword: String, key: String },

    #[error("'{value}' is not a valid {key}: use 1-64 letters, digits, '-' or '_'")]
    InvalidIdentifier { key: String, value: String },

    #[error("'{value}' is not a valid date for '{key}': use YYYY-MM-DD")]
    InvalidDate { key: String, value: String },

    #[error("'{value}' is not valid for '{key}': {reason}")]
    InvalidNumber {
        key: String,
        value: String,
        reason: String,
    },

    #[error("range start {from} is after range end {to}")]
    InvalidRange { from: String, to: String },

    #[error("/edit {id} requires at least one field change")]
    NoChanges { id: String },

    #[error("{reason}")]
    InvalidBatch { reason: String },

    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<CommandError>,
    },
}

impl CommandError {
    pub(crate) fn missing(keyword: &str, key: &str) -> Self {
        Self::MissingArgument {
            keyword: keyword.to_string(),
            key: key.to_string(),
        }
    }

    pub(crate) fn at_line(self, line: usize) -> Self {
        Self::AtLine {
            line,
            source: Box::new(self),
        }
    }
}
