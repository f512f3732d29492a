//! Typed argument and field values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A value carried by a command argument or stored in an item field.
///
/// The variant records how the value was written: quoted text, a bare
/// decimal number, or a bare boolean. Numbers keep their literal text so
/// canonical output reproduces them exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Text(String),
    Number(String),
    Bool(bool),
}

/// Item fields and edit changes, keyed by field name.
pub type Fields = BTreeMap<String, Value>;

impl Value {
    /// An empty text value, which is how a field is cleared.
    pub fn blank() -> Self {
        Value::Text(String::new())
    }

    /// Borrow the value as text if it is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Number(_) | Value::Bool(_) => None,
        }
    }

    /// True for an empty text value.
    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Text(s) if s.is_empty())
    }

    /// The value rendered as plain text, without quoting.
    pub fn to_text(&self) -> String {
        match self {
            Value::Text(s) | Value::Number(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
        }
    }

    /// Consume the value, returning its plain text.
    pub fn into_text(self) -> String {
        match self {
            Value::Text(s) | Value::Number(s) => s,
            Value::Bool(b) => b.to_string(),
        }
    }

    /// Classify a bare (unquoted) token.
    pub fn from_bare(token: &str) -> Self {
        match token {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ if is_decimal(token) => Value::Number(token.to_string()),
            _ => Value::Text(token.to_string()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// `-?digits(.digits)?`
fn is_decimal(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    let (int, frac) = match digits.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int) && frac.map_or(true, all_digits)
}
