//! Trip model definition: the aggregate derived by replaying a journal.

use std::collections::BTreeMap;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::{Fields, Value};

/// Fields every item carries. They may be blank but are never absent.
pub const REQUIRED_FIELDS: [&str; 3] = ["type", "name", "date"];

/// The itinerary as reconstructed from the journal.
///
/// Never mutated in place by callers; the reducer produces a fresh model for
/// every command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripModel {
    /// Trip identifier, set by `create-trip`
    pub id: String,

    /// Display name of the trip
    pub name: String,

    /// Items in insertion order
    #[serde(default)]
    pub items: Vec<Item>,

    /// Countries visited, in order of first appearance
    #[serde(default)]
    pub countries: Vec<Country>,

    /// Traveller preferences
    #[serde(default)]
    pub preferences: BTreeMap<String, Value>,
}

impl TripModel {
    /// Looks up an item by id.
    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub(crate) fn item_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// True if an item with this id is present.
    pub fn contains_item(&self, id: &str) -> bool {
        self.item(id).is_some()
    }

    /// True before `create-trip` has been replayed.
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.items.is_empty()
    }
}

/// A single itinerary entry: a flight, a hotel night, a museum visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Stable opaque identifier
    pub id: String,

    /// Required and optional fields
    pub fields: Fields,
}

impl Item {
    /// Builds an item, filling any missing required field with a blank.
    pub fn new(id: impl Into<String>, mut fields: Fields) -> Self {
        for key in REQUIRED_FIELDS {
            fields.entry(key.to_string()).or_insert_with(Value::blank);
        }
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field rendered as text, or an empty string when absent.
    pub fn text(&self, key: &str) -> String {
        self.field(key).map(Value::to_text).unwrap_or_default()
    }

    pub fn name(&self) -> String {
        self.text("name")
    }

    pub fn kind(&self) -> String {
        self.text("type")
    }

    /// The item's date, if its `date` field holds a valid ISO date.
    pub fn date(&self) -> Option<Date> {
        self.field("date")?.as_text()?.trim().parse().ok()
    }
}

/// A country on the itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
