//! Itinerary date display utilities.

use std::fmt;

use jiff::civil::Date;

/// Formats an item date as `Fri 2025-05-02`.
///
/// Items whose `date` field is blank or not a valid date show the raw text,
/// or `undated` when blank.
pub struct ItemDate<'a> {
    pub raw: &'a str,
    pub parsed: Option<Date>,
}

impl<'a> ItemDate<'a> {
    pub fn new(raw: &'a str, parsed: Option<Date>) -> Self {
        Self { raw, parsed }
    }
}

impl fmt::Display for ItemDate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parsed {
            Some(date) => write!(f, "{}", date.strftime("%a %Y-%m-%d")),
            None if self.raw.trim().is_empty() => write!(f, "undated"),
            None => write!(f, "{}", self.raw),
        }
    }
}
