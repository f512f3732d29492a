//! Display implementations for trip models.
//!
//! The trip renders as a markdown document: a heading, then items in
//! insertion order, then countries and preferences when present.

use std::fmt;

use super::dates::ItemDate;
use crate::models::{Country, Item, TripModel, Value, REQUIRED_FIELDS};

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(text) | Value::Number(text) => write!(f, "{text}"),
            Value::Bool(flag) => write!(f, "{flag}"),
        }
    }
}

impl fmt::Display for TripModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            writeln!(f, "# {}", self.id)?;
        } else {
            writeln!(f, "# {}", self.name)?;
            writeln!(f)?;
            writeln!(f, "- Trip: {}", self.id)?;
        }

        if self.items.is_empty() {
            writeln!(f, "\nNo items in this trip.")?;
        } else {
            writeln!(f, "\n## Items")?;
            writeln!(f)?;
            for item in &self.items {
                write!(f, "{item}")?;
            }
        }

        if !self.countries.is_empty() {
            writeln!(f, "\n## Countries")?;
            writeln!(f)?;
            for country in &self.countries {
                writeln!(f, "- {country}")?;
            }
        }

        if !self.preferences.is_empty() {
            writeln!(f, "\n## Preferences")?;
            writeln!(f)?;
            for (key, value) in &self.preferences {
                writeln!(f, "- {key}: {value}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        let kind = self.kind();
        write!(
            f,
            "- **{}** `{}` {}",
            if name.is_empty() { "(unnamed)" } else { &name },
            self.id,
            ItemDate::new(&self.text("date"), self.date())
        )?;
        if !kind.is_empty() {
            write!(f, " · {kind}")?;
        }
        writeln!(f)?;

        for (key, value) in &self.fields {
            if REQUIRED_FIELDS.contains(&key.as_str()) || value.is_blank() {
                continue;
            }
            writeln!(f, "  - {key}: {value}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
