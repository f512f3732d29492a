//! `/help` text.

use std::fmt;

use crate::command::CommandKind;

/// Help for every command, or for one command when a topic is given.
///
/// Topics accept aliases and an optional leading slash.
pub struct HelpText<'a> {
    topic: Option<&'a str>,
}

impl<'a> HelpText<'a> {
    pub fn new(topic: Option<&'a str>) -> Self {
        Self { topic }
    }
}

impl fmt::Display for HelpText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(topic) = self.topic.map(str::trim).filter(|t| !t.is_empty()) else {
            writeln!(f, "Commands:")?;
            for kind in CommandKind::all() {
                writeln!(f, "  {}", kind.usage())?;
            }
            return write!(f, "Item ids are shown in the itinerary. Dates are YYYY-MM-DD.");
        };

        match CommandKind::from_keyword(topic.trim_start_matches('/')) {
            Some(kind) => write!(f, "{}", kind.usage()),
            None => write!(f, "No help for '{topic}'. Try /help for a list of commands."),
        }
    }
}
