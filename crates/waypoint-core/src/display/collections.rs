//! Collection wrapper types for displaying groups of domain objects.

use std::fmt;

/// Newtype wrapper for displaying the trips that have a journal.
///
/// The current trip, when known, is flagged in the list.
///
/// # Examples
///
/// ```rust
/// use waypoint_core::display::TripList;
///
/// let trips = TripList::new(vec!["lisbon".into(), "rome".into()]).with_current(Some("rome"));
/// let output = trips.to_string();
/// assert!(output.contains("- rome (current)"));
/// ```
pub struct TripList {
    pub trips: Vec<String>,
    pub current: Option<String>,
}

impl TripList {
    pub fn new(trips: Vec<String>) -> Self {
        Self {
            trips,
            current: None,
        }
    }

    /// Flags `current` in the output.
    pub fn with_current(mut self, current: Option<&str>) -> Self {
        self.current = current.map(str::to_string);
        self
    }
}

impl fmt::Display for TripList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.trips.is_empty() {
            return writeln!(f, "No trips found.");
        }
        writeln!(f, "# Trips")?;
        writeln!(f)?;
        for trip in &self.trips {
            if self.current.as_deref() == Some(trip.as_str()) {
                writeln!(f, "- {trip} (current)")?;
            } else {
                writeln!(f, "- {trip}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_trip_list() {
        assert_eq!(TripList::new(Vec::new()).to_string(), "No trips found.\n");
    }
}
