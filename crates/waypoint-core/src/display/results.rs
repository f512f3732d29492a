//! Display for engine results: batch outcomes, journal logs, maintenance
//! reports and AI task status.

use std::fmt;

use crate::{
    models::{BatchOutcome, JournalLog, MaintenanceReport, TripReport},
    serializer::TaskStatus,
    timeline::EntryState,
};

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for message in &self.messages {
            writeln!(f, "{message}")?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Trip '{}': {} command(s) run, head {} of {}, {} journal line(s).",
            self.trip, self.executed, self.head, self.total, self.journal_len
        )?;
        if !self.marked.is_empty() {
            writeln!(f, "Marked: {}", self.marked.join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryState::Applied => "applied",
            EntryState::Undone => "undone",
            EntryState::Discarded => "discarded",
            EntryState::Marker => "marker",
        })
    }
}

impl fmt::Display for JournalLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Journal: {}", self.trip)?;
        writeln!(f)?;
        writeln!(f, "Head {} of {} timeline command(s).", self.head, self.total)?;
        writeln!(f)?;
        for entry in &self.entries {
            writeln!(f, "{:>4}. [{}] `{}`", entry.sequence, entry.state, entry.line)?;
        }
        Ok(())
    }
}

impl fmt::Display for MaintenanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.trips.is_empty() {
            return writeln!(f, "No journals to renormalize.");
        }
        writeln!(f, "# Renormalization")?;
        for trip in &self.trips {
            writeln!(f)?;
            write!(f, "{trip}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TripReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} line(s) read, {} rewritten, {} changed, {} skipped",
            self.trip,
            self.lines,
            self.rewritten,
            self.changed,
            self.skipped.len()
        )?;
        for skipped in &self.skipped {
            writeln!(
                f,
                "  line {}: {} ({})",
                skipped.line, skipped.text, skipped.reason
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Queued => write!(f, "queued"),
            TaskStatus::Running { step } => write!(f, "running (step {})", step + 1),
            TaskStatus::Completed { executed, summary } => {
                write!(f, "completed: {executed} command(s)")?;
                if !summary.is_empty() {
                    write!(f, "\n{summary}")?;
                }
                Ok(())
            }
            TaskStatus::Failed { error } => write!(f, "failed: {error}"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}
