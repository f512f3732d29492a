//! Operator maintenance: rewrite journals into canonical form.

use log::{info, warn};

use super::Engine;
use crate::{
    command::format,
    error::Result,
    journal::{parse_persisted, JournalStore},
    models::{MaintenanceReport, SkippedLine, TripReport},
};

/// Parallel document holding the canonical rewrite of a journal.
pub(crate) const CANONICAL_DOCUMENT: &str = "journal.canonical";
/// Parallel document holding the rewrite report.
pub(crate) const REPORT_DOCUMENT: &str = "journal.report";

impl Engine {
    /// Rewrites every trip's journal into canonical form.
    ///
    /// The result goes to `trips/<trip>/journal.canonical`, with a report in
    /// `trips/<trip>/journal.report`. The live journal is never touched, so
    /// no trip lock is taken. Unparsable lines are logged and skipped.
    pub async fn renormalize_all(&self) -> Result<MaintenanceReport> {
        let report = self
            .blocking(|journal| {
                let trips = journal
                    .trips()?
                    .iter()
                    .map(|trip| renormalize_trip(journal, trip))
                    .collect::<Result<Vec<_>>>()?;
                Ok(MaintenanceReport { trips })
            })
            .await?;
        info!(
            "renormalized {} trip(s), {} line(s) skipped",
            report.trips.len(),
            report.skipped()
        );
        Ok(report)
    }
}

fn renormalize_trip(journal: &JournalStore, trip: &str) -> Result<TripReport> {
    let lines = journal.read_lines(trip)?.unwrap_or_default();
    let mut canonical = String::new();
    let mut changed = 0;
    let mut skipped = Vec::new();

    for (index, text) in lines.iter().enumerate() {
        match parse_persisted(text) {
            Ok(command) => {
                let line = format(&command);
                if line != text.trim() {
                    changed += 1;
                }
                canonical.push_str(&line);
                canonical.push('\n');
            }
            Err(reason) => {
                warn!("trip '{trip}': skipping journal line {}: {reason}", index + 1);
                skipped.push(SkippedLine {
                    line: index + 1,
                    text: text.clone(),
                    reason,
                });
            }
        }
    }

    let report = TripReport {
        trip: trip.to_string(),
        lines: lines.len(),
        rewritten: lines.len() - skipped.len(),
        changed,
        skipped,
    };
    journal.write_document(trip, CANONICAL_DOCUMENT, &canonical)?;
    journal.write_document(trip, REPORT_DOCUMENT, &report.to_string())?;
    Ok(report)
}
