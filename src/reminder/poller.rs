//! One reminder cycle: fetch → due-check → dedup → persist.

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

use super::alerts::{alert_message, record_alert_once, AlertOutcome};
use super::clock::Clock;
use super::due::check_due;
use super::source::MedicationSource;
use super::types::Alert;

/// Summary of a poll cycle.
#[derive(Debug, Default, Serialize)]
pub struct PollReport {
    /// Medications returned by the source.
    pub checked: usize,
    /// Medications judged due.
    pub due: usize,
    /// Alerts written this cycle.
    pub created: Vec<Alert>,
    /// Due medications that already had an alert today.
    pub already_alerted: usize,
    /// Medications whose `last_taken` could not be read, with the bad value.
    pub malformed: Vec<(String, String)>,
}

/// Run one reminder cycle.
///
/// A source failure aborts before anything is written. Storage failures
/// propagate as errors.
pub async fn check_and_alert<S: MedicationSource>(
    conn: &mut Connection,
    source: &S,
    clock: &Clock,
) -> Result<PollReport> {
    tracing::info!(source = %source.describe(), now = %clock.now(), "poll cycle started");

    let meds = source
        .fetch_medications()
        .await
        .context("failed to fetch medication list")?;

    let mut report = PollReport {
        checked: meds.len(),
        ..Default::default()
    };

    for med in &meds {
        let due = match check_due(med.last_taken.as_deref(), &med.frequency, clock) {
            Ok(due) => due,
            Err(e) => {
                tracing::warn!(name = %med.name, error = %e, "treating medication as not due");
                report.malformed.push((med.name.clone(), e.input));
                false
            }
        };
        if !due {
            continue;
        }
        report.due += 1;

        let message = alert_message(&med.name, &med.dosage);
        match record_alert_once(conn, &med.name, &message, clock)? {
            AlertOutcome::Created(alert) => {
                tracing::info!(name = %alert.name, message = %alert.message, "alert logged");
                report.created.push(alert);
            }
            AlertOutcome::AlreadyAlerted(existing) => {
                tracing::debug!(name = %existing.name, id = existing.id, "already alerted today");
                report.already_alerted += 1;
            }
        }
    }

    tracing::info!(
        checked = report.checked,
        due = report.due,
        created = report.created.len(),
        already_alerted = report.already_alerted,
        malformed = report.malformed.len(),
        "poll cycle finished"
    );

    Ok(report)
}
