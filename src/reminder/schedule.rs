//! Medication schedule and dose log.
//!
//! The schedule is what `ember serve` publishes as a medication source.
//! Recording a dose appends to `medication_logs` and moves the schedule's
//! `last_taken` forward, which is what the next due-check reads.

use anyhow::{bail, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::alerts::parse_column;
use super::clock::{to_db_text, Clock};
use super::types::{MedicationLog, ScheduledMedication};

/// `last_taken` format written when a dose is recorded.
const LAST_TAKEN_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn scheduled_from_row(row: &Row<'_>) -> rusqlite::Result<ScheduledMedication> {
    let created_at: String = row.get(5)?;
    Ok(ScheduledMedication {
        id: row.get(0)?,
        name: row.get(1)?,
        dosage: row.get(2)?,
        frequency: row.get(3)?,
        last_taken: row.get(4)?,
        created_at: parse_column(5, &created_at)?,
    })
}

/// Add a medication to the schedule. Returns the stored row.
pub fn add_medication(
    conn: &Connection,
    name: &str,
    dosage: &str,
    frequency: &str,
    last_taken: Option<&str>,
    clock: &Clock,
) -> Result<ScheduledMedication> {
    for (field, value) in [("name", name), ("dosage", dosage), ("frequency", frequency)] {
        if value.trim().is_empty() {
            bail!("{field} must not be empty");
        }
    }

    let id = uuid::Uuid::now_v7().to_string();
    let last_taken = last_taken.filter(|t| !t.is_empty());
    conn.execute(
        "INSERT INTO med_schedule (id, name, dosage, frequency, last_taken, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, name, dosage, frequency, last_taken, to_db_text(clock.now())],
    )?;

    tracing::info!(id = %id, name = %name, "medication scheduled");

    Ok(ScheduledMedication {
        id,
        name: name.to_string(),
        dosage: dosage.to_string(),
        frequency: frequency.to_string(),
        last_taken: last_taken.map(str::to_string),
        created_at: clock.now(),
    })
}

/// All scheduled medications in insertion order.
pub fn list_schedule(conn: &Connection) -> Result<Vec<ScheduledMedication>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, dosage, frequency, last_taken, created_at FROM med_schedule ORDER BY created_at, id",
    )?;
    let rows = stmt
        .query_map([], scheduled_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_medication(conn: &Connection, id: &str) -> Result<Option<ScheduledMedication>> {
    let row = conn
        .query_row(
            "SELECT id, name, dosage, frequency, last_taken, created_at FROM med_schedule WHERE id = ?1",
            params![id],
            scheduled_from_row,
        )
        .optional()?;
    Ok(row)
}

/// Remove a medication from the schedule. Returns `false` if no such id.
pub fn remove_medication(conn: &Connection, id: &str) -> Result<bool> {
    let rows = conn.execute("DELETE FROM med_schedule WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

/// Record that a scheduled medication was taken now.
///
/// Returns `None` if the id is not on the schedule.
pub fn log_dose_taken(
    conn: &mut Connection,
    medication_id: &str,
    clock: &Clock,
) -> Result<Option<MedicationLog>> {
    let tx = conn.transaction()?;

    let Some(med) = get_medication(&tx, medication_id)? else {
        return Ok(None);
    };

    let now = clock.now();
    let date = clock.start_of_day();
    tx.execute(
        "INSERT INTO medication_logs (medication_id, name, timestamp, date) VALUES (?1, ?2, ?3, ?4)",
        params![med.id, med.name, to_db_text(now), to_db_text(date)],
    )?;
    let log_id = tx.last_insert_rowid();

    tx.execute(
        "UPDATE med_schedule SET last_taken = ?1 WHERE id = ?2",
        params![now.format(LAST_TAKEN_FORMAT).to_string(), med.id],
    )?;

    tx.commit()?;

    tracing::info!(medication_id = %med.id, name = %med.name, "dose recorded");

    Ok(Some(MedicationLog {
        id: log_id,
        medication_id: med.id,
        name: med.name,
        timestamp: now,
        date,
    }))
}
