//! Alert persistence and same-day deduplication.
//!
//! [`record_alert_once`] is the write path. The lookup and the insert run in
//! one transaction, and the unique `(name, date)` index added by migration v2
//! turns a lost race into a no-op instead of a second row.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::clock::{from_db_text, to_db_text, Clock};
use super::types::Alert;

/// Display text stored on every alert.
pub fn alert_message(name: &str, dosage: &str) -> String {
    format!("{name} ({dosage}) is due!")
}

/// Outcome of [`record_alert_once`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    /// No alert existed for the day; this one was written.
    Created(Alert),
    /// An alert for the same `(name, date)` already existed and was left alone.
    AlreadyAlerted(Alert),
}

impl AlertOutcome {
    pub fn alert(&self) -> &Alert {
        match self {
            Self::Created(a) | Self::AlreadyAlerted(a) => a,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

fn alert_from_row(row: &Row<'_>) -> rusqlite::Result<Alert> {
    let timestamp: String = row.get(3)?;
    let date: String = row.get(4)?;
    Ok(Alert {
        id: row.get(0)?,
        name: row.get(1)?,
        message: row.get(2)?,
        timestamp: parse_column(3, &timestamp)?,
        date: parse_column(4, &date)?,
    })
}

pub(crate) fn parse_column(idx: usize, text: &str) -> rusqlite::Result<chrono::NaiveDateTime> {
    from_db_text(text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Look up the alert for `name` on the day starting at `date`.
pub fn find_alert(
    conn: &Connection,
    name: &str,
    date: chrono::NaiveDateTime,
) -> Result<Option<Alert>> {
    let alert = conn
        .query_row(
            "SELECT id, name, message, timestamp, date FROM alerts WHERE name = ?1 AND date = ?2",
            params![name, to_db_text(date)],
            alert_from_row,
        )
        .optional()?;
    Ok(alert)
}

/// Write an alert for `name` unless one already exists for the clock's day.
pub fn record_alert_once(
    conn: &mut Connection,
    name: &str,
    message: &str,
    clock: &Clock,
) -> Result<AlertOutcome> {
    let date = clock.start_of_day();
    let tx = conn.transaction()?;

    if let Some(existing) = find_alert(&tx, name, date)? {
        return Ok(AlertOutcome::AlreadyAlerted(existing));
    }

    let inserted = tx.execute(
        "INSERT OR IGNORE INTO alerts (name, message, timestamp, date) VALUES (?1, ?2, ?3, ?4)",
        params![name, message, to_db_text(clock.now()), to_db_text(date)],
    )?;

    let outcome = if inserted == 0 {
        let existing = find_alert(&tx, name, date)?
            .context("alert insert ignored but no existing alert found")?;
        AlertOutcome::AlreadyAlerted(existing)
    } else {
        AlertOutcome::Created(Alert {
            id: tx.last_insert_rowid(),
            name: name.to_string(),
            message: message.to_string(),
            timestamp: clock.now(),
            date,
        })
    };

    tx.commit()?;
    Ok(outcome)
}

/// Most recent alerts, newest first.
pub fn recent_alerts(conn: &Connection, limit: usize) -> Result<Vec<Alert>> {
    // SQLite reads a negative LIMIT as unlimited
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn.prepare(
        "SELECT id, name, message, timestamp, date FROM alerts ORDER BY timestamp DESC, id DESC LIMIT ?1",
    )?;
    let alerts = stmt
        .query_map(params![limit], alert_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(alerts)
}
