//! Reminder record types.
//!
//! [`Medication`] is what a medication source publishes, [`ScheduledMedication`]
//! is the locally stored schedule entry behind `ember serve`, [`Alert`] and
//! [`MedicationLog`] are the owned records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A medication as published by the medication source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    /// Unique per reminder cycle; half of the alert dedup key.
    pub name: String,
    pub dosage: String,
    /// Free text, classified by [`crate::reminder::due::FrequencyBucket`].
    pub frequency: String,
    /// ISO 8601 text, `None` when the medication has never been taken.
    #[serde(default)]
    pub last_taken: Option<String>,
}

/// A medication schedule row, matching the `med_schedule` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledMedication {
    /// UUID v7 primary key.
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub last_taken: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<ScheduledMedication> for Medication {
    fn from(s: ScheduledMedication) -> Self {
        Self {
            name: s.name,
            dosage: s.dosage,
            frequency: s.frequency,
            last_taken: s.last_taken,
        }
    }
}

/// A due-medication alert, matching the `alerts` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub name: String,
    /// `"<name> (<dosage>) is due!"`
    pub message: String,
    /// When the alert was written.
    pub timestamp: NaiveDateTime,
    /// `timestamp` truncated to the start of its day.
    pub date: NaiveDateTime,
}

/// A recorded dose, matching the `medication_logs` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationLog {
    pub id: i64,
    pub medication_id: String,
    pub name: String,
    pub timestamp: NaiveDateTime,
    pub date: NaiveDateTime,
}
