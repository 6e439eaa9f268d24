pub mod chat;
pub mod dashboard;
pub mod doctor;
pub mod meds;
pub mod poll;

use chrono::NaiveDateTime;

/// `[Jan 05 14:30]`-style stamp used in terminal listings.
pub(crate) fn short_stamp(at: NaiveDateTime) -> String {
    at.format("%b %d %H:%M").to_string()
}
