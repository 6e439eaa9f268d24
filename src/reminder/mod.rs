//! Medication reminder: due-check rule, daily alert dedup, schedule store and
//! the poll cycle that ties them together.

pub mod alerts;
pub mod clock;
pub mod due;
pub mod poller;
pub mod schedule;
pub mod source;
pub mod types;
