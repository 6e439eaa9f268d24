//! Injected notion of "now".
//!
//! Every time-dependent reminder operation takes a [`Clock`] instead of reading
//! the system time itself. A clock is a snapshot: one poll cycle sees a single
//! instant, and tests pin it with [`Clock::fixed`].

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Storage format for every instant written to the database.
pub const DB_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Which wall clock the reminder reasons in. Day boundaries for the alert
/// dedup key are taken in this basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBasis {
    /// The host's local time zone, DST included.
    Local,
    Utc,
}

impl TimeBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Utc => "utc",
        }
    }
}

impl std::fmt::Display for TimeBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    basis: TimeBasis,
    now: NaiveDateTime,
}

impl Clock {
    /// Snapshot the system clock in the given basis.
    pub fn system(basis: TimeBasis) -> Self {
        let now = match basis {
            TimeBasis::Local => chrono::Local::now().naive_local(),
            TimeBasis::Utc => chrono::Utc::now().naive_utc(),
        };
        Self { basis, now }
    }

    pub fn fixed(basis: TimeBasis, now: NaiveDateTime) -> Self {
        Self { basis, now }
    }

    pub fn basis(&self) -> TimeBasis {
        self.basis
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    /// `now` truncated to midnight: zero hour, minute, second and fraction.
    pub fn start_of_day(&self) -> NaiveDateTime {
        self.now.date().and_time(NaiveTime::MIN)
    }

    /// Express an offset-bearing instant on this clock's wall clock.
    pub fn wall_clock(&self, at: DateTime<FixedOffset>) -> NaiveDateTime {
        match self.basis {
            TimeBasis::Local => at.with_timezone(&chrono::Local).naive_local(),
            TimeBasis::Utc => at.naive_utc(),
        }
    }
}

pub fn to_db_text(at: NaiveDateTime) -> String {
    at.format(DB_TIME_FORMAT).to_string()
}

pub fn from_db_text(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(text, DB_TIME_FORMAT)
}
