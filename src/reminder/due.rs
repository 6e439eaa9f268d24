//! Due-check evaluation.
//!
//! A medication is due when the time since `last_taken` has reached the
//! threshold of its [`FrequencyBucket`]. An unset `last_taken` is always due;
//! an unreadable one is never due and is reported as a [`TimestampError`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use super::clock::Clock;

/// `last_taken` could not be read as an ISO 8601 timestamp.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date format: {input:?}")]
pub struct TimestampError {
    pub input: String,
}

/// Threshold class derived from free-text frequency labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyBucket {
    /// Label mentions "daily": due every 24 hours.
    Daily,
    /// Label mentions "twice" (and not "daily"): due every 12 hours.
    TwiceDaily,
    /// Anything else: due every 8 hours.
    Default,
}

impl FrequencyBucket {
    /// Case-insensitive substring match. "daily" wins over "twice", so
    /// "Twice daily" lands in [`FrequencyBucket::Daily`].
    pub fn classify(frequency: &str) -> Self {
        let frequency = frequency.to_lowercase();
        if frequency.contains("daily") {
            Self::Daily
        } else if frequency.contains("twice") {
            Self::TwiceDaily
        } else {
            Self::Default
        }
    }

    pub fn threshold_hours(&self) -> i64 {
        match self {
            Self::Daily => 24,
            Self::TwiceDaily => 12,
            Self::Default => 8,
        }
    }

    pub fn threshold(&self) -> TimeDelta {
        TimeDelta::hours(self.threshold_hours())
    }
}

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO 8601 `last_taken` value onto the clock's wall clock.
///
/// Naive values are taken as already being on that wall clock; values with
/// `Z` or a `±HH:MM` offset are converted. A bare date means midnight.
pub fn parse_last_taken(text: &str, clock: &Clock) -> Result<NaiveDateTime, TimestampError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Ok(clock.wall_clock(at));
    }
    // %:z does not accept a literal Z
    let offset_text = match text.strip_suffix('Z') {
        Some(rest) => format!("{rest}+00:00"),
        None => text.to_string(),
    };
    for fmt in OFFSET_FORMATS {
        if let Ok(at) = DateTime::parse_from_str(&offset_text, fmt) {
            return Ok(clock.wall_clock(at));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(at) = NaiveDateTime::parse_from_str(text, fmt) {
            return Ok(at);
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(day.and_time(NaiveTime::MIN));
    }
    Err(TimestampError {
        input: text.to_string(),
    })
}

/// Decide whether a medication is due, surfacing unreadable timestamps.
pub fn check_due(
    last_taken: Option<&str>,
    frequency: &str,
    clock: &Clock,
) -> Result<bool, TimestampError> {
    let last_taken = match last_taken {
        None | Some("") => return Ok(true),
        Some(text) => parse_last_taken(text, clock)?,
    };

    let elapsed = clock.now() - last_taken;
    Ok(elapsed >= FrequencyBucket::classify(frequency).threshold())
}

/// Decide whether a medication is due. Unreadable timestamps fail closed:
/// they are logged and treated as not due.
pub fn is_due(last_taken: Option<&str>, frequency: &str, clock: &Clock) -> bool {
    match check_due(last_taken, frequency, clock) {
        Ok(due) => due,
        Err(e) => {
            tracing::warn!(error = %e, "treating medication as not due");
            false
        }
    }
}
