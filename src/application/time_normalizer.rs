use crate::domain::errors::ParseError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

/// Formats carrying an explicit UTC offset.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%z",
];

/// Formats without an offset; taken to be in the reference timezone already.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Converts timestamps into timezone-free calendar dates.
///
/// Offset-aware timestamps are first converted into the reference timezone
/// and only then truncated, so `2024-01-06T01:30:00+05:00` is `2024-01-05` in
/// a UTC reference. Stripping the offset instead would shift dates near midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeNormalizer {
    reference: FixedOffset,
}

impl Default for TimeNormalizer {
    fn default() -> Self {
        Self::utc()
    }
}

impl TimeNormalizer {
    pub fn new(reference: FixedOffset) -> Self {
        Self { reference }
    }

    pub fn utc() -> Self {
        Self {
            reference: Utc.fix(),
        }
    }

    pub fn reference(&self) -> FixedOffset {
        self.reference
    }

    pub fn normalize(&self, timestamp: &str) -> Result<NaiveDate, ParseError> {
        let raw = timestamp.trim();

        if let Ok(aware) = DateTime::parse_from_rfc3339(raw) {
            return Ok(self.to_reference_date(aware));
        }

        for format in OFFSET_FORMATS {
            if let Ok(aware) = DateTime::parse_from_str(raw, format) {
                return Ok(self.to_reference_date(aware));
            }
        }

        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(naive.date());
            }
        }

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
                return Ok(date);
            }
        }

        Err(ParseError::Timestamp {
            input: timestamp.to_string(),
        })
    }

    fn to_reference_date(&self, aware: DateTime<FixedOffset>) -> NaiveDate {
        aware.with_timezone(&self.reference).date_naive()
    }
}
