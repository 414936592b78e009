//! Record timestamps.
//!
//! Every record directory is named by its creation time in a single fixed-width
//! format, so lexical order of directory names equals chronological order.
//! The same format is used for the `timestamp` field of the metadata file.

use std::fmt;
use std::str::FromStr;

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

/// `YYYY-MM-DD-hh-mm-ss`, UTC, second resolution.
pub const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]-[hour]-[minute]-[second]");

/// Creation time of a revision record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(PrimitiveDateTime);

/// Returned when a string is not a record timestamp.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a record timestamp (expected YYYY-MM-DD-hh-mm-ss)")]
pub struct TimestampParseError(pub String);

impl Timestamp {
    /// The current UTC time truncated to whole seconds.
    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        let now = now.replace_nanosecond(0).unwrap_or(now);
        Timestamp(PrimitiveDateTime::new(now.date(), now.time()))
    }

    /// Parse a record timestamp. Only the exact fixed-width form is accepted.
    pub fn parse(s: &str) -> Result<Self, TimestampParseError> {
        let parsed = PrimitiveDateTime::parse(s, TIMESTAMP_FORMAT)
            .map_err(|_| TimestampParseError(s.to_string()))?;
        let ts = Timestamp(parsed);
        // Years outside 0000..=9999 would break fixed width.
        if ts.to_string() != s {
            return Err(TimestampParseError(s.to_string()));
        }
        Ok(ts)
    }

    /// Lenient parse for display purposes: anything unparseable becomes `None`.
    pub fn parse_for_display(s: &str) -> Option<Self> {
        match Self::parse(s) {
            Ok(ts) => Some(ts),
            Err(e) => {
                tracing::trace!("could not parse date: {}", e);
                None
            }
        }
    }

    /// The next whole second, or `None` on calendar overflow.
    pub fn next_second(self) -> Option<Self> {
        self.0.checked_add(Duration::SECOND).map(Timestamp)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(TIMESTAMP_FORMAT) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

impl FromStr for Timestamp {
    type Err = TimestampParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timestamp::parse(s)
    }
}

impl serde::Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse(&s).map_err(serde::de::Error::custom)
    }
}
