//! Lenient parsing of the timestamps and dates emitted by the detection
//! service.
//!
//! Timestamps arrive as RFC 3339 strings; a naive `YYYY-MM-DDTHH:MM:SS[.f]`
//! string (no offset) is read as UTC. Bill dates arrive as plain ISO dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer, de};

pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
    .ok()
    .map(|naive| naive.and_utc())
}

/// Parse a bill date; a full timestamp is truncated to its calendar date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
    .ok()
    .or_else(|| parse_datetime(s.trim()).map(|dt| dt.date_naive()))
}

/// `#[serde(with = "crate::timestamp::utc")]` for `DateTime<Utc>` fields.
pub mod utc {
  use super::*;

  pub fn serialize<S: Serializer>(
    dt: &DateTime<Utc>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&dt.to_rfc3339())
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw)
      .ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw:?}")))
  }
}
