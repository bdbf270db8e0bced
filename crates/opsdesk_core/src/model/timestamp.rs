//! ISO-8601 wire format for record timestamps.
//!
//! Serializes as RFC 3339 UTC with a `Z` suffix. Clock-issued times print
//! with millisecond precision (`2024-08-12T09:30:00.000Z`); finer stored times
//! widen to micro- or nanoseconds so a document round-trips unchanged.
//! Deserialization accepts any RFC 3339 offset.

use crate::clock::Timestamp;
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Formats a timestamp in the wire representation.
pub fn format(value: &Timestamp) -> String {
    value.to_rfc3339_opts(precision(value), true)
}

fn precision(value: &Timestamp) -> SecondsFormat {
    let nanos = value.nanosecond() % 1_000_000_000;
    if nanos % 1_000_000 == 0 {
        SecondsFormat::Millis
    } else if nanos % 1_000 == 0 {
        SecondsFormat::Micros
    } else {
        SecondsFormat::Nanos
    }
}

/// Parses a wire timestamp into UTC.
pub fn parse(raw: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|value| value.with_timezone(&Utc))
}

pub fn serialize<S>(value: &Timestamp, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(value))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::{format, parse};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn format_uses_millis_and_zulu_suffix() {
        let value = Utc.with_ymd_and_hms(2024, 8, 12, 9, 30, 0).unwrap();
        assert_eq!(format(&value), "2024-08-12T09:30:00.000Z");
    }

    #[test]
    fn format_keeps_sub_millisecond_precision() {
        let base = Utc.with_ymd_and_hms(2024, 8, 12, 10, 0, 0).unwrap();
        let micros = base + Duration::microseconds(123_456);
        assert_eq!(format(&micros), "2024-08-12T10:00:00.123456Z");
        assert_eq!(parse(&format(&micros)).unwrap(), micros);

        let nanos = base + Duration::nanoseconds(1);
        assert_eq!(format(&nanos), "2024-08-12T10:00:00.000000001Z");
        assert_eq!(parse(&format(&nanos)).unwrap(), nanos);
    }

    #[test]
    fn parse_normalizes_offsets_to_utc() {
        let parsed = parse("2024-08-12T11:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 8, 12, 9, 30, 0).unwrap());
    }

    #[test]
    fn parse_rejects_non_rfc3339_text() {
        assert!(parse("yesterday").is_err());
    }
}
