use serde::{self, Deserialize, Deserializer, Serializer};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339,
    macros::format_description,
};

/// Parses the timestamp shapes the backend and its users produce.
///
/// Accepts RFC 3339, naive ISO datetimes with or without fractional seconds
/// (taken as UTC, which is how the backend stores them), and plain
/// `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, String> {
    let value = value.trim();

    if let Ok(dt) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(dt);
    }

    // e.g. "2025-03-03T06:17:25.844847"
    if value.contains('T') && value.contains('.') {
        let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
        if let Ok(dt) = PrimitiveDateTime::parse(value, &format) {
            return Ok(dt.assume_utc());
        }
    }

    if value.contains('T') {
        let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
        if let Ok(dt) = PrimitiveDateTime::parse(value, &format) {
            return Ok(dt.assume_utc());
        }
    }

    let format = format_description!("[year]-[month]-[day]");
    Date::parse(value, &format)
        .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_utc())
        .map_err(|e| format!("Failed to parse timestamp '{value}': {e}"))
}

/// Formats a timestamp as RFC 3339 in UTC, the canonical wire representation.
pub fn format_timestamp(value: OffsetDateTime) -> Result<String, time::error::Format> {
    value.to_offset(time::UtcOffset::UTC).format(&Rfc3339)
}

// Serialization module for OffsetDateTime fields
pub mod timestamp_format {
    use super::{Deserialize, Deserializer, OffsetDateTime, Serializer, serde};

    pub fn serialize<S>(datetime: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = super::format_timestamp(*datetime).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let datetime_str = String::deserialize(deserializer)?;
        super::parse_timestamp(&datetime_str).map_err(serde::de::Error::custom)
    }
}

// Optional OffsetDateTime serialization
pub mod timestamp_format_option {
    use super::{Deserialize, Deserializer, OffsetDateTime, Serializer, serde};

    pub fn serialize<S>(datetime: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match datetime {
            Some(dt) => super::timestamp_format::serialize(dt, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) if !s.is_empty() => super::parse_timestamp(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn plain_dates_become_midnight_utc() {
        assert_eq!(
            parse_timestamp("2024-06-01").unwrap(),
            datetime!(2024-06-01 0:00 UTC)
        );
    }

    #[test]
    fn naive_datetimes_are_taken_as_utc() {
        assert_eq!(
            parse_timestamp("2024-06-01T09:30:00").unwrap(),
            datetime!(2024-06-01 9:30 UTC)
        );
        assert_eq!(
            parse_timestamp("2024-06-01T09:30:00.250").unwrap(),
            datetime!(2024-06-01 9:30 UTC) + time::Duration::milliseconds(250)
        );
    }

    #[test]
    fn offsets_are_normalized_when_formatting() {
        let parsed = parse_timestamp("2024-06-01T10:00:00+02:00").unwrap();
        assert_eq!(format_timestamp(parsed).unwrap(), "2024-06-01T08:00:00Z");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_timestamp("next tuesday").is_err());
    }
}
