//! Timestamp decoding for Hasura responses
//!
//! Hasura renders Postgres `timestamptz` as RFC 3339, `timestamp` as a naive
//! ISO date-time and `date` as `YYYY-MM-DD`. All three decode to an
//! `OffsetDateTime` in UTC; values are always encoded back as RFC 3339.

use serde::{Deserialize, Deserializer, Serializer};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// A timestamp string that matched none of the accepted layouts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized timestamp '{0}'")]
pub struct TimestampParseError(pub String);

/// Parse a timestamp in any of the layouts Hasura emits
pub fn parse(raw: &str) -> Result<OffsetDateTime, TimestampParseError> {
    let raw = raw.trim();

    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(ts);
    }

    let naive = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    if let Ok(ts) = PrimitiveDateTime::parse(raw, naive) {
        return Ok(ts.assume_utc());
    }

    let date_only = format_description!("[year]-[month]-[day]");
    if let Ok(date) = Date::parse(raw, date_only) {
        return Ok(date.midnight().assume_utc());
    }

    Err(TimestampParseError(raw.to_string()))
}

/// Render a timestamp as RFC 3339
pub fn format(ts: OffsetDateTime) -> String {
    // RFC 3339 formatting only fails for years outside 0..=9999
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string())
}

pub fn serialize<S>(ts: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(*ts))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

/// Same layouts for nullable columns
pub mod option {
    use super::*;

    pub fn serialize<S>(ts: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match ts {
            Some(ts) => serializer.serialize_some(&super::format(*ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
