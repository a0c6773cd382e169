//! Serde adapter for the `DD/MM/YYYY HH:MM:SS` modification-time layout.
//!
//! Times are written in the local zone with second precision. Reading a value
//! back resolves it against the local zone; ambiguous instants (DST fold)
//! take the earlier offset.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serializer, de};

use crate::MODIFIED_AT_FORMAT;
use crate::error::{ModelError, Result};

pub fn serialize<S>(
    value: &DateTime<Local>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&value.format(MODIFIED_AT_FORMAT))
}

pub fn deserialize<'de, D>(
    deserializer: D,
) -> std::result::Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(de::Error::custom)
}

/// Parse a wire-formatted modification time into the local zone.
pub fn parse(raw: &str) -> Result<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(raw, MODIFIED_AT_FORMAT)
        .map_err(|_| ModelError::InvalidTimestamp(raw.to_string()))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| ModelError::InvalidTimestamp(raw.to_string()))
}
