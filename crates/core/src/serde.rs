//! Serde helper functions for query string deserialization.
//!
//! Query strings carry every value as text, and clients often send empty
//! parameters (`?completed=&priority=`). These helpers treat empty strings as
//! None and parse the rest.

use serde::{Deserialize, Deserializer};

use crate::todo::Priority;

/// Deserialize an optional string, treating empty strings as None.
pub fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}

/// Deserialize an optional bool, treating empty strings as None.
/// Accepts: true, false, 1, 0 (case-insensitive)
pub fn deserialize_optional_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = deserialize_optional_string(deserializer)?;
    match s.as_deref().map(str::trim) {
        None => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(Some(true)),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(Some(false)),
        Some(v) => Err(serde::de::Error::custom(format!(
            "invalid boolean '{v}', expected true or false"
        ))),
    }
}

/// Deserialize an optional priority from its integer form, treating empty
/// strings as None.
pub fn deserialize_optional_priority<'de, D>(deserializer: D) -> Result<Option<Priority>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = deserialize_optional_string(deserializer)?;
    match s {
        None => Ok(None),
        Some(s) => {
            let value: i64 = s.trim().parse().map_err(|_| {
                serde::de::Error::custom(format!("invalid priority '{s}', expected an integer"))
            })?;
            Priority::try_from(value)
                .map(Some)
                .map_err(serde::de::Error::custom)
        }
    }
}
