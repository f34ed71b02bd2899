//! Release date type with the `DD.MM.YYYY` wire format
//!
//! Dates are held as a calendar date internally, rendered as `DD.MM.YYYY`
//! in JSON, and stored as ISO `YYYY-MM-DD` in the database.

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// chrono format string for the wire representation
pub const RELEASE_DATE_FORMAT: &str = "%d.%m.%Y";

/// Error returned when a string is not a valid `DD.MM.YYYY` date
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid release date '{input}': expected format DD.MM.YYYY")]
pub struct ReleaseDateError {
    pub input: String,
}

/// A song release date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReleaseDate(NaiveDate);

impl ReleaseDate {
    /// Build from year/month/day, `None` if the date does not exist
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for ReleaseDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for ReleaseDate {
    type Err = ReleaseDateError;

    /// Strict parse: exactly `DD.MM.YYYY` and a real calendar date.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ReleaseDateError {
            input: s.to_string(),
        };

        // chrono accepts single-digit fields, the wire format does not
        let bytes = s.as_bytes();
        let shape_ok = bytes.len() == 10
            && bytes[2] == b'.'
            && bytes[5] == b'.'
            && bytes
                .iter()
                .enumerate()
                .all(|(i, b)| i == 2 || i == 5 || b.is_ascii_digit());
        if !shape_ok {
            return Err(err());
        }

        NaiveDate::parse_from_str(s, RELEASE_DATE_FORMAT)
            .map(Self)
            .map_err(|_| err())
    }
}

impl fmt::Display for ReleaseDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(RELEASE_DATE_FORMAT))
    }
}

impl Serialize for ReleaseDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReleaseDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Serde adapter for `Option<ReleaseDate>` fields.
///
/// An unknown date is written as `""`. On input, a missing field, `null`
/// and `""` all read as `None`; anything else must be a valid date.
pub mod optional {
    use super::ReleaseDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<ReleaseDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.collect_str(date),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ReleaseDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => s.parse().map(Some).map_err(de::Error::custom),
        }
    }
}
