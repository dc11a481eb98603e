//! # Type System
//!
//! Encapsulates the data types a crash table column can declare: integers,
//! doubles, text and timestamps, plus the `Null` marker every column admits.
//!
//! Example Usage:
//!
//! ```
//! use ty::{DataType, DataTypeKind};
//!
//! let count = DataType::Integer(42);
//! let state = DataType::Text("Texas".to_string());
//! assert_eq!(count.kind(), Some(DataTypeKind::Integer));
//! assert_eq!(DataType::Null.kind(), None);
//! ```
//!
//! ## Coercion:
//!
//! Raw text read from CSV files is coerced into the declared column type with
//! [`DataType::parse_as`]. Values that do not parse are reported as a
//! [`TypeError`] so ingestion can map them to `Null`.
//!
//! ## Serialization/Deserialization:
//!
//! DataTypes derive serde so typed rows can be dumped for debugging and
//! fixtures.

pub mod value;
pub use value::*;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use core::fmt;
use serde::{Deserialize, Serialize};

/// Timestamp formats tried, in order, when no explicit list is configured.
pub const DEFAULT_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
];

/// Time-of-day formats. A bare time is anchored to the UNIX epoch date.
const TIME_OF_DAY_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M %p"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeError {
    IncompatibleType { expected: String, found: String },
    InvalidCast { from: String, to: String },
    OverflowError { data_type: String },
}

impl std::fmt::Display for TypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TypeError::IncompatibleType { expected, found } => {
                write!(f, "Expected type {}, but found {}", expected, found)
            }
            TypeError::InvalidCast { from, to } => write!(f, "Cannot cast from {} to {}", from, to),
            TypeError::OverflowError { data_type } => write!(f, "Overflow error for {}", data_type),
        }
    }
}

impl std::error::Error for TypeError {}

/// The declared type of a column.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataTypeKind {
    #[default]
    Integer,
    Double,
    Text,
    Timestamp,
}

impl DataTypeKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataTypeKind::Integer | DataTypeKind::Double)
    }
}

impl fmt::Display for DataTypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataTypeKind::Integer => write!(f, "INTEGER"),
            DataTypeKind::Double => write!(f, "DOUBLE"),
            DataTypeKind::Text => write!(f, "TEXT"),
            DataTypeKind::Timestamp => write!(f, "TIMESTAMP"),
        }
    }
}

/// A single typed cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DataType {
    Null,
    Integer(i64),
    Double(f64),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl DataType {
    /// Parses raw text into the given kind. Leading and trailing whitespace is
    /// ignored. Empty input is `Null`, not an error.
    pub fn parse_as(
        raw: &str,
        target_type: DataTypeKind,
        timestamp_formats: &[String],
    ) -> Result<DataType, TypeError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(DataType::Null);
        }

        let invalid = || TypeError::InvalidCast {
            from: "TEXT".to_string(),
            to: target_type.to_string(),
        };

        match target_type {
            DataTypeKind::Text => Ok(DataType::Text(raw.to_string())),
            DataTypeKind::Integer => match raw.parse::<i64>() {
                Ok(val) => Ok(DataType::Integer(val)),
                Err(_) => {
                    // Integral floats such as "3.0" are accepted; "3.5" is not.
                    let val = raw.parse::<f64>().map_err(|_| invalid())?;
                    if val.fract() != 0.0 || !val.is_finite() {
                        return Err(invalid());
                    }
                    // i64::MAX as f64 rounds up to 2^63, which does not fit.
                    if val < i64::MIN as f64 || val >= i64::MAX as f64 {
                        return Err(TypeError::OverflowError {
                            data_type: target_type.to_string(),
                        });
                    }
                    Ok(DataType::Integer(val as i64))
                }
            },
            DataTypeKind::Double => raw
                .parse::<f64>()
                .map(DataType::Double)
                .map_err(|_| invalid()),
            DataTypeKind::Timestamp => {
                let parsed = if timestamp_formats.is_empty() {
                    parse_timestamp(raw, DEFAULT_TIMESTAMP_FORMATS.iter().copied())
                } else {
                    parse_timestamp(raw, timestamp_formats.iter().map(String::as_str))
                };
                parsed.map(DataType::Timestamp).ok_or_else(invalid)
            }
        }
    }

    /// Coerces a value to the target kind. Only lossless numeric widening and
    /// rendering to text are supported.
    pub fn coerce_to(&self, target_type: DataTypeKind) -> Result<DataType, TypeError> {
        match (self, target_type) {
            (DataType::Null, _) => Ok(DataType::Null),
            (DataType::Integer(_), DataTypeKind::Integer)
            | (DataType::Double(_), DataTypeKind::Double)
            | (DataType::Text(_), DataTypeKind::Text)
            | (DataType::Timestamp(_), DataTypeKind::Timestamp) => Ok(self.clone()),
            (DataType::Integer(val), DataTypeKind::Double) => Ok(DataType::Double(*val as f64)),
            (DataType::Text(val), kind) => DataType::parse_as(val, kind, &[]),
            (val, DataTypeKind::Text) => Ok(DataType::Text(val.to_string())),
            (val, kind) => Err(TypeError::IncompatibleType {
                expected: kind.to_string(),
                found: val.kind_name(),
            }),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataType::Null)
    }

    /// The kind of a non-null value, `None` for `Null`.
    pub fn kind(&self) -> Option<DataTypeKind> {
        match self {
            DataType::Null => None,
            DataType::Integer(_) => Some(DataTypeKind::Integer),
            DataType::Double(_) => Some(DataTypeKind::Double),
            DataType::Text(_) => Some(DataTypeKind::Text),
            DataType::Timestamp(_) => Some(DataTypeKind::Timestamp),
        }
    }

    pub fn kind_name(&self) -> String {
        match self.kind() {
            Some(kind) => kind.to_string(),
            None => "NULL".to_string(),
        }
    }
}

fn parse_timestamp<'a>(
    raw: &str,
    formats: impl Iterator<Item = &'a str>,
) -> Option<NaiveDateTime> {
    for format in formats {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }

    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    TIME_OF_DAY_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
        .map(|time| epoch.and_time(time))
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Null => write!(f, "NULL"),
            DataType::Integer(val) => write!(f, "{}", val),
            DataType::Double(val) => write!(f, "{}", val),
            DataType::Text(val) => write!(f, "{}", val),
            DataType::Timestamp(val) => write!(f, "{}", val.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}
