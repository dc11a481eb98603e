//! # Values (and their operations)
//!
//! This module provides a [`Value`] which represents a wrapped [`DataType`].
//!
//! A [`Value`] has two notions of comparison, and the distinction matters:
//!
//! - **Identity** (`Eq`, `Hash`, `Ord`): `Null` equals `Null` and sorts after
//!   every non-null value. Grouping, distinct and sorting use identity.
//! - **SQL semantics** ([`Value::sql_eq`], [`Value::sql_cmp`]): any comparison
//!   involving `Null` is unknown (`None`). Predicates and join keys use SQL
//!   semantics, so `Null` never matches anything, not even another `Null`.

use crate::{DataType, DataTypeKind, TypeError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};
use tracing::warn;

/// Represents a value in a table cell.
///
/// # Examples
///
/// ```rust
/// use ty::Value;
///
/// let male = Value::from("MALE");
/// assert_eq!(male.sql_eq(&Value::from("MALE")), Some(true));
///
/// // Null is unknown under SQL equality, but groups with itself.
/// assert_eq!(Value::null().sql_eq(&Value::null()), None);
/// assert_eq!(Value::null(), Value::null());
/// ```
///
/// ## String operations:
///
/// ```
/// use ty::Value;
///
/// let factor = Value::from("UNDER INFLUENCE - ALCOHOL");
/// assert_eq!(factor.lower().contains("alcohol"), Some(true));
/// assert_eq!(Value::null().contains("alcohol"), None);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Value {
    data: DataType,
}

impl Value {
    /// Creates a new [`Value`] from the given [`DataType`].
    pub fn new(data: DataType) -> Self {
        Self { data }
    }

    pub fn null() -> Self {
        Self::new(DataType::Null)
    }

    pub fn data(&self) -> &DataType {
        &self.data
    }

    /// Determines if the [`Value`] is a `Null`.
    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }

    pub fn kind(&self) -> Option<DataTypeKind> {
        self.data.kind()
    }

    /// Coerces the [`Value`] to a specified [`DataTypeKind`], returning a [`TypeError`] on failure.
    pub fn coerce_to(&self, target_type: DataTypeKind) -> Result<Self, TypeError> {
        self.data.coerce_to(target_type).map(Value::new)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.data {
            DataType::Integer(val) => Some(val),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.data {
            DataType::Integer(val) => Some(val as f64),
            DataType::Double(val) => Some(val),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            DataType::Text(val) => Some(val),
            _ => None,
        }
    }

    // -- SQL comparison --

    /// SQL equality. `None` if either side is `Null`. Integers and doubles
    /// compare numerically; other mismatched kinds are never equal.
    pub fn sql_eq(&self, other: &Self) -> Option<bool> {
        self.sql_cmp(other)
            .map(|ordering| ordering == Ordering::Equal)
            .or_else(|| {
                if self.is_null() || other.is_null() {
                    None
                } else {
                    Some(false)
                }
            })
    }

    /// SQL ordering. `None` if either side is `Null` or the kinds are not
    /// comparable.
    pub fn sql_cmp(&self, other: &Self) -> Option<Ordering> {
        match (&self.data, &other.data) {
            (DataType::Integer(a), DataType::Integer(b)) => Some(a.cmp(b)),
            (DataType::Integer(a), DataType::Double(b)) => (*a as f64).partial_cmp(b),
            (DataType::Double(a), DataType::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (DataType::Double(a), DataType::Double(b)) => a.partial_cmp(b),
            (DataType::Text(a), DataType::Text(b)) => Some(a.cmp(b)),
            (DataType::Timestamp(a), DataType::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    // -- String operations --

    /// Lower-cases a text [`Value`]. `Null` stays `Null`; other kinds emit a
    /// warning and yield `Null`.
    pub fn lower(&self) -> Self {
        match &self.data {
            DataType::Text(text) => Value::new(DataType::Text(text.to_lowercase())),
            DataType::Null => Value::null(),
            _ => {
                warn!("Lower operation called on a non-text value");
                Value::null()
            }
        }
    }

    /// Case-sensitive substring test. `None` for `Null` or non-text values.
    pub fn contains(&self, needle: &str) -> Option<bool> {
        match &self.data {
            DataType::Text(text) => Some(text.contains(needle)),
            DataType::Null => None,
            _ => {
                warn!("Contains operation called on a non-text value");
                None
            }
        }
    }

    // -- Arithmetic --

    /// Adds two numeric values. Integer overflow is an error; any double
    /// operand makes the result a double.
    pub fn checked_add(&self, other: &Self) -> Result<Self, TypeError> {
        match (&self.data, &other.data) {
            (DataType::Integer(a), DataType::Integer(b)) => a
                .checked_add(*b)
                .map(|sum| Value::new(DataType::Integer(sum)))
                .ok_or(TypeError::OverflowError {
                    data_type: DataTypeKind::Integer.to_string(),
                }),
            (DataType::Integer(a), DataType::Double(b)) => {
                Ok(Value::new(DataType::Double(*a as f64 + b)))
            }
            (DataType::Double(a), DataType::Integer(b)) => {
                Ok(Value::new(DataType::Double(a + *b as f64)))
            }
            (DataType::Double(a), DataType::Double(b)) => Ok(Value::new(DataType::Double(a + b))),
            (a, b) => Err(TypeError::IncompatibleType {
                expected: "numeric".to_string(),
                found: format!("{} + {}", a.kind_name(), b.kind_name()),
            }),
        }
    }

    /// Position of the kind in the identity ordering. Numbers share a rank so
    /// integers and doubles interleave by magnitude.
    fn kind_rank(&self) -> u8 {
        match self.data {
            DataType::Integer(_) | DataType::Double(_) => 0,
            DataType::Text(_) => 1,
            DataType::Timestamp(_) => 2,
            DataType::Null => 3,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.data, &other.data) {
            (DataType::Integer(a), DataType::Integer(b)) => a.cmp(b),
            (DataType::Double(a), DataType::Double(b)) => a.total_cmp(b),
            // Numerically equal integers sort before doubles to stay consistent with Eq.
            (DataType::Integer(a), DataType::Double(b)) => {
                (*a as f64).total_cmp(b).then(Ordering::Less)
            }
            (DataType::Double(a), DataType::Integer(b)) => {
                a.total_cmp(&(*b as f64)).then(Ordering::Greater)
            }
            (DataType::Text(a), DataType::Text(b)) => a.cmp(b),
            (DataType::Timestamp(a), DataType::Timestamp(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.data).hash(state);
        match &self.data {
            DataType::Null => {}
            DataType::Integer(val) => val.hash(state),
            DataType::Double(val) => val.to_bits().hash(state),
            DataType::Text(val) => val.hash(state),
            DataType::Timestamp(val) => val.hash(state),
        }
    }
}

impl From<DataType> for Value {
    fn from(data: DataType) -> Self {
        Value::new(data)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::new(DataType::Integer(val))
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::new(DataType::Double(val))
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::new(DataType::Text(val.to_string()))
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::new(DataType::Text(val))
    }
}

impl From<NaiveDateTime> for Value {
    fn from(val: NaiveDateTime) -> Self {
        Value::new(DataType::Timestamp(val))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(val: Option<T>) -> Self {
        val.map(Into::into).unwrap_or_else(Value::null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data)
    }
}
