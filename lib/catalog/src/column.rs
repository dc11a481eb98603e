//! # Column Representation
//!
//! This module provides a representation of a column in a table schema.
//! It defines the `Column` that pairs a column name with its declared
//! [`DataTypeKind`].
//!
//! ## Usage
//!
//! ```
//! use catalog::Column;
//! use ty::DataTypeKind;
//!
//! let crash_id = Column::new("CRASH_ID", DataTypeKind::Integer);
//! let zip = Column::text("DRVR_ZIP");
//! assert_eq!(crash_id.column_name(), "CRASH_ID");
//! assert_eq!(zip.column_type(), &DataTypeKind::Text);
//! ```

use getset::Getters;
use serde::{Deserialize, Serialize};
use std::fmt;
use ty::DataTypeKind;
use typed_builder::TypedBuilder;

/// Represents a column in a table.
///
/// ```ignore
/// +------------------+--------------+
/// | column_name      | column_type  |
/// +------------------+--------------+
/// | CRASH_ID         | integer      |
/// +------------------+--------------+
/// | PRSN_GNDR_ID     | text         |
/// +------------------+--------------+
/// ```
///
/// To create a new `Column`, you can use the builder pattern:
///
/// ```rust
/// use catalog::Column;
/// use ty::DataTypeKind;
///
/// let column = Column::builder()
///     .column_name("PRSN_BAC_TEST_RSLT".to_string())
///     .column_type(DataTypeKind::Double)
///     .build();
/// ```
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TypedBuilder, Getters,
)]
#[getset(get = "pub")]
pub struct Column {
    column_name: String,
    column_type: DataTypeKind,
}

impl Column {
    pub fn new(column_name: &str, column_type: DataTypeKind) -> Self {
        Column::builder()
            .column_name(column_name.to_string())
            .column_type(column_type)
            .build()
    }

    pub fn integer(column_name: &str) -> Self {
        Self::new(column_name, DataTypeKind::Integer)
    }

    pub fn double(column_name: &str) -> Self {
        Self::new(column_name, DataTypeKind::Double)
    }

    pub fn text(column_name: &str) -> Self {
        Self::new(column_name, DataTypeKind::Text)
    }

    pub fn timestamp(column_name: &str) -> Self {
        Self::new(column_name, DataTypeKind::Timestamp)
    }

    /// Returns a copy of this column under a different name.
    pub fn renamed(&self, column_name: String) -> Self {
        Column::builder()
            .column_name(column_name)
            .column_type(self.column_type)
            .build()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.column_name, self.column_type)
    }
}
