use std::sync::Arc;

use crate::Column;
use getset::Getters;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, trace};

/// A reference-counted [`Schema`] handle that can be shared across threads.
pub type SchemaRef = Arc<Schema>;

/// [`Schema`] is the ordered list of columns a table declares.
///
/// Column names are unique within a schema; lookups are by name and return
/// the positional index rows are laid out by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Serialize, Deserialize)]
#[getset(get = "pub")]
pub struct Schema {
    columns: Vec<Column>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Column index {0} out of bounds")]
    ColumnIndexOutOfBounds(usize),
    #[error("Column name not found: {0}")]
    ColumnNameNotFound(String),
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
    #[error("Column name must not be empty")]
    EmptyColumnName,
}

impl Schema {
    /// Constructs a new [`Schema`] from a given set of columns, rejecting
    /// empty and duplicate column names.
    pub fn new(columns: Vec<Column>) -> Result<Self, SchemaError> {
        for (index, column) in columns.iter().enumerate() {
            if column.column_name().is_empty() {
                return Err(SchemaError::EmptyColumnName);
            }
            if columns[..index]
                .iter()
                .any(|other| other.column_name() == column.column_name())
            {
                error!(column = %column.column_name(), "Duplicate column in schema");
                return Err(SchemaError::DuplicateColumn(column.column_name().clone()));
            }
        }

        trace!("Schema created with {} columns", columns.len());
        Ok(Self { columns })
    }

    /// Creates a copy of the schema restricted to the given column indices,
    /// in the given order.
    pub fn copy_schema(schema: &Schema, attrs: &[usize]) -> Result<Self, SchemaError> {
        let mut cols = Vec::with_capacity(attrs.len());
        for &i in attrs {
            match schema.columns.get(i) {
                Some(column) => cols.push(column.clone()),
                None => {
                    error!("Column index {} is out of bounds", i);
                    return Err(SchemaError::ColumnIndexOutOfBounds(i));
                }
            }
        }

        trace!("Schema copied with {} columns", cols.len());
        Self::new(cols)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get_column(&self, col_idx: usize) -> Result<&Column, SchemaError> {
        self.columns
            .get(col_idx)
            .ok_or(SchemaError::ColumnIndexOutOfBounds(col_idx))
    }

    pub fn get_col_idx(&self, col_name: &str) -> Result<usize, SchemaError> {
        self.columns
            .iter()
            .position(|col| col.column_name() == col_name)
            .ok_or_else(|| SchemaError::ColumnNameNotFound(col_name.to_string()))
    }

    /// Resolves several column names at once.
    pub fn get_col_indices<S: AsRef<str>>(&self, col_names: &[S]) -> Result<Vec<usize>, SchemaError> {
        col_names
            .iter()
            .map(|name| self.get_col_idx(name.as_ref()))
            .collect()
    }

    pub fn contains(&self, col_name: &str) -> bool {
        self.columns.iter().any(|col| col.column_name() == col_name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|col| col.column_name().as_str())
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let columns = self
            .columns
            .iter()
            .map(|col| col.to_string())
            .collect::<Vec<_>>();
        write!(f, "({})", columns.join(", "))
    }
}
