//! # Typed Tables
//!
//! A [`Table`] is an immutable, schema-declared, ordered sequence of rows. It
//! is the unit every relational operator consumes and produces: operators
//! never mutate a table, they build a new one.
//!
//! Construction checks every row against the schema (arity and value kinds),
//! so a `Table` that exists is known to be well-formed. `Null` is accepted in
//! every column.

use crate::schema::{Schema, SchemaError, SchemaRef};
use getset::Getters;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error};
use ty::Value;

/// A row is positionally aligned with its table's schema.
pub type Row = Vec<Value>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Schema violation in table {table} at row {row}: {detail}")]
    SchemaViolation {
        table: String,
        row: usize,
        detail: String,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Table {
    name: String,
    schema: SchemaRef,
    rows: Vec<Row>,
}

impl Table {
    /// Builds a table, failing with [`TableError::SchemaViolation`] on the
    /// first row whose arity or value kinds disagree with the schema.
    pub fn new(name: impl Into<String>, schema: SchemaRef, rows: Vec<Row>) -> Result<Self, TableError> {
        let name = name.into();
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != schema.len() {
                error!(table = %name, row = row_idx, "Row arity does not match schema");
                return Err(TableError::SchemaViolation {
                    table: name,
                    row: row_idx,
                    detail: format!("expected {} values, found {}", schema.len(), row.len()),
                });
            }

            for (value, column) in row.iter().zip(schema.columns()) {
                match value.kind() {
                    Some(kind) if kind != *column.column_type() => {
                        error!(table = %name, row = row_idx, column = %column.column_name(), "Value type does not match schema");
                        return Err(TableError::SchemaViolation {
                            table: name,
                            row: row_idx,
                            detail: format!(
                                "column {} expects {}, found {}",
                                column.column_name(),
                                column.column_type(),
                                kind
                            ),
                        });
                    }
                    _ => {}
                }
            }
        }

        Ok(Self { name, schema, rows })
    }

    pub fn empty(name: impl Into<String>, schema: SchemaRef) -> Self {
        Self {
            name: name.into(),
            schema,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// At most `len` rows starting at `offset`. Out-of-range bounds are
    /// clamped.
    pub fn slice(&self, offset: usize, len: usize) -> Self {
        let start = offset.min(self.rows.len());
        let end = start.saturating_add(len).min(self.rows.len());
        Self {
            name: self.name.clone(),
            schema: self.schema.clone(),
            rows: self.rows[start..end].to_vec(),
        }
    }

    /// The values of one column, in row order.
    pub fn column_values(&self, col_name: &str) -> Result<Vec<&Value>, TableError> {
        let idx = self.schema.get_col_idx(col_name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Keeps the rows for which `predicate` holds, preserving order.
    pub fn filter_rows<F>(&self, predicate: F) -> Self
    where
        F: Fn(&Row) -> bool,
    {
        let rows: Vec<Row> = self.rows.iter().filter(|row| predicate(row)).cloned().collect();
        debug!(table = %self.name, input = self.len(), output = rows.len(), "Filtered rows");
        Self {
            name: self.name.clone(),
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Restricts the table to the named columns, in the given order.
    pub fn project<S: AsRef<str>>(&self, columns: &[S]) -> Result<Self, TableError> {
        let indices = self.schema.get_col_indices(columns)?;
        let schema = Arc::new(Schema::copy_schema(&self.schema, &indices)?);
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(Self {
            name: self.name.clone(),
            schema,
            rows,
        })
    }

    /// Drops repeated rows, keeping the first occurrence of each. Rows
    /// compare by value identity, so two all-null rows are duplicates.
    pub fn distinct(&self) -> Self {
        let mut seen: HashSet<&Row> = HashSet::with_capacity(self.rows.len());
        let rows: Vec<Row> = self
            .rows
            .iter()
            .filter(|row| seen.insert(*row))
            .cloned()
            .collect();

        debug!(table = %self.name, input = self.len(), output = rows.len(), "Distinct rows");
        Self {
            name: self.name.clone(),
            schema: self.schema.clone(),
            rows,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.name, self.schema)?;
        for row in &self.rows {
            let cells = row.iter().map(|v| v.to_string()).collect::<Vec<_>>();
            writeln!(f, "  {}", cells.join(" | "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Column;
    use pretty_assertions_sorted::assert_eq;

    fn person_schema() -> SchemaRef {
        Arc::new(
            Schema::new(vec![
                Column::integer("CRASH_ID"),
                Column::text("PRSN_GNDR_ID"),
                Column::integer("DEATH_CNT"),
            ])
            .unwrap(),
        )
    }

    fn persons() -> Table {
        Table::new(
            "Person",
            person_schema(),
            vec![
                vec![Value::from(100), Value::from("MALE"), Value::from(1)],
                vec![Value::from(100), Value::from("FEMALE"), Value::from(0)],
                vec![Value::from(200), Value::from("MALE"), Value::null()],
                vec![Value::from(100), Value::from("MALE"), Value::from(1)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_wrong_arity() {
        let result = Table::new("Person", person_schema(), vec![vec![Value::from(1)]]);
        assert!(matches!(
            result,
            Err(TableError::SchemaViolation { row: 0, .. })
        ));
    }

    #[test]
    fn test_new_rejects_wrong_kind() {
        let result = Table::new(
            "Person",
            person_schema(),
            vec![
                vec![Value::from(1), Value::from("MALE"), Value::from(0)],
                vec![Value::from("1"), Value::from("MALE"), Value::from(0)],
            ],
        );
        assert!(matches!(
            result,
            Err(TableError::SchemaViolation { row: 1, .. })
        ));
    }

    #[test]
    fn test_new_accepts_nulls() {
        let table = Table::new(
            "Person",
            person_schema(),
            vec![vec![Value::null(), Value::null(), Value::null()]],
        )
        .unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_filter_rows_preserves_order() {
        let males = persons().filter_rows(|row| row[1] == Value::from("MALE"));
        assert_eq!(
            males.column_values("CRASH_ID").unwrap(),
            vec![&Value::from(100), &Value::from(200), &Value::from(100)]
        );
    }

    #[test]
    fn test_project() {
        let projected = persons().project(&["DEATH_CNT", "CRASH_ID"]).unwrap();
        assert_eq!(projected.schema().len(), 2);
        assert_eq!(projected.rows()[0], vec![Value::from(1), Value::from(100)]);
        assert!(persons().project(&["VIN"]).is_err());
    }

    #[test]
    fn test_distinct_first_occurrence() {
        let distinct = persons().project(&["CRASH_ID"]).unwrap().distinct();
        assert_eq!(
            distinct.rows(),
            &vec![vec![Value::from(100)], vec![Value::from(200)]]
        );
    }

    #[test]
    fn test_distinct_is_idempotent() {
        let once = persons().distinct();
        assert_eq!(once.len(), 3);
        assert_eq!(once.distinct(), once);
    }

    #[test]
    fn test_slice_clamps() {
        let table = persons();
        assert_eq!(table.slice(1, 2).len(), 2);
        assert_eq!(table.slice(3, 10).len(), 1);
        assert!(table.slice(10, 1).is_empty());
    }

    #[test]
    fn test_empty() {
        let table = Table::empty("Person", person_schema());
        assert!(table.is_empty());
        assert!(table.distinct().is_empty());
    }
}
