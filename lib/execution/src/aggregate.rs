//! # Grouped Aggregation
//!
//! [`group_by`] partitions a table by the identity of its key columns and
//! folds each group through a set of [`Aggregation`]s. Key identity treats
//! `Null` as a regular value, so all-null keys form one group.
//!
//! Groups are emitted in the order their first row appears in the input.
//! Large inputs are aggregated in parallel: each chunk builds partial
//! accumulators which are then merged in chunk order, so the output is the
//! same as a sequential fold.

use crate::error::{ExecutionError, Result};
use catalog::{Column, Row, Schema, Table};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};
use ty::{DataType, DataTypeKind, Value};

/// Inputs with at least this many rows are aggregated in parallel.
const PARALLEL_THRESHOLD: usize = 16_384;
const CHUNK_SIZE: usize = 4_096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    /// Number of non-null values of a column.
    Count(String),
    /// Number of rows.
    CountStar,
    /// Sum of the non-null values of a numeric column; zero when there are
    /// none.
    Sum(String),
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregate::Count(column) => write!(f, "count({})", column),
            Aggregate::CountStar => write!(f, "count(*)"),
            Aggregate::Sum(column) => write!(f, "sum({})", column),
        }
    }
}

/// An [`Aggregate`] together with the name of its output column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub aggregate: Aggregate,
    pub alias: String,
}

impl Aggregation {
    pub fn count(column: &str, alias: &str) -> Self {
        Self {
            aggregate: Aggregate::Count(column.to_string()),
            alias: alias.to_string(),
        }
    }

    pub fn count_star(alias: &str) -> Self {
        Self {
            aggregate: Aggregate::CountStar,
            alias: alias.to_string(),
        }
    }

    pub fn sum(column: &str, alias: &str) -> Self {
        Self {
            aggregate: Aggregate::Sum(column.to_string()),
            alias: alias.to_string(),
        }
    }
}

/// A pending grouping of `table` by `keys`. Nothing is computed until
/// [`GroupBy::agg`].
#[derive(Debug, Clone)]
pub struct GroupBy<'a> {
    table: &'a Table,
    keys: Vec<String>,
}

pub fn group_by<'a, S: AsRef<str>>(table: &'a Table, keys: &[S]) -> GroupBy<'a> {
    GroupBy {
        table,
        keys: keys.iter().map(|k| k.as_ref().to_string()).collect(),
    }
}

/// An aggregate with its input column resolved.
#[derive(Debug, Clone, Copy)]
enum BoundAggregate {
    Count(usize),
    CountStar,
    Sum(usize, DataTypeKind),
}

#[derive(Debug, Clone)]
enum Accumulator {
    Count(i64),
    Sum(Value),
}

impl Accumulator {
    fn new(aggregate: &BoundAggregate) -> Self {
        match aggregate {
            BoundAggregate::Count(_) | BoundAggregate::CountStar => Accumulator::Count(0),
            BoundAggregate::Sum(_, DataTypeKind::Double) => {
                Accumulator::Sum(Value::new(DataType::Double(0.0)))
            }
            BoundAggregate::Sum(..) => Accumulator::Sum(Value::new(DataType::Integer(0))),
        }
    }

    fn update(&mut self, aggregate: &BoundAggregate, row: &Row) -> Result<()> {
        match (self, aggregate) {
            (Accumulator::Count(n), BoundAggregate::CountStar) => *n += 1,
            (Accumulator::Count(n), BoundAggregate::Count(idx)) => {
                if !row[*idx].is_null() {
                    *n += 1;
                }
            }
            (Accumulator::Sum(total), BoundAggregate::Sum(idx, _)) => {
                if !row[*idx].is_null() {
                    *total = total.checked_add(&row[*idx])?;
                }
            }
            _ => unreachable!("accumulator created for a different aggregate"),
        }
        Ok(())
    }

    fn merge(&mut self, other: Accumulator) -> Result<()> {
        match (self, other) {
            (Accumulator::Count(a), Accumulator::Count(b)) => *a += b,
            (Accumulator::Sum(a), Accumulator::Sum(b)) => *a = a.checked_add(&b)?,
            _ => unreachable!("merging accumulators of different aggregates"),
        }
        Ok(())
    }

    fn finish(self) -> Value {
        match self {
            Accumulator::Count(n) => Value::from(n),
            Accumulator::Sum(total) => total,
        }
    }
}

/// Groups in first-occurrence order, with an index from key to position.
#[derive(Debug, Default)]
struct Partial {
    index: HashMap<Vec<Value>, usize>,
    groups: Vec<(Vec<Value>, Vec<Accumulator>)>,
}

impl Partial {
    fn accumulators(&mut self, key: Vec<Value>, aggregates: &[BoundAggregate]) -> &mut Vec<Accumulator> {
        let position = match self.index.get(&key) {
            Some(&position) => position,
            None => {
                let position = self.groups.len();
                self.index.insert(key.clone(), position);
                self.groups
                    .push((key, aggregates.iter().map(Accumulator::new).collect()));
                position
            }
        };
        &mut self.groups[position].1
    }

    fn fold(rows: &[Row], keys: &[usize], aggregates: &[BoundAggregate]) -> Result<Self> {
        let mut partial = Partial::default();
        for row in rows {
            let key = keys.iter().map(|&i| row[i].clone()).collect();
            let accumulators = partial.accumulators(key, aggregates);
            for (accumulator, aggregate) in accumulators.iter_mut().zip(aggregates) {
                accumulator.update(aggregate, row)?;
            }
        }
        Ok(partial)
    }

    fn merge(&mut self, other: Partial, aggregates: &[BoundAggregate]) -> Result<()> {
        for (key, others) in other.groups {
            let accumulators = self.accumulators(key, aggregates);
            for (accumulator, other) in accumulators.iter_mut().zip(others) {
                accumulator.merge(other)?;
            }
        }
        Ok(())
    }
}

impl<'a> GroupBy<'a> {
    /// Computes one output row per group: the key columns followed by one
    /// column per aggregation, named by its alias.
    #[instrument(skip_all, fields(table = %self.table.name(), keys = ?self.keys))]
    pub fn agg(&self, aggregations: &[Aggregation]) -> Result<Table> {
        let schema = self.table.schema();
        let keys = schema.get_col_indices(&self.keys)?;

        let mut columns: Vec<Column> = Vec::with_capacity(keys.len() + aggregations.len());
        for &key in &keys {
            columns.push(schema.get_column(key)?.clone());
        }

        let mut aggregates = Vec::with_capacity(aggregations.len());
        for aggregation in aggregations {
            let (bound, kind) = match &aggregation.aggregate {
                Aggregate::CountStar => (BoundAggregate::CountStar, DataTypeKind::Integer),
                Aggregate::Count(column) => (
                    BoundAggregate::Count(schema.get_col_idx(column)?),
                    DataTypeKind::Integer,
                ),
                Aggregate::Sum(column) => {
                    let idx = schema.get_col_idx(column)?;
                    let kind = *schema.get_column(idx)?.column_type();
                    if !kind.is_numeric() {
                        return Err(ExecutionError::InvalidAggregate {
                            aggregate: aggregation.aggregate.to_string(),
                            column: column.clone(),
                            kind,
                        });
                    }
                    (BoundAggregate::Sum(idx, kind), kind)
                }
            };
            aggregates.push(bound);
            columns.push(Column::new(&aggregation.alias, kind));
        }
        let output_schema = Arc::new(Schema::new(columns)?);

        let rows = self.table.rows();
        let partial = if rows.len() >= PARALLEL_THRESHOLD {
            let partials = rows
                .par_chunks(CHUNK_SIZE)
                .map(|chunk| Partial::fold(chunk, &keys, &aggregates))
                .collect::<Result<Vec<_>>>()?;
            debug!(chunks = partials.len(), "Merging partial aggregates");
            let mut merged = Partial::default();
            for partial in partials {
                merged.merge(partial, &aggregates)?;
            }
            merged
        } else {
            Partial::fold(rows, &keys, &aggregates)?
        };

        let mut output: Vec<Row> = partial
            .groups
            .into_iter()
            .map(|(mut key, accumulators)| {
                key.extend(accumulators.into_iter().map(Accumulator::finish));
                key
            })
            .collect();

        // A global aggregate over no rows still yields one row.
        if keys.is_empty() && output.is_empty() {
            output.push(aggregates.iter().map(|a| Accumulator::new(a).finish()).collect());
        }

        debug!(input_rows = rows.len(), groups = output.len(), "Aggregation complete");
        Ok(Table::new(self.table.name().clone(), output_schema, output)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;

    fn persons() -> Table {
        let schema = Schema::new(vec![
            Column::integer("CRASH_ID"),
            Column::text("PRSN_GNDR_ID"),
            Column::integer("TOT_INJRY_CNT"),
            Column::double("PRSN_BAC_TEST_RSLT"),
        ])
        .unwrap();
        Table::new(
            "Person",
            Arc::new(schema),
            vec![
                vec![Value::from(1), Value::from("MALE"), Value::from(2), Value::from(0.5)],
                vec![Value::from(1), Value::from("FEMALE"), Value::null(), Value::null()],
                vec![Value::from(2), Value::null(), Value::from(1), Value::from(0.25)],
                vec![Value::from(2), Value::from("MALE"), Value::from(3), Value::null()],
                vec![Value::from(3), Value::null(), Value::null(), Value::null()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_group_by_first_occurrence_order() {
        let grouped = group_by(&persons(), &["PRSN_GNDR_ID"])
            .agg(&[
                Aggregation::count_star("CNT"),
                Aggregation::sum("TOT_INJRY_CNT", "INJURIES"),
            ])
            .unwrap();
        assert_eq!(
            grouped.rows(),
            &vec![
                vec![Value::from("MALE"), Value::from(2), Value::from(5)],
                vec![Value::from("FEMALE"), Value::from(1), Value::from(0)],
                vec![Value::null(), Value::from(2), Value::from(1)],
            ]
        );
        let names: Vec<&str> = grouped.schema().column_names().collect();
        assert_eq!(names, vec!["PRSN_GNDR_ID", "CNT", "INJURIES"]);
    }

    #[test]
    fn test_count_skips_nulls() {
        let grouped = group_by(&persons(), &["CRASH_ID"])
            .agg(&[
                Aggregation::count("PRSN_GNDR_ID", "GENDERS"),
                Aggregation::count_star("PERSONS"),
            ])
            .unwrap();
        assert_eq!(
            grouped.rows()[1],
            vec![Value::from(2), Value::from(1), Value::from(2)]
        );
        assert_eq!(
            grouped.rows()[2],
            vec![Value::from(3), Value::from(0), Value::from(1)]
        );
    }

    #[test]
    fn test_sum_all_null_is_zero_of_input_kind() {
        let grouped = group_by(&persons(), &["CRASH_ID"])
            .agg(&[Aggregation::sum("PRSN_BAC_TEST_RSLT", "BAC")])
            .unwrap();
        assert_eq!(
            grouped.column_values("BAC").unwrap(),
            vec![&Value::from(0.5), &Value::from(0.25), &Value::from(0.0)]
        );
        assert_eq!(
            grouped.schema().get_column(1).unwrap().column_type(),
            &DataTypeKind::Double
        );
    }

    #[test]
    fn test_global_aggregate_over_empty_input() {
        let empty = Table::empty("Person", persons().schema().clone());
        let no_keys: [&str; 0] = [];
        let grouped = group_by(&empty, &no_keys)
            .agg(&[
                Aggregation::count_star("CNT"),
                Aggregation::sum("TOT_INJRY_CNT", "INJURIES"),
            ])
            .unwrap();
        assert_eq!(grouped.rows(), &vec![vec![Value::from(0), Value::from(0)]]);

        let keyed = group_by(&empty, &["CRASH_ID"])
            .agg(&[Aggregation::count_star("CNT")])
            .unwrap();
        assert!(keyed.is_empty());
    }

    #[test]
    fn test_sum_rejects_text() {
        let err = group_by(&persons(), &["CRASH_ID"])
            .agg(&[Aggregation::sum("PRSN_GNDR_ID", "X")])
            .unwrap_err();
        assert_eq!(
            err,
            ExecutionError::InvalidAggregate {
                aggregate: "sum(PRSN_GNDR_ID)".to_string(),
                column: "PRSN_GNDR_ID".to_string(),
                kind: DataTypeKind::Text,
            }
        );
    }

    #[test]
    fn test_alias_collision_is_an_error() {
        let err = group_by(&persons(), &["CRASH_ID"])
            .agg(&[Aggregation::count_star("CRASH_ID")])
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Schema(_)));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let schema = Arc::new(
            Schema::new(vec![Column::integer("STATE"), Column::integer("N")]).unwrap(),
        );
        let rows: Vec<Row> = (0..(PARALLEL_THRESHOLD as i64 * 2 + 17))
            .map(|i| vec![Value::from((i * 7919) % 13), Value::from(i % 5)])
            .collect();
        let big = Table::new("Big", schema, rows).unwrap();

        let parallel = group_by(&big, &["STATE"])
            .agg(&[Aggregation::count_star("CNT"), Aggregation::sum("N", "TOTAL")])
            .unwrap();

        let keys = [0usize];
        let aggregates = [BoundAggregate::CountStar, BoundAggregate::Sum(1, DataTypeKind::Integer)];
        let sequential = Partial::fold(big.rows(), &keys, &aggregates).unwrap();
        let expected: Vec<Row> = sequential
            .groups
            .into_iter()
            .map(|(mut key, accumulators)| {
                key.extend(accumulators.into_iter().map(Accumulator::finish));
                key
            })
            .collect();
        assert_eq!(parallel.rows(), &expected);
        assert_eq!(parallel.len(), 13);
    }
}
