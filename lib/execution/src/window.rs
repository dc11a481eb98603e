//! # Window Ranking
//!
//! `RANK() OVER (PARTITION BY .. ORDER BY ..)` and the range selection that
//! usually follows it.
//!
//! Within a partition rows are ranked by one sort key. Rows whose key values
//! are identical share a rank, and the next distinct value is ranked by the
//! number of rows before it plus one, so `10, 10, 8, 5` descending ranks
//! `1, 1, 3, 4`. Ranking restarts at 1 in every partition.

use crate::error::{ExecutionError, Result};
use crate::order::{BoundSortKey, SortKey};
use catalog::{Column, Row, Schema, Table};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};
use ty::{DataTypeKind, Value};

/// Default name of the column [`rank_over`] appends.
pub const RANK_COLUMN: &str = "RNK";

/// Appends an integer `rank_column` holding each row's rank within its
/// partition.
///
/// Partitions are emitted in the order their first row appears. Within a
/// partition rows are sorted by `order`, stably, so tied rows keep their
/// input order. An empty `partition` ranks the whole table as one
/// partition.
#[instrument(skip_all, fields(table = %table.name(), order = %order))]
pub fn rank_over<S: AsRef<str>>(
    table: &Table,
    partition: &[S],
    order: &SortKey,
    rank_column: &str,
) -> Result<Table> {
    let partition_keys = table.schema().get_col_indices(partition)?;
    let order_key = BoundSortKey::bind(table, order)?;

    let mut columns = table.schema().columns().clone();
    columns.push(Column::integer(rank_column));
    let schema = Arc::new(Schema::new(columns)?);

    let mut index: HashMap<Vec<&Value>, usize> = HashMap::new();
    let mut partitions: Vec<Vec<&Row>> = Vec::new();
    for row in table.rows() {
        let key: Vec<&Value> = partition_keys.iter().map(|&i| &row[i]).collect();
        let position = *index.entry(key).or_insert_with(|| {
            partitions.push(Vec::new());
            partitions.len() - 1
        });
        partitions[position].push(row);
    }

    let mut rows = Vec::with_capacity(table.len());
    for mut members in partitions {
        members.sort_by(|a, b| order_key.compare(a, b));

        let mut rank = 1;
        for (position, row) in members.iter().enumerate() {
            if position > 0 && order_key.compare(members[position - 1], row).is_ne() {
                rank = position as i64 + 1;
            }
            let mut out = Vec::with_capacity(schema.len());
            out.extend(row.iter().cloned());
            out.push(Value::from(rank));
            rows.push(out);
        }
    }

    debug!(partitions = index.len(), rows = rows.len(), "Ranked rows");
    Ok(Table::new(table.name().clone(), schema, rows)?)
}

/// Keeps rows whose rank lies in `[lo, hi]`, preserving order. Null ranks
/// never qualify.
pub fn where_rank_between(table: &Table, rank_column: &str, lo: i64, hi: i64) -> Result<Table> {
    let idx = table.schema().get_col_idx(rank_column)?;
    if *table.schema().get_column(idx)?.column_type() != DataTypeKind::Integer {
        return Err(ExecutionError::InvalidRankColumn(rank_column.to_string()));
    }

    Ok(table.filter_rows(|row| {
        row[idx]
            .as_i64()
            .map_or(false, |rank| (lo..=hi).contains(&rank))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;

    fn table(rows: Vec<(&str, &str, Option<i64>)>) -> Table {
        let schema = Schema::new(vec![
            Column::text("VEH_BODY_STYL_ID"),
            Column::text("VEH_MAKE_ID"),
            Column::integer("TOTAL"),
        ])
        .unwrap();
        Table::new(
            "Unit",
            Arc::new(schema),
            rows.into_iter()
                .map(|(style, make, total)| {
                    vec![Value::from(style), Value::from(make), Value::from(total)]
                })
                .collect(),
        )
        .unwrap()
    }

    fn ranks(table: &Table) -> Vec<(String, i64)> {
        table
            .rows()
            .iter()
            .map(|row| (row[1].to_string(), row[3].as_i64().unwrap()))
            .collect()
    }

    #[test]
    fn test_rank_ties_leave_gaps() {
        let sums = table(vec![
            ("CAR", "D", Some(5)),
            ("CAR", "A", Some(10)),
            ("CAR", "C", Some(8)),
            ("CAR", "B", Some(10)),
        ]);
        let no_partition: [&str; 0] = [];
        let ranked = rank_over(&sums, &no_partition, &SortKey::desc("TOTAL"), RANK_COLUMN).unwrap();
        assert_eq!(
            ranks(&ranked),
            vec![
                ("A".to_string(), 1),
                ("B".to_string(), 1),
                ("C".to_string(), 3),
                ("D".to_string(), 4)
            ]
        );

        let top = where_rank_between(&ranked, RANK_COLUMN, 1, 3).unwrap();
        let makes: Vec<String> = top.rows().iter().map(|r| r[1].to_string()).collect();
        assert_eq!(makes, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_rank_restarts_per_partition() {
        let counts = table(vec![
            ("VAN", "X", Some(1)),
            ("CAR", "Y", Some(4)),
            ("VAN", "Z", Some(2)),
            ("CAR", "W", Some(4)),
        ]);
        let ranked =
            rank_over(&counts, &["VEH_BODY_STYL_ID"], &SortKey::asc("TOTAL"), RANK_COLUMN).unwrap();
        assert_eq!(
            ranks(&ranked),
            vec![
                ("X".to_string(), 1),
                ("Z".to_string(), 2),
                ("Y".to_string(), 1),
                ("W".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_null_order_values() {
        let sums = table(vec![
            ("CAR", "A", None),
            ("CAR", "B", Some(3)),
            ("CAR", "C", None),
        ]);
        let no_partition: [&str; 0] = [];
        let desc = rank_over(&sums, &no_partition, &SortKey::desc("TOTAL"), RANK_COLUMN).unwrap();
        assert_eq!(
            ranks(&desc),
            vec![("A".to_string(), 1), ("C".to_string(), 1), ("B".to_string(), 3)]
        );
        let asc = rank_over(&sums, &no_partition, &SortKey::asc("TOTAL"), RANK_COLUMN).unwrap();
        assert_eq!(
            ranks(&asc),
            vec![("B".to_string(), 1), ("A".to_string(), 2), ("C".to_string(), 2)]
        );
    }

    #[test]
    fn test_rank_column_must_be_new() {
        let sums = table(vec![("CAR", "A", Some(1))]);
        let no_partition: [&str; 0] = [];
        assert!(matches!(
            rank_over(&sums, &no_partition, &SortKey::desc("TOTAL"), "TOTAL"),
            Err(ExecutionError::Schema(_))
        ));
    }

    #[test]
    fn test_where_rank_between_requires_integer_column() {
        let sums = table(vec![("CAR", "A", Some(1))]);
        assert_eq!(
            where_rank_between(&sums, "VEH_MAKE_ID", 1, 1).unwrap_err(),
            ExecutionError::InvalidRankColumn("VEH_MAKE_ID".to_string())
        );
    }

    #[test]
    fn test_empty_table() {
        let empty = table(vec![]);
        let ranked = rank_over(&empty, &["VEH_MAKE_ID"], &SortKey::desc("TOTAL"), RANK_COLUMN).unwrap();
        assert!(ranked.is_empty());
        assert_eq!(ranked.schema().len(), 4);
    }
}
