use crate::error::Result;
use catalog::{Row, Table};
use std::cmp::Ordering;
use std::fmt;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ascending => write!(f, "ASC"),
            Direction::Descending => write!(f, "DESC"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub column: String,
    pub direction: Direction,
}

impl SortKey {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: Direction::Descending,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.direction)
    }
}

/// A [`SortKey`] resolved to a column position.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoundSortKey {
    index: usize,
    direction: Direction,
}

impl BoundSortKey {
    pub(crate) fn bind(table: &Table, key: &SortKey) -> Result<Self> {
        Ok(Self {
            index: table.schema().get_col_idx(&key.column)?,
            direction: key.direction,
        })
    }

    /// Compares by value identity, so nulls are the greatest value: last
    /// when ascending and first when descending.
    pub(crate) fn compare(&self, a: &Row, b: &Row) -> Ordering {
        let ordering = a[self.index].cmp(&b[self.index]);
        match self.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

/// Sorts by the keys in priority order. The sort is stable: rows equal on
/// every key keep their input order.
#[instrument(skip_all, fields(table = %table.name()))]
pub fn order_by(table: &Table, keys: &[SortKey]) -> Result<Table> {
    let bound = keys
        .iter()
        .map(|key| BoundSortKey::bind(table, key))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = table.rows().clone();
    rows.sort_by(|a, b| {
        bound
            .iter()
            .map(|key| key.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    debug!(rows = rows.len(), keys = keys.len(), "Sorted rows");
    Ok(Table::new(table.name().clone(), table.schema().clone(), rows)?)
}

/// The first `n` rows.
pub fn limit(table: &Table, n: usize) -> Table {
    table.slice(0, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{Column, Schema};
    use pretty_assertions_sorted::assert_eq;
    use std::sync::Arc;
    use ty::Value;

    fn makes() -> Table {
        let schema = Schema::new(vec![Column::text("VEH_MAKE_ID"), Column::integer("CNT")]).unwrap();
        Table::new(
            "Unit",
            Arc::new(schema),
            vec![
                vec![Value::from("FORD"), Value::from(3)],
                vec![Value::from("TOYOTA"), Value::null()],
                vec![Value::from("CHEVROLET"), Value::from(5)],
                vec![Value::from("HONDA"), Value::from(3)],
                vec![Value::from("DODGE"), Value::from(3)],
            ],
        )
        .unwrap()
    }

    fn makes_of(table: &Table) -> Vec<String> {
        table
            .column_values("VEH_MAKE_ID")
            .unwrap()
            .into_iter()
            .map(|v| v.to_string())
            .collect()
    }

    #[test]
    fn test_order_by_is_stable() {
        let sorted = order_by(&makes(), &[SortKey::asc("CNT")]).unwrap();
        assert_eq!(
            makes_of(&sorted),
            vec!["FORD", "HONDA", "DODGE", "CHEVROLET", "TOYOTA"]
        );
    }

    #[test]
    fn test_nulls_first_when_descending() {
        let sorted = order_by(&makes(), &[SortKey::desc("CNT")]).unwrap();
        assert_eq!(
            makes_of(&sorted),
            vec!["TOYOTA", "CHEVROLET", "FORD", "HONDA", "DODGE"]
        );
    }

    #[test]
    fn test_secondary_key_breaks_ties() {
        let sorted = order_by(
            &makes(),
            &[SortKey::desc("CNT"), SortKey::asc("VEH_MAKE_ID")],
        )
        .unwrap();
        assert_eq!(
            makes_of(&sorted),
            vec!["TOYOTA", "CHEVROLET", "DODGE", "FORD", "HONDA"]
        );
    }

    #[test]
    fn test_limit() {
        assert_eq!(limit(&makes(), 2).len(), 2);
        assert_eq!(limit(&makes(), 10).len(), 5);
        assert!(limit(&makes(), 0).is_empty());
    }

    #[test]
    fn test_unknown_sort_column() {
        assert!(order_by(&makes(), &[SortKey::asc("VIN")]).is_err());
    }
}
