use crate::error::Result;
use crate::expression::Predicate;
use catalog::Table;
use tracing::{instrument, trace};

/// Keeps the rows for which `predicate` is known to be true. Rows where it
/// evaluates to false or unknown are dropped.
#[instrument(skip_all, fields(table = %table.name()))]
pub fn filter(table: &Table, predicate: &Predicate) -> Result<Table> {
    trace!(%predicate, "Binding filter predicate");
    let bound = predicate.bind(table.schema())?;
    Ok(table.filter_rows(|row| bound.matches(row)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::col;
    use crate::ExecutionError;
    use catalog::{Column, Schema, SchemaError};
    use pretty_assertions_sorted::assert_eq;
    use std::sync::Arc;
    use ty::Value;

    fn persons() -> Table {
        let schema = Schema::new(vec![
            Column::integer("CRASH_ID"),
            Column::text("PRSN_GNDR_ID"),
            Column::integer("DEATH_CNT"),
        ])
        .unwrap();
        Table::new(
            "Person",
            Arc::new(schema),
            vec![
                vec![Value::from(100), Value::from("MALE"), Value::from(1)],
                vec![Value::from(100), Value::from("FEMALE"), Value::from(0)],
                vec![Value::from(200), Value::from("MALE"), Value::from(0)],
                vec![Value::from(300), Value::null(), Value::from(2)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_filter_drops_unknown() {
        let predicate = col("DEATH_CNT").gt(0).and(col("PRSN_GNDR_ID").eq("MALE"));
        let filtered = filter(&persons(), &predicate).unwrap();
        assert_eq!(filtered.column_values("CRASH_ID").unwrap(), vec![&Value::from(100)]);

        let negated = filter(&persons(), &col("PRSN_GNDR_ID").eq("MALE").negate()).unwrap();
        assert_eq!(negated.column_values("CRASH_ID").unwrap(), vec![&Value::from(100)]);
    }

    #[test]
    fn test_filter_unknown_column() {
        let err = filter(&persons(), &col("VIN").is_null()).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::Schema(SchemaError::ColumnNameNotFound("VIN".to_string()))
        );
    }
}
