use crate::error::{ExecutionError, Result};
use catalog::{Column, Row, Schema, Table};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};
use ty::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

/// Equi-join emitting one row per matching (left, right) pair. Rows with a
/// null in any key column match nothing.
pub fn inner_join<S: AsRef<str>>(left: &Table, right: &Table, keys: &[S]) -> Result<Table> {
    hash_join(left, right, keys, JoinType::Inner)
}

/// Like [`inner_join`], but a left row without matches is emitted once with
/// every right-side column set to null.
pub fn left_join<S: AsRef<str>>(left: &Table, right: &Table, keys: &[S]) -> Result<Table> {
    hash_join(left, right, keys, JoinType::Left)
}

/// Hash join on equality of all key columns.
///
/// The output schema is the left schema followed by the right schema minus
/// its key columns. A right column whose name is already taken is qualified
/// as `<right table>.<column>`. Output order is left-row order, then
/// right-row order within each match.
#[instrument(skip_all, fields(left = %left.name(), right = %right.name(), join_type = ?join_type))]
pub fn hash_join<S: AsRef<str>>(
    left: &Table,
    right: &Table,
    keys: &[S],
    join_type: JoinType,
) -> Result<Table> {
    if keys.is_empty() {
        return Err(ExecutionError::EmptyJoinKeys);
    }

    let left_keys = left.schema().get_col_indices(keys)?;
    let right_keys = right.schema().get_col_indices(keys)?;
    for ((key, &l), &r) in keys.iter().zip(&left_keys).zip(&right_keys) {
        let left_type = *left.schema().get_column(l)?.column_type();
        let right_type = *right.schema().get_column(r)?.column_type();
        if left_type != right_type {
            return Err(ExecutionError::KeyTypeMismatch {
                column: key.as_ref().to_string(),
                left: left_type,
                right: right_type,
            });
        }
    }

    let right_payload: Vec<usize> = (0..right.schema().len())
        .filter(|i| !right_keys.contains(i))
        .collect();
    let schema = Arc::new(join_schema(left, right, &right_payload)?);

    // Build side: right rows bucketed by key, in right-row order.
    let mut buckets: HashMap<Vec<&Value>, Vec<&Row>> = HashMap::new();
    for row in right.rows() {
        if let Some(key) = join_key(row, &right_keys) {
            buckets.entry(key).or_default().push(row);
        }
    }

    let mut rows = Vec::new();
    for row in left.rows() {
        let matches = join_key(row, &left_keys).and_then(|key| buckets.get(&key));
        match matches {
            Some(matches) => {
                for matched in matches {
                    let mut out = Vec::with_capacity(schema.len());
                    out.extend(row.iter().cloned());
                    out.extend(right_payload.iter().map(|&i| matched[i].clone()));
                    rows.push(out);
                }
            }
            None if join_type == JoinType::Left => {
                let mut out = Vec::with_capacity(schema.len());
                out.extend(row.iter().cloned());
                out.extend(right_payload.iter().map(|_| Value::null()));
                rows.push(out);
            }
            None => {}
        }
    }

    debug!(
        left_rows = left.len(),
        right_rows = right.len(),
        output_rows = rows.len(),
        "Join complete"
    );
    let name = format!("{}_{}", left.name(), right.name());
    Ok(Table::new(name, schema, rows)?)
}

/// The key values of a row, or `None` if any of them is null.
fn join_key<'a>(row: &'a Row, keys: &[usize]) -> Option<Vec<&'a Value>> {
    keys.iter()
        .map(|&i| {
            let value = &row[i];
            (!value.is_null()).then_some(value)
        })
        .collect()
}

fn join_schema(left: &Table, right: &Table, right_payload: &[usize]) -> Result<Schema> {
    let mut columns: Vec<Column> = left.schema().columns().clone();
    for &i in right_payload {
        let column = right.schema().get_column(i)?;
        if left.schema().contains(column.column_name()) {
            let qualified = format!("{}.{}", right.name(), column.column_name());
            columns.push(column.renamed(qualified));
        } else {
            columns.push(column.clone());
        }
    }
    Ok(Schema::new(columns)?)
}
