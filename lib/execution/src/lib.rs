//! # Relational Operators
//!
//! The query engine behind the crash analyses: filter, inner and left hash
//! joins, grouped aggregation, ordering, limits, and rank windows over
//! [`catalog::Table`]s.
//!
//! Every operator is a pure function from input tables to a newly built
//! table. Inputs are never modified, so operators can be freely composed and
//! run from several threads at once.
//!
//! [`TableExt`] exposes the operators as methods for chaining:
//!
//! ```
//! use catalog::{Column, Schema, Table};
//! use execution::{col, Aggregation, SortKey, TableExt};
//! use std::sync::Arc;
//! use ty::Value;
//!
//! let schema = Schema::new(vec![Column::text("VEH_MAKE_ID"), Column::integer("TOT_INJRY_CNT")]).unwrap();
//! let units = Table::new(
//!     "Unit",
//!     Arc::new(schema),
//!     vec![
//!         vec![Value::from("FORD"), Value::from(2)],
//!         vec![Value::from("NA"), Value::from(9)],
//!         vec![Value::from("FORD"), Value::from(1)],
//!     ],
//! )
//! .unwrap();
//!
//! let injuries = units
//!     .filter(&col("VEH_MAKE_ID").not_eq("NA"))?
//!     .group_by(&["VEH_MAKE_ID"])
//!     .agg(&[Aggregation::sum("TOT_INJRY_CNT", "TOTAL")])?
//!     .order_by(&[SortKey::desc("TOTAL")])?;
//! assert_eq!(injuries.rows()[0], vec![Value::from("FORD"), Value::from(3)]);
//! # Ok::<(), execution::ExecutionError>(())
//! ```

mod aggregate;
mod error;
mod expression;
mod filter;
mod join;
mod order;
mod window;

pub use aggregate::{group_by, Aggregate, Aggregation, GroupBy};
pub use error::{ExecutionError, Result};
pub use expression::{col, lit, BoundExpr, BoundPredicate, CompareOp, Expr, Predicate};
pub use filter::filter;
pub use join::{hash_join, inner_join, left_join, JoinType};
pub use order::{limit, order_by, Direction, SortKey};
pub use window::{rank_over, where_rank_between, RANK_COLUMN};

use catalog::Table;

/// Method-call syntax for the operators in this crate.
pub trait TableExt {
    fn filter(&self, predicate: &Predicate) -> Result<Table>;
    fn inner_join<S: AsRef<str>>(&self, right: &Table, keys: &[S]) -> Result<Table>;
    fn left_join<S: AsRef<str>>(&self, right: &Table, keys: &[S]) -> Result<Table>;
    fn group_by<S: AsRef<str>>(&self, keys: &[S]) -> GroupBy<'_>;
    fn order_by(&self, keys: &[SortKey]) -> Result<Table>;
    fn limit(&self, n: usize) -> Table;
    fn rank_over<S: AsRef<str>>(&self, partition: &[S], order: &SortKey) -> Result<Table>;
    fn where_rank_between(&self, lo: i64, hi: i64) -> Result<Table>;
    fn count(&self) -> usize;
}

impl TableExt for Table {
    fn filter(&self, predicate: &Predicate) -> Result<Table> {
        filter::filter(self, predicate)
    }

    fn inner_join<S: AsRef<str>>(&self, right: &Table, keys: &[S]) -> Result<Table> {
        join::inner_join(self, right, keys)
    }

    fn left_join<S: AsRef<str>>(&self, right: &Table, keys: &[S]) -> Result<Table> {
        join::left_join(self, right, keys)
    }

    fn group_by<S: AsRef<str>>(&self, keys: &[S]) -> GroupBy<'_> {
        aggregate::group_by(self, keys)
    }

    fn order_by(&self, keys: &[SortKey]) -> Result<Table> {
        order::order_by(self, keys)
    }

    fn limit(&self, n: usize) -> Table {
        order::limit(self, n)
    }

    /// Ranks into [`RANK_COLUMN`].
    fn rank_over<S: AsRef<str>>(&self, partition: &[S], order: &SortKey) -> Result<Table> {
        window::rank_over(self, partition, order, RANK_COLUMN)
    }

    /// Selects on [`RANK_COLUMN`].
    fn where_rank_between(&self, lo: i64, hi: i64) -> Result<Table> {
        window::where_rank_between(self, RANK_COLUMN, lo, hi)
    }

    fn count(&self) -> usize {
        self.len()
    }
}
