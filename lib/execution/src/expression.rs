//! # Predicates
//!
//! A small typed predicate language for row filters. Predicates are built
//! from [`Expr`]s (column references, literals, `lower(..)`) and evaluate
//! under SQL three-valued logic: a comparison involving `Null` is unknown,
//! unknown propagates through `AND`/`OR`/`NOT` the Kleene way, and a filter
//! keeps a row only when its predicate is known to be true.
//!
//! ```
//! use execution::{col, Predicate};
//!
//! let male_deaths: Predicate = col("DEATH_CNT").gt(0).and(col("PRSN_GNDR_ID").eq("MALE"));
//! assert_eq!(male_deaths.to_string(), "(DEATH_CNT > 0 AND PRSN_GNDR_ID = 'MALE')");
//! ```
//!
//! Column names are resolved against a schema once, by [`Predicate::bind`],
//! before any row is evaluated. An unknown column is an error.

use catalog::{Row, Schema, SchemaError};
use std::cmp::Ordering;
use std::fmt;
use ty::{DataType, Value};

/// Shorthand for [`Expr::col`].
pub fn col(name: &str) -> Expr {
    Expr::col(name)
}

/// Shorthand for [`Expr::lit`].
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::lit(value)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Column(String),
    Literal(Value),
    Lower(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        left: Expr,
        op: CompareOp,
        right: Expr,
    },
    InList {
        expr: Expr,
        list: Vec<Value>,
        negated: bool,
    },
    Contains {
        expr: Expr,
        pattern: String,
    },
    IsNull {
        expr: Expr,
        negated: bool,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl Expr {
    pub fn col(name: &str) -> Self {
        Expr::Column(name.to_string())
    }

    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn lower(self) -> Self {
        Expr::Lower(Box::new(self))
    }

    fn compare(self, op: CompareOp, right: impl Into<Expr>) -> Predicate {
        Predicate::Compare {
            left: self,
            op,
            right: right.into(),
        }
    }

    pub fn eq(self, right: impl Into<Expr>) -> Predicate {
        self.compare(CompareOp::Eq, right)
    }

    pub fn not_eq(self, right: impl Into<Expr>) -> Predicate {
        self.compare(CompareOp::NotEq, right)
    }

    pub fn gt(self, right: impl Into<Expr>) -> Predicate {
        self.compare(CompareOp::Gt, right)
    }

    pub fn gt_eq(self, right: impl Into<Expr>) -> Predicate {
        self.compare(CompareOp::GtEq, right)
    }

    pub fn lt(self, right: impl Into<Expr>) -> Predicate {
        self.compare(CompareOp::Lt, right)
    }

    pub fn lt_eq(self, right: impl Into<Expr>) -> Predicate {
        self.compare(CompareOp::LtEq, right)
    }

    pub fn is_in<I, V>(self, list: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::InList {
            expr: self,
            list: list.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    pub fn not_in<I, V>(self, list: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::InList {
            expr: self,
            list: list.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    /// Case-sensitive substring match; wrap in [`Expr::lower`] for a
    /// case-insensitive one.
    pub fn contains(self, pattern: &str) -> Predicate {
        Predicate::Contains {
            expr: self,
            pattern: pattern.to_string(),
        }
    }

    pub fn is_null(self) -> Predicate {
        Predicate::IsNull {
            expr: self,
            negated: false,
        }
    }

    pub fn is_not_null(self) -> Predicate {
        Predicate::IsNull {
            expr: self,
            negated: true,
        }
    }

    fn bind(&self, schema: &Schema) -> Result<BoundExpr, SchemaError> {
        Ok(match self {
            Expr::Column(name) => BoundExpr::Column(schema.get_col_idx(name)?),
            Expr::Literal(value) => BoundExpr::Literal(value.clone()),
            Expr::Lower(inner) => BoundExpr::Lower(Box::new(inner.bind(schema)?)),
        })
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Literal(value)
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Literal(value.into())
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Literal(value.into())
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Literal(value.into())
    }
}

impl Predicate {
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Conjunction of all the given predicates. `None` if there are none.
    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        predicates.into_iter().reduce(Predicate::and)
    }

    /// Resolves column references against `schema`.
    pub fn bind(&self, schema: &Schema) -> Result<BoundPredicate, SchemaError> {
        Ok(match self {
            Predicate::Compare { left, op, right } => BoundPredicate::Compare {
                left: left.bind(schema)?,
                op: *op,
                right: right.bind(schema)?,
            },
            Predicate::InList {
                expr,
                list,
                negated,
            } => BoundPredicate::InList {
                expr: expr.bind(schema)?,
                list: list.clone(),
                negated: *negated,
            },
            Predicate::Contains { expr, pattern } => BoundPredicate::Contains {
                expr: expr.bind(schema)?,
                pattern: pattern.clone(),
            },
            Predicate::IsNull { expr, negated } => BoundPredicate::IsNull {
                expr: expr.bind(schema)?,
                negated: *negated,
            },
            Predicate::And(a, b) => {
                BoundPredicate::And(Box::new(a.bind(schema)?), Box::new(b.bind(schema)?))
            }
            Predicate::Or(a, b) => {
                BoundPredicate::Or(Box::new(a.bind(schema)?), Box::new(b.bind(schema)?))
            }
            Predicate::Not(p) => BoundPredicate::Not(Box::new(p.bind(schema)?)),
        })
    }
}

/// An [`Expr`] with column names resolved to row positions.
#[derive(Debug, Clone)]
pub enum BoundExpr {
    Column(usize),
    Literal(Value),
    Lower(Box<BoundExpr>),
}

impl BoundExpr {
    fn evaluate(&self, row: &Row) -> Value {
        match self {
            BoundExpr::Column(idx) => row[*idx].clone(),
            BoundExpr::Literal(value) => value.clone(),
            BoundExpr::Lower(inner) => inner.evaluate(row).lower(),
        }
    }
}

/// A [`Predicate`] with column names resolved to row positions.
#[derive(Debug, Clone)]
pub enum BoundPredicate {
    Compare {
        left: BoundExpr,
        op: CompareOp,
        right: BoundExpr,
    },
    InList {
        expr: BoundExpr,
        list: Vec<Value>,
        negated: bool,
    },
    Contains {
        expr: BoundExpr,
        pattern: String,
    },
    IsNull {
        expr: BoundExpr,
        negated: bool,
    },
    And(Box<BoundPredicate>, Box<BoundPredicate>),
    Or(Box<BoundPredicate>, Box<BoundPredicate>),
    Not(Box<BoundPredicate>),
}

impl BoundPredicate {
    /// Evaluates the predicate against a row. `None` means unknown.
    pub fn evaluate(&self, row: &Row) -> Option<bool> {
        match self {
            BoundPredicate::Compare { left, op, right } => {
                let (left, right) = (left.evaluate(row), right.evaluate(row));
                match op {
                    CompareOp::Eq => left.sql_eq(&right),
                    CompareOp::NotEq => left.sql_eq(&right).map(|eq| !eq),
                    CompareOp::Gt => left.sql_cmp(&right).map(|o| o == Ordering::Greater),
                    CompareOp::GtEq => left.sql_cmp(&right).map(|o| o != Ordering::Less),
                    CompareOp::Lt => left.sql_cmp(&right).map(|o| o == Ordering::Less),
                    CompareOp::LtEq => left.sql_cmp(&right).map(|o| o != Ordering::Greater),
                }
            }
            BoundPredicate::InList {
                expr,
                list,
                negated,
            } => {
                let value = expr.evaluate(row);
                let found = if value.is_null() {
                    None
                } else if list.iter().any(|item| value.sql_eq(item) == Some(true)) {
                    Some(true)
                } else if list.iter().any(Value::is_null) {
                    None
                } else {
                    Some(false)
                };
                if *negated {
                    found.map(|f| !f)
                } else {
                    found
                }
            }
            BoundPredicate::Contains { expr, pattern } => expr.evaluate(row).contains(pattern),
            BoundPredicate::IsNull { expr, negated } => {
                Some(expr.evaluate(row).is_null() != *negated)
            }
            BoundPredicate::And(a, b) => match (a.evaluate(row), b.evaluate(row)) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            BoundPredicate::Or(a, b) => match (a.evaluate(row), b.evaluate(row)) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
            BoundPredicate::Not(p) => p.evaluate(row).map(|v| !v),
        }
    }

    /// True only when the predicate is known to hold.
    pub fn matches(&self, row: &Row) -> bool {
        self.evaluate(row) == Some(true)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "{}", name),
            Expr::Literal(value) => fmt_literal(f, value),
            Expr::Lower(inner) => write!(f, "lower({})", inner),
        }
    }
}

fn fmt_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value.data() {
        DataType::Text(text) => write!(f, "'{}'", text),
        DataType::Timestamp(_) => write!(f, "'{}'", value),
        _ => write!(f, "{}", value),
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
        };
        write!(f, "{}", op)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { left, op, right } => write!(f, "{} {} {}", left, op, right),
            Predicate::InList {
                expr,
                list,
                negated,
            } => {
                write!(f, "{} {}IN (", expr, if *negated { "NOT " } else { "" })?;
                for (i, value) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    fmt_literal(f, value)?;
                }
                write!(f, ")")
            }
            Predicate::Contains { expr, pattern } => write!(f, "{} CONTAINS '{}'", expr, pattern),
            Predicate::IsNull { expr, negated } => {
                write!(f, "{} IS {}NULL", expr, if *negated { "NOT " } else { "" })
            }
            Predicate::And(a, b) => write!(f, "({} AND {})", a, b),
            Predicate::Or(a, b) => write!(f, "({} OR {})", a, b),
            Predicate::Not(p) => write!(f, "NOT {}", p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Column;
    use pretty_assertions_sorted::assert_eq;

    fn schema() -> Schema {
        Schema::new(vec![
            Column::integer("DEATH_CNT"),
            Column::text("PRSN_GNDR_ID"),
            Column::text("CONTRIB_FACTR_1_ID"),
        ])
        .unwrap()
    }

    fn row(deaths: Option<i64>, gender: Option<&str>, factor: Option<&str>) -> Row {
        vec![Value::from(deaths), Value::from(gender), Value::from(factor)]
    }

    fn eval(predicate: &Predicate, row: &Row) -> Option<bool> {
        predicate.bind(&schema()).unwrap().evaluate(row)
    }

    #[test]
    fn test_compare() {
        let p = col("DEATH_CNT").gt(0);
        assert_eq!(eval(&p, &row(Some(1), None, None)), Some(true));
        assert_eq!(eval(&p, &row(Some(0), None, None)), Some(false));
        assert_eq!(eval(&p, &row(None, None, None)), None);
    }

    #[test]
    fn test_not_eq_with_null_is_unknown() {
        let p = col("PRSN_GNDR_ID").not_eq("NA");
        assert_eq!(eval(&p, &row(None, Some("MALE"), None)), Some(true));
        assert_eq!(eval(&p, &row(None, Some("NA"), None)), Some(false));
        assert_eq!(eval(&p, &row(None, None, None)), None);
    }

    #[test]
    fn test_in_list() {
        let p = col("PRSN_GNDR_ID").is_in(["MALE", "FEMALE"]);
        assert_eq!(eval(&p, &row(None, Some("MALE"), None)), Some(true));
        assert_eq!(eval(&p, &row(None, Some("UNKNOWN"), None)), Some(false));
        assert_eq!(eval(&p, &row(None, None, None)), None);

        let not_in = col("PRSN_GNDR_ID").not_in(["UNKNOWN", "NA"]);
        assert_eq!(eval(&not_in, &row(None, Some("MALE"), None)), Some(true));
        assert_eq!(eval(&not_in, &row(None, Some("NA"), None)), Some(false));
        assert_eq!(eval(&not_in, &row(None, None, None)), None);
    }

    #[test]
    fn test_in_list_containing_null() {
        let p = col("PRSN_GNDR_ID").is_in([Value::from("MALE"), Value::null()]);
        assert_eq!(eval(&p, &row(None, Some("MALE"), None)), Some(true));
        assert_eq!(eval(&p, &row(None, Some("FEMALE"), None)), None);
    }

    #[test]
    fn test_lower_contains() {
        let p = col("CONTRIB_FACTR_1_ID").lower().contains("alcohol");
        assert_eq!(
            eval(&p, &row(None, None, Some("HAD BEEN DRINKING / UNDER INFLUENCE - ALCOHOL"))),
            Some(true)
        );
        assert_eq!(eval(&p, &row(None, None, Some("SPEEDING"))), Some(false));
        assert_eq!(eval(&p, &row(None, None, None)), None);
    }

    #[test]
    fn test_kleene_logic() {
        let unknown = col("DEATH_CNT").gt(0);
        let truth = col("PRSN_GNDR_ID").eq("MALE");
        let falsity = col("PRSN_GNDR_ID").eq("FEMALE");
        let r = row(None, Some("MALE"), None);

        assert_eq!(eval(&unknown.clone().or(truth.clone()), &r), Some(true));
        assert_eq!(eval(&unknown.clone().or(falsity.clone()), &r), None);
        assert_eq!(eval(&unknown.clone().and(falsity.clone()), &r), Some(false));
        assert_eq!(eval(&unknown.clone().and(truth), &r), None);
        assert_eq!(eval(&unknown.negate(), &r), None);
        assert_eq!(eval(&falsity.negate(), &r), Some(true));
    }

    #[test]
    fn test_is_null() {
        assert_eq!(eval(&col("DEATH_CNT").is_null(), &row(None, None, None)), Some(true));
        assert_eq!(eval(&col("DEATH_CNT").is_not_null(), &row(None, None, None)), Some(false));
    }

    #[test]
    fn test_bind_unknown_column() {
        let err = col("VIN").eq("x").bind(&schema()).unwrap_err();
        assert_eq!(err, SchemaError::ColumnNameNotFound("VIN".to_string()));
    }

    #[test]
    fn test_all() {
        assert!(Predicate::all(Vec::new()).is_none());
        let p = Predicate::all([col("DEATH_CNT").gt(0), col("PRSN_GNDR_ID").eq("MALE")]).unwrap();
        assert_eq!(eval(&p, &row(Some(2), Some("MALE"), None)), Some(true));
    }

    #[test]
    fn test_display() {
        let p = col("VEH_BODY_STYL_ID")
            .not_in(["UNKNOWN", "NA"])
            .and(col("VEH_BODY_STYL_ID").contains("OTHER").negate())
            .or(col("DRVR_ZIP").is_not_null());
        assert_eq!(
            p.to_string(),
            "((VEH_BODY_STYL_ID NOT IN ('UNKNOWN', 'NA') AND NOT VEH_BODY_STYL_ID CONTAINS 'OTHER') OR DRVR_ZIP IS NOT NULL)"
        );
    }
}
