use catalog::{SchemaError, TableError};
use thiserror::Error;
use ty::{DataTypeKind, TypeError};

pub type Result<T> = std::result::Result<T, ExecutionError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutionError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error("Cannot {aggregate} column {column} of type {kind}")]
    InvalidAggregate {
        aggregate: String,
        column: String,
        kind: DataTypeKind,
    },
    #[error("Join key {column} has type {left} on the left but {right} on the right")]
    KeyTypeMismatch {
        column: String,
        left: DataTypeKind,
        right: DataTypeKind,
    },
    #[error("Join requires at least one key column")]
    EmptyJoinKeys,
    #[error("Rank column {0} must be an integer column")]
    InvalidRankColumn(String),
}
