use catalog::{SchemaError, TableError};
use common::config::ConfigError;
use execution::ExecutionError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Missing input for table {table}: {path} does not exist")]
    MissingInput { table: String, path: PathBuf },
    #[error("Missing input for table {0}")]
    MissingTable(String),
    #[error("Failed to ingest {path}: {detail}")]
    Ingest { path: PathBuf, detail: String },
    #[error("Failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to write report {path}: {detail}")]
    Report { path: PathBuf, detail: String },
    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Failed to decode the result of analysis {analysis}: {detail}")]
    Decode { analysis: u8, detail: String },
    #[error("Analysis {analysis} produced a null {column}")]
    UnexpectedNull { analysis: u8, column: String },
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
