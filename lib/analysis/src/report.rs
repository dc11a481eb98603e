//! The two-column report: one row per analysis holding its description and
//! its encoded result.

use crate::analyses::Analysis;
use crate::error::{AnalysisError, Result};
use crate::result::AnalysisResult;
use catalog::{Column, Schema, SchemaRef, Table};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};
use ty::Value;

pub const REPORT_TABLE: &str = "Report";
pub const DESCRIPTION_COLUMN: &str = "Analysis_Description";
pub const RESULT_COLUMN: &str = "Result";

pub fn report_schema() -> SchemaRef {
    let columns = vec![Column::text(DESCRIPTION_COLUMN), Column::text(RESULT_COLUMN)];
    Arc::new(
        Schema::new(columns)
            .unwrap_or_else(|err| unreachable!("invalid report schema: {}", err)),
    )
}

/// Builds the report table, one row per result in the given order.
pub fn assemble(results: &[(Analysis, AnalysisResult)]) -> Result<Table> {
    let rows = results
        .iter()
        .map(|(analysis, result)| {
            Ok(vec![
                Value::from(analysis.description()),
                Value::from(result.encode()?),
            ])
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Table::new(REPORT_TABLE, report_schema(), rows)?)
}

/// Writes `report` as CSV with a header row, creating the parent directory
/// when needed. An existing file is replaced.
#[instrument(skip(report), fields(rows = report.len()))]
pub fn write_report(report: &Table, path: &Path) -> Result<()> {
    let report_error = |detail: String| AnalysisError::Report {
        path: path.to_path_buf(),
        detail,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| report_error(err.to_string()))?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|err| report_error(err.to_string()))?;
    writer
        .write_record(report.schema().column_names())
        .map_err(|err| report_error(err.to_string()))?;
    for row in report.rows() {
        writer
            .write_record(row.iter().map(|value| value.as_str().unwrap_or("")))
            .map_err(|err| report_error(err.to_string()))?;
    }
    writer.flush().map_err(|err| report_error(err.to_string()))?;

    info!(path = %path.display(), "Report written");
    Ok(())
}

/// Reads a report written by [`write_report`]. Empty results read back as
/// empty strings, not null.
pub fn read_report(path: &Path) -> Result<Table> {
    let csv_error = |source: csv::Error| AnalysisError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();
    if headers.iter().collect::<Vec<_>>() != [DESCRIPTION_COLUMN, RESULT_COLUMN] {
        return Err(AnalysisError::Report {
            path: path.to_path_buf(),
            detail: format!("unexpected header {:?}", headers),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(Value::from).collect());
    }
    Ok(Table::new(REPORT_TABLE, report_schema(), rows)?)
}

/// Recovers typed results from a report table, matching rows to analyses by
/// description.
pub fn decode_report(report: &Table) -> Result<Vec<(Analysis, AnalysisResult)>> {
    report
        .rows()
        .iter()
        .map(|row| {
            let description = row[0].as_str().unwrap_or_default();
            let analysis = Analysis::ALL
                .iter()
                .copied()
                .find(|analysis| analysis.description() == description)
                .ok_or_else(|| AnalysisError::Decode {
                    analysis: 0,
                    detail: format!("unknown analysis description {:?}", description),
                })?;
            let result = AnalysisResult::decode(analysis, row[1].as_str().unwrap_or_default())?;
            Ok((analysis, result))
        })
        .collect()
}
