//! # CSV Ingestion
//!
//! Reads one crash table from a CSV file with a header row. Header names are
//! matched to the table's declared columns by name, so column order in the
//! file does not matter. Every declared column must be present; extra
//! columns are skipped with a warning.
//!
//! Each cell is coerced to its column's declared type. Empty cells and cells
//! missing from a short row become null. So do cells that are not valid
//! UTF-8 or fail to parse; those are counted in
//! [`IngestStats`] so a bad export is visible in the logs rather than
//! silently shrinking the answers.

use crate::error::{AnalysisError, Result};
use crate::tables::TableKind;
use catalog::{Row, Table};
use csv::{ByteRecord, StringRecord};
use getset::Getters;
use std::io;
use std::path::Path;
use std::time::Instant;
use tracing::{info, instrument, warn};
use ty::{DataType, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct IngestStats {
    rows: usize,
    /// Non-empty cells that did not parse as the declared type.
    unparsable: usize,
}

/// Reads the CSV file at `path` into a table of the given kind.
#[instrument(skip(timestamp_formats), fields(table = %kind))]
pub fn read_table(
    kind: TableKind,
    path: &Path,
    timestamp_formats: &[String],
) -> Result<(Table, IngestStats)> {
    if !path.is_file() {
        return Err(AnalysisError::MissingInput {
            table: kind.name().to_string(),
            path: path.to_path_buf(),
        });
    }

    let reader = reader_builder()
        .from_path(path)
        .map_err(|source| AnalysisError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    read_records(kind, reader, path, timestamp_formats)
}

/// Reads CSV text from any reader. `source` only labels errors and logs.
pub fn read_csv<R: io::Read>(
    kind: TableKind,
    input: R,
    source: &Path,
    timestamp_formats: &[String],
) -> Result<(Table, IngestStats)> {
    let reader = reader_builder().from_reader(input);
    read_records(kind, reader, source, timestamp_formats)
}

/// Rows may be shorter or longer than the header; missing cells read as null.
fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

fn read_records<R: io::Read>(
    kind: TableKind,
    mut reader: csv::Reader<R>,
    source: &Path,
    timestamp_formats: &[String],
) -> Result<(Table, IngestStats)> {
    let start = Instant::now();
    let csv_error = |source_error: csv::Error| AnalysisError::Csv {
        path: source.to_path_buf(),
        source: source_error,
    };

    let schema = kind.schema();
    let headers = reader.headers().map_err(csv_error)?.clone();
    let positions = header_positions(kind, &headers, source)?;

    let mut stats = IngestStats::default();
    let mut rows: Vec<Row> = Vec::new();
    let mut record = ByteRecord::new();
    while reader.read_byte_record(&mut record).map_err(csv_error)? {
        let mut row = Vec::with_capacity(schema.len());
        for (column, &position) in schema.columns().iter().zip(&positions) {
            let parsed = match record.get(position) {
                None => Some(DataType::Null),
                Some(bytes) => std::str::from_utf8(bytes).ok().and_then(|raw| {
                    DataType::parse_as(raw, *column.column_type(), timestamp_formats).ok()
                }),
            };
            let value = match parsed {
                Some(data) => Value::new(data),
                None => {
                    stats.unparsable += 1;
                    Value::null()
                }
            };
            row.push(value);
        }
        rows.push(row);
    }
    stats.rows = rows.len();

    if stats.unparsable > 0 {
        warn!(
            table = %kind,
            cells = stats.unparsable,
            "Unparsable cells were read as null"
        );
    }
    let table = Table::new(kind.name(), schema, rows)?;
    info!(
        "ingested {} records for {} in {:?}",
        stats.rows,
        kind,
        start.elapsed()
    );
    Ok((table, stats))
}

/// Position of every declared column in the CSV header.
fn header_positions(kind: TableKind, headers: &StringRecord, source: &Path) -> Result<Vec<usize>> {
    let schema = kind.schema();
    let names: Vec<&str> = headers.iter().map(str::trim).collect();

    let mut positions = Vec::with_capacity(schema.len());
    for column in schema.columns() {
        match names.iter().position(|name| *name == column.column_name().as_str()) {
            Some(position) => positions.push(position),
            None => {
                return Err(AnalysisError::Ingest {
                    path: source.to_path_buf(),
                    detail: format!(
                        "header has no column {} required by table {}",
                        column.column_name(),
                        kind
                    ),
                })
            }
        }
    }

    for name in names.iter().filter(|name| !schema.contains(name)) {
        warn!(table = %kind, column = %name, "Ignoring undeclared column");
    }
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;

    fn read(kind: TableKind, text: &str) -> Result<(Table, IngestStats)> {
        read_csv(kind, text.as_bytes(), Path::new("inline.csv"), &[])
    }

    #[test]
    fn test_reads_by_header_name() {
        let (table, stats) = read(
            TableKind::Damage,
            "DAMAGED_PROPERTY,CRASH_ID\nFENCE,14\n\"MAILBOX, METAL\",15\n",
        )
        .unwrap();
        assert_eq!(stats.rows(), &2);
        assert_eq!(
            table.rows(),
            &vec![
                vec![Value::from(14), Value::from("FENCE")],
                vec![Value::from(15), Value::from("MAILBOX, METAL")],
            ]
        );
    }

    #[test]
    fn test_unparsable_and_empty_cells_become_null() {
        let (table, stats) = read(
            TableKind::Charge,
            "CRASH_ID,UNIT_NBR,PRSN_NBR,CHARGE,CITATION_NBR\n\
             1,2.0,x,SPEEDING,\n\
             ,1,1,,C1\n",
        )
        .unwrap();
        assert_eq!(stats.unparsable(), &1);
        assert_eq!(
            table.rows()[0],
            vec![
                Value::from(1),
                Value::from(2),
                Value::null(),
                Value::from("SPEEDING"),
                Value::null()
            ]
        );
        assert!(table.rows()[1][0].is_null());
        assert!(table.rows()[1][3].is_null());
    }

    #[test]
    fn test_short_rows_pad_with_null() {
        let (table, stats) = read(
            TableKind::Damage,
            "CRASH_ID,DAMAGED_PROPERTY\n14\n15,FENCE,EXTRA\n",
        )
        .unwrap();
        assert_eq!(stats.unparsable(), &0);
        assert_eq!(
            table.rows(),
            &vec![
                vec![Value::from(14), Value::null()],
                vec![Value::from(15), Value::from("FENCE")],
            ]
        );
    }

    #[test]
    fn test_invalid_utf8_cell_becomes_null() {
        let input: &[u8] = b"CRASH_ID,DAMAGED_PROPERTY\n14,FEN\xffCE\n15,MAILBOX\n";
        let (table, stats) =
            read_csv(TableKind::Damage, input, Path::new("inline.csv"), &[]).unwrap();
        assert_eq!(stats.unparsable(), &1);
        assert_eq!(
            table.rows(),
            &vec![
                vec![Value::from(14), Value::null()],
                vec![Value::from(15), Value::from("MAILBOX")],
            ]
        );
    }

    #[test]
    fn test_missing_header_column() {
        let err = read(TableKind::Damage, "CRASH_ID\n1\n").unwrap_err();
        assert!(matches!(err, AnalysisError::Ingest { .. }));
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let (table, _) = read(
            TableKind::Endorse,
            "CRASH_ID,UNIT_NBR,NOTE,DRVR_LIC_ENDORS_ID\n3,1,ignored,NONE\n",
        )
        .unwrap();
        assert_eq!(
            table.rows()[0],
            vec![Value::from(3), Value::from(1), Value::from("NONE")]
        );
    }

    #[test]
    fn test_timestamp_cells() {
        let header: Vec<String> = TableKind::Person
            .schema()
            .column_names()
            .map(str::to_string)
            .collect();
        let mut cells = vec![String::new(); header.len()];
        let death_time = header.iter().position(|c| c == "PRSN_DEATH_TIME").unwrap();
        cells[death_time] = "01/03/2018 02:15:00 AM".to_string();
        let text = format!("{}\n{}\n", header.join(","), cells.join(","));

        let (table, stats) = read(TableKind::Person, &text).unwrap();
        assert_eq!(stats.unparsable(), &0);
        assert_eq!(
            table.rows()[0][death_time].to_string(),
            "2018-01-03 02:15:00"
        );
    }

    #[test]
    fn test_missing_file() {
        let err = read_table(TableKind::Unit, Path::new("/nonexistent/Units_use.csv"), &[]).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingInput { .. }));
    }
}
