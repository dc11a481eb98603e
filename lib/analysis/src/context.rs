use crate::error::{AnalysisError, Result};
use crate::ingest::read_table;
use crate::tables::TableKind;
use catalog::{Table, TableError};
use common::config::CrashConfig;
use getset::Getters;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{info, instrument};

/// The six input tables of one run. Built once, read by every analysis.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct PipelineContext {
    person: Table,
    restrict: Table,
    unit: Table,
    charge: Table,
    damage: Table,
    endorse: Table,
}

impl PipelineContext {
    /// Assembles a context from already built tables. All six kinds must be
    /// supplied, each with its declared schema.
    pub fn from_tables(tables: impl IntoIterator<Item = (TableKind, Table)>) -> Result<Self> {
        let mut tables: HashMap<TableKind, Table> = tables.into_iter().collect();
        for (kind, table) in &tables {
            if **table.schema() != *kind.schema() {
                return Err(TableError::SchemaViolation {
                    table: kind.name().to_string(),
                    row: 0,
                    detail: format!("expected schema {}, found {}", kind.schema(), table.schema()),
                }
                .into());
            }
        }

        let mut take = |kind: TableKind| {
            tables
                .remove(&kind)
                .ok_or_else(|| AnalysisError::MissingTable(kind.name().to_string()))
        };
        Ok(Self {
            person: take(TableKind::Person)?,
            restrict: take(TableKind::Restrict)?,
            unit: take(TableKind::Unit)?,
            charge: take(TableKind::Charge)?,
            damage: take(TableKind::Damage)?,
            endorse: take(TableKind::Endorse)?,
        })
    }

    /// A context of six empty tables.
    pub fn empty() -> Self {
        Self {
            person: TableKind::Person.empty_table(),
            restrict: TableKind::Restrict.empty_table(),
            unit: TableKind::Unit.empty_table(),
            charge: TableKind::Charge.empty_table(),
            damage: TableKind::Damage.empty_table(),
            endorse: TableKind::Endorse.empty_table(),
        }
    }

    /// Replaces one table, checking its schema.
    pub fn with_table(self, kind: TableKind, table: Table) -> Result<Self> {
        let mut tables: Vec<(TableKind, Table)> = TableKind::ALL
            .iter()
            .filter(|other| **other != kind)
            .map(|other| (*other, self.table(*other).clone()))
            .collect();
        tables.push((kind, table));
        Self::from_tables(tables)
    }

    pub fn table(&self, kind: TableKind) -> &Table {
        match kind {
            TableKind::Person => &self.person,
            TableKind::Restrict => &self.restrict,
            TableKind::Unit => &self.unit,
            TableKind::Charge => &self.charge,
            TableKind::Damage => &self.damage,
            TableKind::Endorse => &self.endorse,
        }
    }

    /// Reads the six CSV files named by `config`. Every file is checked for
    /// existence before any is read, so a missing input fails fast.
    #[instrument(skip_all, fields(data_dir = ?config.data_dir()))]
    pub fn load(config: &CrashConfig) -> Result<Self> {
        let paths: Vec<_> = TableKind::ALL
            .iter()
            .map(|kind| (*kind, config.input_path(kind.file_name(config.files()))))
            .collect();

        if let Some((kind, path)) = paths.iter().find(|(_, path)| !path.is_file()) {
            return Err(AnalysisError::MissingInput {
                table: kind.name().to_string(),
                path: path.clone(),
            });
        }

        let formats = config.timestamp_formats();
        let tables = paths
            .par_iter()
            .map(|(kind, path)| read_table(*kind, path, formats).map(|(table, _)| (*kind, table)))
            .collect::<Result<Vec<_>>>()?;

        let context = Self::from_tables(tables)?;
        info!(
            persons = context.person.len(),
            units = context.unit.len(),
            charges = context.charge.len(),
            damages = context.damage.len(),
            "Input tables loaded"
        );
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{Column, Schema};
    use std::sync::Arc;
    use ty::Value;

    #[test]
    fn test_from_tables_requires_all_six() {
        let tables = TableKind::ALL
            .iter()
            .filter(|kind| **kind != TableKind::Damage)
            .map(|kind| (*kind, kind.empty_table()));
        let err = PipelineContext::from_tables(tables).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingTable(table) if table == "Damage"));
    }

    #[test]
    fn test_from_tables_checks_schema() {
        let wrong = Table::empty(
            "Damage",
            Arc::new(Schema::new(vec![Column::integer("CRASH_ID")]).unwrap()),
        );
        let err = PipelineContext::empty()
            .with_table(TableKind::Damage, wrong)
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Table(TableError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn test_with_table() {
        let row = TableKind::Damage
            .sparse_row(&[("CRASH_ID", Value::from(5))])
            .unwrap();
        let damage = Table::new("Damage", TableKind::Damage.schema(), vec![row]).unwrap();
        let context = PipelineContext::empty()
            .with_table(TableKind::Damage, damage)
            .unwrap();
        assert_eq!(context.damage().len(), 1);
        assert!(context.unit().is_empty());
    }

    #[test]
    fn test_load_reports_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CrashConfig::default();
        config.set_data_dir(dir.path().to_path_buf());
        let err = PipelineContext::load(&config).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingInput { table, .. } if table == "Person"));
    }
}
