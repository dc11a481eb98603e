//! The six crash tables and their declared schemas.

use catalog::{Column, Row, Schema, SchemaError, SchemaRef, Table};
use common::config::InputFiles;
use std::fmt;
use std::sync::Arc;
use ty::{DataTypeKind, Value};

use DataTypeKind::{Double, Integer, Text, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TableKind {
    Person,
    Restrict,
    Unit,
    Charge,
    Damage,
    Endorse,
}

const PERSON_COLUMNS: &[(&str, DataTypeKind)] = &[
    ("CRASH_ID", Integer),
    ("UNIT_NBR", Integer),
    ("PRSN_NBR", Integer),
    ("PRSN_TYPE_ID", Text),
    ("PRSN_OCCPNT_POS_ID", Text),
    ("PRSN_INJRY_SEV_ID", Text),
    ("PRSN_AGE", Integer),
    ("PRSN_ETHNICITY_ID", Text),
    ("PRSN_GNDR_ID", Text),
    ("PRSN_EJCT_ID", Text),
    ("PRSN_REST_ID", Text),
    ("PRSN_AIRBAG_ID", Text),
    ("PRSN_HELMET_ID", Text),
    ("PRSN_SOL_FL", Text),
    ("PRSN_ALC_SPEC_TYPE_ID", Text),
    ("PRSN_ALC_RSLT_ID", Text),
    ("PRSN_BAC_TEST_RSLT", Double),
    ("PRSN_DRG_SPEC_TYPE_ID", Text),
    ("PRSN_DRG_RSLT_ID", Text),
    ("DRVR_DRG_CAT_1_ID", Text),
    ("PRSN_DEATH_TIME", Timestamp),
    ("INCAP_INJRY_CNT", Integer),
    ("NONINCAP_INJRY_CNT", Integer),
    ("POSS_INJRY_CNT", Integer),
    ("NON_INJRY_CNT", Integer),
    ("UNKN_INJRY_CNT", Integer),
    ("TOT_INJRY_CNT", Integer),
    ("DEATH_CNT", Integer),
    ("DRVR_LIC_TYPE_ID", Text),
    ("DRVR_LIC_STATE_ID", Text),
    ("DRVR_LIC_CLS_ID", Text),
    ("DRVR_ZIP", Text),
];

const RESTRICT_COLUMNS: &[(&str, DataTypeKind)] = &[
    ("CRASH_ID", Integer),
    ("UNIT_NBR", Integer),
    ("DRVR_LIC_RESTRIC_ID", Text),
];

const UNIT_COLUMNS: &[(&str, DataTypeKind)] = &[
    ("CRASH_ID", Integer),
    ("UNIT_NBR", Integer),
    ("UNIT_DESC_ID", Text),
    ("VEH_PARKED_FL", Text),
    ("VEH_HNR_FL", Text),
    ("VEH_LIC_STATE_ID", Text),
    ("VIN", Text),
    ("VEH_MOD_YEAR", Integer),
    ("VEH_COLOR_ID", Text),
    ("VEH_MAKE_ID", Text),
    ("VEH_MOD_ID", Text),
    ("VEH_BODY_STYL_ID", Text),
    ("EMER_RESPNDR_FL", Text),
    ("OWNR_ZIP", Text),
    ("FIN_RESP_PROOF_ID", Text),
    ("FIN_RESP_TYPE_ID", Text),
    ("VEH_DMAG_AREA_1_ID", Text),
    ("VEH_DMAG_SCL_1_ID", Text),
    ("FORCE_DIR_1_ID", Text),
    ("VEH_DMAG_AREA_2_ID", Text),
    ("VEH_DMAG_SCL_2_ID", Text),
    ("FORCE_DIR_2_ID", Text),
    ("VEH_INVENTORIED_FL", Text),
    ("VEH_TRANSP_NAME", Text),
    ("VEH_TRANSP_DEST", Text),
    ("CONTRIB_FACTR_1_ID", Text),
    ("CONTRIB_FACTR_2_ID", Text),
    ("CONTRIB_FACTR_P1_ID", Text),
    ("VEH_TRVL_DIR_ID", Text),
    ("FIRST_HARM_EVT_INV_ID", Text),
    ("INCAP_INJRY_CNT", Integer),
    ("NONINCAP_INJRY_CNT", Integer),
    ("POSS_INJRY_CNT", Integer),
    ("NON_INJRY_CNT", Integer),
    ("UNKN_INJRY_CNT", Integer),
    ("TOT_INJRY_CNT", Integer),
    ("DEATH_CNT", Integer),
];

const CHARGE_COLUMNS: &[(&str, DataTypeKind)] = &[
    ("CRASH_ID", Integer),
    ("UNIT_NBR", Integer),
    ("PRSN_NBR", Integer),
    ("CHARGE", Text),
    ("CITATION_NBR", Text),
];

const DAMAGE_COLUMNS: &[(&str, DataTypeKind)] =
    &[("CRASH_ID", Integer), ("DAMAGED_PROPERTY", Text)];

const ENDORSE_COLUMNS: &[(&str, DataTypeKind)] = &[
    ("CRASH_ID", Integer),
    ("UNIT_NBR", Integer),
    ("DRVR_LIC_ENDORS_ID", Text),
];

impl TableKind {
    pub const ALL: [TableKind; 6] = [
        TableKind::Person,
        TableKind::Restrict,
        TableKind::Unit,
        TableKind::Charge,
        TableKind::Damage,
        TableKind::Endorse,
    ];

    /// Table name, used to qualify colliding columns in joins.
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Person => "Person",
            TableKind::Restrict => "Restrict",
            TableKind::Unit => "Unit",
            TableKind::Charge => "Charge",
            TableKind::Damage => "Damage",
            TableKind::Endorse => "Endorse",
        }
    }

    fn columns(&self) -> &'static [(&'static str, DataTypeKind)] {
        match self {
            TableKind::Person => PERSON_COLUMNS,
            TableKind::Restrict => RESTRICT_COLUMNS,
            TableKind::Unit => UNIT_COLUMNS,
            TableKind::Charge => CHARGE_COLUMNS,
            TableKind::Damage => DAMAGE_COLUMNS,
            TableKind::Endorse => ENDORSE_COLUMNS,
        }
    }

    pub fn schema(&self) -> SchemaRef {
        let columns = self
            .columns()
            .iter()
            .map(|(name, kind)| Column::new(name, *kind))
            .collect();
        // Column names in the declarations above are unique and non-empty.
        Arc::new(Schema::new(columns).unwrap_or_else(|err| {
            unreachable!("invalid declared schema for {}: {}", self.name(), err)
        }))
    }

    /// The configured CSV file name of this table.
    pub fn file_name<'a>(&self, files: &'a InputFiles) -> &'a str {
        match self {
            TableKind::Person => files.person().as_str(),
            TableKind::Restrict => files.restrict().as_str(),
            TableKind::Unit => files.unit().as_str(),
            TableKind::Charge => files.charge().as_str(),
            TableKind::Damage => files.damage().as_str(),
            TableKind::Endorse => files.endorse().as_str(),
        }
    }

    pub fn empty_table(&self) -> Table {
        Table::empty(self.name(), self.schema())
    }

    /// A row of this table holding the given cells and null everywhere else.
    pub fn sparse_row(&self, cells: &[(&str, Value)]) -> Result<Row, SchemaError> {
        let schema = self.schema();
        let mut row = vec![Value::null(); schema.len()];
        for (name, value) in cells {
            row[schema.get_col_idx(name)?] = value.clone();
        }
        Ok(row)
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions_sorted::assert_eq;

    #[test]
    fn test_schema_widths() {
        let widths: Vec<usize> = TableKind::ALL.iter().map(|kind| kind.schema().len()).collect();
        assert_eq!(widths, vec![32, 3, 37, 5, 2, 3]);
    }

    #[test]
    fn test_declared_types() {
        let person = TableKind::Person.schema();
        let bac = person.get_col_idx("PRSN_BAC_TEST_RSLT").unwrap();
        assert_eq!(person.get_column(bac).unwrap().column_type(), &Double);
        let death_time = person.get_col_idx("PRSN_DEATH_TIME").unwrap();
        assert_eq!(person.get_column(death_time).unwrap().column_type(), &Timestamp);
    }

    #[test]
    fn test_file_names() {
        let files = InputFiles::default();
        assert_eq!(TableKind::Person.file_name(&files), "Primary_Person_use.csv");
        assert_eq!(TableKind::Endorse.file_name(&files), "Endorse_use.csv");
    }

    #[test]
    fn test_sparse_row() {
        let row = TableKind::Damage
            .sparse_row(&[("DAMAGED_PROPERTY", Value::from("FENCE"))])
            .unwrap();
        assert_eq!(row, vec![Value::null(), Value::from("FENCE")]);
        assert!(TableKind::Damage.sparse_row(&[("VIN", Value::null())]).is_err());
    }
}
