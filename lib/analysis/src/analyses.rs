//! # The Eight Analyses
//!
//! Each analysis is a fixed composition of relational operators over the
//! tables of a [`PipelineContext`]. Every step that orders rows carries an
//! explicit secondary key (the group key, ascending) so that ties always
//! resolve the same way.
//!
//! Empty inputs never fail: counts come out as zero, lists as empty and the
//! state as `None`.

use crate::context::PipelineContext;
use crate::error::{AnalysisError, Result};
use crate::result::{AnalysisResult, BodyStyleEthnicity, MakeRank, ZipRank};
use crate::speeding::SpeedingPipeline;
use catalog::Table;
use execution::{col, Aggregation, SortKey, TableExt};
use std::fmt;
use tracing::{debug, instrument};
use ty::Value;

const NO_PARTITION: [&str; 0] = [];

const EXCLUDED_BODY_STYLES: [&str; 3] = ["UNKNOWN", "NA", "NOT REPORTED"];
const EXCLUDED_ETHNICITIES: [&str; 3] = ["UNKNOWN", "OTHER", "NA"];
const CAR_BODY_STYLES: [&str; 3] = [
    "PASSENGER CAR, 4-DOOR",
    "PASSENGER CAR, 2-DOOR",
    "POLICE CAR/TRUCK",
];
const HIGH_DAMAGE_LEVELS: [&str; 3] = ["DAMAGED 5", "DAMAGED 6", "DAMAGED 7 HIGHEST"];
const INSURANCE_PROOFS: [&str; 2] = ["PROOF OF LIABILITY INSURANCE", "LIABILITY INSURANCE POLICY"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Analysis {
    MaleFatalities,
    TwoWheelersBooked,
    TopFemaleState,
    InjuryMakes,
    EthnicityByBodyStyle,
    AlcoholZips,
    InsuredUndamaged,
    SpeedingMakes,
}

impl Analysis {
    /// All analyses, in report order.
    pub const ALL: [Analysis; 8] = [
        Analysis::MaleFatalities,
        Analysis::TwoWheelersBooked,
        Analysis::TopFemaleState,
        Analysis::InjuryMakes,
        Analysis::EthnicityByBodyStyle,
        Analysis::AlcoholZips,
        Analysis::InsuredUndamaged,
        Analysis::SpeedingMakes,
    ];

    /// 1-based position in the report.
    pub fn number(&self) -> u8 {
        match self {
            Analysis::MaleFatalities => 1,
            Analysis::TwoWheelersBooked => 2,
            Analysis::TopFemaleState => 3,
            Analysis::InjuryMakes => 4,
            Analysis::EthnicityByBodyStyle => 5,
            Analysis::AlcoholZips => 6,
            Analysis::InsuredUndamaged => 7,
            Analysis::SpeedingMakes => 8,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.number() == number)
    }

    /// The `Analysis_Description` of this analysis in the report.
    pub fn description(&self) -> &'static str {
        match self {
            Analysis::MaleFatalities => "Number of crashes where number of persons killed are male",
            Analysis::TwoWheelersBooked => "Number of two wheelers booked for crashes",
            Analysis::TopFemaleState => "State having highest accidents where females are involved",
            Analysis::InjuryMakes => "Vehicle manufacturer's that contributes to largest no of injuries including death : Top 5th to top 15th",
            Analysis::EthnicityByBodyStyle => "Top ethnic user group of each body style",
            Analysis::AlcoholZips => "Top 5 zip codes having highest no of car crashes with alcohol as the contributing factor to crash",
            Analysis::InsuredUndamaged => "Count of distinct crash Id's where no damage property was observed, damage level was above 4 and car avails Insurance",
            Analysis::SpeedingMakes => "Top 5 vehicle manufacturer's where drivers are charged with speeding related offences, has licensed Drivers, used top 10 vehicle colours and has car licensed with the Top 25 states with highest number of offences",
        }
    }

    #[instrument(skip(context), fields(analysis = self.number()))]
    pub fn run(&self, context: &PipelineContext) -> Result<AnalysisResult> {
        let result = match self {
            Analysis::MaleFatalities => AnalysisResult::Count(male_fatality_crashes(context)?),
            Analysis::TwoWheelersBooked => AnalysisResult::Count(two_wheelers_booked(context)?),
            Analysis::TopFemaleState => AnalysisResult::State(top_female_state(context)?),
            Analysis::InjuryMakes => AnalysisResult::MakeRanks(injury_makes_5_to_15(context)?),
            Analysis::EthnicityByBodyStyle => {
                AnalysisResult::BodyStyleEthnicities(top_ethnicity_by_body_style(context)?)
            }
            Analysis::AlcoholZips => AnalysisResult::ZipRanks(top_alcohol_zips(context)?),
            Analysis::InsuredUndamaged => {
                AnalysisResult::Count(insured_undamaged_crashes(context)?)
            }
            Analysis::SpeedingMakes => {
                AnalysisResult::MakeOffences(SpeedingPipeline::default().run(context)?)
            }
        };
        debug!(%result, "Analysis finished");
        Ok(result)
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Analysis {}", self.number())
    }
}

/// Crashes in which at least one male person died.
#[instrument(skip_all)]
pub fn male_fatality_crashes(context: &PipelineContext) -> Result<i64> {
    let crashes = context
        .person()
        .filter(&col("DEATH_CNT").gt(0).and(col("PRSN_GNDR_ID").eq("MALE")))?
        .project(&["CRASH_ID"])?
        .distinct();
    Ok(crashes.len() as i64)
}

/// Crashes with a charged motorcycle unit.
#[instrument(skip_all)]
pub fn two_wheelers_booked(context: &PipelineContext) -> Result<i64> {
    let crashes = context
        .unit()
        .inner_join(context.charge(), &["CRASH_ID"])?
        .filter(&col("VEH_BODY_STYL_ID").eq("MOTORCYCLE"))?
        .project(&["CRASH_ID"])?
        .distinct();
    Ok(crashes.len() as i64)
}

/// Driver license state with the most female persons involved. `None` when
/// no female is recorded, or when the top group has no state.
#[instrument(skip_all)]
pub fn top_female_state(context: &PipelineContext) -> Result<Option<String>> {
    let top = context
        .person()
        .filter(&col("PRSN_GNDR_ID").eq("FEMALE"))?
        .group_by(&["DRVR_LIC_STATE_ID"])
        .agg(&[Aggregation::count("CRASH_ID", "HIGH_CRASH_FEMALE")])?
        .order_by(&[
            SortKey::desc("HIGH_CRASH_FEMALE"),
            SortKey::asc("DRVR_LIC_STATE_ID"),
        ])?
        .limit(1);

    Ok(top
        .rows()
        .first()
        .and_then(|row| row[0].as_str())
        .map(str::to_string))
}

/// Makes ranked 5th through 15th by total injuries, ordered by rank and
/// then make.
#[instrument(skip_all)]
pub fn injury_makes_5_to_15(context: &PipelineContext) -> Result<Vec<MakeRank>> {
    let ranked = context
        .unit()
        .filter(&col("VEH_MAKE_ID").not_eq("NA"))?
        .group_by(&["VEH_MAKE_ID"])
        .agg(&[Aggregation::sum("TOT_INJRY_CNT", "TOT_INJ_VEH_ID")])?
        .order_by(&[SortKey::asc("VEH_MAKE_ID")])?
        .rank_over(&NO_PARTITION, &SortKey::desc("TOT_INJ_VEH_ID"))?
        .where_rank_between(5, 15)?
        .project(&["VEH_MAKE_ID", execution::RANK_COLUMN])?;

    ranked
        .rows()
        .iter()
        .map(|row| {
            Ok(MakeRank {
                make: text(Analysis::InjuryMakes, "VEH_MAKE_ID", &row[0])?,
                rank: integer(Analysis::InjuryMakes, execution::RANK_COLUMN, &row[1])?,
            })
        })
        .collect()
}

/// For every body style, the ethnicity ranked first when ethnicities are
/// ordered by ascending crash count. Ordered by body style, then ethnicity.
#[instrument(skip_all)]
pub fn top_ethnicity_by_body_style(context: &PipelineContext) -> Result<Vec<BodyStyleEthnicity>> {
    let predicate = col("PRSN_ETHNICITY_ID")
        .not_in(EXCLUDED_ETHNICITIES)
        .and(col("VEH_BODY_STYL_ID").not_in(EXCLUDED_BODY_STYLES))
        .and(col("VEH_BODY_STYL_ID").contains("OTHER").negate());

    let top = context
        .person()
        .inner_join(context.unit(), &["CRASH_ID"])?
        .filter(&predicate)?
        .group_by(&["VEH_BODY_STYL_ID", "PRSN_ETHNICITY_ID"])
        .agg(&[Aggregation::count("CRASH_ID", "ETHNICITY_CRASH_CNT")])?
        .order_by(&[
            SortKey::asc("VEH_BODY_STYL_ID"),
            SortKey::asc("PRSN_ETHNICITY_ID"),
        ])?
        .rank_over(&["VEH_BODY_STYL_ID"], &SortKey::asc("ETHNICITY_CRASH_CNT"))?
        .where_rank_between(1, 1)?
        .project(&["VEH_BODY_STYL_ID", "PRSN_ETHNICITY_ID"])?
        .order_by(&[
            SortKey::asc("VEH_BODY_STYL_ID"),
            SortKey::asc("PRSN_ETHNICITY_ID"),
        ])?;

    top.rows()
        .iter()
        .map(|row| {
            Ok(BodyStyleEthnicity {
                body_style: text(Analysis::EthnicityByBodyStyle, "VEH_BODY_STYL_ID", &row[0])?,
                ethnicity: text(Analysis::EthnicityByBodyStyle, "PRSN_ETHNICITY_ID", &row[1])?,
            })
        })
        .collect()
}

/// Driver zip codes ranked 1st through 5th by alcohol-related car crashes,
/// ordered by rank and then zip.
#[instrument(skip_all)]
pub fn top_alcohol_zips(context: &PipelineContext) -> Result<Vec<ZipRank>> {
    let alcohol = col("CONTRIB_FACTR_1_ID")
        .lower()
        .contains("alcohol")
        .or(col("CONTRIB_FACTR_2_ID").lower().contains("alcohol"));
    let predicate = col("VEH_BODY_STYL_ID")
        .is_in(CAR_BODY_STYLES)
        .and(alcohol)
        .and(col("DRVR_ZIP").is_not_null());

    let ranked = context
        .person()
        .inner_join(context.unit(), &["CRASH_ID"])?
        .filter(&predicate)?
        .group_by(&["DRVR_ZIP"])
        .agg(&[Aggregation::count("CRASH_ID", "CAR_CRASH_CNT")])?
        .order_by(&[SortKey::asc("DRVR_ZIP")])?
        .rank_over(&NO_PARTITION, &SortKey::desc("CAR_CRASH_CNT"))?
        .where_rank_between(1, 5)?
        .project(&["DRVR_ZIP", execution::RANK_COLUMN])?;

    ranked
        .rows()
        .iter()
        .map(|row| {
            Ok(ZipRank {
                zip: text(Analysis::AlcoholZips, "DRVR_ZIP", &row[0])?,
                rank: integer(Analysis::AlcoholZips, execution::RANK_COLUMN, &row[1])?,
            })
        })
        .collect()
}

/// Distinct crashes with no damaged property, a unit damaged above level 4
/// and proof of liability insurance.
#[instrument(skip_all)]
pub fn insured_undamaged_crashes(context: &PipelineContext) -> Result<i64> {
    let high_damage = col("VEH_DMAG_SCL_1_ID")
        .is_in(HIGH_DAMAGE_LEVELS)
        .or(col("VEH_DMAG_SCL_2_ID").is_in(HIGH_DAMAGE_LEVELS));
    let predicate = col("DAMAGED_PROPERTY")
        .is_null()
        .and(high_damage)
        .and(col("FIN_RESP_TYPE_ID").is_in(INSURANCE_PROOFS));

    let crashes = context
        .unit()
        .left_join(context.damage(), &["CRASH_ID"])?
        .filter(&predicate)?
        .project(&["CRASH_ID"])?
        .distinct();
    Ok(crashes.len() as i64)
}

pub(crate) fn text(analysis: Analysis, column: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AnalysisError::UnexpectedNull {
            analysis: analysis.number(),
            column: column.to_string(),
        })
}

pub(crate) fn integer(analysis: Analysis, column: &str, value: &Value) -> Result<i64> {
    value.as_i64().ok_or_else(|| AnalysisError::UnexpectedNull {
        analysis: analysis.number(),
        column: column.to_string(),
    })
}

/// The values of one column as a list, for use in `IN` predicates.
pub(crate) fn column_list(table: &Table, column: &str) -> Result<Vec<Value>> {
    Ok(table.column_values(column)?.into_iter().cloned().collect())
}
