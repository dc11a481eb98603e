//! Analysis 8: top vehicle makes for speeding offences, restricted to
//! licensed drivers, the most common vehicle colors and the states with the
//! most offences.
//!
//! The work is split into three stages that can be run on their own:
//! [`SpeedingPipeline::top_colors`], [`SpeedingPipeline::top_states`] and
//! [`SpeedingPipeline::offences`].

use crate::analyses::{column_list, integer, Analysis};
use crate::context::PipelineContext;
use crate::error::Result;
use crate::result::MakeOffences;
use catalog::Table;
use execution::{col, Aggregation, SortKey, TableExt};
use getset::CopyGetters;
use tracing::{debug, instrument};
use ty::Value;

const LICENSE_TYPES: [&str; 2] = ["DRIVER LICENSE", "COMMERCIAL DRIVER LIC."];

#[derive(Debug, Clone, Copy, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct SpeedingPipeline {
    /// How many vehicle colors qualify.
    color_limit: usize,
    /// How many license states qualify.
    state_limit: usize,
    /// How many makes are reported.
    make_limit: usize,
}

impl Default for SpeedingPipeline {
    fn default() -> Self {
        Self {
            color_limit: 10,
            state_limit: 25,
            make_limit: 5,
        }
    }
}

impl SpeedingPipeline {
    pub fn new(color_limit: usize, state_limit: usize, make_limit: usize) -> Self {
        Self {
            color_limit,
            state_limit,
            make_limit,
        }
    }

    /// The most frequent `VEH_COLOR_ID` values over all units.
    #[instrument(skip_all)]
    pub fn top_colors(&self, unit: &Table) -> Result<Vec<Value>> {
        let colors = unit
            .group_by(&["VEH_COLOR_ID"])
            .agg(&[Aggregation::count_star("COLOR_CNT")])?
            .order_by(&[SortKey::desc("COLOR_CNT"), SortKey::asc("VEH_COLOR_ID")])?
            .limit(self.color_limit);
        column_list(&colors, "VEH_COLOR_ID")
    }

    /// The `VEH_LIC_STATE_ID` values with the most charges.
    #[instrument(skip_all)]
    pub fn top_states(&self, unit: &Table, charge: &Table) -> Result<Vec<Value>> {
        let states = unit
            .inner_join(charge, &["CRASH_ID"])?
            .group_by(&["VEH_LIC_STATE_ID"])
            .agg(&[Aggregation::count_star("OFFENCE_CNT")])?
            .order_by(&[
                SortKey::desc("OFFENCE_CNT"),
                SortKey::asc("VEH_LIC_STATE_ID"),
            ])?
            .limit(self.state_limit);
        column_list(&states, "VEH_LIC_STATE_ID")
    }

    /// Speeding offences by licensed drivers per make, limited to the given
    /// colors and states. A null color or state in either list matches
    /// nothing.
    ///
    /// Each side is narrowed to the columns it contributes and filtered
    /// before the joins, so only qualifying rows are multiplied out.
    #[instrument(skip_all, fields(colors = colors.len(), states = states.len()))]
    pub fn offences(
        &self,
        context: &PipelineContext,
        colors: &[Value],
        states: &[Value],
    ) -> Result<Vec<MakeOffences>> {
        let units = context
            .unit()
            .project(&["CRASH_ID", "VEH_MAKE_ID", "VEH_COLOR_ID", "VEH_LIC_STATE_ID"])?
            .filter(
                &col("VEH_COLOR_ID")
                    .is_in(colors.iter().cloned())
                    .and(col("VEH_LIC_STATE_ID").is_in(states.iter().cloned())),
            )?;
        let charges = context
            .charge()
            .project(&["CRASH_ID", "CHARGE"])?
            .filter(&col("CHARGE").lower().contains("speed"))?;
        let drivers = context
            .person()
            .project(&["CRASH_ID", "DRVR_LIC_TYPE_ID"])?
            .filter(&col("DRVR_LIC_TYPE_ID").is_in(LICENSE_TYPES))?;

        let makes = units
            .inner_join(&charges, &["CRASH_ID"])?
            .inner_join(&drivers, &["CRASH_ID"])?
            .group_by(&["VEH_MAKE_ID"])
            .agg(&[Aggregation::count_star("OFFENCE_CNT")])?
            .order_by(&[SortKey::desc("OFFENCE_CNT"), SortKey::asc("VEH_MAKE_ID")])?
            .limit(self.make_limit);

        makes
            .rows()
            .iter()
            .map(|row| {
                Ok(MakeOffences {
                    make: row[0].as_str().map(str::to_string),
                    offences: integer(Analysis::SpeedingMakes, "OFFENCE_CNT", &row[1])?,
                })
            })
            .collect()
    }

    pub fn run(&self, context: &PipelineContext) -> Result<Vec<MakeOffences>> {
        let colors = self.top_colors(context.unit())?;
        let states = self.top_states(context.unit(), context.charge())?;
        debug!(?colors, ?states, "Speeding filters selected");
        self.offences(context, &colors, &states)
    }
}
