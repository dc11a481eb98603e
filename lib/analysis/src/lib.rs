//! # Crash Analyses
//!
//! Loads the six crash tables into a [`PipelineContext`], runs the eight
//! fixed analyses over it and writes the two-column report.
//!
//! ```no_run
//! use analysis::run_pipeline;
//! use common::config::CrashConfig;
//!
//! let report = run_pipeline(&CrashConfig::default())?;
//! println!("report written to {}", report.display());
//! # Ok::<(), analysis::AnalysisError>(())
//! ```

mod analyses;
mod context;
mod error;
mod ingest;
mod report;
mod result;
mod runner;
mod speeding;
mod tables;

pub use analyses::{
    injury_makes_5_to_15, insured_undamaged_crashes, male_fatality_crashes, top_alcohol_zips,
    top_ethnicity_by_body_style, top_female_state, two_wheelers_booked, Analysis,
};
pub use context::PipelineContext;
pub use error::{AnalysisError, Result};
pub use ingest::{read_csv, read_table, IngestStats};
pub use report::{
    assemble, decode_report, read_report, report_schema, write_report, DESCRIPTION_COLUMN,
    RESULT_COLUMN,
};
pub use result::{AnalysisResult, BodyStyleEthnicity, MakeOffences, MakeRank, ZipRank};
pub use runner::{run_all, run_pipeline};
pub use speeding::SpeedingPipeline;
pub use tables::TableKind;
