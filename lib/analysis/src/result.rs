//! # Analysis Results
//!
//! Typed answers of the eight analyses and their text encoding for the
//! report's `Result` column:
//!
//! - counts are written in decimal,
//! - a state is written verbatim, and a missing state as the empty string,
//! - lists are written as a JSON array of objects keyed by the original
//!   column names, e.g. `[{"VEH_MAKE_ID":"FORD","RANK":5}]`.
//!
//! [`AnalysisResult::decode`] inverts [`AnalysisResult::encode`] given the
//! analysis the text came from.

use crate::analyses::Analysis;
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeRank {
    #[serde(rename = "VEH_MAKE_ID")]
    pub make: String,
    #[serde(rename = "RANK")]
    pub rank: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyStyleEthnicity {
    #[serde(rename = "VEH_BODY_STYL_ID")]
    pub body_style: String,
    #[serde(rename = "PRSN_ETHNICITY_ID")]
    pub ethnicity: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipRank {
    #[serde(rename = "DRVR_ZIP")]
    pub zip: String,
    #[serde(rename = "RANK")]
    pub rank: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeOffences {
    /// `None` when the make was not recorded.
    #[serde(rename = "VEH_MAKE_ID")]
    pub make: Option<String>,
    #[serde(rename = "OFFENCE_CNT")]
    pub offences: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisResult {
    Count(i64),
    State(Option<String>),
    MakeRanks(Vec<MakeRank>),
    BodyStyleEthnicities(Vec<BodyStyleEthnicity>),
    ZipRanks(Vec<ZipRank>),
    MakeOffences(Vec<MakeOffences>),
}

impl AnalysisResult {
    pub fn encode(&self) -> Result<String> {
        let json = match self {
            AnalysisResult::Count(count) => return Ok(count.to_string()),
            AnalysisResult::State(state) => return Ok(state.clone().unwrap_or_default()),
            AnalysisResult::MakeRanks(records) => serde_json::to_string(records),
            AnalysisResult::BodyStyleEthnicities(records) => serde_json::to_string(records),
            AnalysisResult::ZipRanks(records) => serde_json::to_string(records),
            AnalysisResult::MakeOffences(records) => serde_json::to_string(records),
        };
        Ok(json?)
    }

    /// Parses the encoded result of `analysis`.
    pub fn decode(analysis: Analysis, text: &str) -> Result<Self> {
        let number = analysis.number();
        let json_error = |err: serde_json::Error| AnalysisError::Decode {
            analysis: number,
            detail: err.to_string(),
        };

        Ok(match analysis {
            Analysis::MaleFatalities | Analysis::TwoWheelersBooked | Analysis::InsuredUndamaged => {
                let count = text.trim().parse().map_err(|_| AnalysisError::Decode {
                    analysis: number,
                    detail: format!("{:?} is not a count", text),
                })?;
                AnalysisResult::Count(count)
            }
            Analysis::TopFemaleState => {
                AnalysisResult::State((!text.is_empty()).then(|| text.to_string()))
            }
            Analysis::InjuryMakes => {
                AnalysisResult::MakeRanks(serde_json::from_str(text).map_err(json_error)?)
            }
            Analysis::EthnicityByBodyStyle => {
                AnalysisResult::BodyStyleEthnicities(serde_json::from_str(text).map_err(json_error)?)
            }
            Analysis::AlcoholZips => {
                AnalysisResult::ZipRanks(serde_json::from_str(text).map_err(json_error)?)
            }
            Analysis::SpeedingMakes => {
                AnalysisResult::MakeOffences(serde_json::from_str(text).map_err(json_error)?)
            }
        })
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Ok(text) => write!(f, "{}", text),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}
