//! Grammar for benchmark file stems.
//!
//! ```text
//! stem      := qualified | bare
//! qualified := dataset "_" step "_" suffix     dataset may itself contain "_"
//! bare      := step "_" suffix
//! ```
//!
//! `step` and `suffix` may be empty; `dataset`, when present, may not.
//!
//! `plate1_annotate_benchmark` → dataset `plate1`;
//! `annotate_benchmark` → all inputs.

use crate::error::BenchError;
use regex::Regex;

/// Dataset name for executions that ran over every input at once.
pub const ALL_INPUTS: &str = "all_inputs";

/// Step category whose files never carry a dataset qualifier
/// (`feature_select_benchmark`).
const DATASET_LESS_PREFIX: &str = "feature";

const STEM_RE: &str = r"^(?:(?P<dataset>.*)_)?(?P<step>[^_]*)_(?P<suffix>[^_]*)$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputName {
    Dataset(String),
    AllInputs,
}

impl InputName {
    pub fn as_str(&self) -> &str {
        match self {
            InputName::Dataset(name) => name,
            InputName::AllInputs => ALL_INPUTS,
        }
    }

    /// Derive the input dataset from a file stem.
    ///
    /// Both a bare stem and a stem whose first token is `feature` collapse
    /// to [`InputName::AllInputs`].
    pub fn from_stem(stem: &str) -> Result<Self, BenchError> {
        let re = Regex::new(STEM_RE)?;
        let caps = re
            .captures(stem)
            .ok_or_else(|| BenchError::BadFileName(stem.to_string()))?;

        let first_token = stem.split('_').next().unwrap_or_default();
        match caps.name("dataset") {
            None => Ok(InputName::AllInputs),
            Some(_) if first_token == DATASET_LESS_PREFIX => Ok(InputName::AllInputs),
            Some(dataset) if dataset.as_str().is_empty() => {
                Err(BenchError::BadFileName(stem.to_string()))
            }
            Some(dataset) => Ok(InputName::Dataset(dataset.as_str().to_string())),
        }
    }
}
