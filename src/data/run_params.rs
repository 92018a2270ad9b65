//! Run parameters embedded in result file names.
//!
//! Simulation output is named like `result-probability-add-26-2-50-40-150-.csv`.
//! The trailing run of integer fields starts with, in order, the threshold,
//! the number of trustees, the anonymity-set size, the number of subsecrets,
//! and the absolute threshold. Up to four further integers follow for runs
//! that vary more than the base parameters (a subsecret threshold, a hint
//! count, or the memory/obtain/whistleblow percentages of an adversary run).

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PlotError;

const FIELD_COUNT: usize = 5;
/// Integer fields accepted after the base parameters.
pub const MAX_EXTRAS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Param {
    Threshold,
    Trustees,
    Anonymity,
    Subsecrets,
    Absolute,
}

impl Param {
    pub fn label(self) -> &'static str {
        match self {
            Param::Threshold => "threshold",
            Param::Trustees => "trustees",
            Param::Anonymity => "anonymity",
            Param::Subsecrets => "subsecrets",
            Param::Absolute => "absolute",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunParams {
    pub threshold: u32,
    pub trustees: u32,
    pub anonymity: u32,
    pub subsecrets: u32,
    pub absolute: u32,
    /// Fields after the base five, zero when absent.
    pub extras: [u32; MAX_EXTRAS],
}

impl RunParams {
    pub fn from_file_name(name: &str) -> Result<Self, PlotError> {
        let stem = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name);
        let tokens: Vec<&str> = stem.split('-').filter(|t| !t.is_empty()).collect();
        let numeric = tokens
            .iter()
            .rev()
            .take_while(|t| t.parse::<u32>().is_ok())
            .count();
        let fields: Vec<u32> = tokens[tokens.len() - numeric..]
            .iter()
            .filter_map(|t| t.parse::<u32>().ok())
            .collect();
        if fields.len() < FIELD_COUNT || fields.len() > FIELD_COUNT + MAX_EXTRAS {
            return Err(PlotError::InvalidFileName(name.to_string()));
        }
        let mut extras = [0; MAX_EXTRAS];
        extras[..fields.len() - FIELD_COUNT].copy_from_slice(&fields[FIELD_COUNT..]);
        Ok(Self {
            threshold: fields[0],
            trustees: fields[1],
            anonymity: fields[2],
            subsecrets: fields[3],
            absolute: fields[4],
            extras,
        })
    }

    pub fn get(&self, param: Param) -> u32 {
        match param {
            Param::Threshold => self.threshold,
            Param::Trustees => self.trustees,
            Param::Anonymity => self.anonymity,
            Param::Subsecrets => self.subsecrets,
            Param::Absolute => self.absolute,
        }
    }
}

/// Name of the baseline result directory paired with `dir`: the first
/// `-x-` token becomes `-baseline-` (`p-add-an` -> `p-baseline-an`).
pub fn baseline_dir_name(dir: &str) -> String {
    let Some(start) = dir.find('-') else {
        return dir.to_string();
    };
    let Some(len) = dir[start + 1..].find('-') else {
        return dir.to_string();
    };
    let end = start + 1 + len;
    format!("{}-baseline{}", &dir[..start], &dir[end..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trailing_fields() {
        let params = RunParams::from_file_name("result-probability-add-26-2-50-40-150-.csv").unwrap();
        assert_eq!(
            params,
            RunParams {
                threshold: 26,
                trustees: 2,
                anonymity: 50,
                subsecrets: 40,
                absolute: 150,
                extras: [0; MAX_EXTRAS],
            }
        );
        assert_eq!(params.get(Param::Anonymity), 50);
    }

    #[test]
    fn extra_fields_follow_the_base_five() {
        let params =
            RunParams::from_file_name("result-probability-th-2-3-100-5-20-80-.csv").unwrap();
        assert_eq!(params.threshold, 2);
        assert_eq!(params.absolute, 20);
        assert_eq!(params.extras, [80, 0, 0, 0]);

        let adversary =
            RunParams::from_file_name("result-adv-2-3-100-5-20-40-40-70-1-.csv").unwrap();
        assert_eq!(adversary.anonymity, 100);
        assert_eq!(adversary.extras, [40, 40, 70, 1]);

        assert!(matches!(
            RunParams::from_file_name("result-1-2-3-4-5-6-7-8-9-10-.csv"),
            Err(PlotError::InvalidFileName(_))
        ));
    }

    #[test]
    fn too_few_fields_is_rejected() {
        assert!(matches!(
            RunParams::from_file_name("result-probability-1-2-.csv"),
            Err(PlotError::InvalidFileName(_))
        ));
    }

    #[test]
    fn baseline_name_replaces_first_token() {
        assert_eq!(baseline_dir_name("p-add-an"), "p-baseline-an");
        assert_eq!(baseline_dir_name("csv-prob_add_v_th-x"), "csv-baseline-x");
        assert_eq!(baseline_dir_name("plain"), "plain");
        assert_eq!(baseline_dir_name("one-dash"), "one-dash");
    }
}
