//! Record shapes flowing through the daily batch.
//!
//! `RawRecord` is the fixed input contract. Each stage produces its own
//! owned shape: `RedactedRecord` (PHI stripped), `NormalizedRecord`
//! (tri-state readings), `CleanRecord` (readings are value or null) and
//! `EnrichedRecord` (derived mean, level and batch date).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::constants::{
    COMPLETE_DATASET_SUFFIX, INCOMPLETE_DATASET_SUFFIX, SENTINEL,
};

/// One row of the dated input file, as declared by the fixed schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub patient_id: i32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub glucose_mg_dl_t1: Option<f32>,
    pub glucose_mg_dl_t2: Option<f32>,
    pub glucose_mg_dl_t3: Option<f32>,
    pub cancer_present: Option<bool>,
    pub atrophy_present: Option<i32>,
}

/// Identifier and clinical fields only
#[derive(Debug, Clone, PartialEq)]
pub struct RedactedRecord {
    pub patient_id: i32,
    pub mg_dl_t1: Option<f32>,
    pub mg_dl_t2: Option<f32>,
    pub mg_dl_t3: Option<f32>,
    pub cancer_present: Option<bool>,
    pub atrophy_present: Option<i32>,
}

impl RedactedRecord {
    pub fn readings(&self) -> [Option<f32>; 3] {
        [self.mg_dl_t1, self.mg_dl_t2, self.mg_dl_t3]
    }
}

/// State of a single glucose reading after the range check.
///
/// `Missing` means the reading was never taken; `Rejected` means it was
/// taken but is physically implausible. Only the latter disqualifies a
/// record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Valid(f32),
    Missing,
    Rejected,
}

impl Reading {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Reading::Rejected)
    }

    /// The column value this reading stands for, with rejected readings
    /// written as the sentinel
    pub fn column_value(&self) -> Option<f32> {
        match self {
            Reading::Valid(v) => Some(*v),
            Reading::Missing => None,
            Reading::Rejected => Some(SENTINEL),
        }
    }

    /// Collapse to value-or-null. `None` for rejected readings too, so
    /// callers must filter rejected records first.
    pub fn value(&self) -> Option<f32> {
        match self {
            Reading::Valid(v) => Some(*v),
            Reading::Missing | Reading::Rejected => None,
        }
    }
}

/// Intermediate normalizer output, before rejected records are dropped
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub patient_id: i32,
    pub readings: [Reading; 3],
    pub cancer_present: u8,
    pub atrophy_present: Option<i32>,
}

impl NormalizedRecord {
    pub fn is_rejected(&self) -> bool {
        self.readings.iter().any(Reading::is_rejected)
    }

    /// Names of the reading columns that failed the range check
    pub fn rejected_fields(&self) -> Vec<&'static str> {
        READING_FIELDS
            .iter()
            .zip(self.readings.iter())
            .filter(|(_, r)| r.is_rejected())
            .map(|(name, _)| *name)
            .collect()
    }
}

/// Output column names of the three readings
pub const READING_FIELDS: [&str; 3] = ["mg_dl_t1", "mg_dl_t2", "mg_dl_t3"];

/// A validated record: every reading is either in range or null
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub patient_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mg_dl_t1: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mg_dl_t2: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mg_dl_t3: Option<f32>,
    pub cancer_present: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atrophy_present: Option<i32>,
}

impl CleanRecord {
    pub fn readings(&self) -> [Option<f32>; 3] {
        [self.mg_dl_t1, self.mg_dl_t2, self.mg_dl_t3]
    }

    pub fn completeness(&self) -> Completeness {
        if self.readings().iter().all(Option::is_some) {
            Completeness::Complete
        } else {
            Completeness::Incomplete
        }
    }
}

/// Glucose level derived from the rounded mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GlucoseLevel {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "prediabetes")]
    Prediabetes,
    #[serde(rename = "diabetes")]
    Diabetes,
    #[serde(rename = "not applicable")]
    NotApplicable,
}

impl GlucoseLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlucoseLevel::Normal => "normal",
            GlucoseLevel::Prediabetes => "prediabetes",
            GlucoseLevel::Diabetes => "diabetes",
            GlucoseLevel::NotApplicable => "not applicable",
        }
    }
}

impl std::fmt::Display for GlucoseLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A clean record with the derived fields stamped on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: CleanRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glucose_mean: Option<f64>,
    pub glucose_level: GlucoseLevel,
    pub measurement_date: NaiveDate,
}

impl EnrichedRecord {
    pub fn completeness(&self) -> Completeness {
        self.record.completeness()
    }
}

/// Partition key for the output datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    /// All three readings present
    Complete,
    /// At least one reading missing
    Incomplete,
}

impl Completeness {
    /// Suffix appended to the batch date to name the dataset
    pub fn dataset_suffix(&self) -> &'static str {
        match self {
            Completeness::Complete => COMPLETE_DATASET_SUFFIX,
            Completeness::Incomplete => INCOMPLETE_DATASET_SUFFIX,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Completeness::Complete => "complete",
            Completeness::Incomplete => "incomplete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn clean(t1: Option<f32>, t2: Option<f32>, t3: Option<f32>) -> CleanRecord {
        CleanRecord {
            patient_id: 7,
            mg_dl_t1: t1,
            mg_dl_t2: t2,
            mg_dl_t3: t3,
            cancer_present: 0,
            atrophy_present: None,
        }
    }

    #[test]
    fn test_completeness_requires_all_readings() {
        assert_eq!(clean(Some(1.0), Some(2.0), Some(3.0)).completeness(), Completeness::Complete);
        assert_eq!(clean(Some(1.0), None, Some(3.0)).completeness(), Completeness::Incomplete);
        assert_eq!(clean(None, None, None).completeness(), Completeness::Incomplete);
    }

    #[test]
    fn test_rejected_reading_column_value_is_sentinel() {
        assert_eq!(Reading::Rejected.column_value(), Some(SENTINEL));
        assert_eq!(Reading::Rejected.value(), None);
        assert_eq!(Reading::Missing.column_value(), None);
        assert_eq!(Reading::Valid(12.5).column_value(), Some(12.5));
    }

    #[test]
    fn test_rejected_fields_are_named() {
        let record = NormalizedRecord {
            patient_id: 1,
            readings: [Reading::Valid(100.0), Reading::Rejected, Reading::Rejected],
            cancer_present: 0,
            atrophy_present: None,
        };
        assert!(record.is_rejected());
        assert_eq!(record.rejected_fields(), vec!["mg_dl_t2", "mg_dl_t3"]);
    }

    #[test]
    fn test_enriched_record_serializes_flat_and_omits_nulls() {
        let record = EnrichedRecord {
            record: clean(Some(100.0), Some(110.0), None),
            glucose_mean: None,
            glucose_level: GlucoseLevel::NotApplicable,
            measurement_date: NaiveDate::from_ymd_opt(2020, 10, 28).unwrap(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "patient_id": 7,
                "mg_dl_t1": 100.0,
                "mg_dl_t2": 110.0,
                "cancer_present": 0,
                "glucose_level": "not applicable",
                "measurement_date": "2020-10-28"
            })
        );
    }
}
