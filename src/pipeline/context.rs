use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use crate::constants::{input_file_name, DATE_FORMAT};
use crate::domain::Completeness;
use crate::error::{PipelineError, Result};

/// Everything a single batch run needs to know, built once per run and
/// handed to each stage. Holds no state across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineContext {
    batch_date: NaiveDate,
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl PipelineContext {
    pub fn new(
        batch_date: NaiveDate,
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            batch_date,
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Parse a `YYYY-MM-DD` run date
    pub fn parse_date(value: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|source| PipelineError::Date {
            value: value.to_string(),
            source,
        })
    }

    pub fn batch_date(&self) -> NaiveDate {
        self.batch_date
    }

    /// Batch date as used in file and dataset names
    pub fn date_str(&self) -> String {
        self.batch_date.format(DATE_FORMAT).to_string()
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `{input_dir}/{date}_patient_data.csv`
    pub fn input_path(&self) -> PathBuf {
        self.input_dir.join(input_file_name(&self.date_str()))
    }

    /// `{date}_without_missed_readings` or `{date}_with_missed_readings`
    pub fn dataset_name(&self, completeness: Completeness) -> String {
        format!("{}{}", self.date_str(), completeness.dataset_suffix())
    }

    pub fn dataset_dir(&self, completeness: Completeness) -> PathBuf {
        self.output_dir.join(self.dataset_name(completeness))
    }
}
