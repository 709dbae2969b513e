use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use tracing::{info, warn};

use crate::app::ports::PatientSourcePort;
use crate::constants::INPUT_COLUMNS;
use crate::domain::RawRecord;
use crate::error::{PipelineError, Result};
use crate::pipeline::context::PipelineContext;

/// Reads `{input_dir}/{date}_patient_data.csv` against the fixed schema
#[derive(Debug, Default, Clone)]
pub struct CsvPatientSource;

impl CsvPatientSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl PatientSourcePort for CsvPatientSource {
    async fn load_batch(&self, ctx: &PipelineContext) -> anyhow::Result<Vec<RawRecord>> {
        let path = ctx.input_path();
        let bytes = read_input(&path).await?;
        info!(path = %path.display(), bytes = bytes.len(), "Read patient batch file");
        crate::observability::metrics::ingest::bytes_read(bytes.len());

        Ok(parse_patient_csv(bytes.as_slice())?)
    }
}

async fn read_input(path: &Path) -> Result<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PipelineError::InputNotFound(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Parse a header row plus data rows, binding columns by position.
///
/// Empty cells are null. Any row that does not fit the schema aborts the
/// whole parse.
pub fn parse_patient_csv<R: Read>(input: R) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    if headers.len() != INPUT_COLUMNS.len() {
        return Err(PipelineError::Schema {
            line: 1,
            column: "<header>".to_string(),
            message: format!("expected {} columns, found {}", INPUT_COLUMNS.len(), headers.len()),
        });
    }
    let mismatched: Vec<_> = headers
        .iter()
        .zip(INPUT_COLUMNS.iter())
        .filter(|(found, expected)| found.trim() != **expected)
        .map(|(found, expected)| format!("{} (expected {})", found, expected))
        .collect();
    if !mismatched.is_empty() {
        warn!(columns = ?mismatched, "Header names differ from schema; binding columns by position");
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        records.push(parse_row(&row)?);
    }

    Ok(records)
}

fn parse_row(row: &csv::StringRecord) -> Result<RawRecord> {
    let line = row.position().map(|p| p.line()).unwrap_or_default();
    if row.len() != INPUT_COLUMNS.len() {
        return Err(PipelineError::Schema {
            line,
            column: "<row>".to_string(),
            message: format!("expected {} columns, found {}", INPUT_COLUMNS.len(), row.len()),
        });
    }

    let patient_id = get_number_field::<i32>(row, 0, line)?.ok_or_else(|| PipelineError::Schema {
        line,
        column: INPUT_COLUMNS[0].to_string(),
        message: "identifier is missing".to_string(),
    })?;

    Ok(RawRecord {
        patient_id,
        first_name: get_string_field(row, 1),
        last_name: get_string_field(row, 2),
        email: get_string_field(row, 3),
        address: get_string_field(row, 4),
        glucose_mg_dl_t1: get_number_field(row, 5, line)?,
        glucose_mg_dl_t2: get_number_field(row, 6, line)?,
        glucose_mg_dl_t3: get_number_field(row, 7, line)?,
        cancer_present: get_bool_field(row, 8, line)?,
        atrophy_present: get_number_field(row, 9, line)?,
    })
}

// ==========================================
// CSV field helpers
// ==========================================

fn get_string_field(row: &csv::StringRecord, index: usize) -> Option<String> {
    row.get(index)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn get_number_field<T>(row: &csv::StringRecord, index: usize, line: u64) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_string_field(row, index) {
        None => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(|e| PipelineError::Schema {
            line,
            column: INPUT_COLUMNS[index].to_string(),
            message: format!("cannot parse '{}': {}", s, e),
        }),
    }
}

fn get_bool_field(row: &csv::StringRecord, index: usize, line: u64) -> Result<Option<bool>> {
    match get_string_field(row, index) {
        None => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(s) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(s) => Err(PipelineError::Schema {
            line,
            column: INPUT_COLUMNS[index].to_string(),
            message: format!("cannot parse '{}' as a boolean", s),
        }),
    }
}
