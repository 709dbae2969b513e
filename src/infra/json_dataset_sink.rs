use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app::ports::{DatasetReceipt, DatasetSinkPort};
use crate::constants::{MANIFEST_FILE_NAME, PART_FILE_NAME, SUCCESS_MARKER_NAME};
use crate::domain::{Completeness, EnrichedRecord};
use crate::error::Result;
use crate::pipeline::context::PipelineContext;
use crate::pipeline::processing::partition::DatasetBatch;

/// Column description embedded in every manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// Sidecar describing one written dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub dataset: String,
    pub batch_date: NaiveDate,
    pub completeness: Completeness,
    pub record_count: usize,
    pub part_file: String,
    pub sha256: String,
    pub schema: Vec<FieldSpec>,
}

/// Output schema of an enriched record, in serialization order
pub fn enriched_schema() -> Vec<FieldSpec> {
    [
        ("patient_id", "integer", false),
        ("mg_dl_t1", "float", true),
        ("mg_dl_t2", "float", true),
        ("mg_dl_t3", "float", true),
        ("cancer_present", "integer", false),
        ("atrophy_present", "integer", true),
        ("glucose_mean", "double", true),
        ("glucose_level", "string", false),
        ("measurement_date", "date", false),
    ]
    .into_iter()
    .map(|(name, data_type, nullable)| FieldSpec {
        name: name.to_string(),
        data_type: data_type.to_string(),
        nullable,
    })
    .collect()
}

/// Serialize records as newline-delimited JSON, one object per line
pub fn encode_ndjson(records: &[EnrichedRecord]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buf, record)?;
        buf.push(b'\n');
    }
    Ok(buf)
}

/// Writes each dataset as a directory under the context's output dir:
/// `part-00000.json`, `_manifest.json`, then the `_SUCCESS` marker.
#[derive(Debug, Default, Clone)]
pub struct JsonDatasetSink;

impl JsonDatasetSink {
    pub fn new() -> Self {
        Self
    }

    async fn write_dir(&self, dir: &Path, dataset: &DatasetBatch) -> Result<DatasetManifest> {
        // Overwrite mode: drop whatever an earlier run left behind
        if tokio::fs::try_exists(dir).await? {
            debug!(dir = %dir.display(), "Removing previous dataset output");
            tokio::fs::remove_dir_all(dir).await?;
        }
        tokio::fs::create_dir_all(dir).await?;

        let body = encode_ndjson(&dataset.records)?;
        let sha256 = hex::encode(Sha256::digest(&body));
        tokio::fs::write(dir.join(PART_FILE_NAME), &body).await?;

        let manifest = DatasetManifest {
            dataset: dataset.name.clone(),
            batch_date: dataset.batch_date,
            completeness: dataset.completeness,
            record_count: dataset.records.len(),
            part_file: PART_FILE_NAME.to_string(),
            sha256,
            schema: enriched_schema(),
        };
        let manifest_bytes = serde_json::to_vec_pretty(&manifest)?;
        tokio::fs::write(dir.join(MANIFEST_FILE_NAME), manifest_bytes).await?;

        tokio::fs::write(dir.join(SUCCESS_MARKER_NAME), b"").await?;
        Ok(manifest)
    }
}

#[async_trait::async_trait]
impl DatasetSinkPort for JsonDatasetSink {
    async fn write_dataset(
        &self,
        ctx: &PipelineContext,
        dataset: &DatasetBatch,
    ) -> anyhow::Result<DatasetReceipt> {
        let dir: PathBuf = ctx.dataset_dir(dataset.completeness);
        info!(dataset = %dataset.name, records = dataset.records.len(), "Writing dataset");

        let manifest = self.write_dir(&dir, dataset).await?;

        Ok(DatasetReceipt {
            name: manifest.dataset,
            location: dir,
            record_count: manifest.record_count,
            sha256: manifest.sha256,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CleanRecord, GlucoseLevel};

    fn record(id: i32, mean: Option<f64>, level: GlucoseLevel) -> EnrichedRecord {
        EnrichedRecord {
            record: CleanRecord {
                patient_id: id,
                mg_dl_t1: Some(80.0),
                mg_dl_t2: Some(90.0),
                mg_dl_t3: Some(100.0),
                cancer_present: 1,
                atrophy_present: Some(0),
            },
            glucose_mean: mean,
            glucose_level: level,
            measurement_date: NaiveDate::from_ymd_opt(2020, 10, 28).unwrap(),
        }
    }

    #[test]
    fn test_ndjson_keeps_schema_order() {
        let body = encode_ndjson(&[record(1, Some(90.0), GlucoseLevel::Normal)]).unwrap();
        let text = String::from_utf8(body).unwrap();

        assert_eq!(
            text,
            "{\"patient_id\":1,\"mg_dl_t1\":80.0,\"mg_dl_t2\":90.0,\"mg_dl_t3\":100.0,\"cancer_present\":1,\"atrophy_present\":0,\"glucose_mean\":90.0,\"glucose_level\":\"normal\",\"measurement_date\":\"2020-10-28\"}\n"
        );
    }

    #[test]
    fn test_schema_matches_serialized_keys() {
        let value = serde_json::to_value(record(1, Some(90.0), GlucoseLevel::Normal)).unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        let mut schema_names: Vec<_> = enriched_schema().into_iter().map(|f| f.name).collect();
        schema_names.sort();
        let mut keys_sorted = keys;
        keys_sorted.sort();
        assert_eq!(keys_sorted, schema_names);
    }

    #[tokio::test]
    async fn test_write_dataset_layout_and_overwrite() {
        let out = tempfile::tempdir().unwrap();
        let ctx = PipelineContext::new(NaiveDate::from_ymd_opt(2020, 10, 28).unwrap(), "data", out.path());
        let dataset = DatasetBatch {
            name: ctx.dataset_name(Completeness::Complete),
            completeness: Completeness::Complete,
            batch_date: ctx.batch_date(),
            records: vec![record(1, Some(90.0), GlucoseLevel::Normal)],
        };
        let sink = JsonDatasetSink::new();

        let dir = ctx.dataset_dir(Completeness::Complete);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("part-00001.json"), "stale").unwrap();

        let receipt = sink.write_dataset(&ctx, &dataset).await.unwrap();

        assert_eq!(receipt.location, dir);
        assert_eq!(receipt.record_count, 1);
        assert!(dir.join(PART_FILE_NAME).exists());
        assert!(dir.join(SUCCESS_MARKER_NAME).exists());
        assert!(!dir.join("part-00001.json").exists());

        let manifest: DatasetManifest =
            serde_json::from_slice(&std::fs::read(dir.join(MANIFEST_FILE_NAME)).unwrap()).unwrap();
        assert_eq!(manifest.dataset, "2020-10-28_without_missed_readings");
        assert_eq!(manifest.record_count, 1);
        assert_eq!(manifest.sha256, receipt.sha256);
        assert_eq!(manifest.schema, enriched_schema());

        let body = std::fs::read(dir.join(PART_FILE_NAME)).unwrap();
        assert_eq!(hex::encode(Sha256::digest(&body)), manifest.sha256);
    }

    #[tokio::test]
    async fn test_empty_dataset_still_written() {
        let out = tempfile::tempdir().unwrap();
        let ctx = PipelineContext::new(NaiveDate::from_ymd_opt(2020, 10, 28).unwrap(), "data", out.path());
        let dataset = DatasetBatch {
            name: ctx.dataset_name(Completeness::Incomplete),
            completeness: Completeness::Incomplete,
            batch_date: ctx.batch_date(),
            records: Vec::new(),
        };

        let receipt = JsonDatasetSink::new().write_dataset(&ctx, &dataset).await.unwrap();

        let dir = ctx.dataset_dir(Completeness::Incomplete);
        assert_eq!(receipt.record_count, 0);
        assert_eq!(std::fs::read(dir.join(PART_FILE_NAME)).unwrap(), Vec::<u8>::new());
        assert!(dir.join(SUCCESS_MARKER_NAME).exists());
    }
}
