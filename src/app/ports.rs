use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;

use crate::domain::RawRecord;
use crate::pipeline::context::PipelineContext;
use crate::pipeline::processing::partition::DatasetBatch;

/// Supplies the rows of one dated batch
#[async_trait]
pub trait PatientSourcePort: Send + Sync {
    async fn load_batch(&self, ctx: &PipelineContext) -> anyhow::Result<Vec<RawRecord>>;
}

/// Persists one output group, replacing any earlier write for the same date
#[async_trait]
pub trait DatasetSinkPort: Send + Sync {
    async fn write_dataset(
        &self,
        ctx: &PipelineContext,
        dataset: &DatasetBatch,
    ) -> anyhow::Result<DatasetReceipt>;
}

/// What a sink reports back after a write
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetReceipt {
    pub name: String,
    pub location: PathBuf,
    pub record_count: usize,
    pub sha256: String,
}
