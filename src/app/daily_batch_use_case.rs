use anyhow::{Context, Result};
use std::time::Instant;
use tracing::{error, info, instrument};

use crate::app::ports::{DatasetReceipt, DatasetSinkPort, PatientSourcePort};
use crate::pipeline::context::PipelineContext;
use crate::pipeline::{BatchProcessor, BatchSummary, ProcessedBatch};

/// Result of a full run: the counts plus one receipt per written dataset
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub receipts: Vec<DatasetReceipt>,
}

/// Use case for turning one day's patient file into the two completeness
/// datasets
pub struct DailyBatchUseCase {
    source: Box<dyn PatientSourcePort>,
    sink: Box<dyn DatasetSinkPort>,
    processor: BatchProcessor,
}

impl DailyBatchUseCase {
    pub fn new(
        source: Box<dyn PatientSourcePort>,
        sink: Box<dyn DatasetSinkPort>,
        processor: BatchProcessor,
    ) -> Self {
        Self {
            source,
            sink,
            processor,
        }
    }

    /// Create a use case with the default normalizer and enricher
    pub fn with_default_processor(
        source: Box<dyn PatientSourcePort>,
        sink: Box<dyn DatasetSinkPort>,
    ) -> Self {
        Self::new(source, sink, BatchProcessor::default())
    }

    /// Load and process the batch without writing anything
    #[instrument(skip(self, ctx), fields(batch_date = %ctx.date_str()))]
    pub async fn inspect(&self, ctx: &PipelineContext) -> Result<BatchSummary> {
        Ok(self.load_and_process(ctx).await?.summary)
    }

    /// Load, process and write both datasets. Stops at the first failure.
    #[instrument(skip(self, ctx), fields(batch_date = %ctx.date_str()))]
    pub async fn run(&self, ctx: &PipelineContext) -> Result<BatchReport> {
        let started = Instant::now();

        match self.run_inner(ctx).await {
            Ok(report) => {
                crate::observability::metrics::batch::run_success(started.elapsed().as_secs_f64());
                info!(
                    datasets = report.receipts.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Batch run finished"
                );
                Ok(report)
            }
            Err(e) => {
                crate::observability::metrics::batch::run_error();
                error!("Batch run failed: {:#}", e);
                Err(e)
            }
        }
    }

    async fn run_inner(&self, ctx: &PipelineContext) -> Result<BatchReport> {
        let processed = self.load_and_process(ctx).await?;

        let mut receipts = Vec::with_capacity(2);
        for dataset in processed.partitioned.datasets() {
            let receipt = self
                .sink
                .write_dataset(ctx, dataset)
                .await
                .with_context(|| format!("Failed to write dataset {}", dataset.name))?;
            crate::observability::metrics::sink::dataset_written(
                dataset.completeness.as_str(),
                receipt.record_count,
            );
            info!(
                dataset = %receipt.name,
                records = receipt.record_count,
                location = %receipt.location.display(),
                "Dataset written"
            );
            receipts.push(receipt);
        }

        Ok(BatchReport {
            summary: processed.summary,
            receipts,
        })
    }

    async fn load_and_process(&self, ctx: &PipelineContext) -> Result<ProcessedBatch> {
        let records = self
            .source
            .load_batch(ctx)
            .await
            .with_context(|| format!("Failed to load batch for {}", ctx.date_str()))?;
        info!(records = records.len(), "Loaded batch");
        crate::observability::metrics::ingest::records_loaded(records.len());

        Ok(self.processor.process(ctx, records))
    }
}
