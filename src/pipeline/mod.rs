// Data processing pipeline: context and the core record stages

pub mod context;
pub mod processing;

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::domain::{GlucoseLevel, RawRecord, RedactedRecord};
use context::PipelineContext;
use processing::enrich::{DefaultEnricher, Enricher};
use processing::normalize::{normalize_batch, DefaultNormalizer, Normalizer, RejectedRecord};
use processing::partition::{partition, PartitionedBatch};

/// Counts describing one processed batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub batch_date: NaiveDate,
    pub loaded: usize,
    pub rejected: usize,
    pub complete: usize,
    pub incomplete: usize,
    pub levels: BTreeMap<GlucoseLevel, usize>,
}

/// Output of the core stages, ready to hand to a sink
#[derive(Debug, Clone)]
pub struct ProcessedBatch {
    pub partitioned: PartitionedBatch,
    pub rejected: Vec<RejectedRecord>,
    pub summary: BatchSummary,
}

/// Redact → normalize → enrich → partition, with no I/O
pub struct BatchProcessor {
    normalizer: Box<dyn Normalizer + Send + Sync>,
    enricher: Box<dyn Enricher + Send + Sync>,
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new(Box::new(DefaultNormalizer), Box::new(DefaultEnricher))
    }
}

impl BatchProcessor {
    pub fn new(
        normalizer: Box<dyn Normalizer + Send + Sync>,
        enricher: Box<dyn Enricher + Send + Sync>,
    ) -> Self {
        Self {
            normalizer,
            enricher,
        }
    }

    /// Run the core stages over one day's records. Pure in its inputs, so
    /// the same records and context always yield the same batch.
    pub fn process(&self, ctx: &PipelineContext, records: Vec<RawRecord>) -> ProcessedBatch {
        let loaded = records.len();

        let redacted: Vec<RedactedRecord> = records.into_iter().map(RedactedRecord::from).collect();
        debug!(count = redacted.len(), "Redacted identifying fields");

        let outcome = normalize_batch(self.normalizer.as_ref(), redacted);
        debug!(kept = outcome.kept.len(), rejected = outcome.rejected.len(), "Normalized readings");

        let enriched: Vec<_> = outcome
            .kept
            .into_iter()
            .map(|record| self.enricher.enrich(ctx, record))
            .collect();

        let mut levels = BTreeMap::new();
        for record in &enriched {
            *levels.entry(record.glucose_level).or_insert(0) += 1;
            crate::observability::metrics::enrich::record_enriched(record.glucose_level);
        }

        let partitioned = partition(ctx, enriched);
        crate::observability::metrics::partition::batch_partitioned(
            partitioned.complete.records.len(),
            partitioned.incomplete.records.len(),
        );

        let summary = BatchSummary {
            batch_date: ctx.batch_date(),
            loaded,
            rejected: outcome.rejected.len(),
            complete: partitioned.complete.records.len(),
            incomplete: partitioned.incomplete.records.len(),
            levels,
        };

        info!(
            batch_date = %ctx.date_str(),
            loaded = summary.loaded,
            rejected = summary.rejected,
            complete = summary.complete,
            incomplete = summary.incomplete,
            "Processed batch"
        );

        ProcessedBatch {
            partitioned,
            rejected: outcome.rejected,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SENTINEL;
    use crate::domain::Completeness;

    fn raw(id: i32, t: [Option<f32>; 3], flag: Option<bool>) -> RawRecord {
        RawRecord {
            patient_id: id,
            first_name: Some("First".to_string()),
            last_name: Some("Last".to_string()),
            email: Some("first.last@example.org".to_string()),
            address: Some("1 Main St".to_string()),
            glucose_mg_dl_t1: t[0],
            glucose_mg_dl_t2: t[1],
            glucose_mg_dl_t3: t[2],
            cancer_present: flag,
            atrophy_present: None,
        }
    }

    fn ctx() -> PipelineContext {
        PipelineContext::new(NaiveDate::from_ymd_opt(2020, 10, 28).unwrap(), "data", "processed")
    }

    fn batch() -> Vec<RawRecord> {
        vec![
            raw(1, [Some(150.0), Some(160.0), Some(-5.0)], Some(true)),
            raw(2, [Some(100.0), Some(110.0), None], None),
            raw(3, [Some(80.0), Some(90.0), Some(100.0)], Some(false)),
            raw(4, [Some(150.0), Some(150.0), Some(150.0)], Some(true)),
            raw(5, [Some(250.0), Some(260.0), Some(1200.0)], None),
        ]
    }

    #[test]
    fn test_process_batch_scenarios() {
        let processed = BatchProcessor::default().process(&ctx(), batch());
        let complete = &processed.partitioned.complete.records;
        let incomplete = &processed.partitioned.incomplete.records;

        let rejected_ids: Vec<_> = processed.rejected.iter().map(|r| r.patient_id).collect();
        assert_eq!(rejected_ids, vec![1, 5]);

        assert_eq!(incomplete.len(), 1);
        assert_eq!(incomplete[0].record.patient_id, 2);
        assert_eq!(incomplete[0].glucose_mean, None);
        assert_eq!(incomplete[0].glucose_level, GlucoseLevel::NotApplicable);
        assert_eq!(incomplete[0].record.cancer_present, 0);

        assert_eq!(complete.len(), 2);
        assert_eq!(complete[0].record.patient_id, 3);
        assert_eq!(complete[0].glucose_mean, Some(90.0));
        assert_eq!(complete[0].glucose_level, GlucoseLevel::Normal);
        assert_eq!(complete[1].record.patient_id, 4);
        assert_eq!(complete[1].glucose_mean, Some(150.0));
        assert_eq!(complete[1].glucose_level, GlucoseLevel::Prediabetes);
        assert_eq!(complete[1].record.cancer_present, 1);
    }

    #[test]
    fn test_summary_counts_add_up() {
        let processed = BatchProcessor::default().process(&ctx(), batch());
        let summary = &processed.summary;

        assert_eq!(summary.loaded, 5);
        assert_eq!(summary.rejected, 2);
        assert_eq!(summary.complete + summary.incomplete + summary.rejected, summary.loaded);
        assert_eq!(processed.partitioned.total(), summary.complete + summary.incomplete);
        assert_eq!(summary.levels.get(&GlucoseLevel::Normal), Some(&1));
        assert_eq!(summary.levels.get(&GlucoseLevel::Prediabetes), Some(&1));
        assert_eq!(summary.levels.get(&GlucoseLevel::NotApplicable), Some(&1));
        assert_eq!(summary.levels.get(&GlucoseLevel::Diabetes), None);
    }

    #[test]
    fn test_every_output_record_is_valid() {
        let processed = BatchProcessor::default().process(&ctx(), batch());

        for dataset in processed.partitioned.datasets() {
            for record in &dataset.records {
                assert!(record.record.readings().iter().all(|r| *r != Some(SENTINEL)));
                assert_eq!(record.completeness(), dataset.completeness);
                if record.glucose_mean.is_none() {
                    assert_eq!(record.glucose_level, GlucoseLevel::NotApplicable);
                }
                assert_eq!(record.measurement_date, ctx().batch_date());
            }
        }
        assert_eq!(processed.partitioned.incomplete.completeness, Completeness::Incomplete);
    }

    #[test]
    fn test_processing_is_repeatable() {
        let processor = BatchProcessor::default();
        let first = processor.process(&ctx(), batch());
        let second = processor.process(&ctx(), batch());

        assert_eq!(first.partitioned, second.partitioned);
        assert_eq!(first.summary, second.summary);
    }
}
