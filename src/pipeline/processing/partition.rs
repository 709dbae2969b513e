use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Completeness, EnrichedRecord};
use crate::pipeline::context::PipelineContext;

/// One output group, tagged with its completeness and batch date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetBatch {
    pub name: String,
    pub completeness: Completeness,
    pub batch_date: NaiveDate,
    pub records: Vec<EnrichedRecord>,
}

/// The two disjoint groups of an enriched batch
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionedBatch {
    pub complete: DatasetBatch,
    pub incomplete: DatasetBatch,
}

impl PartitionedBatch {
    pub fn total(&self) -> usize {
        self.complete.records.len() + self.incomplete.records.len()
    }

    /// Both groups, complete first
    pub fn datasets(&self) -> [&DatasetBatch; 2] {
        [&self.complete, &self.incomplete]
    }
}

/// Split enriched records by whether all three readings are present. Every
/// record lands in exactly one group and input order is kept within each.
pub fn partition(ctx: &PipelineContext, records: Vec<EnrichedRecord>) -> PartitionedBatch {
    let (complete, incomplete): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|r| r.completeness() == Completeness::Complete);

    let dataset = |completeness: Completeness, records: Vec<EnrichedRecord>| DatasetBatch {
        name: ctx.dataset_name(completeness),
        completeness,
        batch_date: ctx.batch_date(),
        records,
    };

    PartitionedBatch {
        complete: dataset(Completeness::Complete, complete),
        incomplete: dataset(Completeness::Incomplete, incomplete),
    }
}
