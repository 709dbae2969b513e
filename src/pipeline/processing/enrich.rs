use crate::constants::{
    DIABETES_ABOVE, MEAN_DECIMALS, NORMAL_BELOW, PREDIABETES_ABOVE, PREDIABETES_BELOW,
};
use crate::domain::{CleanRecord, EnrichedRecord, GlucoseLevel};
use crate::pipeline::context::PipelineContext;

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Mean of the three readings, rounded to one decimal.
///
/// Null-propagating: a single missing reading makes the mean missing rather
/// than averaging over the readings that are present. Readings are summed in
/// single precision and divided in double precision.
pub fn glucose_mean(readings: [Option<f32>; 3]) -> Option<f64> {
    let [t1, t2, t3] = readings;
    let sum = t1? + t2? + t3?;
    Some(round_to(f64::from(sum) / 3.0, MEAN_DECIMALS))
}

/// Bucket a mean into a glucose level; first matching rule wins.
///
/// Exactly 140 and the closed range [199, 200] match no clinical rule and
/// fall through to `NotApplicable`, as does a missing mean.
pub fn classify(mean: Option<f64>) -> GlucoseLevel {
    match mean {
        Some(m) if m < NORMAL_BELOW => GlucoseLevel::Normal,
        Some(m) if m > PREDIABETES_ABOVE && m < PREDIABETES_BELOW => GlucoseLevel::Prediabetes,
        Some(m) if m > DIABETES_ABOVE => GlucoseLevel::Diabetes,
        _ => GlucoseLevel::NotApplicable,
    }
}

/// Trait for deriving summary attributes on a clean record
pub trait Enricher {
    fn enrich(&self, ctx: &PipelineContext, record: CleanRecord) -> EnrichedRecord;
}

/// Adds `glucose_mean`, `glucose_level` and the batch date
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultEnricher;

impl Enricher for DefaultEnricher {
    fn enrich(&self, ctx: &PipelineContext, record: CleanRecord) -> EnrichedRecord {
        let glucose_mean = glucose_mean(record.readings());
        EnrichedRecord {
            record,
            glucose_mean,
            glucose_level: classify(glucose_mean),
            measurement_date: ctx.batch_date(),
        }
    }
}
