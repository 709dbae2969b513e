use tracing::debug;

use crate::constants::{READING_MAX_INCLUSIVE, READING_MIN_EXCLUSIVE};
use crate::domain::{CleanRecord, NormalizedRecord, Reading, RedactedRecord};

/// Range-check a single reading. Null stays missing; anything outside
/// `(0, 999]` (NaN included) is rejected.
pub fn check_reading(value: Option<f32>) -> Reading {
    match value {
        None => Reading::Missing,
        Some(v) if v > READING_MIN_EXCLUSIVE && v <= READING_MAX_INCLUSIVE => Reading::Valid(v),
        Some(_) => Reading::Rejected,
    }
}

/// `true` maps to 1; `false` and unknown both map to 0
pub fn presence_indicator(flag: Option<bool>) -> u8 {
    match flag {
        Some(true) => 1,
        Some(false) | None => 0,
    }
}

/// Trait for range-checking and coercing redacted records
pub trait Normalizer {
    fn normalize(&self, record: RedactedRecord) -> NormalizedRecord;
}

/// Applies the clinical range rule to every reading and the 0/1 coercion to
/// the presence flag
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultNormalizer;

impl Normalizer for DefaultNormalizer {
    fn normalize(&self, record: RedactedRecord) -> NormalizedRecord {
        NormalizedRecord {
            patient_id: record.patient_id,
            readings: record.readings().map(check_reading),
            cancer_present: presence_indicator(record.cancer_present),
            atrophy_present: record.atrophy_present,
        }
    }
}

impl NormalizedRecord {
    /// `None` when any reading was rejected
    pub fn into_clean(self) -> Option<CleanRecord> {
        if self.is_rejected() {
            return None;
        }
        let [t1, t2, t3] = self.readings.map(|r| r.value());
        Some(CleanRecord {
            patient_id: self.patient_id,
            mg_dl_t1: t1,
            mg_dl_t2: t2,
            mg_dl_t3: t3,
            cancer_present: self.cancer_present,
            atrophy_present: self.atrophy_present,
        })
    }
}

/// A record dropped by the range rule
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    pub patient_id: i32,
    pub fields: Vec<&'static str>,
}

/// Result of normalizing a whole batch
#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    pub kept: Vec<CleanRecord>,
    pub rejected: Vec<RejectedRecord>,
}

/// Normalize every record and drop the ones carrying a rejected reading.
/// Input order is preserved among the survivors.
pub fn normalize_batch(
    normalizer: &dyn Normalizer,
    records: Vec<RedactedRecord>,
) -> NormalizeOutcome {
    let mut outcome = NormalizeOutcome::default();

    for record in records {
        let normalized = normalizer.normalize(record);
        if normalized.is_rejected() {
            let fields = normalized.rejected_fields();
            debug!(patient_id = normalized.patient_id, fields = ?fields, "Dropping record with out-of-range reading");
            crate::observability::metrics::normalize::record_rejected(&fields);
            outcome.rejected.push(RejectedRecord {
                patient_id: normalized.patient_id,
                fields,
            });
        } else if let Some(clean) = normalized.into_clean() {
            outcome.kept.push(clean);
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SENTINEL;

    fn redacted(t1: Option<f32>, t2: Option<f32>, t3: Option<f32>, flag: Option<bool>) -> RedactedRecord {
        RedactedRecord {
            patient_id: 1,
            mg_dl_t1: t1,
            mg_dl_t2: t2,
            mg_dl_t3: t3,
            cancer_present: flag,
            atrophy_present: Some(0),
        }
    }

    #[test]
    fn test_check_reading_bounds() {
        assert_eq!(check_reading(None), Reading::Missing);
        assert_eq!(check_reading(Some(0.0)), Reading::Rejected);
        assert_eq!(check_reading(Some(-5.0)), Reading::Rejected);
        assert_eq!(check_reading(Some(0.1)), Reading::Valid(0.1));
        assert_eq!(check_reading(Some(999.0)), Reading::Valid(999.0));
        assert_eq!(check_reading(Some(999.1)), Reading::Rejected);
        assert_eq!(check_reading(Some(f32::NAN)), Reading::Rejected);
        assert_eq!(check_reading(Some(f32::INFINITY)), Reading::Rejected);
    }

    #[test]
    fn test_sentinel_itself_is_rejected() {
        assert_eq!(check_reading(Some(SENTINEL)), Reading::Rejected);
    }

    #[test]
    fn test_presence_flag_coercion() {
        assert_eq!(presence_indicator(Some(true)), 1);
        assert_eq!(presence_indicator(Some(false)), 0);
        // Unknown collapses to 0, indistinguishable from false
        assert_eq!(presence_indicator(None), 0);
    }

    #[test]
    fn test_out_of_range_reading_drops_record() {
        let outcome = normalize_batch(
            &DefaultNormalizer,
            vec![redacted(Some(150.0), Some(160.0), Some(-5.0), Some(true))],
        );

        assert!(outcome.kept.is_empty());
        assert_eq!(
            outcome.rejected,
            vec![RejectedRecord { patient_id: 1, fields: vec!["mg_dl_t3"] }]
        );
    }

    #[test]
    fn test_missing_reading_keeps_record() {
        let outcome = normalize_batch(
            &DefaultNormalizer,
            vec![redacted(Some(100.0), Some(110.0), None, None)],
        );

        assert!(outcome.rejected.is_empty());
        assert_eq!(outcome.kept.len(), 1);
        let clean = &outcome.kept[0];
        assert_eq!(clean.readings(), [Some(100.0), Some(110.0), None]);
        assert_eq!(clean.cancer_present, 0);
        assert_eq!(clean.atrophy_present, Some(0));
    }

    #[test]
    fn test_no_sentinel_survives() {
        let records = vec![
            redacted(Some(SENTINEL), Some(100.0), Some(100.0), None),
            redacted(Some(1000.0), None, None, Some(false)),
            redacted(None, None, None, Some(true)),
            redacted(Some(80.0), Some(90.0), Some(100.0), Some(true)),
        ];

        let outcome = normalize_batch(&DefaultNormalizer, records);

        assert_eq!(outcome.kept.len(), 2);
        assert_eq!(outcome.rejected.len(), 2);
        for record in &outcome.kept {
            assert!(record.readings().iter().all(|r| *r != Some(SENTINEL)));
        }
    }
}
