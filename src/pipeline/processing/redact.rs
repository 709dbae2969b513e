use crate::domain::{RawRecord, RedactedRecord};

/// Drop name, email and address, keeping the identifier and clinical fields
/// under their canonical names
pub fn redact(record: RawRecord) -> RedactedRecord {
    RedactedRecord {
        patient_id: record.patient_id,
        mg_dl_t1: record.glucose_mg_dl_t1,
        mg_dl_t2: record.glucose_mg_dl_t2,
        mg_dl_t3: record.glucose_mg_dl_t3,
        cancer_present: record.cancer_present,
        atrophy_present: record.atrophy_present,
    }
}

impl From<RawRecord> for RedactedRecord {
    fn from(record: RawRecord) -> Self {
        redact(record)
    }
}
