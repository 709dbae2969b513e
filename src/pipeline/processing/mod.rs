// Pipeline processing: per-record redaction, validation, enrichment and
// completeness partitioning

pub mod enrich;
pub mod normalize;
pub mod partition;
pub mod redact;
