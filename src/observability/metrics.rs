//! Metrics for the glucose batch job
//!
//! Recording goes through the `metrics` facade. Without an installed
//! recorder every call is a no-op; `init` installs a Prometheus recorder
//! whose rendered text can be dropped into a node-exporter textfile
//! directory at the end of a run.

use std::fmt;
use std::path::{Path, PathBuf};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

use crate::error::{PipelineError, Result};

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingest metrics
    IngestRecordsLoaded,
    IngestBytesRead,

    // Normalize metrics
    NormalizeRecordsRejected,
    NormalizeReadingsRejected,

    // Enrich metrics
    EnrichRecordsEnriched,

    // Partition metrics
    PartitionCompleteRecords,
    PartitionIncompleteRecords,

    // Sink metrics
    SinkDatasetsWritten,
    SinkRecordsWritten,

    // Batch metrics
    BatchRunsSuccess,
    BatchRunsError,
    BatchDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::IngestRecordsLoaded => "glucose_ingest_records_loaded_total",
            MetricName::IngestBytesRead => "glucose_ingest_bytes_read",
            MetricName::NormalizeRecordsRejected => "glucose_normalize_records_rejected_total",
            MetricName::NormalizeReadingsRejected => "glucose_normalize_readings_rejected_total",
            MetricName::EnrichRecordsEnriched => "glucose_enrich_records_total",
            MetricName::PartitionCompleteRecords => "glucose_partition_complete_records",
            MetricName::PartitionIncompleteRecords => "glucose_partition_incomplete_records",
            MetricName::SinkDatasetsWritten => "glucose_sink_datasets_written_total",
            MetricName::SinkRecordsWritten => "glucose_sink_records_written_total",
            MetricName::BatchRunsSuccess => "glucose_batch_runs_success_total",
            MetricName::BatchRunsError => "glucose_batch_runs_error_total",
            MetricName::BatchDuration => "glucose_batch_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installed Prometheus recorder plus the file its output goes to
pub struct MetricsTextfile {
    handle: PrometheusHandle,
    path: PathBuf,
}

impl fmt::Debug for MetricsTextfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsTextfile").field("path", &self.path).finish()
    }
}

impl MetricsTextfile {
    /// Render the current metric values and write them out
    pub fn flush(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&self.path, self.handle.render())?;
        info!(path = %self.path.display(), "Wrote metrics textfile");
        Ok(())
    }
}

/// Install the Prometheus recorder when a textfile path is configured
pub fn init(textfile: Option<&Path>) -> Result<Option<MetricsTextfile>> {
    let Some(path) = textfile else {
        info!("Metrics recorder not installed (no textfile configured)");
        return Ok(None);
    };

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| PipelineError::Config(format!("Failed to install Prometheus recorder: {}", e)))?;

    info!(path = %path.display(), "Metrics system initialized");
    Ok(Some(MetricsTextfile {
        handle,
        path: path.to_path_buf(),
    }))
}

// ============================================================================
// Ingest Metrics
// ============================================================================

pub mod ingest {
    use super::MetricName;

    pub fn records_loaded(count: usize) {
        ::metrics::counter!(MetricName::IngestRecordsLoaded.as_str()).increment(count as u64);
    }

    pub fn bytes_read(bytes: usize) {
        ::metrics::histogram!(MetricName::IngestBytesRead.as_str()).record(bytes as f64);
    }
}

// ============================================================================
// Normalize Metrics
// ============================================================================

pub mod normalize {
    use super::MetricName;

    /// Record a dropped record and each reading that caused it
    pub fn record_rejected(fields: &[&'static str]) {
        ::metrics::counter!(MetricName::NormalizeRecordsRejected.as_str()).increment(1);
        for field in fields {
            ::metrics::counter!(MetricName::NormalizeReadingsRejected.as_str(), "field" => *field)
                .increment(1);
        }
    }
}

// ============================================================================
// Enrich Metrics
// ============================================================================

pub mod enrich {
    use super::MetricName;
    use crate::domain::GlucoseLevel;

    pub fn record_enriched(level: GlucoseLevel) {
        ::metrics::counter!(MetricName::EnrichRecordsEnriched.as_str(), "glucose_level" => level.as_str())
            .increment(1);
    }
}

// ============================================================================
// Partition Metrics
// ============================================================================

pub mod partition {
    use super::MetricName;

    pub fn batch_partitioned(complete: usize, incomplete: usize) {
        ::metrics::gauge!(MetricName::PartitionCompleteRecords.as_str()).set(complete as f64);
        ::metrics::gauge!(MetricName::PartitionIncompleteRecords.as_str()).set(incomplete as f64);
    }
}

// ============================================================================
// Sink Metrics
// ============================================================================

pub mod sink {
    use super::MetricName;

    pub fn dataset_written(completeness: &'static str, records: usize) {
        ::metrics::counter!(MetricName::SinkDatasetsWritten.as_str(), "completeness" => completeness)
            .increment(1);
        ::metrics::counter!(MetricName::SinkRecordsWritten.as_str(), "completeness" => completeness)
            .increment(records as u64);
    }
}

// ============================================================================
// Batch Metrics
// ============================================================================

pub mod batch {
    use super::MetricName;

    pub fn run_success(duration_secs: f64) {
        ::metrics::counter!(MetricName::BatchRunsSuccess.as_str()).increment(1);
        ::metrics::histogram!(MetricName::BatchDuration.as_str()).record(duration_secs);
    }

    pub fn run_error() {
        ::metrics::counter!(MetricName::BatchRunsError.as_str()).increment(1);
    }
}
