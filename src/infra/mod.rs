// Adapters for the batch job's boundaries

pub mod csv_source_adapter;
pub mod json_dataset_sink;

pub use csv_source_adapter::CsvPatientSource;
pub use json_dataset_sink::JsonDatasetSink;
