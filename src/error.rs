use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Schema violation at line {line}, column '{column}': {message}")]
    Schema {
        line: u64,
        column: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid run date '{value}': {source}")]
    Date {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
