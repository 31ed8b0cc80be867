use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    /// 表格契约被破坏
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unknown format `{format}` (available: {available})")]
    UnknownFormat { format: String, available: String },
    #[error("Invalid exporter registry: {0}")]
    Registry(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
