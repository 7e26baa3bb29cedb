use scoreforge_core::EngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV Parsing Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Engine Error: {0}")]
    Engine(#[from] EngineError),

    #[error("Data Validation Error: {0}")]
    Validation(String),
}

pub type CliResult<T> = Result<T, CliError>;
