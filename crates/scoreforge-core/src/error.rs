use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Cannot resolve value for score '{score}': {reason}")]
    ValueResolution { score: String, reason: String },

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Unknown aggregation stage: '{0}'")]
    UnknownStage(String),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn resolution(score: &str, reason: impl Into<String>) -> Self {
        Self::ValueResolution {
            score: score.to_string(),
            reason: reason.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
