use std::result::Result as StdResult;

use chrono::NaiveDate;
use thiserror::Error;

/// Error type covering every validation failure the engine can surface.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Malformed calendar date: `{0}`")]
    MalformedDate(String),
    #[error("Effective date {effective_from} precedes chain start {chain_start}")]
    InvalidEffectiveDate {
        effective_from: NaiveDate,
        chain_start: NaiveDate,
    },
    #[error("Invalid split configuration: {0}")]
    InvalidSplitConfiguration(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = StdResult<T, EngineError>;

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}
