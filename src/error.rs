use crate::gate::DenialReason;
use std::fmt;

#[derive(Debug)]
pub enum StudioError {
    ConfigError(String),
    ValidationError { field: &'static str, message: String },
    Denied(DenialReason),
    RequestError(String),
    ResponseError(String),
    StorageError(String),
}

impl fmt::Display for StudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudioError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            StudioError::ValidationError { field, message } => {
                write!(f, "Invalid request field '{}': {}", field, message)
            }
            StudioError::Denied(reason) => write!(f, "Generation not allowed: {}", reason),
            StudioError::RequestError(msg) => write!(f, "Request error: {}", msg),
            StudioError::ResponseError(msg) => write!(f, "Response error: {}", msg),
            StudioError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for StudioError {}

pub type Result<T> = std::result::Result<T, StudioError>;
