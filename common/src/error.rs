use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("missing 'key' parameter")]
    MissingKey,
    #[error("unknown key '{0}'")]
    UnknownKey(String),
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
    #[error("missing or incorrect mutation credential")]
    Forbidden,
    #[error("thermal protection is latched; acknowledge it first")]
    ThermalLatched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MissingKey,
    UnknownKey,
    InvalidValue,
    Forbidden,
    ThermalLatched,
}

impl MutationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingKey => ErrorCode::MissingKey,
            Self::UnknownKey(_) => ErrorCode::UnknownKey,
            Self::InvalidValue { .. } => ErrorCode::InvalidValue,
            Self::Forbidden => ErrorCode::Forbidden,
            Self::ThermalLatched => ErrorCode::ThermalLatched,
        }
    }

    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Failed(String),
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;
