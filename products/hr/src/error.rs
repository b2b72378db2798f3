use platform_api::ApiError;
use sea_orm::DbErr;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<String>,
    },
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors,
        }
    }

    /// A single rule violation reported as its own message.
    pub fn rule(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Validation {
            errors: vec![message.clone()],
            message,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Validation { message, errors } => ApiError::invalid(message, errors),
            ServiceError::Duplicate(message) => ApiError::Conflict(message),
            ServiceError::NotFound(message) => ApiError::NotFound(message),
            ServiceError::Database(err) => ApiError::internal(anyhow::Error::new(err)),
        }
    }
}
