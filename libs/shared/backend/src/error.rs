use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Request rejected by backend: {0}")]
    Rejected(String),

    #[error("Invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Response envelope carried no data")]
    MissingData,

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

impl BackendError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Status { status, message } => match status {
                401 => AppError::Auth(message),
                403 => AppError::Forbidden(message),
                404 => AppError::NotFound(message),
                409 => AppError::Conflict(message),
                400 | 422 => AppError::BadRequest(message),
                _ => AppError::ExternalService(format!("API error ({}): {}", status, message)),
            },
            BackendError::Rejected(message) => AppError::ExternalService(message),
            BackendError::InvalidHeader(message) => AppError::Auth(message),
            other => AppError::ExternalService(other.to_string()),
        }
    }
}
