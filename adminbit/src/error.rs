use axum::extract::rejection::JsonRejection;
use http::StatusCode;
use std::sync::PoisonError;
use thiserror::Error;

/// Failure signaled by a [`crate::store::DataStore`]. Caught at the point of each
/// controller operation and converted into an error notification, never propagated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("no record with id {id} in `{collection}`")]
    NotFound { collection: String, id: u64 },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serde error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json rejection: {0}")]
    JsonRejection(#[from] JsonRejection),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::NotFound(_)                        => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_)                    => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_)                      => StatusCode::BAD_REQUEST,
            AppError::JsonRejection(r)                   => r.status(),
            _                                            => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<T> From<PoisonError<T>> for AppError {
    fn from(e: PoisonError<T>) -> Self {
        AppError::Custom(format!("Poison error: {:?}", e.to_string()))
    }
}

impl From<AppError> for axum::Error {
    fn from(val: AppError) -> Self {
        axum::Error::new(val.to_string())
    }
}
