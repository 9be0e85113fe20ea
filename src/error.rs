use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::codec::CryptoError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid card data: {0}")]
    InvalidCard(String),

    #[error("Duplicate data: {0}")]
    Duplicate(String),

    /// Ownership mismatch on the number-based lookup path.
    #[error("Authentication failed")]
    Ownership,

    #[error("Malformed batch file: {0}")]
    MalformedBatchFile(#[from] crate::services::batch_file::BatchFileError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::InvalidCard(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::Duplicate(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            AppError::Ownership => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication failed".to_string(),
            ),
            AppError::MalformedBatchFile(e) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", e.to_string())
            }
            AppError::Crypto(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ERROR",
                "Card number encryption failed".to_string(),
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ERROR",
                "Database error".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ERROR",
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": code,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
