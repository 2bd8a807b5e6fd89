//! Error types for the lansia registry backend.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`SheetError`] - spreadsheet shape/read errors (fatal for the whole file)
//! - [`ImportError`] - import pipeline orchestration errors
//! - [`AuthError`] - authentication and token errors
//! - [`ApiError`] - top-level HTTP errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries. Per-row import
//! problems are *not* errors in this sense: they are collected as
//! plain message strings and reported in the upload summary.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

// =============================================================================
// Spreadsheet Errors
// =============================================================================

/// Errors while reading the uploaded workbook. All of these abort the
/// request before any row is processed.
#[derive(Debug, Error)]
pub enum SheetError {
    /// The workbook could not be opened or decoded.
    #[error("Cannot read workbook: {0}")]
    Workbook(String),

    /// The workbook has no sheets.
    #[error("Workbook has no sheets")]
    NoSheet,

    /// The sheet is empty.
    #[error("Sheet is empty")]
    Empty,

    /// Transposed sheet width does not match the fixed template header.
    #[error("Unexpected sheet shape: expected {expected} field rows, found {found}")]
    ColumnCount { expected: usize, found: usize },
}

// =============================================================================
// Import Pipeline Errors
// =============================================================================

/// Fatal import pipeline errors. Row-level problems are reported as
/// message strings in [`crate::importer::pipeline::ImportOutcome`] instead.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Spreadsheet could not be turned into rows.
    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),

    /// The batch transaction itself failed.
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

// =============================================================================
// Auth Errors
// =============================================================================

/// Authentication and session-token errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No bearer token on the request.
    #[error("Authentication required")]
    MissingToken,

    /// Token failed decoding or verification.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Password hashing failed.
    #[error("Password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// Token issuance/verification plumbing failed.
    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

// =============================================================================
// API Errors (top-level)
// =============================================================================

/// Top-level error type returned by HTTP handlers.
///
/// Converts into a JSON `{"message": ...}` response, matching the
/// message-string contract of the rest of the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Import pipeline failure.
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Database failure.
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    /// Malformed or unacceptable request.
    #[error("{0}")]
    BadRequest(String),

    /// Requested record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Anything else.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::Auth(AuthError::Hash(_)) | ApiError::Auth(AuthError::Jwt(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Import(_) => StatusCode::BAD_REQUEST,
            ApiError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            ApiError::Db(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for sheet operations.
pub type SheetResult<T> = Result<T, SheetError>;

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Result type for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // SheetError -> ImportError -> ApiError
        let sheet_err = SheetError::ColumnCount {
            expected: 47,
            found: 12,
        };
        let import_err: ImportError = sheet_err.into();
        let api_err: ApiError = import_err.into();
        assert!(api_err.to_string().contains("47"));
    }

    #[test]
    fn test_column_count_message() {
        let err = SheetError::ColumnCount {
            expected: 47,
            found: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 47"));
        assert!(msg.contains("found 3"));
    }

    #[test]
    fn test_auth_error_messages() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid credentials"
        );
        assert_eq!(AuthError::MissingToken.to_string(), "Authentication required");
    }
}
