//! Login, session checks and password reset.
//!
//! Sessions are stateless bearer tokens, so logout is a client-side
//! token drop and the endpoint only exists for the frontend contract.
//! Reset tokens are single-use rows with a one-hour expiry; the token is
//! returned in the response body for the frontend to build the reset
//! link from.

use axum::extract::State;
use axum::{http::StatusCode, Json};
use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};
use tracing::info;

use super::types::{ForgotPasswordRequest, LoginRequest, LoginResponse, ResetPasswordRequest};
use super::AppState;
use crate::auth::{self, AuthUser};
use crate::error::{ApiError, ApiResult, AuthError};
use crate::models::User;

/// Reset tokens are valid this long.
const RESET_TOKEN_HOURS: i64 = 1;

/// Length of the random reset token string.
const RESET_TOKEN_LEN: usize = 43;

/// `POST /api/login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user: Option<User> =
        sqlx::query_as("SELECT id, username, email, password_hash, role FROM users WHERE username = $1")
            .bind(&req.username)
            .fetch_optional(&state.pool)
            .await?;

    let user = user.ok_or(AuthError::InvalidCredentials)?;
    if !auth::verify_password(&req.password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.jwt.issue(user.id, &user.username, &user.role)?;
    info!(username = %user.username, role = %user.role, "login");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: user.into(),
    }))
}

/// `POST /api/logout`
pub async fn logout() -> Json<Value> {
    Json(json!({ "message": "Logout successful" }))
}

/// `GET /api/check-auth`
pub async fn check_auth(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Value>> {
    let account: Option<User> =
        sqlx::query_as("SELECT id, username, email, password_hash, role FROM users WHERE id = $1")
            .bind(user.id)
            .fetch_optional(&state.pool)
            .await?;

    let account = account.ok_or(AuthError::InvalidToken)?;
    Ok(Json(json!({
        "authenticated": true,
        "user": {
            "id": account.id,
            "username": account.username,
            "email": account.email,
            "role": account.role,
        }
    })))
}

/// `POST /api/forgot-password`
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<Value>> {
    let user_id: Option<i32> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&req.email)
        .fetch_optional(&state.pool)
        .await?;

    let user_id = user_id.ok_or_else(|| ApiError::NotFound("Email not found".to_string()))?;

    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LEN)
        .map(char::from)
        .collect();
    let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_HOURS);

    sqlx::query(
        "INSERT INTO password_reset_tokens (user_id, token, expires_at) VALUES ($1, $2, $3)",
    )
    .bind(user_id)
    .bind(&token)
    .bind(expires_at)
    .execute(&state.pool)
    .await?;

    info!(user_id, "password reset token issued");
    Ok(Json(json!({
        "message": "Password reset token generated",
        "token": token,
    })))
}

/// `PUT /api/reset-password`
///
/// Consumes an unexpired, unused reset token and replaces the user's
/// password hash.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut txn = state.pool.begin().await?;

    let user_id: Option<i32> = sqlx::query_scalar(
        r#"
        UPDATE password_reset_tokens
        SET used = TRUE
        WHERE token = $1 AND NOT used AND expires_at > now()
        RETURNING user_id
        "#,
    )
    .bind(&req.token)
    .fetch_optional(&mut *txn)
    .await?;

    let Some(user_id) = user_id else {
        return Err(ApiError::BadRequest(
            "Token tidak valid atau sudah kedaluwarsa".to_string(),
        ));
    };

    let hash = auth::hash_password(&req.password)?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
        .bind(&hash)
        .bind(user_id)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;
    info!(user_id, "password reset");
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Password berhasil diubah" })),
    ))
}
