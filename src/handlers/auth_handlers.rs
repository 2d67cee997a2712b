use crate::error::{AppError, Result};
use crate::models::user::{PublicUser, User};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;

// Missing JSON fields deserialize to empty strings so the service can
// answer with its own validation error instead of a serde rejection.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct VerifyEmailRequest {
    pub code: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct ResetPasswordRequest {
    pub password: String,
}

async fn establish_session(session: &Session, user: &User) -> Result<()> {
    session
        .insert("user_id", user.id)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create session: {}", e)))?;
    session
        .insert("email", user.email.clone())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create session: {}", e)))?;
    session
        .insert("auth_timestamp", chrono::Utc::now().timestamp())
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create session: {}", e)))?;
    Ok(())
}

pub async fn signup_handler(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<SignupRequest>,
) -> Result<Response> {
    let user = state
        .account_service
        .signup(&body.name, &body.email, &body.password)
        .await?;

    establish_session(&session, &user).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User created successfully",
            "user": PublicUser::from(&user),
        })),
    )
        .into_response())
}

pub async fn verify_email_handler(
    State(state): State<AppState>,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<Response> {
    let user = state.account_service.verify_email(&body.code).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Email verified successfully",
        "user": PublicUser::from(&user),
    }))
    .into_response())
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Response> {
    let user = state
        .account_service
        .login(&body.email, &body.password)
        .await?;

    establish_session(&session, &user).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Logged in successfully",
        "user": PublicUser::from(&user),
    }))
    .into_response())
}

pub async fn logout_handler(session: Session) -> Result<Response> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("Failed to clear session: {}", e)))?;

    Ok(Json(json!({
        "success": true,
        "message": "Logged out successfully",
    }))
    .into_response())
}

pub async fn forgot_password_handler(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Response> {
    state.account_service.forgot_password(&body.email).await?;

    // The reset token is only ever delivered by email.
    Ok(Json(json!({
        "success": true,
        "message": "Password reset link sent to your email",
    }))
    .into_response())
}

pub async fn reset_password_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Response> {
    state
        .account_service
        .reset_password(&token, &body.password)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password reset successful",
    }))
    .into_response())
}

pub async fn health_handler() -> Response {
    Json(json!({
        "success": true,
        "message": "ok",
    }))
    .into_response()
}
