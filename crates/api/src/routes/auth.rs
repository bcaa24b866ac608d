//! Registration, login, and password recovery handlers.

use axum::{extract::State, http::StatusCode};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use quillpost_core::{Email, UserId, UserType};

use super::Message;
use super::extract::Json;
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthSession, Registration};
use crate::state::AppState;

const CODE_SENT: Message = Message {
    message: "Verification code has been sent!",
};

const PASSWORD_UPDATED: Message = Message {
    message: "Password has been updated",
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub email: Email,
    pub password: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: Email,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Email,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Email,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    pub password: String,
}

/// Profile plus access token, returned by every flow that authenticates.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub email: Email,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub created_at: DateTime<Utc>,
    pub access_token: String,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        let user = session.user;
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            dob: user.dob,
            email: user.email,
            user_type: user.user_type,
            created_at: user.created_at,
            access_token: session.access_token,
        }
    }
}

/// `POST /v1/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Message>)> {
    state
        .auth()
        .start_registration(Registration {
            first_name: req.first_name,
            last_name: req.last_name,
            dob: req.dob,
            email: req.email,
            password: req.password,
            user_type: req.user_type,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CODE_SENT)))
}

/// `POST /v1/auth/verify`
pub async fn verify(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let session = state
        .auth()
        .complete_registration(&req.email, req.code.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// `POST /v1/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let session = state.auth().login(&req.email, &req.password).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// `POST /v1/auth/forgot-password`
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<Message>)> {
    state.auth().forgot_password(&req.email).await?;
    Ok((StatusCode::CREATED, Json(CODE_SENT)))
}

/// `POST /v1/auth/verify-forgot-password`
pub async fn verify_forgot_password(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let session = state
        .auth()
        .verify_forgot_password(&req.email, req.code.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// `POST /v1/auth/update-password`
pub async fn update_password(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<Json<Message>> {
    state.auth().update_password(user.id(), &req.password).await?;
    Ok(Json(PASSWORD_UPDATED))
}
