//! Axum route handlers for signup, login, logout and remembered logins.
//!
//! Credentials are not checked against any user store: any non-empty pair
//! logs in. A short artificial delay stands in for the round trip.

use std::time::Duration;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::session::Session;
use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub remember_me: bool,
    pub device_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
    pub device_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub session: Session,
    /// Present when the login is remembered; the client keeps it to look the
    /// login up again after a reload.
    pub device_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RememberedQuery {
    pub device_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RememberedResponse {
    pub email: Option<String>,
    pub remember_me: bool,
    pub session_active: bool,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if request.password != request.confirm_password {
        return Err(AppError::Validation("Passwords don't match".to_string()));
    }
    require_filled(&[&request.name, &request.email, &request.password])?;
    require_email(&request.email)?;

    auth_delay(&state).await;
    let session = state
        .sessions
        .issue(&request.email, Some(&request.name))
        .await;
    let device_id =
        apply_remember(&state, request.remember_me, request.device_id, &session).await?;
    info!("Account created for session {}", session.token);

    Ok(Json(AuthResponse {
        message: "Account created successfully!".to_string(),
        session,
        device_id,
    }))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    require_filled(&[&request.email, &request.password])?;

    auth_delay(&state).await;
    let session = state.sessions.issue(&request.email, None).await;
    let device_id =
        apply_remember(&state, request.remember_me, request.device_id, &session).await?;
    info!("Logged in, session {}", session.token);

    Ok(Json(AuthResponse {
        message: "Logged in successfully!".to_string(),
        session,
        device_id,
    }))
}

/// POST /api/v1/auth/logout
///
/// Ends the session and drops its workspace. A remembered email stays.
pub async fn handle_logout(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Json<LogoutResponse> {
    let token = auth.session.token;
    state.sessions.revoke(token).await;
    state.workspaces.remove(token).await;
    info!("Logged out session {token}");
    Json(LogoutResponse {
        message: "Logged out".to_string(),
    })
}

/// GET /api/v1/auth/session
pub async fn handle_session(auth: AuthSession) -> Json<Session> {
    Json(auth.session)
}

/// GET /api/v1/auth/remembered?device_id=
///
/// What a reloaded login form should be prefilled with.
pub async fn handle_remembered(
    State(state): State<AppState>,
    Query(query): Query<RememberedQuery>,
) -> Result<Json<RememberedResponse>, AppError> {
    let response = match state.remember.recall(query.device_id).await? {
        Some(login) => RememberedResponse {
            session_active: state.sessions.is_live(login.session_token).await,
            email: Some(login.email),
            remember_me: true,
        },
        None => RememberedResponse {
            email: None,
            remember_me: false,
            session_active: false,
        },
    };
    Ok(Json(response))
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

fn require_filled(fields: &[&str]) -> Result<(), AppError> {
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(AppError::Validation(
            "Please fill in all fields".to_string(),
        ));
    }
    Ok(())
}

fn require_email(email: &str) -> Result<(), AppError> {
    if !email.contains('@') {
        return Err(AppError::Validation(format!(
            "'{}' is not a valid email address",
            email.trim()
        )));
    }
    Ok(())
}

async fn auth_delay(state: &AppState) {
    if state.config.auth_delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(state.config.auth_delay_ms)).await;
    }
}

/// Stores or clears the remembered login for the device. Returns the device
/// id the client should keep.
async fn apply_remember(
    state: &AppState,
    remember_me: bool,
    device_id: Option<Uuid>,
    session: &Session,
) -> Result<Option<Uuid>, AppError> {
    if remember_me {
        let device = device_id.unwrap_or_else(Uuid::new_v4);
        state
            .remember
            .remember(device, &session.email, session.token)
            .await?;
        return Ok(Some(device));
    }
    if let Some(device) = device_id {
        state.remember.forget(device).await?;
    }
    Ok(device_id)
}
