//! Sessions, the `AuthSession` extractor, and "remember me".

pub mod handlers;
pub mod remember;
pub mod session;

use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::session::Session;
use crate::errors::AppError;
use crate::state::AppState;
use crate::workspace::SharedWorkspace;

/// The caller's live session and its workspace. Any handler taking this
/// argument requires `Authorization: Bearer <session token>`.
pub struct AuthSession {
    pub session: Session,
    pub workspace: SharedWorkspace,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| {
                warn!("Rejected request without a valid bearer token");
                AppError::Unauthorized
            })?;

        let Some(session) = state.sessions.touch(token).await else {
            warn!("Rejected request with unknown or expired session token");
            state.workspaces.remove(token).await;
            return Err(AppError::Unauthorized);
        };
        let workspace = state.workspaces.get_or_create(token).await?;

        Ok(Self { session, workspace })
    }
}

/// Drops every session expired at `now` along with its workspace.
/// Returns how many were dropped.
pub async fn sweep_expired_sessions(state: &AppState, now: DateTime<Utc>) -> usize {
    let expired = state.sessions.sweep(now).await;
    for token in &expired {
        state.workspaces.remove(*token).await;
    }
    expired.len()
}

/// Runs [`sweep_expired_sessions`] every `SESSION_SWEEP_SECS`.
pub fn spawn_session_sweeper(state: AppState) -> JoinHandle<()> {
    let period = Duration::from_secs(state.config.session_sweep_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let dropped = sweep_expired_sessions(&state, Utc::now()).await;
            if dropped > 0 {
                info!("Expired {dropped} idle sessions");
            } else {
                debug!("Session sweep found nothing to expire");
            }
        }
    })
}

/// The scheme name is matched case-insensitively.
fn bearer_token(header: &str) -> Option<Uuid> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    token.trim().parse().ok()
}
