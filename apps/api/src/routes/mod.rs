pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::candidates::handlers as candidates;
use crate::job_description::handlers as job_description;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/signup", post(auth::handle_signup))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/auth/session", get(auth::handle_session))
        .route("/api/v1/auth/remembered", get(auth::handle_remembered))
        // Job description intake
        .route("/api/v1/job-description", get(job_description::handle_get))
        .route(
            "/api/v1/job-description/text",
            post(job_description::handle_set_text),
        )
        .route(
            "/api/v1/job-description/file",
            post(job_description::handle_upload_file),
        )
        .route(
            "/api/v1/job-description/url",
            post(job_description::handle_set_url),
        )
        .route(
            "/api/v1/job-description/process",
            post(job_description::handle_process),
        )
        .route(
            "/api/v1/job-description/reset",
            post(job_description::handle_reset),
        )
        // Resume batch intake
        .route(
            "/api/v1/resumes/batch",
            post(resumes::handle_start_batch).get(resumes::handle_get_batch),
        )
        .route(
            "/api/v1/resumes/batch/reset",
            post(resumes::handle_reset_batch),
        )
        .route("/api/v1/resumes/export.xlsx", get(resumes::handle_export))
        // Results table
        .route("/api/v1/candidates", get(candidates::handle_list))
        .route(
            "/api/v1/candidates/:id/shortlist",
            patch(candidates::handle_toggle_shortlist),
        )
        .route("/api/v1/candidates/export", get(candidates::handle_export))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
