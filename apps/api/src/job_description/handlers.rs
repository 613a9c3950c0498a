//! Axum route handlers for the job-description intake.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::extraction::{self, read_multipart};
use crate::intake::IntakeSnapshot;
use crate::job_description::models::{ExtractedJobInfo, JobDescriptionInput};
use crate::job_description::service::run_submission;
use crate::state::AppState;
use crate::workspace::Workspace;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct JobDescriptionView {
    #[serde(flatten)]
    pub intake: IntakeSnapshot<ExtractedJobInfo>,
    pub input: Option<JobDescriptionInput>,
}

impl JobDescriptionView {
    fn of(ws: &Workspace) -> Self {
        Self {
            intake: ws.job_description.snapshot(),
            input: ws.job_description.input().cloned(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/job-description
pub async fn handle_get(auth: AuthSession) -> Json<JobDescriptionView> {
    let ws = auth.workspace.lock().await;
    Json(JobDescriptionView::of(&ws))
}

/// POST /api/v1/job-description/text
///
/// Pasted text. Emptiness is checked when processing, not here.
pub async fn handle_set_text(
    auth: AuthSession,
    Json(request): Json<TextRequest>,
) -> Result<Json<JobDescriptionView>, AppError> {
    let mut ws = auth.workspace.lock().await;
    ws.job_description.select()?;
    ws.job_description.set_ready(JobDescriptionInput {
        text: request.text,
        ..Default::default()
    })?;
    Ok(Json(JobDescriptionView::of(&ws)))
}

/// POST /api/v1/job-description/url
///
/// Records the URL. Its content is never fetched.
pub async fn handle_set_url(
    auth: AuthSession,
    Json(request): Json<UrlRequest>,
) -> Result<Json<JobDescriptionView>, AppError> {
    let url = validate_url(&request.url)?;
    let mut ws = auth.workspace.lock().await;
    ws.job_description.select()?;
    ws.job_description.set_ready(JobDescriptionInput {
        source_url: Some(url),
        ..Default::default()
    })?;
    Ok(Json(JobDescriptionView::of(&ws)))
}

/// POST /api/v1/job-description/file
///
/// Multipart with a single `file` part. The type gate runs before extraction;
/// the workspace lock is released while the document is parsed.
pub async fn handle_upload_file(
    State(state): State<AppState>,
    auth: AuthSession,
    multipart: Multipart,
) -> Result<Json<JobDescriptionView>, AppError> {
    let upload = read_multipart(multipart, state.accept_policy()).await?;
    let mut files = upload.files.into_iter();
    let file = files
        .next()
        .ok_or_else(|| AppError::Validation("Please select a file to upload".to_string()))?;
    if files.next().is_some() {
        return Err(AppError::Validation(
            "Upload a single job description file".to_string(),
        ));
    }

    {
        let mut ws = auth.workspace.lock().await;
        ws.job_description.select()?;
        ws.job_description.begin_extraction()?;
    }

    let file_name = file.file_name.clone();
    let extracted = extraction::extract(file).await;

    let mut ws = auth.workspace.lock().await;
    match extracted {
        Ok(text) => {
            info!("Extracted JD from '{file_name}' ({} chars)", text.len());
            ws.job_description.set_ready(JobDescriptionInput {
                text,
                source_file: Some(file_name),
                source_url: None,
            })?;
            Ok(Json(JobDescriptionView::of(&ws)))
        }
        Err(e) => {
            ws.job_description.fail_extraction(e.to_string())?;
            Err(AppError::Extraction(e))
        }
    }
}

/// POST /api/v1/job-description/process
pub async fn handle_process(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<ExtractedJobInfo>, AppError> {
    let info = run_submission(&auth.workspace, state.llm.clone()).await?;
    Ok(Json(info))
}

/// POST /api/v1/job-description/reset
pub async fn handle_reset(auth: AuthSession) -> Json<JobDescriptionView> {
    let mut ws = auth.workspace.lock().await;
    ws.job_description.reset();
    Json(JobDescriptionView::of(&ws))
}

pub fn validate_url(raw: &str) -> Result<String, AppError> {
    let invalid = || AppError::Validation(format!("'{}' is not a valid http(s) URL", raw.trim()));
    let url = reqwest::Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url.to_string())
}
