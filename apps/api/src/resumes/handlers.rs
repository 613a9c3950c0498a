//! Axum route handlers for the resume batch intake.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::Serialize;

use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::export::{download, ExportFormat};
use crate::extraction::read_multipart;
use crate::intake::IntakeSnapshot;
use crate::job_description::handlers::validate_url;
use crate::resumes::batch::start_batch;
use crate::resumes::models::{BatchReport, ResumeBatchInput};
use crate::state::AppState;
use crate::workspace::Workspace;

#[derive(Debug, Serialize)]
pub struct BatchView {
    #[serde(flatten)]
    pub intake: IntakeSnapshot<BatchReport>,
    pub files: Vec<String>,
    pub cloud_link: Option<String>,
}

impl BatchView {
    fn of(ws: &Workspace) -> Self {
        let input = ws.resumes.input();
        Self {
            intake: ws.resumes.snapshot(),
            files: input.map(ResumeBatchInput::file_names).unwrap_or_default(),
            cloud_link: input.and_then(|i| i.cloud_link.clone()),
        }
    }
}

/// POST /api/v1/resumes/batch
///
/// Multipart: any number of `files` parts plus an optional `cloud_link` field.
/// Every file passes the type gate before the batch starts; the batch itself
/// runs in the background and is polled through GET.
pub async fn handle_start_batch(
    State(state): State<AppState>,
    auth: AuthSession,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BatchView>), AppError> {
    let mut upload = read_multipart(multipart, state.accept_policy()).await?;
    let cloud_link = match upload.fields.remove("cloud_link") {
        Some(link) if !link.trim().is_empty() => Some(validate_url(&link)?),
        _ => None,
    };
    if upload.files.is_empty() && cloud_link.is_none() {
        return Err(AppError::Validation(
            "Please select a folder with resume files".to_string(),
        ));
    }

    {
        let mut ws = auth.workspace.lock().await;
        ws.resumes.select()?;
        ws.resumes.set_ready(ResumeBatchInput {
            files: upload.files,
            cloud_link,
        })?;
    }

    start_batch(&auth.workspace, state.llm.clone()).await?;

    let ws = auth.workspace.lock().await;
    Ok((StatusCode::ACCEPTED, Json(BatchView::of(&ws))))
}

/// GET /api/v1/resumes/batch
pub async fn handle_get_batch(auth: AuthSession) -> Json<BatchView> {
    let ws = auth.workspace.lock().await;
    Json(BatchView::of(&ws))
}

/// POST /api/v1/resumes/batch/reset
pub async fn handle_reset_batch(auth: AuthSession) -> Json<BatchView> {
    let mut ws = auth.workspace.lock().await;
    ws.resumes.reset();
    Json(BatchView::of(&ws))
}

/// GET /api/v1/resumes/export.xlsx
pub async fn handle_export(auth: AuthSession) -> Result<Response, AppError> {
    let ws = auth.workspace.lock().await;
    let report = ws
        .resumes
        .result()
        .ok_or_else(|| AppError::NotFound("No parsed resumes to export".to_string()))?;
    download(&report.rows, ExportFormat::Xlsx, "parsed_resumes", "Resumes")
}
