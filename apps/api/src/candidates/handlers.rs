//! Axum route handlers for the results table.

use axum::{
    extract::{Path, Query},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::candidates::board::shortlist_notification;
use crate::candidates::models::{Candidate, ScoreBand};
use crate::errors::AppError;
use crate::export::{download, ExportFormat};

#[derive(Debug, Serialize)]
pub struct CandidateView {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub score_band: ScoreBand,
}

impl From<&Candidate> for CandidateView {
    fn from(candidate: &Candidate) -> Self {
        Self {
            candidate: candidate.clone(),
            score_band: candidate.ats_score.band(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CandidateListResponse {
    pub candidates: Vec<CandidateView>,
    pub shortlisted: usize,
}

#[derive(Debug, Serialize)]
pub struct ShortlistResponse {
    pub candidate: CandidateView,
    pub notification: String,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

/// GET /api/v1/candidates
pub async fn handle_list(auth: AuthSession) -> Json<CandidateListResponse> {
    let ws = auth.workspace.lock().await;
    Json(CandidateListResponse {
        candidates: ws.candidates.rows().iter().map(CandidateView::from).collect(),
        shortlisted: ws.candidates.shortlisted().count(),
    })
}

/// PATCH /api/v1/candidates/:id/shortlist
pub async fn handle_toggle_shortlist(
    auth: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ShortlistResponse>, AppError> {
    let mut ws = auth.workspace.lock().await;
    let candidate = ws.candidates.toggle_shortlist(id)?;
    let notification = shortlist_notification(candidate);
    info!("{notification} (session {})", auth.session.token);
    Ok(Json(ShortlistResponse {
        candidate: CandidateView::from(candidate),
        notification,
    }))
}

/// GET /api/v1/candidates/export?format=csv|xlsx
///
/// Defaults to CSV.
pub async fn handle_export(
    auth: AuthSession,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let format = match query.format.as_deref() {
        Some(f) => f.parse::<ExportFormat>()?,
        None => ExportFormat::Csv,
    };
    let ws = auth.workspace.lock().await;
    download(ws.candidates.rows(), format, "candidates", "Candidates")
}
