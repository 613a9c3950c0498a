//! Per-session workspace: the two intakes and the candidate table.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::candidates::board::CandidateBoard;
use crate::candidates::fixtures::sample_candidates;
use crate::errors::AppError;
use crate::intake::Intake;
use crate::job_description::models::{ExtractedJobInfo, JobDescriptionInput};
use crate::resumes::models::{BatchReport, ResumeBatchInput};

pub struct Workspace {
    pub job_description: Intake<JobDescriptionInput, ExtractedJobInfo>,
    pub resumes: Intake<ResumeBatchInput, BatchReport>,
    pub candidates: CandidateBoard,
}

pub type SharedWorkspace = Arc<Mutex<Workspace>>;

impl Workspace {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            job_description: Intake::default(),
            resumes: Intake::default(),
            candidates: CandidateBoard::new(sample_candidates()?),
        })
    }

    pub fn shared() -> Result<SharedWorkspace, AppError> {
        Ok(Arc::new(Mutex::new(Self::new()?)))
    }

    /// Cancels in-flight work in both intakes.
    pub fn reset_intakes(&mut self) {
        self.job_description.reset();
        self.resumes.reset();
    }
}

/// Workspaces keyed by session token.
#[derive(Clone, Default)]
pub struct WorkspaceRegistry {
    inner: Arc<RwLock<HashMap<Uuid, SharedWorkspace>>>,
}

impl WorkspaceRegistry {
    pub async fn get_or_create(&self, token: Uuid) -> Result<SharedWorkspace, AppError> {
        if let Some(ws) = self.inner.read().await.get(&token) {
            return Ok(ws.clone());
        }
        let mut map = self.inner.write().await;
        if let Some(ws) = map.get(&token) {
            return Ok(ws.clone());
        }
        let ws = Workspace::shared()?;
        map.insert(token, ws.clone());
        debug!("Created workspace for session {token}");
        Ok(ws)
    }

    /// Drops the session's workspace, aborting anything still running in it.
    pub async fn remove(&self, token: Uuid) {
        let removed = self.inner.write().await.remove(&token);
        if let Some(ws) = removed {
            ws.lock().await.reset_intakes();
        }
    }

    #[cfg(test)]
    pub async fn contains(&self, token: Uuid) -> bool {
        self.inner.read().await.contains_key(&token)
    }
}
