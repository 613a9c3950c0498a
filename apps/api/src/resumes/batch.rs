//! Sequential resume batch: extract, parse with the LLM, validate, repeat.
//! A file that fails at any step is reported as skipped and the batch moves on.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{self, UploadedFile};
use crate::llm_client::{parse_json, prompts::json_system, ChatRequest, LlmProvider};
use crate::resumes::models::{BatchReport, ParsedResume, ResumeRow, SkipStage, SkippedFile};
use crate::resumes::prompts::{
    RESUME_PARSE_MAX_TOKENS, RESUME_PARSE_PROMPT_TEMPLATE, RESUME_PARSE_ROLE,
    RESUME_PARSE_TEMPERATURE,
};
use crate::workspace::SharedWorkspace;

pub fn build_request(resume_text: &str) -> ChatRequest {
    let user = RESUME_PARSE_PROMPT_TEMPLATE.replace("{resume_text}", resume_text);
    ChatRequest::new(json_system(RESUME_PARSE_ROLE), user)
        .with_temperature(RESUME_PARSE_TEMPERATURE)
        .with_max_tokens(RESUME_PARSE_MAX_TOKENS)
}

/// Runs one file through extraction, the LLM, and schema validation.
pub async fn process_resume(
    file: UploadedFile,
    llm: &dyn LlmProvider,
) -> Result<ParsedResume, SkippedFile> {
    let file_name = file.file_name.clone();
    let skip = |stage: SkipStage, reason: String| SkippedFile {
        file_name: file_name.clone(),
        stage,
        reason,
    };

    let text = extraction::extract(file)
        .await
        .map_err(|e| skip(SkipStage::Extraction, e.to_string()))?;

    let raw = llm
        .complete(&build_request(&text))
        .await
        .map_err(|e| skip(SkipStage::Llm, e.user_message()))?;

    let parsed: ParsedResume =
        parse_json(&raw).map_err(|e| skip(SkipStage::Schema, e.to_string()))?;
    parsed
        .validate()
        .map_err(|reason| skip(SkipStage::Schema, reason))?;
    Ok(parsed)
}

/// Processes `files` in order, publishing progress after each one. Stops
/// early once submission `id` is no longer current.
pub async fn run_batch(
    workspace: SharedWorkspace,
    llm: Arc<dyn LlmProvider>,
    id: Uuid,
    files: Vec<UploadedFile>,
    cloud_link: Option<String>,
) {
    let mut report = BatchReport::started(files.len(), cloud_link);
    if !workspace.lock().await.resumes.record_progress(id, report.clone()) {
        return;
    }

    for file in files {
        let file_name = file.file_name.clone();
        match process_resume(file, llm.as_ref()).await {
            Ok(parsed) => report.rows.push(ResumeRow { file_name, parsed }),
            Err(skipped) => {
                warn!(
                    "Skipping '{}' at {:?}: {}",
                    skipped.file_name, skipped.stage, skipped.reason
                );
                report.skipped.push(skipped);
            }
        }
        report.advance();

        if !workspace.lock().await.resumes.record_progress(id, report.clone()) {
            info!("Resume batch {id} stopped at {}/{}", report.completed, report.total);
            return;
        }
    }

    info!(
        "Resume batch {id} finished: {} parsed, {} skipped",
        report.rows.len(),
        report.skipped.len()
    );
    workspace.lock().await.resumes.complete(id, Ok(report));
}

/// Starts a batch over the files already on the resume intake and returns
/// the submission id. The batch runs in the background.
pub async fn start_batch(
    workspace: &SharedWorkspace,
    llm: Arc<dyn LlmProvider>,
) -> Result<Uuid, AppError> {
    let (id, input) = {
        let mut ws = workspace.lock().await;
        let input = ws.resumes.input().cloned().unwrap_or_default();
        if input.files.is_empty() {
            return Err(AppError::Validation(if input.cloud_link.is_some() {
                "Cloud links are not resolved; upload the resume files directly".to_string()
            } else {
                "Please select a folder with resume files".to_string()
            }));
        }
        (ws.resumes.begin_submission()?, input)
    };
    info!("Resume batch {id} started with {} files", input.files.len());

    let task = tokio::spawn(run_batch(
        workspace.clone(),
        llm,
        id,
        input.files,
        input.cloud_link,
    ));
    workspace
        .lock()
        .await
        .resumes
        .attach_abort(id, task.abort_handle());
    Ok(id)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use crate::extraction::FileKind;
    use crate::intake::IntakeStatus;
    use crate::llm_client::testing::{Reply, ScriptedLlm};
    use crate::resumes::models::ResumeBatchInput;
    use crate::workspace::Workspace;

    const JANE: &str = r#"{"name": "Jane Doe", "email": "jane@example.com", "phone": "+1-555-0100", "skills": ["Rust"], "experience": "4 years", "education": "BSc"}"#;
    const BOB: &str = r#"{"name": "Bob Roe", "email": "bob@example.com", "phone": null, "skills": ["Go"], "experience": "2 years", "education": ""}"#;

    fn text_file(name: &str, body: &'static str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            kind: FileKind::Text,
            bytes: Bytes::from_static(body.as_bytes()),
        }
    }

    async fn workspace_with(input: ResumeBatchInput) -> SharedWorkspace {
        let workspace = Workspace::shared().unwrap();
        {
            let mut ws = workspace.lock().await;
            ws.resumes.select().unwrap();
            ws.resumes.set_ready(input).unwrap();
        }
        workspace
    }

    async fn wait_until_finished(workspace: &SharedWorkspace) {
        for _ in 0..200 {
            if workspace.lock().await.resumes.status() != IntakeStatus::Submitting {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("batch did not finish");
    }

    #[tokio::test]
    async fn test_process_resume_parses_valid_output() {
        let llm = ScriptedLlm::text(JANE);
        let parsed = process_resume(text_file("jane.txt", "Jane Doe, Rust"), &llm)
            .await
            .unwrap();
        assert_eq!(parsed.name, "Jane Doe");
        let request = &llm.requests()[0];
        assert!(request.user.ends_with("Jane Doe, Rust"));
        assert_eq!(request.max_tokens, Some(RESUME_PARSE_MAX_TOKENS));
    }

    #[tokio::test]
    async fn test_blank_file_skipped_without_llm_call() {
        let llm = ScriptedLlm::text(JANE);
        let skipped = process_resume(text_file("blank.txt", "   "), &llm)
            .await
            .unwrap_err();
        assert_eq!(skipped.stage, SkipStage::Extraction);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_schema_violation_is_skipped() {
        let llm = ScriptedLlm::text(r#"{"name": "X", "email": "x@y.z", "skills": []}"#);
        let skipped = process_resume(text_file("x.txt", "resume"), &llm)
            .await
            .unwrap_err();
        assert_eq!(skipped.stage, SkipStage::Schema);
        assert_eq!(skipped.file_name, "x.txt");
    }

    #[tokio::test]
    async fn test_batch_reports_rows_skips_and_progress() {
        let workspace = workspace_with(ResumeBatchInput {
            files: vec![
                text_file("jane.txt", "Jane Doe resume"),
                text_file("broken.txt", "Someone"),
                text_file("bob.txt", "Bob Roe resume"),
                text_file("empty.txt", ""),
            ],
            cloud_link: None,
        })
        .await;
        let llm = Arc::new(ScriptedLlm::new([
            Reply::Text(JANE.to_string()),
            Reply::ApiError {
                status: 429,
                message: "Rate limit reached".to_string(),
            },
            Reply::Text(BOB.to_string()),
        ]));

        start_batch(&workspace, llm.clone()).await.unwrap();
        wait_until_finished(&workspace).await;

        let snap = workspace.lock().await.resumes.snapshot();
        assert_eq!(snap.status, IntakeStatus::Done);
        let report = snap.result.unwrap();
        assert_eq!(report.total, 4);
        assert_eq!(report.completed, 4);
        assert_eq!(report.progress, 100);
        let names: Vec<&str> = report.rows.iter().map(|r| r.parsed.name.as_str()).collect();
        assert_eq!(names, vec!["Jane Doe", "Bob Roe"]);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].stage, SkipStage::Llm);
        assert_eq!(report.skipped[0].reason, "Rate limit reached");
        assert_eq!(report.skipped[1].stage, SkipStage::Extraction);
        assert_eq!(llm.calls(), 3);
    }

    #[tokio::test]
    async fn test_cloud_link_only_is_rejected() {
        let workspace = workspace_with(ResumeBatchInput {
            files: Vec::new(),
            cloud_link: Some("https://drive.example.com/folder".to_string()),
        })
        .await;
        let llm = Arc::new(ScriptedLlm::text(JANE));
        let err = start_batch(&workspace, llm.clone()).await.unwrap_err();
        assert!(err.to_string().contains("Cloud links are not resolved"));
        assert_eq!(llm.calls(), 0);
        assert_eq!(workspace.lock().await.resumes.status(), IntakeStatus::Ready);
    }

    #[tokio::test]
    async fn test_reset_stops_batch() {
        let workspace = workspace_with(ResumeBatchInput {
            files: vec![
                text_file("a.txt", "first"),
                text_file("b.txt", "second"),
            ],
            cloud_link: None,
        })
        .await;
        let llm = Arc::new(ScriptedLlm::new([
            Reply::Delayed(Duration::from_millis(300), JANE.to_string()),
            Reply::Text(BOB.to_string()),
        ]));

        start_batch(&workspace, llm.clone()).await.unwrap();
        workspace.lock().await.resumes.reset();
        tokio::time::sleep(Duration::from_millis(400)).await;

        let ws = workspace.lock().await;
        assert_eq!(ws.resumes.status(), IntakeStatus::Idle);
        assert!(ws.resumes.result().is_none());
        assert!(llm.calls() <= 1);
    }
}
