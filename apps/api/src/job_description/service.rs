use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::job_description::models::{ExtractedJobInfo, JobInfo};
use crate::job_description::prompts::{
    JD_EXTRACT_MAX_TOKENS, JD_EXTRACT_PROMPT_TEMPLATE, JD_EXTRACT_ROLE, JD_EXTRACT_TEMPERATURE,
};
use crate::llm_client::{parse_json, prompts::json_system, ChatRequest, LlmProvider};
use crate::workspace::SharedWorkspace;

pub fn build_request(jd_text: &str) -> ChatRequest {
    let user = JD_EXTRACT_PROMPT_TEMPLATE.replace("{jd_text}", jd_text);
    ChatRequest::new(json_system(JD_EXTRACT_ROLE), user)
        .with_temperature(JD_EXTRACT_TEMPERATURE)
        .with_max_tokens(JD_EXTRACT_MAX_TOKENS)
}

/// Wraps model text. The raw text is always kept; the structured form only
/// when it parses and validates.
pub fn interpret(raw: String, provider: &str) -> ExtractedJobInfo {
    let checked = parse_json::<JobInfo>(&raw)
        .map_err(|e| e.to_string())
        .and_then(|info| info.validate().map(|_| info));

    let (structured, schema_error) = match checked {
        Ok(info) => (Some(info), None),
        Err(reason) => {
            warn!("JD extraction output did not match schema: {reason}");
            (None, Some(reason))
        }
    };

    ExtractedJobInfo {
        raw,
        structured,
        schema_error,
        provider: provider.to_string(),
    }
}

/// Sends the workspace's job description to the LLM and records the outcome
/// on the intake.
///
/// The call runs in its own task so a reset can abort it. The task writes
/// the result back itself, so a dropped request still leaves the intake in a
/// final state.
pub async fn run_submission(
    workspace: &SharedWorkspace,
    llm: Arc<dyn LlmProvider>,
) -> Result<ExtractedJobInfo, AppError> {
    let (id, text) = {
        let mut ws = workspace.lock().await;
        let intake = &mut ws.job_description;
        let input = intake.input().cloned().unwrap_or_default();
        if input.text.trim().is_empty() {
            return Err(AppError::Validation(if input.source_url.is_some() {
                "URL sources are not fetched; paste the text or upload the file".to_string()
            } else {
                "Please provide a job description".to_string()
            }));
        }
        (intake.begin_submission()?, input.text)
    };
    info!("JD submission {id} started ({} chars, provider {})", text.len(), llm.name());

    let request = build_request(&text);
    let task_workspace = workspace.clone();
    let task = tokio::spawn(async move {
        let outcome = llm.complete(&request).await;
        let mut ws = task_workspace.lock().await;
        match outcome {
            Ok(raw) => {
                let info = interpret(raw, llm.name());
                if ws.job_description.complete(id, Ok(info.clone())) {
                    Ok(info)
                } else {
                    Err(cancelled())
                }
            }
            Err(e) => {
                ws.job_description.complete(id, Err(e.user_message()));
                Err(AppError::Llm(e))
            }
        }
    });
    workspace
        .lock()
        .await
        .job_description
        .attach_abort(id, task.abort_handle());

    match task.await {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Err(cancelled()),
        Err(e) => {
            let message = format!("JD submission task failed: {e}");
            workspace
                .lock()
                .await
                .job_description
                .complete(id, Err(message.clone()));
            Err(AppError::Internal(anyhow::anyhow!(message)))
        }
    }
}

fn cancelled() -> AppError {
    AppError::Conflict("The submission was cancelled".to_string())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::intake::IntakeStatus;
    use crate::job_description::models::JobDescriptionInput;
    use crate::llm_client::testing::{Reply, ScriptedLlm};
    use crate::workspace::Workspace;

    const GOOD_JSON: &str = r#"{"job_title": "Senior Software Engineer", "key_skills": ["React", "Node.js"], "experience": "5+ years", "education": "BSc"}"#;

    async fn ready_workspace(text: &str) -> SharedWorkspace {
        let workspace = Workspace::shared().unwrap();
        {
            let mut ws = workspace.lock().await;
            ws.job_description.select().unwrap();
            ws.job_description
                .set_ready(JobDescriptionInput {
                    text: text.to_string(),
                    ..Default::default()
                })
                .unwrap();
        }
        workspace
    }

    #[test]
    fn test_build_request_embeds_text_and_temperature() {
        let request = build_request("We need a Rust engineer");
        assert!(request.user.starts_with(
            "Extract key details (Job Title, Key Skills, Experience, Education)"
        ));
        assert!(request.user.ends_with("We need a Rust engineer"));
        assert!(request.system.contains("job descriptions"));
        assert!((request.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(request.max_tokens, Some(JD_EXTRACT_MAX_TOKENS));
    }

    #[test]
    fn test_interpret_valid_json() {
        let info = interpret(format!("```json\n{GOOD_JSON}\n```"), "openai");
        let structured = info.structured.unwrap();
        assert_eq!(structured.job_title, "Senior Software Engineer");
        assert!(info.schema_error.is_none());
        assert!(info.raw.starts_with("```json"));
    }

    #[test]
    fn test_interpret_prose_keeps_raw_only() {
        let info = interpret("Job Title: SWE\nSkills: Rust".to_string(), "huggingface");
        assert!(info.structured.is_none());
        assert!(info.schema_error.is_some());
        assert_eq!(info.raw, "Job Title: SWE\nSkills: Rust");
    }

    #[tokio::test]
    async fn test_success_stores_result() {
        let workspace = ready_workspace("Rust engineer wanted").await;
        let llm = Arc::new(ScriptedLlm::text(GOOD_JSON));
        let info = run_submission(&workspace, llm.clone()).await.unwrap();

        assert!(info.structured.is_some());
        assert_eq!(llm.calls(), 1);
        let ws = workspace.lock().await;
        assert_eq!(ws.job_description.status(), IntakeStatus::Done);
        assert_eq!(ws.job_description.result().unwrap().raw, GOOD_JSON);
    }

    #[tokio::test]
    async fn test_empty_text_makes_no_llm_call() {
        let workspace = ready_workspace("   ").await;
        let llm = Arc::new(ScriptedLlm::text(GOOD_JSON));
        let err = run_submission(&workspace, llm.clone()).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_url_only_input_is_rejected() {
        let workspace = Workspace::shared().unwrap();
        {
            let mut ws = workspace.lock().await;
            ws.job_description.select().unwrap();
            ws.job_description
                .set_ready(JobDescriptionInput {
                    source_url: Some("https://jobs.example.com/1".to_string()),
                    ..Default::default()
                })
                .unwrap();
        }
        let llm = Arc::new(ScriptedLlm::text(GOOD_JSON));
        let err = run_submission(&workspace, llm.clone()).await.unwrap_err();
        assert!(err.to_string().contains("URL sources are not fetched"));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_error_moves_to_submit_error() {
        let workspace = ready_workspace("Rust engineer wanted").await;
        let llm = Arc::new(ScriptedLlm::new([Reply::ApiError {
            status: 401,
            message: "Incorrect API key provided".to_string(),
        }]));
        let err = run_submission(&workspace, llm).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));

        let snap = workspace.lock().await.job_description.snapshot();
        assert_eq!(snap.status, IntakeStatus::SubmitError);
        assert!(snap.result.is_none());
        assert_eq!(snap.error.as_deref(), Some("Incorrect API key provided"));
    }

    #[tokio::test]
    async fn test_reset_during_call_discards_late_result() {
        let workspace = ready_workspace("Rust engineer wanted").await;
        let llm = Arc::new(ScriptedLlm::new([Reply::Delayed(
            Duration::from_millis(200),
            GOOD_JSON.to_string(),
        )]));

        let submit_ws = workspace.clone();
        let submission = tokio::spawn(async move { run_submission(&submit_ws, llm).await });

        // Wait until the submission is in flight, then reset.
        loop {
            if workspace.lock().await.job_description.status() == IntakeStatus::Submitting {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        workspace.lock().await.job_description.reset();

        let err = submission.await.unwrap().unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        let ws = workspace.lock().await;
        assert_eq!(ws.job_description.status(), IntakeStatus::Idle);
        assert!(ws.job_description.result().is_none());
    }
}
