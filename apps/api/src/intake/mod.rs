//! Intake lifecycle shared by the job-description and resume-batch components.
//!
//! ```text
//! idle → selecting → extracting → (ready | extraction_error) → submitting → (done | submit_error)
//! ```
//!
//! Every submission gets a fresh id. A result is applied only while its id is
//! still the current one, so a response arriving after a reset or a newer
//! submission is dropped instead of overwriting state.

use serde::Serialize;
use tokio::task::AbortHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStatus {
    Idle,
    Selecting,
    Extracting,
    Ready,
    ExtractionError,
    Submitting,
    Done,
    SubmitError,
}

impl IntakeStatus {
    /// Reset (→ `Idle`) is always allowed and is handled by [`Intake::reset`].
    pub fn can_transition_to(self, next: IntakeStatus) -> bool {
        use IntakeStatus::*;
        matches!(
            (self, next),
            (Idle | Ready | Done | SubmitError | ExtractionError, Selecting)
                | (Selecting, Extracting | Ready)
                | (Extracting, Ready | ExtractionError)
                | (Ready | Done | SubmitError, Submitting)
                | (Submitting, Done | SubmitError)
                | (_, Idle)
        )
    }
}

struct Submission {
    id: Uuid,
    abort: Option<AbortHandle>,
}

/// One component's state: its input `I`, its last result `R`, and the
/// submission currently in flight.
pub struct Intake<I, R> {
    status: IntakeStatus,
    input: Option<I>,
    result: Option<R>,
    error: Option<String>,
    submission: Option<Submission>,
}

/// Serializable view of an intake, without the input payload.
#[derive(Debug, Clone, Serialize)]
pub struct IntakeSnapshot<R> {
    pub status: IntakeStatus,
    pub submission_id: Option<Uuid>,
    pub result: Option<R>,
    pub error: Option<String>,
}

impl<I, R> Default for Intake<I, R> {
    fn default() -> Self {
        Self {
            status: IntakeStatus::Idle,
            input: None,
            result: None,
            error: None,
            submission: None,
        }
    }
}

impl<I, R: Clone> Intake<I, R> {
    pub fn status(&self) -> IntakeStatus {
        self.status
    }

    pub fn input(&self) -> Option<&I> {
        self.input.as_ref()
    }

    pub fn result(&self) -> Option<&R> {
        self.result.as_ref()
    }

    pub fn snapshot(&self) -> IntakeSnapshot<R> {
        IntakeSnapshot {
            status: self.status,
            submission_id: self.submission.as_ref().map(|s| s.id),
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }

    fn transition(&mut self, next: IntakeStatus) -> Result<(), AppError> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "cannot move from {:?} to {:?}",
                self.status, next
            )));
        }
        debug!("Intake {:?} -> {:?}", self.status, next);
        self.status = next;
        Ok(())
    }

    /// New input is being provided. Clears the previous result and error.
    pub fn select(&mut self) -> Result<(), AppError> {
        self.transition(IntakeStatus::Selecting)?;
        self.input = None;
        self.result = None;
        self.error = None;
        Ok(())
    }

    pub fn begin_extraction(&mut self) -> Result<(), AppError> {
        self.transition(IntakeStatus::Extracting)
    }

    pub fn fail_extraction(&mut self, message: String) -> Result<(), AppError> {
        self.transition(IntakeStatus::ExtractionError)?;
        self.error = Some(message);
        Ok(())
    }

    /// Input is complete (typed directly or extracted from a file).
    pub fn set_ready(&mut self, input: I) -> Result<(), AppError> {
        self.transition(IntakeStatus::Ready)?;
        self.input = Some(input);
        Ok(())
    }

    /// Starts a submission and returns its id.
    pub fn begin_submission(&mut self) -> Result<Uuid, AppError> {
        if self.status == IntakeStatus::Submitting {
            return Err(AppError::Conflict(
                "a submission is already in progress".to_string(),
            ));
        }
        self.transition(IntakeStatus::Submitting)?;
        let id = Uuid::new_v4();
        self.submission = Some(Submission { id, abort: None });
        self.error = None;
        Ok(id)
    }

    pub fn is_current(&self, id: Uuid) -> bool {
        self.status == IntakeStatus::Submitting
            && self.submission.as_ref().is_some_and(|s| s.id == id)
    }

    /// Registers the task running submission `id`. If that submission was
    /// already superseded, the task is aborted on the spot.
    pub fn attach_abort(&mut self, id: Uuid, handle: AbortHandle) {
        match self.submission.as_mut() {
            Some(s) if s.id == id && self.status == IntakeStatus::Submitting => {
                s.abort = Some(handle)
            }
            _ => handle.abort(),
        }
    }

    /// Stores a partial result while the submission is still running.
    pub fn record_progress(&mut self, id: Uuid, partial: R) -> bool {
        if !self.is_current(id) {
            return false;
        }
        self.result = Some(partial);
        true
    }

    /// Applies the outcome of submission `id`. Returns false (and changes
    /// nothing) when the submission is no longer current.
    pub fn complete(&mut self, id: Uuid, outcome: Result<R, String>) -> bool {
        if !self.is_current(id) {
            info!("Discarding stale result for submission {id}");
            return false;
        }
        self.submission = None;
        match outcome {
            Ok(result) => {
                self.status = IntakeStatus::Done;
                self.result = Some(result);
                self.error = None;
            }
            Err(message) => {
                self.status = IntakeStatus::SubmitError;
                self.result = None;
                self.error = Some(message);
            }
        }
        true
    }

    /// Back to `Idle`. Any in-flight submission is aborted and its late result ignored.
    pub fn reset(&mut self) {
        if let Some(submission) = self.submission.take() {
            if let Some(handle) = submission.abort {
                handle.abort();
            }
            info!("Cancelled submission {}", submission.id);
        }
        self.status = IntakeStatus::Idle;
        self.input = None;
        self.result = None;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestIntake = Intake<String, String>;

    fn ready(input: &str) -> TestIntake {
        let mut intake = TestIntake::default();
        intake.select().unwrap();
        intake.set_ready(input.to_string()).unwrap();
        intake
    }

    #[test]
    fn test_text_path_reaches_done() {
        let mut intake = ready("jd");
        let id = intake.begin_submission().unwrap();
        assert_eq!(intake.status(), IntakeStatus::Submitting);
        assert!(intake.complete(id, Ok("result".to_string())));
        assert_eq!(intake.status(), IntakeStatus::Done);
        assert_eq!(intake.result().unwrap(), "result");
    }

    #[test]
    fn test_file_path_through_extraction() {
        let mut intake = TestIntake::default();
        intake.select().unwrap();
        intake.begin_extraction().unwrap();
        intake.set_ready("extracted".to_string()).unwrap();
        assert_eq!(intake.status(), IntakeStatus::Ready);
        assert_eq!(intake.input().unwrap(), "extracted");
    }

    #[test]
    fn test_extraction_error_blocks_submission() {
        let mut intake = TestIntake::default();
        intake.select().unwrap();
        intake.begin_extraction().unwrap();
        intake.fail_extraction("bad pdf".to_string()).unwrap();
        assert_eq!(intake.status(), IntakeStatus::ExtractionError);
        assert!(matches!(
            intake.begin_submission().unwrap_err(),
            AppError::Conflict(_)
        ));
        // The user can pick a new file.
        intake.select().unwrap();
        assert_eq!(intake.snapshot().error, None);
    }

    #[test]
    fn test_cannot_submit_from_idle() {
        let mut intake = TestIntake::default();
        assert!(intake.begin_submission().is_err());
    }

    #[test]
    fn test_double_submission_rejected() {
        let mut intake = ready("jd");
        intake.begin_submission().unwrap();
        let err = intake.begin_submission().unwrap_err();
        assert!(err.to_string().contains("already in progress"));
    }

    #[test]
    fn test_submit_error_keeps_message_and_no_result() {
        let mut intake = ready("jd");
        let id = intake.begin_submission().unwrap();
        assert!(intake.complete(id, Err("Incorrect API key".to_string())));
        let snap = intake.snapshot();
        assert_eq!(snap.status, IntakeStatus::SubmitError);
        assert!(snap.result.is_none());
        assert_eq!(snap.error.as_deref(), Some("Incorrect API key"));
    }

    #[test]
    fn test_late_result_after_reset_is_discarded() {
        let mut intake = ready("jd");
        let id = intake.begin_submission().unwrap();
        intake.reset();
        assert!(!intake.complete(id, Ok("late".to_string())));
        assert_eq!(intake.status(), IntakeStatus::Idle);
        assert!(intake.result().is_none());
    }

    #[test]
    fn test_result_of_superseded_submission_is_discarded() {
        let mut intake = ready("jd");
        let first = intake.begin_submission().unwrap();
        intake.reset();
        intake.select().unwrap();
        intake.set_ready("jd2".to_string()).unwrap();
        let second = intake.begin_submission().unwrap();

        assert!(!intake.complete(first, Ok("old".to_string())));
        assert!(intake.complete(second, Ok("new".to_string())));
        assert_eq!(intake.result().unwrap(), "new");
    }

    #[test]
    fn test_progress_only_for_current_submission() {
        let mut intake = ready("batch");
        let id = intake.begin_submission().unwrap();
        assert!(intake.record_progress(id, "1/2".to_string()));
        assert_eq!(intake.snapshot().result.as_deref(), Some("1/2"));
        assert!(!intake.record_progress(Uuid::new_v4(), "x".to_string()));
    }

    #[test]
    fn test_resubmit_after_done() {
        let mut intake = ready("jd");
        let id = intake.begin_submission().unwrap();
        intake.complete(id, Ok("a".to_string()));
        let again = intake.begin_submission().unwrap();
        assert_ne!(id, again);
    }

    #[tokio::test]
    async fn test_reset_aborts_running_task() {
        let mut intake = ready("jd");
        let id = intake.begin_submission().unwrap();
        let task = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        });
        intake.attach_abort(id, task.abort_handle());
        intake.reset();
        let err = task.await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_attach_to_stale_submission_aborts_immediately() {
        let mut intake = ready("jd");
        let id = intake.begin_submission().unwrap();
        intake.reset();
        let task = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        });
        intake.attach_abort(id, task.abort_handle());
        assert!(task.await.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_transition_table() {
        use IntakeStatus::*;
        assert!(Idle.can_transition_to(Selecting));
        assert!(!Idle.can_transition_to(Submitting));
        assert!(!Selecting.can_transition_to(Done));
        assert!(Extracting.can_transition_to(ExtractionError));
        assert!(!ExtractionError.can_transition_to(Submitting));
        assert!(Submitting.can_transition_to(Idle));
        assert!(!Submitting.can_transition_to(Selecting));
    }
}
