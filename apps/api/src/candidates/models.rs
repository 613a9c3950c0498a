use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::{Cell, TabularRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Qualified,
    Review,
}

impl CandidateStatus {
    pub fn label(self) -> &'static str {
        match self {
            CandidateStatus::Qualified => "Qualified",
            CandidateStatus::Review => "Needs Review",
        }
    }
}

/// Display band for an ATS score: ≥85 high, ≥70 medium, otherwise low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

/// ATS compatibility percentage. Always within 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AtsScore(u8);

impl AtsScore {
    pub fn new(value: u8) -> Result<Self, AppError> {
        if value > 100 {
            return Err(AppError::Validation(format!(
                "ATS score must be between 0 and 100, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn band(self) -> ScoreBand {
        match self.0 {
            85..=u8::MAX => ScoreBand::High,
            70..=84 => ScoreBand::Medium,
            _ => ScoreBand::Low,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub ats_score: AtsScore,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub status: CandidateStatus,
    pub shortlisted: bool,
}

impl TabularRow for Candidate {
    fn headers() -> &'static [&'static str] {
        &[
            "Name",
            "Email",
            "Phone",
            "ATS Score",
            "Strengths",
            "Gaps",
            "Status",
            "Shortlisted",
        ]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.name.as_str().into(),
            self.email.as_str().into(),
            self.phone.as_str().into(),
            Cell::Number(f64::from(self.ats_score.value())),
            self.strengths.join(", ").into(),
            self.gaps.join(", ").into(),
            self.status.label().into(),
            if self.shortlisted { "Yes" } else { "No" }.into(),
        ]
    }
}
