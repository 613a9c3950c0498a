use serde::{Deserialize, Serialize};

use crate::export::{Cell, TabularRow};
use crate::extraction::UploadedFile;

/// Candidate details parsed from one resume. Model output must match exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParsedResume {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub experience: String,
    pub education: String,
}

impl ParsedResume {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is empty".to_string());
        }
        if !self.email.contains('@') {
            return Err(format!("email '{}' is not an address", self.email));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumeRow {
    pub file_name: String,
    #[serde(flatten)]
    pub parsed: ParsedResume,
}

impl TabularRow for ResumeRow {
    fn headers() -> &'static [&'static str] {
        &[
            "File",
            "Name",
            "Email",
            "Phone",
            "Skills",
            "Experience",
            "Education",
        ]
    }

    fn cells(&self) -> Vec<Cell> {
        vec![
            self.file_name.as_str().into(),
            self.parsed.name.as_str().into(),
            self.parsed.email.as_str().into(),
            self.parsed.phone.clone().unwrap_or_default().into(),
            self.parsed.skills.join(", ").into(),
            self.parsed.experience.as_str().into(),
            self.parsed.education.as_str().into(),
        ]
    }
}

/// Where a file dropped out of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipStage {
    Extraction,
    Llm,
    Schema,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub file_name: String,
    pub stage: SkipStage,
    pub reason: String,
}

/// Running or final state of one batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub completed: usize,
    /// `completed * 100 / total`, integer division.
    pub progress: u8,
    pub rows: Vec<ResumeRow>,
    pub skipped: Vec<SkippedFile>,
    pub cloud_link: Option<String>,
}

impl BatchReport {
    pub fn started(total: usize, cloud_link: Option<String>) -> Self {
        Self {
            total,
            completed: 0,
            progress: 0,
            rows: Vec::new(),
            skipped: Vec::new(),
            cloud_link,
        }
    }

    /// Marks one more file as handled and recomputes progress.
    pub fn advance(&mut self) {
        self.completed += 1;
        self.progress = percent(self.completed, self.total);
    }
}

fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (completed.min(total) * 100 / total) as u8
}

#[derive(Debug, Clone, Default)]
pub struct ResumeBatchInput {
    pub files: Vec<UploadedFile>,
    pub cloud_link: Option<String>,
}

impl ResumeBatchInput {
    pub fn file_names(&self) -> Vec<String> {
        self.files.iter().map(|f| f.file_name.clone()).collect()
    }
}
