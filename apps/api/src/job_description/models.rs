use serde::{Deserialize, Serialize};

/// What the user has provided so far. `text` is empty for URL-only input.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobDescriptionInput {
    pub text: String,
    pub source_file: Option<String>,
    pub source_url: Option<String>,
}

/// Structured job details. Model output must match this shape exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobInfo {
    pub job_title: String,
    pub key_skills: Vec<String>,
    pub experience: String,
    pub education: String,
}

impl JobInfo {
    /// Schema checks beyond what serde enforces.
    pub fn validate(&self) -> Result<(), String> {
        if self.job_title.trim().is_empty() {
            return Err("job_title is empty".to_string());
        }
        if self.key_skills.iter().any(|s| s.trim().is_empty()) {
            return Err("key_skills contains an empty entry".to_string());
        }
        Ok(())
    }
}

/// Result of one extraction call. `raw` is always the model's text; `structured`
/// is present only when that text validated against [`JobInfo`].
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedJobInfo {
    pub raw: String,
    pub structured: Option<JobInfo>,
    pub schema_error: Option<String>,
    pub provider: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_info_rejects_unknown_fields() {
        let json = r#"{"job_title": "SWE", "key_skills": [], "experience": "", "education": "", "salary": "lots"}"#;
        assert!(serde_json::from_str::<JobInfo>(json).is_err());
    }

    #[test]
    fn test_job_info_requires_all_fields() {
        let json = r#"{"job_title": "SWE", "key_skills": ["Rust"]}"#;
        assert!(serde_json::from_str::<JobInfo>(json).is_err());
    }

    #[test]
    fn test_validate_empty_title() {
        let info = JobInfo {
            job_title: " ".to_string(),
            key_skills: vec!["Rust".to_string()],
            experience: "3 years".to_string(),
            education: String::new(),
        };
        assert_eq!(info.validate().unwrap_err(), "job_title is empty");
    }
}
