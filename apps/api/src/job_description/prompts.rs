/// Role line for job-description extraction; see [`crate::llm_client::prompts::json_system`].
pub const JD_EXTRACT_ROLE: &str =
    "You are an assistant that extracts structured information from job descriptions.";

/// Replace `{jd_text}` before sending.
pub const JD_EXTRACT_PROMPT_TEMPLATE: &str = r#"Extract key details (Job Title, Key Skills, Experience, Education) from the following JD.

Return a JSON object with this EXACT schema (no extra fields):
{
  "job_title": "Senior Software Engineer",
  "key_skills": ["React", "Node.js", "TypeScript", "AWS"],
  "experience": "5+ years",
  "education": "Bachelor's in Computer Science"
}

Use an empty string when the JD does not state experience or education.

JD:

{jd_text}"#;

/// Sampling temperature for extraction calls.
pub const JD_EXTRACT_TEMPERATURE: f32 = 0.3;

/// Upper bound on generated tokens; the JSON answer is short.
pub const JD_EXTRACT_MAX_TOKENS: u32 = 512;
