pub const RESUME_PARSE_ROLE: &str =
    "You are an assistant that extracts structured candidate information from resumes.";

/// Replace `{resume_text}` before sending.
pub const RESUME_PARSE_PROMPT_TEMPLATE: &str = r#"Extract the candidate's details from the resume below.

Return a JSON object with this EXACT schema (no extra fields):
{
  "name": "Jane Doe",
  "email": "jane.doe@example.com",
  "phone": "+1-555-0100",
  "skills": ["React", "Node.js", "AWS"],
  "experience": "6 years, most recently Senior Engineer at Acme",
  "education": "BSc Computer Science"
}

Use null for "phone" when the resume has none and an empty string for
experience or education that is not stated.

Resume:

{resume_text}"#;

pub const RESUME_PARSE_TEMPERATURE: f32 = 0.2;

pub const RESUME_PARSE_MAX_TOKENS: u32 = 1024;
