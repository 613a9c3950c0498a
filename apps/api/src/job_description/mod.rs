// Job-description intake: text, file or URL in; LLM-extracted job details out.
// All LLM calls go through llm_client; nothing here talks to a provider directly.

pub mod handlers;
pub mod models;
pub mod prompts;
pub mod service;
