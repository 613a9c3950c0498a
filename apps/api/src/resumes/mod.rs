// Resume batch intake: many files in, one LLM parse per file, progress and
// skipped files reported as the batch runs.

pub mod batch;
pub mod handlers;
pub mod models;
pub mod prompts;
