// Shared prompt fragments.
// Each intake that calls the LLM defines its own prompts.rs alongside it.

/// Appended to system prompts whose output is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Joins a role description with the JSON-only instruction.
pub fn json_system(role: &str) -> String {
    format!("{} {}", role.trim_end(), JSON_ONLY_INSTRUCTION)
}
