use std::sync::Arc;

use crate::auth::remember::RememberStore;
use crate::auth::session::{SessionPolicy, SessionStore};
use crate::config::Config;
use crate::extraction::AcceptPolicy;
use crate::llm_client::LlmProvider;
use crate::workspace::WorkspaceRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Provider chosen from `LLM_PROVIDER` at startup.
    pub llm: Arc<dyn LlmProvider>,
    pub sessions: SessionStore,
    /// In-memory unless `REDIS_URL` is set.
    pub remember: RememberStore,
    pub workspaces: WorkspaceRegistry,
}

impl AppState {
    pub fn new(config: Config, llm: Arc<dyn LlmProvider>, remember: RememberStore) -> Self {
        let policy =
            SessionPolicy::from_secs(config.session_idle_secs, config.session_max_age_secs);
        Self {
            config,
            llm,
            sessions: SessionStore::new(policy),
            remember,
            workspaces: WorkspaceRegistry::default(),
        }
    }

    pub fn accept_policy(&self) -> AcceptPolicy {
        AcceptPolicy {
            allow_plain_text: self.config.allow_plain_text,
        }
    }

    /// No auth delay, plain text allowed, in-memory remember store.
    #[cfg(test)]
    pub fn for_tests(llm: Arc<dyn LlmProvider>) -> Self {
        use crate::config::{LlmConfig, ProviderKind};

        let config = Config {
            llm: LlmConfig {
                provider: ProviderKind::OpenAi,
                api_key: "test-key".to_string(),
                model: "gpt-4".to_string(),
                base_url: "http://127.0.0.1:9".to_string(),
                max_retries: 0,
                timeout_secs: 5,
                openrouter_referer: "http://localhost:8080".to_string(),
                openrouter_title: "JobLens Agent".to_string(),
            },
            redis_url: None,
            auth_delay_ms: 0,
            allow_plain_text: true,
            max_upload_bytes: 1024 * 1024,
            session_idle_secs: 60 * 60,
            session_max_age_secs: 24 * 60 * 60,
            session_sweep_secs: 60,
            cors_origin: None,
            port: 0,
            rust_log: "debug".to_string(),
        };
        Self::new(config, llm, RememberStore::in_memory())
    }
}
