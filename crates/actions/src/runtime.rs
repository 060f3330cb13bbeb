use std::sync::Arc;

use anyhow::{Context, Result};

use dlassist_core::config::AppConfig;

use crate::assistant::FallbackResponder;
use crate::backend::BackendClient;
use crate::llm::{LlmClient, OpenAiCompatibleClient};

/// Shared, read-only dependencies handed to every action invocation.
#[derive(Clone)]
pub struct ActionContext {
    pub backend: BackendClient,
    pub responder: FallbackResponder,
}

impl ActionContext {
    pub fn new(backend: BackendClient, responder: FallbackResponder) -> Self {
        Self { backend, responder }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let backend =
            BackendClient::from_config(&config.backend).context("failed to build backend HTTP client")?;
        let assistant = OpenAiCompatibleClient::from_config(&config.assistant)
            .context("failed to build assistant HTTP client")?
            .map(|client| Arc::new(client) as Arc<dyn LlmClient>);

        Ok(Self::new(backend, FallbackResponder::new(assistant, &config.assistant)))
    }
}
