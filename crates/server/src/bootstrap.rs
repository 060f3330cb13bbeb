use std::sync::Arc;

use dlassist_actions::{default_registry, ActionContext, ActionRegistry};
use dlassist_core::config::{AppConfig, ConfigError};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub context: Arc<ActionContext>,
    pub registry: Arc<ActionRegistry>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("action context could not be built: {0}")]
    Context(#[source] anyhow::Error),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let context = ActionContext::from_config(&config).map_err(BootstrapError::Context)?;
    let registry = default_registry();

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        backend_base_url = %context.backend.base_url(),
        registered_actions = registry.len(),
        assistant_enabled = context.responder.is_enabled(),
        "action runtime assembled"
    );

    Ok(Application { config, context: Arc::new(context), registry: Arc::new(registry) })
}
