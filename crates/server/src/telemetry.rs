use anyhow::{anyhow, Result};
use dlassist_core::config::{AppConfig, LogFormat};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Handle for process-wide tracing. Call [`TelemetryGuard::shutdown`] once on exit.
///
/// `otlp_endpoint` is informational: spans go to the fmt subscriber only.
#[derive(Debug)]
pub struct TelemetryGuard {
    service_name: String,
    otlp_endpoint: Option<String>,
}

impl TelemetryGuard {
    fn from_config(config: &AppConfig) -> Self {
        let otlp_endpoint =
            config.telemetry.enabled.then(|| config.telemetry.otlp_endpoint.clone());
        Self { service_name: config.telemetry.service_name.clone(), otlp_endpoint }
    }

    pub fn shutdown(self) {
        info!(
            event_name = "system.telemetry.shutdown",
            correlation_id = "shutdown",
            service_name = %self.service_name,
            "tracing shut down"
        );
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init(config: &AppConfig) -> Result<TelemetryGuard> {
    let filter = env_filter(&config.logging.level);
    let builder = tracing_subscriber::fmt().with_target(false).with_env_filter(filter);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))?;

    let guard = TelemetryGuard::from_config(config);
    info!(
        event_name = "system.telemetry.init",
        correlation_id = "bootstrap",
        service_name = %guard.service_name,
        otlp_endpoint = guard.otlp_endpoint.as_deref().unwrap_or("disabled"),
        "tracing initialized"
    );
    Ok(guard)
}
