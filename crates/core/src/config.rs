use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub assistant: AssistantConfig,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
    /// Used when the incoming message carries no bearer token of its own.
    pub auth_token: SecretString,
    pub timeout_secs: u64,
    /// Declared for operators; requests are never retried.
    pub max_retries: u32,
    pub retry_delay_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AssistantConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub fallback_max_tokens: u32,
    pub temperature: f32,
    pub history_turns: usize,
    pub referer: String,
    pub title: String,
}

impl AssistantConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_ref().map(|key| !key.expose_secret().trim().is_empty()).unwrap_or(false)
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

/// Tracing lifecycle settings. No span exporter is linked: when `enabled`, the
/// collector endpoint is recorded and logged at startup, but spans are only
/// written to the local log output and never sent to `otlp_endpoint`.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub otlp_endpoint: String,
    pub service_name: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub backend_base_url: Option<String>,
    pub backend_auth_token: Option<String>,
    pub backend_timeout_secs: Option<u64>,
    pub assistant_api_key: Option<String>,
    pub assistant_base_url: Option<String>,
    pub server_port: Option<u16>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://localhost:7500".to_string(),
                auth_token: String::new().into(),
                timeout_secs: 30,
                max_retries: 3,
                retry_delay_secs: 1,
            },
            assistant: AssistantConfig {
                api_key: None,
                base_url: "https://openrouter.ai/api/v1".to_string(),
                model: "deepseek/deepseek-r1-0528-qwen3-8b:free".to_string(),
                timeout_secs: 10,
                max_tokens: 300,
                fallback_max_tokens: 250,
                temperature: 0.7,
                history_turns: 10,
                referer: "https://localhost:5005".to_string(),
                title: "Rasa License Chatbot".to_string(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 5055,
                graceful_shutdown_secs: 15,
            },
            telemetry: TelemetryConfig {
                enabled: false,
                otlp_endpoint: "http://localhost:4317".to_string(),
                service_name: "dlassist-actions".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("dlassist.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(backend) = patch.backend {
            if let Some(base_url) = backend.base_url {
                self.backend.base_url = base_url;
            }
            if let Some(auth_token) = backend.auth_token {
                self.backend.auth_token = secret_value(auth_token);
            }
            if let Some(timeout_secs) = backend.timeout_secs {
                self.backend.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = backend.max_retries {
                self.backend.max_retries = max_retries;
            }
            if let Some(retry_delay_secs) = backend.retry_delay_secs {
                self.backend.retry_delay_secs = retry_delay_secs;
            }
        }

        if let Some(assistant) = patch.assistant {
            if let Some(api_key) = assistant.api_key {
                self.assistant.api_key = Some(secret_value(api_key));
            }
            if let Some(base_url) = assistant.base_url {
                self.assistant.base_url = base_url;
            }
            if let Some(model) = assistant.model {
                self.assistant.model = model;
            }
            if let Some(timeout_secs) = assistant.timeout_secs {
                self.assistant.timeout_secs = timeout_secs;
            }
            if let Some(max_tokens) = assistant.max_tokens {
                self.assistant.max_tokens = max_tokens;
            }
            if let Some(fallback_max_tokens) = assistant.fallback_max_tokens {
                self.assistant.fallback_max_tokens = fallback_max_tokens;
            }
            if let Some(temperature) = assistant.temperature {
                self.assistant.temperature = temperature;
            }
            if let Some(history_turns) = assistant.history_turns {
                self.assistant.history_turns = history_turns;
            }
            if let Some(referer) = assistant.referer {
                self.assistant.referer = referer;
            }
            if let Some(title) = assistant.title {
                self.assistant.title = title;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(telemetry) = patch.telemetry {
            if let Some(enabled) = telemetry.enabled {
                self.telemetry.enabled = enabled;
            }
            if let Some(otlp_endpoint) = telemetry.otlp_endpoint {
                self.telemetry.otlp_endpoint = otlp_endpoint;
            }
            if let Some(service_name) = telemetry.service_name {
                self.telemetry.service_name = service_name;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env_any(&["DLASSIST_BACKEND_BASE_URL", "API_BASE_URL"]) {
            self.backend.base_url = value;
        }
        if let Some(value) = read_env_any(&["DLASSIST_BACKEND_AUTH_TOKEN", "API_AUTH_TOKEN"]) {
            self.backend.auth_token = secret_value(value);
        }
        if let Some(value) = read_env_any(&["DLASSIST_BACKEND_TIMEOUT_SECS", "API_TIMEOUT"]) {
            self.backend.timeout_secs = parse_u64("DLASSIST_BACKEND_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env_any(&["DLASSIST_BACKEND_MAX_RETRIES", "API_MAX_RETRIES"]) {
            self.backend.max_retries = parse_u32("DLASSIST_BACKEND_MAX_RETRIES", &value)?;
        }
        if let Some(value) =
            read_env_any(&["DLASSIST_BACKEND_RETRY_DELAY_SECS", "API_RETRY_DELAY"])
        {
            self.backend.retry_delay_secs =
                parse_u64("DLASSIST_BACKEND_RETRY_DELAY_SECS", &value)?;
        }

        if let Some(value) = read_env_any(&[
            "DLASSIST_ASSISTANT_API_KEY",
            "OPENROUTER_API_KEY",
            "DEEPSEEK_API_KEY",
        ]) {
            self.assistant.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("DLASSIST_ASSISTANT_BASE_URL") {
            self.assistant.base_url = value;
        }
        if let Some(value) = read_env("DLASSIST_ASSISTANT_MODEL") {
            self.assistant.model = value;
        }
        if let Some(value) = read_env("DLASSIST_ASSISTANT_TIMEOUT_SECS") {
            self.assistant.timeout_secs = parse_u64("DLASSIST_ASSISTANT_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("DLASSIST_ASSISTANT_MAX_TOKENS") {
            self.assistant.max_tokens = parse_u32("DLASSIST_ASSISTANT_MAX_TOKENS", &value)?;
        }

        if let Some(value) = read_env("DLASSIST_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("DLASSIST_SERVER_PORT") {
            self.server.port = parse_u16("DLASSIST_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("DLASSIST_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("DLASSIST_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("DLASSIST_TELEMETRY_ENABLED") {
            self.telemetry.enabled = parse_bool("DLASSIST_TELEMETRY_ENABLED", &value)?;
        }
        if let Some(value) =
            read_env_any(&["DLASSIST_TELEMETRY_OTLP_ENDPOINT", "OTEL_EXPORTER_OTLP_ENDPOINT"])
        {
            self.telemetry.otlp_endpoint = value;
        }

        if let Some(value) = read_env_any(&["DLASSIST_LOGGING_LEVEL", "DLASSIST_LOG_LEVEL"]) {
            self.logging.level = value;
        }
        if let Some(value) = read_env_any(&["DLASSIST_LOGGING_FORMAT", "DLASSIST_LOG_FORMAT"]) {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.backend_base_url {
            self.backend.base_url = base_url;
        }
        if let Some(auth_token) = overrides.backend_auth_token {
            self.backend.auth_token = secret_value(auth_token);
        }
        if let Some(timeout_secs) = overrides.backend_timeout_secs {
            self.backend.timeout_secs = timeout_secs;
        }
        if let Some(api_key) = overrides.assistant_api_key {
            self.assistant.api_key = Some(secret_value(api_key));
        }
        if let Some(base_url) = overrides.assistant_base_url {
            self.assistant.base_url = base_url;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_backend(&self.backend)?;
        validate_assistant(&self.assistant)?;
        validate_server(&self.server)?;
        validate_telemetry(&self.telemetry)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("dlassist.toml"), PathBuf::from("config/dlassist.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

fn validate_backend(backend: &BackendConfig) -> Result<(), ConfigError> {
    if !is_http_url(&backend.base_url) {
        return Err(ConfigError::Validation(
            "backend.base_url must start with http:// or https://".to_string(),
        ));
    }

    if backend.timeout_secs == 0 || backend.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "backend.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_assistant(assistant: &AssistantConfig) -> Result<(), ConfigError> {
    if !is_http_url(&assistant.base_url) {
        return Err(ConfigError::Validation(
            "assistant.base_url must start with http:// or https://".to_string(),
        ));
    }

    if assistant.model.trim().is_empty() {
        return Err(ConfigError::Validation("assistant.model must not be empty".to_string()));
    }

    if assistant.timeout_secs == 0 || assistant.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "assistant.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    if assistant.max_tokens == 0 || assistant.fallback_max_tokens == 0 {
        return Err(ConfigError::Validation(
            "assistant.max_tokens and assistant.fallback_max_tokens must be greater than zero"
                .to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&assistant.temperature) {
        return Err(ConfigError::Validation(
            "assistant.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if assistant.history_turns == 0 || assistant.history_turns > 50 {
        return Err(ConfigError::Validation(
            "assistant.history_turns must be in range 1..=50".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_telemetry(telemetry: &TelemetryConfig) -> Result<(), ConfigError> {
    if telemetry.enabled && !is_http_url(&telemetry.otlp_endpoint) {
        return Err(ConfigError::Validation(
            "telemetry.otlp_endpoint must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_env_any(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| read_env(key))
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    backend: Option<BackendPatch>,
    assistant: Option<AssistantPatch>,
    server: Option<ServerPatch>,
    telemetry: Option<TelemetryPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct BackendPatch {
    base_url: Option<String>,
    auth_token: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_delay_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AssistantPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_tokens: Option<u32>,
    fallback_max_tokens: Option<u32>,
    temperature: Option<f32>,
    history_turns: Option<usize>,
    referer: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TelemetryPatch {
    enabled: Option<bool>,
    otlp_endpoint: Option<String>,
    service_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
