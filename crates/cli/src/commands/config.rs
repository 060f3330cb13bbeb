use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dlassist_core::config::{AppConfig, LoadOptions};
use dlassist_core::format::mask_sensitive;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use toml::Value;

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ConfigField {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run(json_output: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: Vec<ConfigField> = effective_values(&config)
        .into_iter()
        .map(|(key, value, env_keys)| ConfigField {
            key,
            value,
            source: field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref()),
        })
        .collect();

    if json_output {
        return match serde_json::to_string_pretty(&fields) {
            Ok(output) => CommandResult::raw(0, output),
            Err(error) => CommandResult::failure("config", "serialization", error.to_string(), 3),
        };
    }

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.iter().map(|field| render_line(field.key, &field.value, &field.source)));
    CommandResult::raw(0, lines.join("\n"))
}

type FieldValue = (&'static str, String, &'static [&'static str]);

fn value(key: &'static str, value: String, env_keys: &'static [&'static str]) -> FieldValue {
    (key, value, env_keys)
}

fn effective_values(config: &AppConfig) -> Vec<FieldValue> {
    let backend = &config.backend;
    let assistant = &config.assistant;

    vec![
        value("backend.base_url", backend.base_url.clone(), &["DLASSIST_BACKEND_BASE_URL", "API_BASE_URL"]),
        value(
            "backend.auth_token",
            redact_secret(Some(&backend.auth_token)),
            &["DLASSIST_BACKEND_AUTH_TOKEN", "API_AUTH_TOKEN"],
        ),
        value(
            "backend.timeout_secs",
            backend.timeout_secs.to_string(),
            &["DLASSIST_BACKEND_TIMEOUT_SECS", "API_TIMEOUT"],
        ),
        value(
            "backend.max_retries",
            backend.max_retries.to_string(),
            &["DLASSIST_BACKEND_MAX_RETRIES", "API_MAX_RETRIES"],
        ),
        value(
            "backend.retry_delay_secs",
            backend.retry_delay_secs.to_string(),
            &["DLASSIST_BACKEND_RETRY_DELAY_SECS", "API_RETRY_DELAY"],
        ),
        value(
            "assistant.api_key",
            redact_secret(assistant.api_key.as_ref()),
            &["DLASSIST_ASSISTANT_API_KEY", "OPENROUTER_API_KEY", "DEEPSEEK_API_KEY"],
        ),
        value("assistant.base_url", assistant.base_url.clone(), &["DLASSIST_ASSISTANT_BASE_URL"]),
        value("assistant.model", assistant.model.clone(), &["DLASSIST_ASSISTANT_MODEL"]),
        value(
            "assistant.timeout_secs",
            assistant.timeout_secs.to_string(),
            &["DLASSIST_ASSISTANT_TIMEOUT_SECS"],
        ),
        value(
            "assistant.max_tokens",
            assistant.max_tokens.to_string(),
            &["DLASSIST_ASSISTANT_MAX_TOKENS"],
        ),
        value(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["DLASSIST_SERVER_BIND_ADDRESS"],
        ),
        value("server.port", config.server.port.to_string(), &["DLASSIST_SERVER_PORT"]),
        value(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["DLASSIST_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        value(
            "telemetry.enabled",
            config.telemetry.enabled.to_string(),
            &["DLASSIST_TELEMETRY_ENABLED"],
        ),
        value(
            "telemetry.otlp_endpoint",
            config.telemetry.otlp_endpoint.clone(),
            &["DLASSIST_TELEMETRY_OTLP_ENDPOINT", "OTEL_EXPORTER_OTLP_ENDPOINT"],
        ),
        value(
            "logging.level",
            config.logging.level.clone(),
            &["DLASSIST_LOGGING_LEVEL", "DLASSIST_LOG_LEVEL"],
        ),
        value(
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["DLASSIST_LOGGING_FORMAT", "DLASSIST_LOG_FORMAT"],
        ),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("dlassist.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/dlassist.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) =
        env_keys.iter().find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()))
    {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: &str) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: Option<&SecretString>) -> String {
    match secret.map(|secret| secret.expose_secret().trim()) {
        None => "<unset>".to_string(),
        Some("") => "<empty>".to_string(),
        Some(value) => mask_sensitive(value),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::{contains_path, redact_secret};

    #[test]
    fn secrets_are_masked_never_printed() {
        let secret = SecretString::from("sk-or-v1-abcdef".to_string());
        let rendered = redact_secret(Some(&secret));

        assert_eq!(rendered, "sk***********ef");
        assert_eq!(redact_secret(None), "<unset>");
        assert_eq!(redact_secret(Some(&SecretString::from("  ".to_string()))), "<empty>");
    }

    #[test]
    fn dotted_paths_are_resolved_in_toml() {
        let doc: toml::Value = "[backend]\nbase_url = \"http://x\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "backend.base_url"));
        assert!(!contains_path(&doc, "backend.auth_token"));
        assert!(!contains_path(&doc, "server.port"));
    }
}
