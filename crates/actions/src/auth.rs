use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};

use dlassist_core::Tracker;

/// Request headers for a backend call. The widget's token from message
/// metadata wins; otherwise the configured service token is used.
pub fn auth_headers(tracker: &Tracker, fallback_token: &SecretString) -> HeaderMap {
    tracker
        .metadata_token()
        .and_then(bearer_headers)
        .or_else(|| bearer_headers(fallback_token.expose_secret()))
        .unwrap_or_else(json_headers)
}

fn bearer_headers(token: &str) -> Option<HeaderMap> {
    let mut authorization = HeaderValue::from_str(&format!("Bearer {}", token.trim())).ok()?;
    authorization.set_sensitive(true);

    let mut headers = json_headers();
    headers.insert(AUTHORIZATION, authorization);
    Some(headers)
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}
