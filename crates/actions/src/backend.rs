use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use secrecy::SecretString;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use dlassist_core::config::BackendConfig;
use dlassist_core::{ApiEnvelope, ApplicationError, LicenseRecord, Tracker};

use crate::auth::auth_headers;
use crate::endpoints::{EndpointResolver, UnknownEndpoint, GET_LICENSE_DETAILS};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    UnknownEndpoint(#[from] UnknownEndpoint),
    #[error("backend request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("backend returned HTTP {0}")]
    Status(StatusCode),
    #[error("backend response was not a valid envelope: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("backend reported failure: {0}")]
    Rejected(String),
    #[error("backend response carried no license record")]
    MissingRecord,
}

impl BackendError {
    /// Failures where the backend answered but said no, as opposed to not answering.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::Status(StatusCode::NOT_FOUND) | Self::MissingRecord)
    }
}

impl From<BackendError> for ApplicationError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::UnknownEndpoint(unknown) => unknown.into(),
            other => ApplicationError::Integration(other.to_string()),
        }
    }
}

/// One backend request: a symbolic endpoint, a method, and its parameters.
#[derive(Clone, Debug)]
pub struct BackendCall {
    method: Method,
    endpoint: &'static str,
    query: Vec<(&'static str, String)>,
    body: Option<Value>,
}

impl BackendCall {
    pub fn get(endpoint: &'static str) -> Self {
        Self { method: Method::GET, endpoint, query: Vec::new(), body: None }
    }

    pub fn post(endpoint: &'static str) -> Self {
        Self { method: Method::POST, endpoint, query: Vec::new(), body: None }
    }

    pub fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Clone, Debug)]
pub struct BackendClient {
    http: Client,
    endpoints: EndpointResolver,
    default_token: SecretString,
}

impl BackendClient {
    pub fn from_config(config: &BackendConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            http,
            endpoints: EndpointResolver::new(config.base_url.clone()),
            default_token: config.auth_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.endpoints.base_url()
    }

    /// Sends `call` and accepts only HTTP 200 with `success: true`.
    pub async fn send(&self, tracker: &Tracker, call: BackendCall) -> Result<ApiEnvelope, BackendError> {
        let url = self.endpoints.resolve(call.endpoint)?;
        debug!(
            event_name = "backend.request",
            endpoint = call.endpoint,
            method = %call.method,
            "calling backend"
        );

        let mut request = self.http.request(call.method, url).headers(auth_headers(tracker, &self.default_token));
        if !call.query.is_empty() {
            request = request.query(&call.query);
        }
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(BackendError::Transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(BackendError::Status(status));
        }

        let envelope: ApiEnvelope = response.json().await.map_err(BackendError::Decode)?;
        if !envelope.is_success() {
            return Err(BackendError::Rejected(envelope.message));
        }
        Ok(envelope)
    }

    /// Reads the license record, optionally for an explicit license number.
    pub async fn license_details(
        &self,
        tracker: &Tracker,
        license_number: Option<&str>,
    ) -> Result<LicenseRecord, BackendError> {
        let mut call = BackendCall::get(GET_LICENSE_DETAILS);
        if let Some(number) = license_number {
            call = call.query("licenseNumber", number);
        }

        self.send(tracker, call).await?.data_as::<LicenseRecord>().ok_or(BackendError::MissingRecord)
    }
}
