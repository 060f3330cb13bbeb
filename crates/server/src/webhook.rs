use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use dlassist_actions::{ActionContext, ActionRegistry};
use dlassist_core::{ActionEvent, Tracker};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::health;

#[derive(Clone)]
pub struct AppState {
    pub context: Arc<ActionContext>,
    pub registry: Arc<ActionRegistry>,
}

/// Custom-action call from the dialogue engine.
#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    pub next_action: String,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub tracker: Tracker,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResponseMessage {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WebhookResponse {
    pub events: Vec<ActionEvent>,
    pub responses: Vec<ResponseMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WebhookError {
    pub error: String,
    pub action_name: String,
    pub correlation_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActionEntry {
    pub name: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/actions", get(list_actions))
        .route("/health", get(health::health))
        .with_state(state)
}

pub async fn webhook(
    State(state): State<AppState>,
    Json(request): Json<WebhookRequest>,
) -> Result<Json<WebhookResponse>, (StatusCode, Json<WebhookError>)> {
    let correlation_id = Uuid::new_v4().to_string();
    let span = info_span!(
        "webhook",
        correlation_id = %correlation_id,
        action = %request.next_action
    );

    async move {
        let WebhookRequest { next_action, sender_id, mut tracker, version } = request;
        if tracker.sender_id.is_none() {
            tracker.sender_id = sender_id;
        }

        info!(
            event_name = "webhook.received",
            engine_version = version.as_deref().unwrap_or("unknown"),
            "custom action requested"
        );

        let outcome = match state.registry.dispatch(&next_action, state.context.clone(), tracker).await {
            Ok(outcome) => outcome,
            Err(unknown) => {
                warn!(event_name = "webhook.unknown_action", error = %unknown, "no handler for action");
                return Err((
                    StatusCode::NOT_FOUND,
                    Json(WebhookError {
                        error: unknown.to_string(),
                        action_name: next_action,
                        correlation_id: correlation_id.clone(),
                    }),
                ));
            }
        };

        Ok(Json(WebhookResponse {
            events: outcome.events,
            responses: outcome.responses.into_iter().map(|text| ResponseMessage { text }).collect(),
        }))
    }
    .instrument(span)
    .await
}

pub async fn list_actions(State(state): State<AppState>) -> Json<Vec<ActionEntry>> {
    Json(state.registry.names().into_iter().map(|name| ActionEntry { name }).collect())
}
