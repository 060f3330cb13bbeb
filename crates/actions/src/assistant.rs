//! Free-text answers for utterances the dialogue model could not place.
//!
//! The responder is strictly best-effort: every failure is logged and collapses
//! into `None`, and callers substitute a canned redirect.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use dlassist_core::config::AssistantConfig;
use dlassist_core::{ConversationTurn, Speaker};

use crate::llm::{ChatMessage, ChatRole, CompletionRequest, LlmClient};

pub const SYSTEM_PROMPT: &str = "You are a friendly assistant for a driving license service. \
You help people with license renewals, duplicate licenses, vehicle categories, address and \
contact changes, delivery status and general questions about driving rules and road safety. \
If a question has nothing to do with driving or licensing, politely explain that you can only \
help with driving license topics. Never invent license numbers, dates or personal details. \
Keep answers short and practical, under 150 words.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponderMode {
    /// The dialogue model had no confident intent.
    Fallback,
    /// The user explicitly asked a general question.
    Query,
}

impl ResponderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fallback => "fallback",
            Self::Query => "query",
        }
    }
}

#[derive(Debug, Error)]
enum AssistantError {
    #[error("assistant is not configured")]
    Disabled,
    #[error("assistant did not answer within {0:?}")]
    Timeout(Duration),
    #[error("assistant request failed: {0}")]
    Client(#[source] anyhow::Error),
}

#[derive(Clone)]
pub struct FallbackResponder {
    client: Option<Arc<dyn LlmClient>>,
    timeout: Duration,
    history_turns: usize,
    fallback_max_tokens: u32,
    query_max_tokens: u32,
}

impl FallbackResponder {
    pub fn new(client: Option<Arc<dyn LlmClient>>, config: &AssistantConfig) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(config.timeout_secs),
            history_turns: config.history_turns,
            fallback_max_tokens: config.fallback_max_tokens,
            query_max_tokens: config.max_tokens,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    pub fn history_turns(&self) -> usize {
        self.history_turns
    }

    pub fn request_for(
        &self,
        mode: ResponderMode,
        utterance: &str,
        history: &[ConversationTurn],
    ) -> CompletionRequest {
        let skip = history.len().saturating_sub(self.history_turns);
        let mut messages = Vec::with_capacity(history.len() - skip + 2);
        messages.push(ChatMessage::new(ChatRole::System, SYSTEM_PROMPT));
        messages.extend(history.iter().skip(skip).map(|turn| {
            let role = match turn.speaker {
                Speaker::User => ChatRole::User,
                Speaker::Assistant => ChatRole::Assistant,
            };
            ChatMessage::new(role, turn.text.clone())
        }));
        messages.push(ChatMessage::new(ChatRole::User, utterance));

        let max_tokens = match mode {
            ResponderMode::Fallback => self.fallback_max_tokens,
            ResponderMode::Query => self.query_max_tokens,
        };
        CompletionRequest { messages, max_tokens }
    }

    /// Answer text, or `None` when the assistant is unavailable or failed.
    pub async fn respond(
        &self,
        mode: ResponderMode,
        utterance: &str,
        history: &[ConversationTurn],
    ) -> Option<String> {
        match self.try_respond(mode, utterance, history).await {
            Ok(answer) => Some(answer),
            Err(AssistantError::Disabled) => {
                debug!(event_name = "assistant.disabled", mode = mode.as_str(), "assistant not configured");
                None
            }
            Err(error) => {
                warn!(
                    event_name = "assistant.failed",
                    mode = mode.as_str(),
                    error = %error,
                    "assistant produced no answer"
                );
                None
            }
        }
    }

    async fn try_respond(
        &self,
        mode: ResponderMode,
        utterance: &str,
        history: &[ConversationTurn],
    ) -> Result<String, AssistantError> {
        let client = self.client.as_ref().ok_or(AssistantError::Disabled)?;
        let request = self.request_for(mode, utterance, history);

        let answer = tokio::time::timeout(self.timeout, client.complete(&request))
            .await
            .map_err(|_| AssistantError::Timeout(self.timeout))?
            .map_err(AssistantError::Client)?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(AssistantError::Client(anyhow::anyhow!("empty completion")));
        }
        Ok(answer.to_string())
    }
}
