use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DomainError;

pub const SLOT_LICENSE_NUMBER: &str = "license_number";
pub const SLOT_FULL_NAME: &str = "full_name";
pub const SLOT_VEHICLE_TYPE: &str = "vehicle_type";
pub const SLOT_NEW_ADDRESS: &str = "new_address";
pub const SLOT_NEW_CONTACT: &str = "new_contact";
pub const SLOT_NEW_STATUS: &str = "new_status";
pub const SLOT_AUTHENTICATED: &str = "authenticated";

/// Conversation state handed over by the dialogue engine for a single turn.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Tracker {
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub slots: HashMap<String, Value>,
    #[serde(default)]
    pub latest_message: Option<LatestMessage>,
    #[serde(default)]
    pub events: Vec<TrackerEvent>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LatestMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackerEvent {
    User {
        #[serde(default)]
        text: Option<String>,
    },
    Bot {
        #[serde(default)]
        text: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
}

impl Tracker {
    /// Slot value as trimmed text; blank or non-string values count as absent.
    pub fn slot_text(&self, name: &str) -> Option<&str> {
        self.slots.get(name).and_then(Value::as_str).map(str::trim).filter(|text| !text.is_empty())
    }

    pub fn require_slot(&self, name: &'static str) -> Result<&str, DomainError> {
        self.slot_text(name).ok_or(DomainError::MissingSlot(name))
    }

    pub fn latest_text(&self) -> Option<&str> {
        self.latest_message
            .as_ref()
            .and_then(|message| message.text.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    fn metadata_text(&self, keys: &[&str]) -> Option<&str> {
        let metadata = self.latest_message.as_ref()?.metadata.as_ref()?;
        keys.iter()
            .filter_map(|key| metadata.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|value| !value.is_empty())
    }

    /// Bearer token forwarded by the chat widget in message metadata.
    pub fn metadata_token(&self) -> Option<&str> {
        self.metadata_text(&["token"])
    }

    /// License number for the signed-in user: message metadata first, then the slot.
    pub fn user_license_number(&self) -> Option<&str> {
        self.metadata_text(&["license_number", "licenseNumber"])
            .or_else(|| self.slot_text(SLOT_LICENSE_NUMBER))
    }

    /// Up to `limit` most recent user/bot turns, oldest first. The trailing user
    /// event matching the latest message is excluded.
    pub fn conversation_history(&self, limit: usize) -> Vec<ConversationTurn> {
        let mut turns: Vec<ConversationTurn> = self
            .events
            .iter()
            .filter_map(|event| match event {
                TrackerEvent::User { text: Some(text) } => {
                    Some(ConversationTurn { speaker: Speaker::User, text: text.trim().to_string() })
                }
                TrackerEvent::Bot { text: Some(text) } => Some(ConversationTurn {
                    speaker: Speaker::Assistant,
                    text: text.trim().to_string(),
                }),
                _ => None,
            })
            .filter(|turn| !turn.text.is_empty())
            .collect();

        let latest = self.latest_text();
        if let (Some(last), Some(latest)) = (turns.last(), latest) {
            if last.speaker == Speaker::User && last.text == latest {
                turns.pop();
            }
        }

        let skip = turns.len().saturating_sub(limit);
        turns.into_iter().skip(skip).collect()
    }
}

/// Instruction returned to the dialogue engine alongside the messages.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ActionEvent {
    Slot { name: String, value: Value },
}

impl ActionEvent {
    pub fn slot(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Slot { name: name.into(), value: value.into() }
    }
}

/// Everything a handler hands back: messages to utter plus slot mutations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionOutcome {
    pub responses: Vec<String>,
    pub events: Vec<ActionEvent>,
}

impl ActionOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self::new().say(text)
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.responses.push(text.into());
        self
    }

    pub fn set_slot(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.events.push(ActionEvent::slot(name, value));
        self
    }
}
