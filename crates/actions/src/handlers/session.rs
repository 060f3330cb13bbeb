use std::sync::Arc;

use tracing::info;

use dlassist_core::domain::session::SLOT_AUTHENTICATED;
use dlassist_core::{ActionOutcome, Tracker};

use crate::runtime::ActionContext;

pub const REPHRASE_MESSAGE: &str = "I'm not sure I understood that. Could you please rephrase or ask for help to see what I can assist you with?";

pub async fn session_started(_context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    info!(
        event_name = "session.started",
        sender_id = tracker.sender_id.as_deref().unwrap_or("unknown"),
        "conversation session started"
    );
    ActionOutcome::new().set_slot(SLOT_AUTHENTICATED, false)
}

pub async fn reset_authentication(_context: Arc<ActionContext>, _tracker: Tracker) -> ActionOutcome {
    ActionOutcome::new().set_slot(SLOT_AUTHENTICATED, false)
}

pub async fn fallback(_context: Arc<ActionContext>, _tracker: Tracker) -> ActionOutcome {
    ActionOutcome::message(REPHRASE_MESSAGE)
}
