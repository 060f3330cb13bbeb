use std::sync::Arc;

use dlassist_core::{ActionOutcome, Tracker};

use crate::assistant::ResponderMode;
use crate::runtime::ActionContext;

pub const FALLBACK_REDIRECT: &str = "I'm not sure I understood that. I can help you check your license status, view your license details, renew your license, request a duplicate, or update your address and contact information. What would you like to do?";
pub const QUERY_REDIRECT: &str = "🤖 I can't answer general questions right now. I can still help you check your license status, renew your license, or update your details. What would you like to do?";

async fn answer(
    context: Arc<ActionContext>,
    tracker: Tracker,
    mode: ResponderMode,
    redirect: &'static str,
) -> ActionOutcome {
    let Some(utterance) = tracker.latest_text() else {
        return ActionOutcome::message(redirect);
    };

    let history = tracker.conversation_history(context.responder.history_turns());
    match context.responder.respond(mode, utterance, &history).await {
        Some(reply) => ActionOutcome::message(reply),
        None => ActionOutcome::message(redirect),
    }
}

pub async fn assistant_fallback(context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    answer(context, tracker, ResponderMode::Fallback, FALLBACK_REDIRECT).await
}

pub async fn assistant_query(context: Arc<ActionContext>, tracker: Tracker) -> ActionOutcome {
    answer(context, tracker, ResponderMode::Query, QUERY_REDIRECT).await
}
