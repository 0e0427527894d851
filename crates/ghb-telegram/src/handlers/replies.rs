use ghb_core::{reply::ReplyOutcome, Result};
use teloxide::types::Message;

use crate::{convert, router::AppState};

pub async fn handle_reply(msg: &Message, state: &AppState) -> Result<()> {
    let Some(event) = convert::reply_event(msg, state.bot_id()) else {
        return Ok(());
    };

    match state.replies.handle(&event).await? {
        ReplyOutcome::Ignored(reason) => {
            tracing::debug!(?reason, chat_id = event.chat_id.0, "reply ignored");
        }
        ReplyOutcome::PromptedLogin(prompt) => {
            tracing::info!(
                user_id = event.user_id.0,
                prompt = prompt.message_id.0,
                "reply without github login, prompted"
            );
        }
        ReplyOutcome::Dispatched(_) | ReplyOutcome::DispatchFailed(_) => {}
    }
    Ok(())
}
