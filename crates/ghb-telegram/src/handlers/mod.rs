//! Telegram update handlers.
//!
//! Filters decide which endpoint an update goes to (see `router::schema`);
//! endpoints convert teloxide types and hand off to `ghb-core`.

use std::sync::Arc;

use teloxide::types::{Message, UserId};

use ghb_core::{embed::LinkEmbedder, errors::Error, reply};

use crate::{convert, router::AppState};

mod commands;
mod replies;

/// Handler failure with enough of the update to find it in the logs.
#[derive(Debug, thiserror::Error)]
#[error("chat {chat_id} message {message_id}: {source}")]
pub struct UpdateError {
    pub chat_id: i64,
    pub message_id: i32,
    #[source]
    pub source: Error,
}

impl UpdateError {
    fn new(msg: &Message, source: Error) -> Self {
        Self {
            chat_id: msg.chat.id.0,
            message_id: msg.id.0,
            source,
        }
    }
}

/// Endpoint a message is routed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Command,
    DataLinkReply,
}

/// Commands win over replies, so `/help` sent as a reply is still a command.
/// Only text replies to one of our own messages carrying a data link are
/// forwarded.
pub fn route(msg: &Message, bot_id: UserId, embedder: &LinkEmbedder) -> Option<Route> {
    if msg.text().is_some_and(|t| t.starts_with('/')) {
        return Some(Route::Command);
    }
    let ev = convert::reply_event(msg, bot_id)?;
    reply::is_data_link_reply(&ev, embedder).then_some(Route::DataLinkReply)
}

fn route_of(msg: &Message, state: &AppState) -> Option<Route> {
    route(msg, state.bot_id(), state.replies.embedder())
}

pub fn is_command(msg: Message, state: Arc<AppState>) -> bool {
    route_of(&msg, &state) == Some(Route::Command)
}

pub fn is_data_link_reply(msg: Message, state: Arc<AppState>) -> bool {
    route_of(&msg, &state) == Some(Route::DataLinkReply)
}

pub async fn on_command(msg: Message, state: Arc<AppState>) -> Result<(), UpdateError> {
    commands::handle_command(&msg, &state)
        .await
        .map_err(|e| UpdateError::new(&msg, e))
}

pub async fn on_reply(msg: Message, state: Arc<AppState>) -> Result<(), UpdateError> {
    replies::handle_reply(&msg, &state)
        .await
        .map_err(|e| UpdateError::new(&msg, e))
}
