//! GitHub-side domain: which entity a Telegram message is about, the compact
//! token that identifies it, and the webhook payloads that announce it.

pub mod codec;
pub mod entity;
pub mod events;
