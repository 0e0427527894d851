//! Telegram messages built from Bot API JSON, shared by the unit tests.

use serde_json::{json, Value};
use teloxide::types::Message;

pub(crate) const BOT_ID: u64 = 999;

pub(crate) fn message(v: Value) -> Message {
    serde_json::from_value(v).expect("valid telegram message")
}

fn chat() -> Value {
    json!({"id": 5, "type": "private", "first_name": "Al"})
}

/// The bot's announcement for issue o/r#42 by alice, as sent by `replied_from`.
fn announcement(replied_from: u64) -> Value {
    json!({
        "message_id": 9,
        "date": 1700000000,
        "chat": chat(),
        "from": {"id": replied_from, "is_bot": true, "first_name": "GH", "username": "gh_bot"},
        "text": "\u{200B}New issue o/r#42",
        "entities": [
            {"type": "text_link", "offset": 0, "length": 1,
             "url": "https://ghbot.invalid/d/i:o/r:42:alice"},
            {"type": "hashtag", "offset": 14, "length": 3}
        ]
    })
}

fn reply_json(from_id: u64, text: &str, replied_from: u64) -> Value {
    json!({
        "message_id": 10,
        "date": 1700000000,
        "chat": chat(),
        "from": {"id": from_id, "is_bot": false, "first_name": "Al"},
        "text": text,
        "entities": [{"type": "bold", "offset": 0, "length": 2}],
        "reply_to_message": announcement(replied_from)
    })
}

/// Text reply from `from_id` to the announcement.
pub(crate) fn reply(from_id: u64, text: &str, replied_from: u64) -> Message {
    message(reply_json(from_id, text, replied_from))
}

/// A reply from user 1 to the bot's announcement, adjusted by `edit`.
pub(crate) fn message_json(edit: impl FnOnce(&mut Value)) -> Message {
    let mut v = reply_json(1, "on it", BOT_ID);
    edit(&mut v);
    message(v)
}

/// Photo with a caption, replying to the announcement.
pub(crate) fn photo_reply(from_id: u64, caption: &str, replied_from: u64) -> Message {
    message(json!({
        "message_id": 11,
        "date": 1700000000,
        "chat": chat(),
        "from": {"id": from_id, "is_bot": false, "first_name": "Al"},
        "photo": [{"file_id": "AgAD", "file_unique_id": "AQAD", "file_size": 1024,
                   "width": 90, "height": 90}],
        "caption": caption,
        "reply_to_message": announcement(replied_from)
    }))
}
