//! teloxide message types → `ghb-core` types.

use teloxide::types::{Message, MessageEntity, MessageEntityKind};

use ghb_core::{
    domain::{ChatId, MessageId, UserId},
    messaging::types::{RepliedMessage, ReplyEvent, TextEntity, TextEntityKind},
};

fn entity_kind(kind: &MessageEntityKind) -> TextEntityKind {
    match kind {
        MessageEntityKind::Bold => TextEntityKind::Bold,
        MessageEntityKind::Italic => TextEntityKind::Italic,
        MessageEntityKind::Underline => TextEntityKind::Underline,
        MessageEntityKind::Strikethrough => TextEntityKind::Strikethrough,
        MessageEntityKind::Code => TextEntityKind::Code,
        MessageEntityKind::Pre { language } => TextEntityKind::Pre {
            language: language.clone(),
        },
        MessageEntityKind::TextLink { url } => TextEntityKind::TextLink {
            url: url.to_string(),
        },
        _ => TextEntityKind::Other,
    }
}

pub fn text_entities(entities: Option<&[MessageEntity]>) -> Vec<TextEntity> {
    entities
        .unwrap_or_default()
        .iter()
        .map(|e| TextEntity {
            kind: entity_kind(&e.kind),
            offset: e.offset,
            length: e.length,
        })
        .collect()
}

/// Text and entities of a message; captions count for media messages.
fn body(msg: &Message) -> Option<(&str, Vec<TextEntity>)> {
    if let Some(text) = msg.text() {
        return Some((text, text_entities(msg.entities())));
    }
    msg.caption()
        .map(|c| (c, text_entities(msg.caption_entities())))
}

/// Build a core reply event from a text message that replies to another one.
///
/// `bot_id` identifies messages this bot sent.
pub fn reply_event(msg: &Message, bot_id: teloxide::types::UserId) -> Option<ReplyEvent> {
    let user = msg.from()?;
    let text = msg.text()?;
    let replied = msg.reply_to_message()?;

    let from_bot = replied.from().map(|u| u.id == bot_id).unwrap_or(false);
    let reply_entities = body(replied).map(|(_, e)| e).unwrap_or_default();

    Some(ReplyEvent {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        user_id: UserId(user.id.0 as i64),
        text: text.to_string(),
        entities: text_entities(msg.entities()),
        reply_to: RepliedMessage {
            from_bot,
            entities: reply_entities,
        },
    })
}
