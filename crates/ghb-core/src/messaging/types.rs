use crate::domain::{ChatId, MessageId, UserId};

/// Rich-text span attached to a message.
///
/// `offset`/`length` are in UTF-16 code units, as on the Telegram wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextEntity {
    pub kind: TextEntityKind,
    pub offset: usize,
    pub length: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextEntityKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
    Pre { language: Option<String> },
    TextLink { url: String },
    /// Anything the core has no use for (mentions, hashtags, bare urls, ...).
    Other,
}

impl TextEntity {
    pub fn text_link(offset: usize, length: usize, url: impl Into<String>) -> Self {
        Self {
            kind: TextEntityKind::TextLink { url: url.into() },
            offset,
            length,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            TextEntityKind::TextLink { url } => Some(url),
            _ => None,
        }
    }
}

/// The message a reply points at, as far as the core needs to know it.
#[derive(Clone, Debug)]
pub struct RepliedMessage {
    /// Whether this bot authored the message.
    pub from_bot: bool,
    pub entities: Vec<TextEntity>,
}

/// An incoming text message that replies to another message.
#[derive(Clone, Debug)]
pub struct ReplyEvent {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub text: String,
    pub entities: Vec<TextEntity>,
    pub reply_to: RepliedMessage,
}

/// A button that opens `url`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub url: String,
}

impl InlineButton {
    pub fn url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

/// Inline keyboard, one button per row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

impl InlineKeyboard {
    pub fn single(button: InlineButton) -> Self {
        Self {
            buttons: vec![button],
        }
    }
}

/// Options for an outgoing HTML message.
#[derive(Clone, Debug, Default)]
pub struct SendOptions {
    pub keyboard: Option<InlineKeyboard>,
    pub reply_to: Option<MessageId>,
    pub disable_link_preview: bool,
}
