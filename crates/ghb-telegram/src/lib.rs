//! Telegram adapter (teloxide).
//!
//! Implements the `ghb-core` MessagingPort over the Telegram Bot API and
//! routes updates to the command and reply handlers.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode},
};

use tokio::time::sleep;

pub mod convert;
pub mod handlers;
pub mod router;
#[cfg(test)]
mod test_fixtures;

use ghb_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, SendOptions},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    pub(crate) fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    fn markup(keyboard: &InlineKeyboard) -> Result<InlineKeyboardMarkup> {
        let mut rows = Vec::with_capacity(keyboard.buttons.len());
        for b in &keyboard.buttons {
            let url = reqwest::Url::parse(&b.url)
                .map_err(|e| Error::External(format!("bad button url {:?}: {e}", b.url)))?;
            rows.push(vec![InlineKeyboardButton::url(b.label.clone(), url)]);
        }
        Ok(InlineKeyboardMarkup::new(rows))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(teloxide::RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    tracing::debug!(wait = ?d, "telegram flood control, retrying");
                    sleep(d).await;
                }
                Err(other) => return Err(Self::map_err(other)),
            }
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_html(&self, chat_id: ChatId, html: &str, opts: SendOptions) -> Result<MessageRef> {
        let markup = opts.keyboard.as_ref().map(Self::markup).transpose()?;

        let msg = self
            .with_retry(|| {
                let mut req = self
                    .bot
                    .send_message(Self::tg_chat(chat_id), html.to_string())
                    .parse_mode(ParseMode::Html)
                    .disable_web_page_preview(opts.disable_link_preview);
                if let Some(reply_to) = opts.reply_to {
                    req = req
                        .reply_to_message_id(Self::tg_msg_id(reply_to))
                        .allow_sending_without_reply(true);
                }
                if let Some(markup) = &markup {
                    req = req.reply_markup(markup.clone());
                }
                req
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .delete_message(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
        })
        .await?;
        Ok(())
    }
}
