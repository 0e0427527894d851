//! Telegram reply → GitHub comment routing.
//!
//! A reply to one of the bot's data-link messages is resolved to the GitHub
//! entity it refers to, gated on the user's GitHub login, and forwarded as a
//! comment. Per reply event:
//!
//! - text starts with `!` → ignored
//! - no decodable data link on the replied-to message → ignored
//! - no access token → login prompt, deleted again after a short delay
//! - otherwise → issue comment or review comment reply

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{AccessToken, MessageRef},
    embed::LinkEmbedder,
    formatting::entities_to_markdown,
    github::entity::{EntityKind, EntityRef},
    messaging::{
        port::MessagingPort,
        types::{InlineButton, InlineKeyboard, ReplyEvent, SendOptions},
    },
    ports::{CredentialStore, GithubApi, TaskScheduler},
    Result,
};

pub const ESCAPE_PREFIX: char = '!';

pub const DEFAULT_LOGIN_PROMPT_TTL: Duration = Duration::from_secs(30);

/// Replies starting with `!` are chat among humans, never forwarded.
pub fn is_escaped(text: &str) -> bool {
    text.starts_with(ESCAPE_PREFIX)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    Escaped,
    NotDataLinkReply,
    NoEntity,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    Ignored(IgnoreReason),
    PromptedLogin(MessageRef),
    Dispatched(EntityKind),
    /// GitHub rejected the call or was unreachable; already logged.
    DispatchFailed(EntityKind),
}

/// A resolved, ready-to-send GitHub comment.
#[derive(Clone, Debug)]
pub struct ReplyIntent {
    pub entity: EntityRef,
    pub reply_text: String,
    pub credential: AccessToken,
}

impl ReplyIntent {
    /// Mention the entity author in front of the user's (markdown-rendered) text.
    pub fn new(entity: EntityRef, event: &ReplyEvent, credential: AccessToken) -> Self {
        let body = entities_to_markdown(&event.text, &event.entities);
        let reply_text = format!("@{} {body}", entity.author);
        Self {
            entity,
            reply_text,
            credential,
        }
    }
}

/// Cheap pre-filter: a reply to a bot message that carries a data link.
pub fn is_data_link_reply(event: &ReplyEvent, embedder: &LinkEmbedder) -> bool {
    event.reply_to.from_bot && embedder.has_data_link(&event.reply_to.entities)
}

pub struct ReplyRouter {
    embedder: LinkEmbedder,
    credentials: Arc<dyn CredentialStore>,
    github: Arc<dyn GithubApi>,
    messenger: Arc<dyn MessagingPort>,
    scheduler: Arc<dyn TaskScheduler>,
    login_url: String,
    prompt_ttl: Duration,
}

impl ReplyRouter {
    pub fn new(
        embedder: LinkEmbedder,
        credentials: Arc<dyn CredentialStore>,
        github: Arc<dyn GithubApi>,
        messenger: Arc<dyn MessagingPort>,
        scheduler: Arc<dyn TaskScheduler>,
        login_url: impl Into<String>,
    ) -> Self {
        Self {
            embedder,
            credentials,
            github,
            messenger,
            scheduler,
            login_url: login_url.into(),
            prompt_ttl: DEFAULT_LOGIN_PROMPT_TTL,
        }
    }

    pub fn with_prompt_ttl(mut self, ttl: Duration) -> Self {
        self.prompt_ttl = ttl;
        self
    }

    pub fn embedder(&self) -> &LinkEmbedder {
        &self.embedder
    }

    /// Run one reply through the gate.
    ///
    /// GitHub failures are logged and reported as `DispatchFailed`; only
    /// messenger failures (sending the login prompt) surface as `Err`.
    pub async fn handle(&self, event: &ReplyEvent) -> Result<ReplyOutcome> {
        if is_escaped(&event.text) {
            return Ok(ReplyOutcome::Ignored(IgnoreReason::Escaped));
        }
        if !is_data_link_reply(event, &self.embedder) {
            return Ok(ReplyOutcome::Ignored(IgnoreReason::NotDataLinkReply));
        }

        let Some(entity) = self.embedder.resolve(&event.reply_to.entities) else {
            return Ok(ReplyOutcome::Ignored(IgnoreReason::NoEntity));
        };

        let Some(token) = self.credentials.access_token(event.user_id).await else {
            let prompt = self.prompt_login(event, &entity).await?;
            return Ok(ReplyOutcome::PromptedLogin(prompt));
        };

        let intent = ReplyIntent::new(entity, event, token);
        let kind = intent.entity.kind;
        match self.dispatch(&intent).await {
            Ok(()) => {
                tracing::info!(
                    repo = %intent.entity.repo,
                    number = intent.entity.number,
                    kind = kind.label(),
                    user_id = event.user_id.0,
                    "forwarded reply to github"
                );
                Ok(ReplyOutcome::Dispatched(kind))
            }
            Err(e) => {
                tracing::warn!(
                    repo = %intent.entity.repo,
                    number = intent.entity.number,
                    kind = kind.label(),
                    error = %e,
                    "github comment failed"
                );
                Ok(ReplyOutcome::DispatchFailed(kind))
            }
        }
    }

    pub async fn dispatch(&self, intent: &ReplyIntent) -> Result<()> {
        let e = &intent.entity;
        match e.kind {
            EntityKind::Issue | EntityKind::PullRequest => {
                self.github
                    .add_issue_comment(&e.repo, e.number, &intent.reply_text, &intent.credential)
                    .await
            }
            EntityKind::PullRequestReviewComment { comment_id } => {
                self.github
                    .add_review_comment(
                        &e.repo,
                        e.number,
                        comment_id,
                        &intent.reply_text,
                        &intent.credential,
                    )
                    .await
            }
        }
    }

    async fn prompt_login(&self, event: &ReplyEvent, entity: &EntityRef) -> Result<MessageRef> {
        let html = format!(
            "Cannot reply to {}, since you are not logged in. \
             Press button below to go to a private chat with me and login.\n\n\
             <i>This message will self destruct in {} sec.</i>",
            entity.kind.label(),
            self.prompt_ttl.as_secs()
        );
        let opts = SendOptions {
            keyboard: Some(InlineKeyboard::single(InlineButton::url(
                "Login",
                self.login_url.clone(),
            ))),
            reply_to: Some(event.message_id),
            disable_link_preview: true,
        };
        let sent = self.messenger.send_html(event.chat_id, &html, opts).await?;

        let messenger = self.messenger.clone();
        self.scheduler.run_once(
            self.prompt_ttl,
            Box::pin(async move {
                if let Err(e) = messenger.delete_message(sent).await {
                    tracing::debug!(error = %e, "login prompt already gone");
                }
            }),
        );

        Ok(sent)
    }
}
