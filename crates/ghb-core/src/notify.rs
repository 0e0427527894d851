//! GitHub webhook event → Telegram HTML announcement with a hidden data link,
//! so replies to the announcement can be forwarded back to GitHub.
//!
//! Events reach the bot as JSON lines from an external webhook receiver:
//!
//! ```text
//! {"event": "issues", "chats": [-1001234], "payload": { ...webhook body... }}
//! ```

use std::sync::Arc;

use serde::Deserialize;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::mpsc,
};

use crate::{
    domain::{ChatId, MessageRef},
    embed::LinkEmbedder,
    formatting::{escape_html, truncate_one_line},
    github::{
        entity::{EntityKind, EntityRef, RepoName},
        events::{GithubEvent, Repository, User},
    },
    messaging::{port::MessagingPort, types::SendOptions},
    Result,
};

const PREVIEW_CHARS: usize = 300;

/// A composed announcement and the entity replies to it are routed to.
#[derive(Clone, Debug)]
pub struct Notification {
    pub html: String,
    pub entity: EntityRef,
}

fn link(url: &str, text: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape_html(url), escape_html(text))
}

fn user_link(user: &User) -> String {
    link(&user.html_url, &user.login)
}

fn thread_link(repo: &Repository, number: u64, title: &str, url: &str) -> String {
    link(url, &format!("{}#{number} {title}", repo.full_name))
}

fn preview(body: Option<&str>) -> String {
    let text = truncate_one_line(body.unwrap_or(""), PREVIEW_CHARS);
    if text.is_empty() {
        return String::new();
    }
    format!("\n\n{}", escape_html(&text))
}

fn entity(kind: EntityKind, repo: &Repository, number: u64, author: &User) -> Option<EntityRef> {
    let repo = RepoName::parse(&repo.full_name).ok()?;
    EntityRef::new(kind, repo, number, &author.login).ok()
}

/// Build the announcement for `event`, or `None` for actions the bot stays
/// quiet about (edits, closes, deletions, ...).
pub fn compose(event: &GithubEvent, embedder: &LinkEmbedder) -> Option<Notification> {
    let (visible, entity) = match event {
        GithubEvent::Issues(ev) if ev.action == "opened" => {
            let i = &ev.issue;
            let html = format!(
                "🐛 New issue {}\nby {}{}",
                thread_link(&ev.repository, i.number, &i.title, &i.html_url),
                user_link(&i.user),
                preview(i.body.as_deref())
            );
            (html, entity(EntityKind::Issue, &ev.repository, i.number, &i.user)?)
        }
        GithubEvent::IssueComment(ev) if ev.action == "created" => {
            let i = &ev.issue;
            let (kind, label) = if i.is_pull_request() {
                (EntityKind::PullRequest, "pull request")
            } else {
                (EntityKind::Issue, "issue")
            };
            let html = format!(
                "💬 New comment on {label} {}\nby {}{}",
                thread_link(&ev.repository, i.number, &i.title, &ev.comment.html_url),
                user_link(&ev.comment.user),
                preview(Some(&ev.comment.body))
            );
            (html, entity(kind, &ev.repository, i.number, &ev.comment.user)?)
        }
        GithubEvent::PullRequest(ev) if ev.action == "opened" => {
            let pr = &ev.pull_request;
            let html = format!(
                "🔌 New pull request {}\nby {}{}",
                thread_link(&ev.repository, pr.number, &pr.title, &pr.html_url),
                user_link(&pr.user),
                preview(pr.body.as_deref())
            );
            (html, entity(EntityKind::PullRequest, &ev.repository, pr.number, &pr.user)?)
        }
        GithubEvent::PullRequestReviewComment(ev) if ev.action == "created" => {
            let pr = &ev.pull_request;
            let c = &ev.comment;
            let file = c
                .path
                .as_deref()
                .map(|p| format!(" on <code>{}</code>", escape_html(p)))
                .unwrap_or_default();
            let html = format!(
                "💬 New review comment{file} in {}\nby {}{}",
                thread_link(&ev.repository, pr.number, &pr.title, &c.html_url),
                user_link(&c.user),
                preview(Some(&c.body))
            );
            let kind = EntityKind::PullRequestReviewComment { comment_id: c.id };
            (html, entity(kind, &ev.repository, pr.number, &c.user)?)
        }
        _ => return None,
    };

    Some(Notification {
        html: embedder.embed_html(&visible, &entity),
        entity,
    })
}

/// Compose and send `event` to every subscribed chat.
///
/// Delivery failures are logged per chat; the returned refs cover the chats
/// that received the message.
pub async fn deliver(
    event: &GithubEvent,
    embedder: &LinkEmbedder,
    messenger: &dyn MessagingPort,
    chats: &[ChatId],
) -> Vec<MessageRef> {
    let Some(note) = compose(event, embedder) else {
        return Vec::new();
    };

    let mut sent = Vec::with_capacity(chats.len());
    for &chat_id in chats {
        let opts = SendOptions {
            disable_link_preview: true,
            ..Default::default()
        };
        match messenger.send_html(chat_id, &note.html, opts).await {
            Ok(m) => sent.push(m),
            Err(e) => tracing::warn!(
                chat_id = chat_id.0,
                repo = %event.repository().full_name,
                error = %e,
                "failed to deliver github notification"
            ),
        }
    }
    sent
}

/// A GitHub event and the chats subscribed to its repository.
#[derive(Clone, Debug)]
pub struct Delivery {
    pub event: GithubEvent,
    pub chats: Vec<ChatId>,
}

#[derive(Deserialize)]
struct DeliveryLine {
    event: String,
    chats: Vec<i64>,
    payload: serde_json::Value,
}

impl Delivery {
    /// Parse one ingress line. Events the bot does not announce yield `Ok(None)`.
    pub fn from_json_line(line: &str) -> Result<Option<Self>> {
        let raw: DeliveryLine = serde_json::from_str(line)?;
        let Some(event) = GithubEvent::from_payload(&raw.event, raw.payload)? else {
            return Ok(None);
        };
        Ok(Some(Self {
            event,
            chats: raw.chats.into_iter().map(ChatId).collect(),
        }))
    }
}

/// Feed deliveries read line by line from `reader` into `tx`.
///
/// Malformed lines are logged and skipped. Returns at end of input or when the
/// receiving side is gone.
pub async fn read_deliveries<R>(reader: R, tx: mpsc::Sender<Delivery>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match Delivery::from_json_line(&line) {
            Ok(Some(d)) => {
                if tx.send(d).await.is_err() {
                    break;
                }
            }
            Ok(None) => tracing::debug!("skipping github event the bot does not announce"),
            Err(e) => tracing::warn!(error = %e, "malformed github delivery"),
        }
    }
    Ok(())
}

/// Drain `rx`, announcing every delivery until all senders are dropped.
pub async fn run_deliveries(
    mut rx: mpsc::Receiver<Delivery>,
    embedder: LinkEmbedder,
    messenger: Arc<dyn MessagingPort>,
) {
    while let Some(d) = rx.recv().await {
        let sent = deliver(&d.event, &embedder, messenger.as_ref(), &d.chats).await;
        tracing::info!(
            repo = %d.event.repository().full_name,
            chats = d.chats.len(),
            sent = sent.len(),
            "github event delivered"
        );
    }
    tracing::debug!("github delivery channel closed");
}
