//! The subset of GitHub webhook payloads the bot announces in Telegram.

use serde::Deserialize;

use crate::Result;

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub login: String,
    pub html_url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Repository {
    pub full_name: String,
    pub html_url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub user: User,
    #[serde(default)]
    pub body: Option<String>,
    /// Present when the "issue" is really a pull request.
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub user: User,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub html_url: String,
    pub user: User,
    #[serde(default)]
    pub body: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReviewComment {
    pub id: u64,
    pub html_url: String,
    pub user: User,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IssuesEvent {
    pub action: String,
    pub issue: Issue,
    pub repository: Repository,
    pub sender: User,
}

#[derive(Clone, Debug, Deserialize)]
pub struct IssueCommentEvent {
    pub action: String,
    pub issue: Issue,
    pub comment: Comment,
    pub repository: Repository,
    pub sender: User,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequest,
    pub repository: Repository,
    pub sender: User,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PullRequestReviewCommentEvent {
    pub action: String,
    pub comment: ReviewComment,
    pub pull_request: PullRequest,
    pub repository: Repository,
    pub sender: User,
}

#[derive(Clone, Debug)]
pub enum GithubEvent {
    Issues(IssuesEvent),
    IssueComment(IssueCommentEvent),
    PullRequest(PullRequestEvent),
    PullRequestReviewComment(PullRequestReviewCommentEvent),
}

impl GithubEvent {
    /// Parse a webhook payload by its `X-GitHub-Event` name.
    ///
    /// Events the bot does not announce (push, star, ...) yield `Ok(None)`.
    pub fn from_payload(event_name: &str, payload: serde_json::Value) -> Result<Option<Self>> {
        let ev = match event_name {
            "issues" => Self::Issues(serde_json::from_value(payload)?),
            "issue_comment" => Self::IssueComment(serde_json::from_value(payload)?),
            "pull_request" => Self::PullRequest(serde_json::from_value(payload)?),
            "pull_request_review_comment" => {
                Self::PullRequestReviewComment(serde_json::from_value(payload)?)
            }
            _ => return Ok(None),
        };
        Ok(Some(ev))
    }

    pub fn repository(&self) -> &Repository {
        match self {
            Self::Issues(e) => &e.repository,
            Self::IssueComment(e) => &e.repository,
            Self::PullRequest(e) => &e.repository,
            Self::PullRequestReviewComment(e) => &e.repository,
        }
    }
}
