use std::{fmt, sync::OnceLock};

use regex::Regex;

use crate::{errors::Error, Result};

/// `owner/name` of a GitHub repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RepoName {
    full: String,
}

fn repo_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?/[A-Za-z0-9._-]+$")
            .expect("valid regex")
    })
}

fn login_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // GitHub logins; `[bot]` suffix covers app accounts (dependabot etc).
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]*(?:\[bot\])?$").expect("valid regex"))
}

impl RepoName {
    pub fn parse(s: &str) -> Result<Self> {
        if !repo_re().is_match(s) || s.ends_with("/.") || s.ends_with("/..") {
            return Err(Error::InvalidEntity(format!("bad repository name: {s:?}")));
        }
        Ok(Self {
            full: s.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

pub fn is_valid_login(login: &str) -> bool {
    login_re().is_match(login)
}

/// What kind of GitHub thread a message points at.
///
/// Review comments carry the id of the comment being replied to; the other
/// kinds are addressed by issue/PR number alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Issue,
    PullRequest,
    PullRequestReviewComment { comment_id: u64 },
}

impl EntityKind {
    /// Human label used in user-facing text.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Issue => "issue",
            EntityKind::PullRequest => "pull request",
            EntityKind::PullRequestReviewComment { .. } => "pull request review comment",
        }
    }

    pub fn comment_id(&self) -> Option<u64> {
        match self {
            EntityKind::PullRequestReviewComment { comment_id } => Some(*comment_id),
            _ => None,
        }
    }
}

/// Identifies the GitHub entity a Telegram message is about.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub repo: RepoName,
    pub number: u64,
    pub author: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, repo: RepoName, number: u64, author: &str) -> Result<Self> {
        if !is_valid_login(author) {
            return Err(Error::InvalidEntity(format!("bad author login: {author:?}")));
        }
        Ok(Self {
            kind,
            repo,
            number,
            author: author.to_string(),
        })
    }

    pub fn issue(repo: &str, number: u64, author: &str) -> Result<Self> {
        Self::new(EntityKind::Issue, RepoName::parse(repo)?, number, author)
    }

    pub fn pull_request(repo: &str, number: u64, author: &str) -> Result<Self> {
        Self::new(EntityKind::PullRequest, RepoName::parse(repo)?, number, author)
    }

    pub fn review_comment(repo: &str, number: u64, comment_id: u64, author: &str) -> Result<Self> {
        Self::new(
            EntityKind::PullRequestReviewComment { comment_id },
            RepoName::parse(repo)?,
            number,
            author,
        )
    }
}
