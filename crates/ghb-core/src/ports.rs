//! Ports to the collaborators the reply flow depends on. Adapters live in
//! `ghb-github` / `ghb-telegram`; `store` and `scheduler` provide in-process
//! implementations.

use std::{future::Future, pin::Pin, time::Duration};

use async_trait::async_trait;

use crate::{
    domain::{AccessToken, UserId},
    github::entity::RepoName,
    Result,
};

/// Read access to per-user GitHub credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn access_token(&self, user_id: UserId) -> Option<AccessToken>;
}

/// GitHub write operations used when a Telegram reply is forwarded.
#[async_trait]
pub trait GithubApi: Send + Sync {
    async fn add_issue_comment(
        &self,
        repo: &RepoName,
        number: u64,
        body: &str,
        token: &AccessToken,
    ) -> Result<()>;

    /// Reply in the thread of an existing pull request review comment.
    async fn add_review_comment(
        &self,
        repo: &RepoName,
        number: u64,
        comment_id: u64,
        body: &str,
        token: &AccessToken,
    ) -> Result<()>;
}

pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Deferred work (login prompt self-destruct).
pub trait TaskScheduler: Send + Sync {
    fn run_once(&self, delay: Duration, task: Task);
}
