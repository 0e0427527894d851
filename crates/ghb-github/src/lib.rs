//! GitHub REST adapter: the `GithubApi` port over `reqwest`, plus the OAuth
//! authorize URL used by `/login`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};

use ghb_core::{
    config::Config,
    domain::{AccessToken, UserId},
    errors::Error,
    github::entity::RepoName,
    ports::GithubApi,
    Result,
};

const USER_AGENT: &str = concat!("ghb/", env!("CARGO_PKG_VERSION"));
const API_VERSION: &str = "2022-11-28";
const OAUTH_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

#[derive(Clone, Debug)]
pub struct GithubClient {
    api_url: String,
    http: reqwest::Client,
}

impl GithubClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::External(format!("github http client build failed: {e}")))?;
        Ok(Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.github_api_url.clone(), cfg.http_timeout)
    }

    fn issue_comments_url(&self, repo: &RepoName, number: u64) -> String {
        format!("{}/repos/{repo}/issues/{number}/comments", self.api_url)
    }

    fn review_reply_url(&self, repo: &RepoName, number: u64, comment_id: u64) -> String {
        format!(
            "{}/repos/{repo}/pulls/{number}/comments/{comment_id}/replies",
            self.api_url
        )
    }

    async fn post_comment(&self, url: String, body: &str, token: &AccessToken) -> Result<()> {
        let resp = self
            .http
            .post(&url)
            .bearer_auth(token.as_str())
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .json(&CommentBody { body })
            .send()
            .await
            .map_err(|e| Error::External(format!("github request error: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            tracing::debug!(%url, status = status.as_u16(), "github comment created");
            return Ok(());
        }
        let text = resp.text().await.unwrap_or_default();
        Err(api_error(status.as_u16(), &text))
    }
}

/// Map a non-2xx GitHub response to `Error::Github`, preferring the API's own
/// `message` field over the raw body.
fn api_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect());
    Error::Github { status, message }
}

#[async_trait]
impl GithubApi for GithubClient {
    async fn add_issue_comment(
        &self,
        repo: &RepoName,
        number: u64,
        body: &str,
        token: &AccessToken,
    ) -> Result<()> {
        self.post_comment(self.issue_comments_url(repo, number), body, token)
            .await
    }

    async fn add_review_comment(
        &self,
        repo: &RepoName,
        number: u64,
        comment_id: u64,
        body: &str,
        token: &AccessToken,
    ) -> Result<()> {
        self.post_comment(self.review_reply_url(repo, number, comment_id), body, token)
            .await
    }
}

/// GitHub OAuth app authorize URL. `state` ties the callback to a Telegram user.
pub fn oauth_authorize_url(
    client_id: &str,
    redirect_uri: Option<&str>,
    state: &str,
) -> Result<String> {
    let mut params = vec![("client_id", client_id), ("scope", "repo"), ("state", state)];
    if let Some(uri) = redirect_uri {
        params.push(("redirect_uri", uri));
    }
    reqwest::Url::parse_with_params(OAUTH_AUTHORIZE_URL, &params)
        .map(String::from)
        .map_err(|e| Error::Config(format!("invalid oauth parameters: {e}")))
}

fn state_signature(secret: &str, user_id: i64) -> String {
    let digest = Sha256::new()
        .chain_update(secret.as_bytes())
        .chain_update(b":")
        .chain_update(user_id.to_string().as_bytes())
        .finalize();
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

/// OAuth `state` for a Telegram user: `<user_id>.<signature>`.
///
/// The callback layer checks it with [`verify_login_state`] before storing the
/// exchanged token for that user.
pub fn login_state(secret: &str, user_id: UserId) -> String {
    format!("{}.{}", user_id.0, state_signature(secret, user_id.0))
}

pub fn verify_login_state(secret: &str, state: &str) -> Option<UserId> {
    let (id, sig) = state.split_once('.')?;
    let id: i64 = id.parse().ok()?;
    (state_signature(secret, id) == sig).then_some(UserId(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GithubClient {
        GithubClient::new("https://api.github.com/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn builds_rest_urls() {
        let c = client();
        let repo = RepoName::parse("o/r").unwrap();
        assert_eq!(
            c.issue_comments_url(&repo, 42),
            "https://api.github.com/repos/o/r/issues/42/comments"
        );
        assert_eq!(
            c.review_reply_url(&repo, 7, 1001),
            "https://api.github.com/repos/o/r/pulls/7/comments/1001/replies"
        );
    }

    #[test]
    fn api_error_prefers_message_field() {
        let e = api_error(403, r#"{"message":"Resource not accessible by integration"}"#);
        assert!(matches!(
            e,
            Error::Github { status: 403, ref message } if message == "Resource not accessible by integration"
        ));

        let e = api_error(502, "Bad Gateway");
        assert!(matches!(e, Error::Github { status: 502, ref message } if message == "Bad Gateway"));
    }

    #[test]
    fn authorize_url_encodes_params() {
        let url = oauth_authorize_url("Iv1.abc", Some("https://bot.example/cb?x=1"), "42").unwrap();
        assert!(url.starts_with("https://github.com/login/oauth/authorize?client_id=Iv1.abc"));
        assert!(url.contains("scope=repo"));
        assert!(url.contains("state=42"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fbot.example%2Fcb%3Fx%3D1"));
    }

    #[test]
    fn login_state_round_trips_and_rejects_forgery() {
        let state = login_state("s3cret", UserId(42));
        assert!(state.starts_with("42."));
        assert_eq!(verify_login_state("s3cret", &state), Some(UserId(42)));
        assert_eq!(verify_login_state("other", &state), None);

        let forged = state.replacen("42.", "43.", 1);
        assert_eq!(verify_login_state("s3cret", &forged), None);
        assert_eq!(verify_login_state("s3cret", "nonsense"), None);
    }

    #[tokio::test]
    async fn unreachable_api_is_an_external_error() {
        let c = GithubClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let repo = RepoName::parse("o/r").unwrap();
        let err = c
            .add_issue_comment(&repo, 1, "hi", &AccessToken("t".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::External(_)));
    }
}
