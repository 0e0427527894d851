//! Per-user data (GitHub access tokens) persisted as one JSON file.
//!
//! Reads and writes hit memory; the file is rewritten by [`JsonUserStore::flush`],
//! which the bot runs periodically and once on shutdown.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::{
    domain::{AccessToken, UserId},
    ports::CredentialStore,
    Result,
};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// GitHub login the token belongs to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_login: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    users: BTreeMap<i64, UserData>,
}

pub struct JsonUserStore {
    path: PathBuf,
    users: RwLock<BTreeMap<i64, UserData>>,
    dirty: AtomicBool,
}

impl JsonUserStore {
    /// Load `path`, or start empty when it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let users = match load_store_file(&path).await? {
            Some(file) => file.users,
            None => BTreeMap::new(),
        };
        tracing::info!(path = %path.display(), users = users.len(), "user store loaded");
        Ok(Self {
            path,
            users: RwLock::new(users),
            dirty: AtomicBool::new(false),
        })
    }

    pub async fn user(&self, user_id: UserId) -> Option<UserData> {
        self.users.read().await.get(&user_id.0).cloned()
    }

    /// Entry point for the OAuth callback layer.
    pub async fn set_access_token(
        &self,
        user_id: UserId,
        token: AccessToken,
        github_login: Option<String>,
    ) {
        let mut users = self.users.write().await;
        let entry = users.entry(user_id.0).or_default();
        entry.access_token = Some(token.0);
        if github_login.is_some() {
            entry.github_login = github_login;
        }
        self.dirty.store(true, Ordering::SeqCst);
    }

    /// Write pending changes. Returns whether anything was written.
    pub async fn flush(&self) -> Result<bool> {
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }
        let file = StoreFile {
            saved_at: Some(Utc::now()),
            users: self.users.read().await.clone(),
        };
        if let Err(e) = save_store_file(&self.path, &file).await {
            // Keep the changes pending for the next attempt.
            self.dirty.store(true, Ordering::SeqCst);
            return Err(e);
        }
        tracing::debug!(path = %self.path.display(), users = file.users.len(), "user store flushed");
        Ok(true)
    }
}

#[async_trait]
impl CredentialStore for JsonUserStore {
    async fn access_token(&self, user_id: UserId) -> Option<AccessToken> {
        self.users
            .read()
            .await
            .get(&user_id.0)
            .and_then(|u| u.access_token.clone())
            .filter(|t| !t.trim().is_empty())
            .map(AccessToken)
    }
}

async fn load_store_file(path: &Path) -> Result<Option<StoreFile>> {
    if !tokio::fs::try_exists(path).await? {
        return Ok(None);
    }
    let txt = tokio::fs::read_to_string(path).await?;
    if txt.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&txt)?))
}

async fn save_store_file(path: &Path, data: &StoreFile) -> Result<()> {
    let txt = serde_json::to_string_pretty(data)?;
    let tmp = path.with_extension("json.tmp");
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(&tmp, txt).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
