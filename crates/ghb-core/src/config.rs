use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use url::Url;

use crate::{embed::DEFAULT_DATA_LINK_BASE, errors::Error, Result};

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Typed configuration, read from the environment (plus an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,

    // GitHub
    pub github_api_url: String,
    pub github_oauth_client_id: Option<String>,
    pub github_oauth_redirect_uri: Option<String>,
    /// Signs the OAuth `state`; defaults to the bot token.
    pub login_state_secret: String,
    pub http_timeout: Duration,

    // Persistence
    pub database_file: PathBuf,
    pub persistence_flush_interval: Duration,

    // Reply routing
    pub data_link_base: String,
    pub login_prompt_ttl: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process env in `load`).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let github_api_url = get("GITHUB_API_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let github_oauth_client_id = get("GITHUB_OAUTH_CLIENT_ID").and_then(non_empty);
        let github_oauth_redirect_uri = get("GITHUB_OAUTH_REDIRECT_URI").and_then(non_empty);
        let login_state_secret = get("LOGIN_STATE_SECRET")
            .and_then(non_empty)
            .unwrap_or_else(|| telegram_bot_token.clone());
        let http_timeout = Duration::from_secs(parse_u64(&get, "HTTP_TIMEOUT_SECS")?.unwrap_or(10));

        let database_file = PathBuf::from(
            get("DATABASE_FILE")
                .and_then(non_empty)
                .unwrap_or_else(|| "/tmp/github-telegram-bot.json".to_string()),
        );
        let persistence_flush_interval =
            Duration::from_secs(parse_u64(&get, "PERSISTENCE_FLUSH_SECS")?.unwrap_or(5 * 60));

        let data_link_base = normalize_data_link_base(
            &get("DATA_LINK_BASE")
                .and_then(non_empty)
                .unwrap_or_else(|| DEFAULT_DATA_LINK_BASE.to_string()),
        )?;
        let login_prompt_ttl =
            Duration::from_secs(parse_u64(&get, "LOGIN_PROMPT_TTL_SECS")?.unwrap_or(30));

        if persistence_flush_interval.is_zero() {
            return Err(Error::Config(
                "PERSISTENCE_FLUSH_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            telegram_bot_token,
            github_api_url,
            github_oauth_client_id,
            github_oauth_redirect_uri,
            login_state_secret,
            http_timeout,
            database_file,
            persistence_flush_interval,
            data_link_base,
            login_prompt_ttl,
        })
    }
}

/// Bring `DATA_LINK_BASE` into the serialized form Telegram returns links in
/// (lowercase scheme and host, explicit root path), so the embedder's prefix
/// match still holds on replies.
fn normalize_data_link_base(raw: &str) -> Result<String> {
    let bad = |why: String| Error::Config(format!("DATA_LINK_BASE {raw:?} {why}"));

    let url = Url::parse(raw.trim()).map_err(|e| bad(format!("is not a URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(bad("must be an http(s) URL".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(bad("must not carry a query or fragment".to_string()));
    }

    let base = url.to_string();
    let sample = format!("{base}rc:o/r:1:2:dependabot[bot]");
    match Url::parse(&sample) {
        Ok(u) if u.as_str() == sample => Ok(base),
        _ => Err(bad("does not keep data tokens intact".to_string())),
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_u64(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = get(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {raw:?}")))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn token_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn defaults() {
        let cfg = Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(cfg.github_api_url, "https://api.github.com");
        assert_eq!(cfg.login_prompt_ttl, Duration::from_secs(30));
        assert_eq!(cfg.persistence_flush_interval, Duration::from_secs(300));
        assert_eq!(cfg.data_link_base, DEFAULT_DATA_LINK_BASE);
        assert!(cfg.github_oauth_client_id.is_none());
        assert_eq!(cfg.login_state_secret, "123:abc");
    }

    #[test]
    fn overrides_and_validation() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("GITHUB_API_URL", "https://ghe.example.com/api/v3/"),
            ("GITHUB_OAUTH_CLIENT_ID", "Iv1.abc"),
            ("LOGIN_PROMPT_TTL_SECS", "10"),
        ]))
        .unwrap();
        assert_eq!(cfg.github_api_url, "https://ghe.example.com/api/v3");
        assert_eq!(cfg.github_oauth_client_id.as_deref(), Some("Iv1.abc"));
        assert_eq!(cfg.login_prompt_ttl, Duration::from_secs(10));

        assert!(Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("LOGIN_PROMPT_TTL_SECS", "soon"),
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("DATA_LINK_BASE", "tg://x/"),
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("PERSISTENCE_FLUSH_SECS", "0"),
        ]))
        .is_err());
    }

    #[test]
    fn data_link_base_is_normalized() {
        let base = |v: &str| {
            Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "t"), ("DATA_LINK_BASE", v)]))
                .map(|c| c.data_link_base)
        };
        assert_eq!(base("https://Bot.Example").unwrap(), "https://bot.example/");
        assert_eq!(base("HTTPS://x.test/d/").unwrap(), "https://x.test/d/");
        assert_eq!(base("http://x.test:80/d/").unwrap(), "http://x.test/d/");
        assert_eq!(base(DEFAULT_DATA_LINK_BASE).unwrap(), DEFAULT_DATA_LINK_BASE);

        assert!(base("ftp://x.test/").is_err());
        assert!(base("https://x.test/d?k=").is_err());
        assert!(base("https://x.test/d#").is_err());
        assert!(base("not a url").is_err());
    }
}
