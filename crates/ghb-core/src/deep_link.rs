//! `t.me` deep links that reopen the private chat with the bot and feed it a
//! command through the `/start` payload.
//!
//! Payload convention: `cmd__arg1__arg2` is re-dispatched as `/cmd arg1 arg2`.

const ARG_SEP: &str = "__";
/// Telegram caps `start` parameters at 64 characters.
const MAX_PAYLOAD_LEN: usize = 64;

pub fn is_valid_payload(payload: &str) -> bool {
    !payload.is_empty()
        && payload.len() <= MAX_PAYLOAD_LEN
        && payload
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Build `https://t.me/<bot>?start=<payload>` for a command route.
pub fn deep_link(bot_username: &str, command: &str, args: &[&str]) -> String {
    let bot = bot_username.trim_start_matches('@');
    let mut payload = command.trim_start_matches('/').to_string();
    for arg in args {
        payload.push_str(ARG_SEP);
        payload.push_str(arg);
    }
    format!("https://t.me/{bot}?start={payload}")
}

/// Command routed through a `/start` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartRoute {
    pub command: String,
    pub args: Vec<String>,
}

pub fn parse_start_payload(payload: &str) -> Option<StartRoute> {
    let payload = payload.trim();
    if !is_valid_payload(payload) {
        return None;
    }
    let mut parts = payload.split(ARG_SEP);
    let command = parts.next().filter(|c| !c.is_empty())?.to_lowercase();
    let args = parts
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();
    Some(StartRoute { command, args })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_login_link() {
        assert_eq!(
            deep_link("@gh_bot", "login", &[]),
            "https://t.me/gh_bot?start=login"
        );
        assert_eq!(
            deep_link("gh_bot", "/help", &["add_repo"]),
            "https://t.me/gh_bot?start=help__add_repo"
        );
    }

    #[test]
    fn parses_payload_into_command() {
        let r = parse_start_payload("help__add_repo").unwrap();
        assert_eq!(r.command, "help");
        assert_eq!(r.args, vec!["add_repo".to_string()]);

        let r = parse_start_payload("LOGIN").unwrap();
        assert_eq!(r.command, "login");
        assert!(r.args.is_empty());
    }

    #[test]
    fn rejects_bad_payloads() {
        assert_eq!(parse_start_payload(""), None);
        assert_eq!(parse_start_payload("__x"), None);
        assert_eq!(parse_start_payload("a b"), None);
        assert_eq!(parse_start_payload(&"a".repeat(65)), None);
    }
}
