use teloxide::types::Message;

use ghb_core::{
    deep_link::{deep_link, parse_start_payload},
    domain::{ChatId, MessageId, UserId},
    formatting::escape_html,
    messaging::types::{InlineButton, InlineKeyboard, SendOptions},
    Result,
};
use ghb_github::{login_state, oauth_authorize_url};

use crate::router::AppState;

const HELP_TEXT: &str = "I forward GitHub activity into this chat and post your replies back to GitHub.\n\n\
Reply to one of my issue, pull request or review comment messages and your reply is posted as a \
GitHub comment, mentioning the author. Start a reply with <code>!</code> to keep it in Telegram.\n\n\
/login - connect your GitHub account\n\
/help add_repo - how to connect a repository\n\
/privacy - what I store";

const HELP_ADD_REPO: &str = "<b>Connecting a repository</b>\n\n\
1. Open the repository on GitHub and go to <i>Settings → Webhooks → Add webhook</i>.\n\
2. Use the webhook URL of this bot deployment as <i>Payload URL</i>, with content type \
<code>application/json</code>.\n\
3. Select the <i>Issues</i>, <i>Issue comments</i>, <i>Pull requests</i> and \
<i>Pull request review comments</i> events.\n\n\
New activity will show up here; reply to it to comment on GitHub.";

const PRIVACY_TEXT: &str = "I store your GitHub access token (and GitHub login, when known) \
keyed by your Telegram user id, so I can post comments on your behalf. \
Nothing else about you or your chats is kept.";

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// `/start <payload>` from a deep link runs the encoded command instead.
fn resolve_start(cmd: String, args: String) -> (String, String) {
    if cmd != "start" {
        return (cmd, args);
    }
    match parse_start_payload(&args) {
        Some(route) if route.command != "start" => (route.command, route.args.join(" ")),
        _ => (cmd, String::new()),
    }
}

fn help_html(args: &str) -> &'static str {
    if args.split_whitespace().next() == Some("add_repo") {
        HELP_ADD_REPO
    } else {
        HELP_TEXT
    }
}

pub async fn handle_command(msg: &Message, state: &AppState) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let (cmd, args) = parse_command(text);
    let (cmd, args) = resolve_start(cmd, args);

    let chat_id = ChatId(msg.chat.id.0);
    let opts = SendOptions {
        reply_to: Some(MessageId(msg.id.0)),
        disable_link_preview: true,
        ..Default::default()
    };

    let (html, keyboard) = match cmd.as_str() {
        "start" => (
            format!(
                "Hello, I am @{}. I relay GitHub activity and post your replies back to GitHub.\n\nSee /help.",
                escape_html(state.bot_username())
            ),
            None,
        ),
        "help" => (help_html(&args).to_string(), None),
        "privacy" => (PRIVACY_TEXT.to_string(), None),
        "login" => login_message(msg, state).await?,
        _ => return Ok(()),
    };

    tracing::debug!(command = %cmd, chat_id = chat_id.0, "command");
    state
        .messenger
        .send_html(chat_id, &html, SendOptions { keyboard, ..opts })
        .await?;
    Ok(())
}

async fn login_message(
    msg: &Message,
    state: &AppState,
) -> Result<(String, Option<InlineKeyboard>)> {
    if !msg.chat.is_private() {
        let link = deep_link(state.bot_username(), "login", &[]);
        return Ok((
            "Logging in happens in a private chat with me.".to_string(),
            Some(InlineKeyboard::single(InlineButton::url("Login", link))),
        ));
    }

    let Some(user) = msg.from() else {
        return Ok(("Cannot tell who you are.".to_string(), None));
    };
    let user_id = UserId(user.id.0 as i64);

    if let Some(data) = state.store.user(user_id).await {
        if data.access_token.is_some() {
            let who = data
                .github_login
                .map(|l| format!(" as <b>{}</b>", escape_html(&l)))
                .unwrap_or_default();
            return Ok((format!("You are already logged in{who}."), None));
        }
    }

    let Some(client_id) = state.cfg.github_oauth_client_id.as_deref() else {
        return Ok(("GitHub login is not configured for this bot.".to_string(), None));
    };

    let url = oauth_authorize_url(
        client_id,
        state.cfg.github_oauth_redirect_uri.as_deref(),
        &login_state(&state.cfg.login_state_secret, user_id),
    )?;
    Ok((
        "Press the button below to connect your GitHub account. \
         Afterwards you can reply to GitHub messages right from Telegram."
            .to_string(),
        Some(InlineKeyboard::single(InlineButton::url("Login with GitHub", url))),
    ))
}
