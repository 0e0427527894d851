use std::sync::Arc;

use teloxide::{
    dispatching::{Dispatcher, UpdateFilterExt, UpdateHandler},
    dptree,
    prelude::*,
    types::{Me, UserId},
};
use tokio::sync::mpsc;

use ghb_core::{
    config::Config,
    deep_link::deep_link,
    embed::LinkEmbedder,
    messaging::port::MessagingPort,
    notify::{self, Delivery},
    ports::GithubApi,
    reply::ReplyRouter,
    scheduler::TokioScheduler,
    store::JsonUserStore,
};

use crate::handlers::{self, UpdateError};
use crate::TelegramMessenger;

/// Process-wide state handed to every handler through the dispatcher deps.
pub struct AppState {
    pub cfg: Arc<Config>,
    pub me: Me,
    pub store: Arc<JsonUserStore>,
    pub messenger: Arc<dyn MessagingPort>,
    pub replies: ReplyRouter,
}

impl AppState {
    pub fn bot_username(&self) -> &str {
        self.me.username()
    }

    pub fn bot_id(&self) -> UserId {
        self.me.user.id
    }
}

/// Update routing table, built once at startup.
///
/// Commands win over replies, so `/help` sent as a reply is still a command.
pub fn schema() -> UpdateHandler<UpdateError> {
    Update::filter_message()
        .branch(dptree::filter(handlers::is_command).endpoint(handlers::on_command))
        .branch(dptree::filter(handlers::is_data_link_reply).endpoint(handlers::on_reply))
}

pub async fn run_polling(
    cfg: Arc<Config>,
    store: Arc<JsonUserStore>,
    github: Arc<dyn GithubApi>,
    deliveries: mpsc::Receiver<Delivery>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());
    let me = bot.get_me().await?;
    tracing::info!(username = %me.username(), "bot started");

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let scheduler = TokioScheduler::new();

    {
        let store = store.clone();
        scheduler.run_repeating(
            "flush_user_store",
            cfg.persistence_flush_interval,
            move || {
                let store = store.clone();
                async move {
                    if let Err(e) = store.flush().await {
                        tracing::error!(error = %e, "user store flush failed");
                    }
                }
            },
        );
    }

    let embedder = LinkEmbedder::new(cfg.data_link_base.clone());
    let announcer = tokio::spawn(notify::run_deliveries(
        deliveries,
        embedder.clone(),
        messenger.clone(),
    ));

    let replies = ReplyRouter::new(
        embedder,
        store.clone(),
        github,
        messenger.clone(),
        Arc::new(scheduler.clone()),
        deep_link(me.username(), "login", &[]),
    )
    .with_prompt_ttl(cfg.login_prompt_ttl);

    let state = Arc::new(AppState {
        cfg,
        me,
        store: store.clone(),
        messenger,
        replies,
    });

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            tracing::trace!(update = ?upd, "unhandled update");
        })
        .error_handler(Arc::new(|e: UpdateError| async move {
            tracing::error!(error = %e, "update caused error");
        }))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    scheduler.shutdown();
    announcer.abort();
    if let Err(e) = store.flush().await {
        tracing::error!(error = %e, "final user store flush failed");
    }
    tracing::info!("bot stopped");

    Ok(())
}
