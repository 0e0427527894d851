use std::sync::Arc;

use tokio::{io::BufReader, sync::mpsc};

use ghb_core::{config::Config, notify, store::JsonUserStore};
use ghb_github::GithubClient;

/// Pending GitHub deliveries buffered between stdin and the announcer.
const DELIVERY_QUEUE: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ghb_core::logging::init("ghb")?;

    let cfg = Arc::new(Config::load()?);
    let store = Arc::new(JsonUserStore::open(cfg.database_file.clone()).await?);
    let github = Arc::new(GithubClient::from_config(&cfg)?);

    if cfg.github_oauth_client_id.is_none() {
        tracing::warn!("GITHUB_OAUTH_CLIENT_ID not set, /login will be unavailable");
    }

    // GitHub events arrive as JSON lines on stdin from the webhook receiver.
    let (tx, rx) = mpsc::channel(DELIVERY_QUEUE);
    tokio::spawn(async move {
        if let Err(e) = notify::read_deliveries(BufReader::new(tokio::io::stdin()), tx).await {
            tracing::error!(error = %e, "github delivery ingress failed");
        }
    });

    ghb_telegram::router::run_polling(cfg, store, github, rx).await
}
