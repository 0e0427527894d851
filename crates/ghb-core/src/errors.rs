/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the reply
/// router and handlers can treat failures uniformly (log and continue).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid entity reference: {0}")]
    InvalidEntity(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("github api error ({status}): {message}")]
    Github { status: u16, message: String },

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
