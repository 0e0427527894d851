//! Messenger-facing abstractions. Telegram is the only implementation; the
//! core speaks in these types so the reply routing stays testable.

pub mod port;
pub mod types;
