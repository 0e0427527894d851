//! Core domain + application logic for the GitHub ⇄ Telegram bridge bot.
//!
//! This crate is framework-agnostic. Telegram and the GitHub REST API live
//! behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod deep_link;
pub mod domain;
pub mod embed;
pub mod errors;
pub mod formatting;
pub mod github;
pub mod logging;
pub mod messaging;
pub mod notify;
pub mod ports;
pub mod reply;
pub mod scheduler;
pub mod store;

pub use errors::{Error, Result};
