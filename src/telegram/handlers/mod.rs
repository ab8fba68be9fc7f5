//! Telegram bot handler tree configuration
//!
//! This module provides the dispatcher schema for the bot. The same handler
//! tree is used by `main` and can be built in tests.

mod commands;
mod schema;
mod types;

pub use commands::{audio_caption, rate_limited_text, searching_text, RATE_LIMITED_TEXT, SONG_USAGE_TEXT, START_TEXT};
pub use schema::schema;
pub use types::{requester_id, HandlerDeps, HandlerError};
