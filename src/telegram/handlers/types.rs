//! Handler types and dependencies

use std::sync::Arc;

use teloxide::types::Message;

use crate::core::rate_limiter::RateLimiter;
use crate::download::pipeline::FetchPipeline;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub rate_limiter: Arc<RateLimiter>,
    pub pipeline: Arc<FetchPipeline>,
    pub bot_username: Option<String>,
    pub max_size_bytes: u64,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(
        rate_limiter: Arc<RateLimiter>,
        pipeline: Arc<FetchPipeline>,
        bot_username: Option<String>,
        max_size_bytes: u64,
    ) -> Self {
        Self {
            rate_limiter,
            pipeline,
            bot_username,
            max_size_bytes,
        }
    }
}

/// Requester identity for the admission gate: the sender, or the chat for
/// anonymous senders.
pub fn requester_id(msg: &Message) -> i64 {
    msg.from
        .as_ref()
        .and_then(|u| i64::try_from(u.id.0).ok())
        .unwrap_or(msg.chat.id.0)
}
