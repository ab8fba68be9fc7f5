//! Dorasong - Telegram bot that turns a song query into a tagged MP3
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, rate limiting and helpers
//! - `download`: the fetch pipeline (search, download, tag, relocate)
//! - `telegram`: bot construction and the dispatcher schema
//! - `cli`: command-line interface

pub mod cli;
pub mod core;
pub mod download;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult, RateLimiter};
pub use download::{FetchError, FetchPipeline, FetchResult, MediaInfo, MediaSource, PipelineConfig};
pub use telegram::{schema, HandlerDeps};
