//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup summary of the effective configuration

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the file or a logger was already set
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at application startup
pub fn log_startup_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("yt-dlp binary: {}", config::YTDL_BIN.as_str());
    log::info!("Download folder: {}", config::download_dir().display());
    log::info!("Scratch root: {}", config::scratch_root().display());
    log::info!("Max file size: {} MiB", *config::MAX_FILE_SIZE_MB);
    log::info!(
        "Rate limit: {} requests per {}s",
        config::rate_limit::LIMIT,
        config::rate_limit::WINDOW_SECS
    );

    if *config::admin::OWNER_ID == 0 {
        log::warn!("OWNER_ID: not set, admin commands are disabled");
    } else {
        log::info!("OWNER_ID: {}", *config::admin::OWNER_ID);
    }

    match config::bot_api::get_url() {
        Some(url) if config::bot_api::is_local() => log::info!("Bot API: local server at {}", url),
        Some(url) => log::info!("Bot API: {}", url),
        None => log::info!("Bot API: api.telegram.org"),
    }
}
