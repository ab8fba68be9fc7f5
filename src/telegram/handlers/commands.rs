//! Command handler implementations (/start, /song, /reset)

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile, Message, MessageId, ParseMode};

use super::types::{requester_id, HandlerDeps, HandlerError};
use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::utils::escape_markdown_v2;
use crate::download::pipeline::FetchResult;
use crate::telegram::Bot;

pub const START_TEXT: &str = "Send /song <song name> to download audio. Example:\n/song Shape of You - Ed Sheeran";
pub const SONG_USAGE_TEXT: &str = "Usage: /song <song name or artist - title>";
pub const RATE_LIMITED_TEXT: &str = "Too many requests. Try again later.";
const RESET_USAGE_TEXT: &str = "Usage: /reset <user_id>";
const UPLOADING_TEXT: &str = "⬆️ Uploading audio...";

/// Username shown in captions when the bot has none
const FALLBACK_USERNAME: &str = "song_bot";

/// Status line shown while the pipeline runs (MarkdownV2).
pub fn searching_text(query: &str) -> String {
    format!("🔎 Searching and downloading: *{}*", escape_markdown_v2(query))
}

/// Caption attached to the delivered audio.
pub fn audio_caption(title: &str, artist: &str, bot_username: Option<&str>) -> String {
    format!(
        "{} — {}\n\nDownloaded by @{}",
        title,
        artist,
        bot_username.unwrap_or(FALLBACK_USERNAME)
    )
}

/// Rejection reply; names the wait when the gate knows it.
pub fn rate_limited_text(retry_in: Option<Duration>) -> String {
    match retry_in {
        Some(wait) => format!("{} Next slot in {}s.", RATE_LIMITED_TEXT, wait.as_secs().max(1)),
        None => RATE_LIMITED_TEXT.to_string(),
    }
}

fn upload_failed_text(err: &AppError) -> String {
    match err {
        AppError::Delivery(reason) => format!("❌ Upload failed: {}", reason),
        other => format!("❌ Upload failed: {}", other),
    }
}

/// Handle /start command
pub(super) async fn handle_start_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    bot.send_message(msg.chat.id, START_TEXT).await?;
    Ok(())
}

/// Handle /song command
///
/// Gate check, then the pipeline, then delivery. The relocated files are
/// removed whether delivery worked or not.
pub(super) async fn handle_song_command(
    bot: &Bot,
    msg: &Message,
    query: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let query = query.trim();
    if query.is_empty() {
        bot.send_message(msg.chat.id, SONG_USAGE_TEXT).await?;
        return Ok(());
    }

    let requester = requester_id(msg);
    if !deps.rate_limiter.allow(requester).await {
        let retry_in = deps.rate_limiter.remaining_time(requester).await;
        log::info!("Rate limit hit for requester {} (retry in {:?})", requester, retry_in);
        bot.send_message(msg.chat.id, rate_limited_text(retry_in)).await?;
        return Ok(());
    }

    let status = bot
        .send_message(msg.chat.id, searching_text(query))
        .parse_mode(ParseMode::MarkdownV2)
        .await?;

    let song = match deps.pipeline.fetch(query, deps.max_size_bytes).await {
        Ok(song) => song,
        Err(e) => {
            log::error!("Download failed for '{}' [{}]: {}", query, e.subcategory(), e);
            if let Err(edit_err) = bot
                .edit_message_text(msg.chat.id, status.id, format!("❌ Failed to download: {}", e))
                .await
            {
                log::warn!("Failed to report download error: {}", edit_err);
            }
            return Ok(());
        }
    };

    let delivery = deliver_song(bot, msg.chat.id, status.id, &song, deps.bot_username.as_deref()).await;
    song.remove_files();

    match delivery {
        Ok(()) => log::info!("Delivered '{}' to requester {}", song.title, requester),
        Err(e) => {
            log::error!("Upload failed for '{}': {}", song.title, e);
            if let Err(edit_err) = bot
                .edit_message_text(msg.chat.id, status.id, upload_failed_text(&e))
                .await
            {
                log::warn!("Failed to report upload error: {}", edit_err);
            }
        }
    }

    Ok(())
}

async fn deliver_song(
    bot: &Bot,
    chat_id: ChatId,
    status_id: MessageId,
    song: &FetchResult,
    bot_username: Option<&str>,
) -> AppResult<()> {
    if let Err(e) = bot.edit_message_text(chat_id, status_id, UPLOADING_TEXT).await {
        log::warn!("Failed to update status message: {}", e);
    }

    let mut request = bot
        .send_audio(chat_id, InputFile::file(&song.audio_path))
        .title(song.title.clone())
        .performer(song.artist.clone())
        .caption(audio_caption(&song.title, &song.artist, bot_username));
    if let Some(thumb) = &song.thumbnail_path {
        request = request.thumbnail(InputFile::file(thumb));
    }

    request.await.map_err(|e| AppError::Delivery(e.to_string()))?;

    if let Err(e) = bot.delete_message(chat_id, status_id).await {
        log::warn!("Failed to delete status message: {}", e);
    }
    Ok(())
}

/// Handle /reset command (owner only)
pub(super) async fn handle_reset_command(
    bot: &Bot,
    msg: &Message,
    args: &str,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let caller = requester_id(msg);
    if !config::admin::is_owner(caller) {
        log::warn!("Ignoring /reset from non-owner {}", caller);
        return Ok(());
    }

    match args.trim().parse::<i64>() {
        Ok(target) => {
            deps.rate_limiter.reset(target).await;
            log::info!("Owner reset rate limit for {}", target);
            bot.send_message(msg.chat.id, format!("✅ Rate limit reset for {}", target))
                .await?;
        }
        Err(_) => {
            bot.send_message(msg.chat.id, RESET_USAGE_TEXT).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::error::FetchError;

    #[test]
    fn test_searching_text_escapes_query() {
        assert_eq!(
            searching_text("Shape of You - Ed Sheeran"),
            "🔎 Searching and downloading: *Shape of You \\- Ed Sheeran*"
        );
    }

    #[test]
    fn test_audio_caption() {
        assert_eq!(
            audio_caption("Shape of You", "Ed Sheeran", Some("dorasong_bot")),
            "Shape of You — Ed Sheeran\n\nDownloaded by @dorasong_bot"
        );
        assert!(audio_caption("T", "A", None).ends_with("@song_bot"));
    }

    #[test]
    fn test_rate_limited_text() {
        assert_eq!(rate_limited_text(None), "Too many requests. Try again later.");
        assert_eq!(
            rate_limited_text(Some(Duration::from_millis(41_500))),
            "Too many requests. Try again later. Next slot in 41s."
        );
        assert!(rate_limited_text(Some(Duration::from_millis(200))).ends_with("in 1s."));
    }

    #[tokio::test]
    async fn test_rejected_requester_gets_wait_hint() {
        let limiter = crate::core::rate_limiter::RateLimiter::with_limit(1, Duration::from_secs(60));
        assert!(limiter.allow(5).await);
        assert!(!limiter.allow(5).await);

        let text = rate_limited_text(limiter.remaining_time(5).await);
        assert!(text.starts_with(RATE_LIMITED_TEXT));
        assert!(text.contains("Next slot in"));
    }

    #[test]
    fn test_upload_failed_text() {
        let err = AppError::Delivery("Request Entity Too Large".to_string());
        assert_eq!(upload_failed_text(&err), "❌ Upload failed: Request Entity Too Large");

        let err = AppError::Fetch(FetchError::ArtifactMissing);
        assert_eq!(upload_failed_text(&err), "❌ Upload failed: MP3 not found after download");
    }
}
