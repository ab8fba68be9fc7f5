use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration constants for the bot
/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Persistent download folder path
/// Read from DOWNLOAD_FOLDER environment variable
/// Defaults to ./data/downloads relative to the working directory
/// Supports tilde (~) expansion for home directory
pub static DOWNLOAD_FOLDER: Lazy<String> =
    Lazy::new(|| env::var("DOWNLOAD_FOLDER").unwrap_or_else(|_| "data/downloads".to_string()));

/// Root directory for per-request scratch workspaces
/// Read from TEMP_FILES_DIR environment variable
/// Defaults to the system temp directory
pub static TEMP_FILES_DIR: Lazy<Option<String>> = Lazy::new(|| {
    env::var("TEMP_FILES_DIR")
        .ok()
        .and_then(|s| if s.trim().is_empty() { None } else { Some(s) })
});

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Maximum artifact size in MiB
/// Read from MAX_FILE_SIZE_MB environment variable
/// Default: 50 (the standard Bot API upload limit)
pub static MAX_FILE_SIZE_MB: Lazy<u64> = Lazy::new(|| {
    env::var("MAX_FILE_SIZE_MB")
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(50)
});

/// Expands `~` and turns the configured download folder into a path.
pub fn download_dir() -> PathBuf {
    PathBuf::from(shellexpand::tilde(DOWNLOAD_FOLDER.as_str()).to_string())
}

/// Root for scratch workspaces; falls back to the system temp directory.
pub fn scratch_root() -> PathBuf {
    match TEMP_FILES_DIR.as_deref() {
        Some(dir) => PathBuf::from(shellexpand::tilde(dir).to_string()),
        None => env::temp_dir(),
    }
}

/// Converts mebibytes to bytes.
pub const fn mib_to_bytes(mib: u64) -> u64 {
    mib * 1024 * 1024
}

/// Maximum artifact size in bytes, derived from `MAX_FILE_SIZE_MB`.
pub fn max_file_size_bytes() -> u64 {
    mib_to_bytes(*MAX_FILE_SIZE_MB)
}

/// Rate limiting configuration
pub mod rate_limit {
    use super::Duration;

    /// Accepted requests per requester within one window
    pub const LIMIT: usize = 2;

    /// Sliding window length (in seconds)
    pub const WINDOW_SECS: u64 = 60;

    /// How often idle requesters are evicted (in seconds)
    pub const SWEEP_INTERVAL_SECS: u64 = 300;

    /// Sliding window duration
    pub fn window() -> Duration {
        Duration::from_secs(WINDOW_SECS)
    }

    /// Sweep interval duration
    pub fn sweep_interval() -> Duration {
        Duration::from_secs(SWEEP_INTERVAL_SECS)
    }
}

/// Download configuration
pub mod download {
    /// Target container/codec produced by the transcode step
    pub const AUDIO_FORMAT: &str = "mp3";

    /// Target bitrate passed to the transcode step
    pub const AUDIO_QUALITY: &str = "192K";

    /// Maximum number of title characters used for the on-disk file name
    pub const MAX_TITLE_CHARS: usize = 150;

    /// Byte cap for the on-disk base name; file systems count bytes, not characters
    pub const MAX_FILENAME_BYTES: usize = 240;

    /// Artist used when the search metadata carries no uploader
    pub const UNKNOWN_ARTIST: &str = "Unknown";
}

/// Thumbnail configuration
pub mod thumbnail {
    use super::Duration;

    /// Timeout for the thumbnail URL fallback fetch (in seconds)
    pub const FETCH_TIMEOUT_SECS: u64 = 15;

    /// Thumbnail fetch timeout duration
    pub fn fetch_timeout() -> Duration {
        Duration::from_secs(FETCH_TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API requests (in seconds)
    /// Large enough for a 50 MB audio upload on a slow link
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Admin configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    /// Owner user ID allowed to run admin commands
    /// Read from OWNER_ID environment variable
    /// Defaults to 0 if not set (nobody is owner)
    pub static OWNER_ID: Lazy<i64> = Lazy::new(|| {
        env::var("OWNER_ID")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0)
    });

    /// Returns true when `user_id` is the configured owner.
    pub fn is_owner(user_id: i64) -> bool {
        let owner = *OWNER_ID;
        owner != 0 && owner == user_id
    }
}

/// Bot API server configuration utilities
pub mod bot_api {
    /// Returns the BOT_API_URL environment variable if set.
    pub fn get_url() -> Option<String> {
        std::env::var("BOT_API_URL").ok().filter(|url| !url.trim().is_empty())
    }

    /// Returns true if using a local Bot API server (not api.telegram.org).
    pub fn is_local() -> bool {
        get_url().map(|url| !url.contains("api.telegram.org")).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_mib_to_bytes() {
        assert_eq!(mib_to_bytes(1), 1_048_576);
        assert_eq!(mib_to_bytes(50), 52_428_800);
    }

    #[test]
    fn test_rate_limit_constants() {
        assert_eq!(rate_limit::LIMIT, 2);
        assert_eq!(rate_limit::window(), Duration::from_secs(60));
    }

    #[test]
    fn test_owner_zero_is_never_owner() {
        // OWNER_ID unset in tests resolves to 0, which must not match user 0
        if *admin::OWNER_ID == 0 {
            assert!(!admin::is_owner(0));
        }
    }

    #[test]
    #[serial]
    fn test_bot_api_url_detection() {
        env::set_var("BOT_API_URL", "http://localhost:8081");
        assert!(bot_api::is_local());

        env::set_var("BOT_API_URL", "https://api.telegram.org");
        assert!(!bot_api::is_local());

        env::set_var("BOT_API_URL", "   ");
        assert_eq!(bot_api::get_url(), None);

        env::remove_var("BOT_API_URL");
        assert!(!bot_api::is_local());
    }
}
