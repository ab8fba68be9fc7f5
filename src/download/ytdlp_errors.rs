//! yt-dlp failure classification.
//!
//! Maps yt-dlp stderr onto a small set of failure types so the user gets a
//! readable reason instead of a Python traceback.

/// yt-dlp failure types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YtDlpErrorType {
    /// Platform asked for sign-in or flagged the request as automated
    BotDetection,
    /// Item is private, removed or region-locked
    VideoUnavailable,
    /// The search returned nothing
    NoResults,
    /// Timeouts, DNS, refused connections
    NetworkError,
    /// Anything else
    Unknown,
}

/// Classifies yt-dlp stderr output.
pub fn analyze_ytdlp_error(stderr: &str) -> YtDlpErrorType {
    let stderr_lower = stderr.to_lowercase();

    if stderr_lower.contains("sign in to confirm")
        || stderr_lower.contains("please sign in")
        || stderr_lower.contains("bot detection")
        || stderr_lower.contains("http error 403")
        || stderr_lower.contains("http error 429")
    {
        return YtDlpErrorType::BotDetection;
    }

    if stderr_lower.contains("private video")
        || stderr_lower.contains("video unavailable")
        || stderr_lower.contains("video is not available")
        || stderr_lower.contains("has been removed")
        || stderr_lower.contains("not available in your country")
    {
        return YtDlpErrorType::VideoUnavailable;
    }

    if stderr_lower.contains("no video results") || stderr_lower.contains("no results") {
        return YtDlpErrorType::NoResults;
    }

    if stderr_lower.contains("timed out")
        || stderr_lower.contains("timeout")
        || stderr_lower.contains("connection")
        || stderr_lower.contains("network")
        || stderr_lower.contains("name resolution")
        || stderr_lower.contains("failed to connect")
    {
        return YtDlpErrorType::NetworkError;
    }

    YtDlpErrorType::Unknown
}

/// Short, user-facing reason for a failure type.
pub fn get_error_message(error_type: &YtDlpErrorType) -> &'static str {
    match error_type {
        YtDlpErrorType::BotDetection => "the platform blocked the request, try again later",
        YtDlpErrorType::VideoUnavailable => "the matching video is unavailable (private, removed or region-locked)",
        YtDlpErrorType::NoResults => "nothing found for this query",
        YtDlpErrorType::NetworkError => "network problem, try again in a minute",
        YtDlpErrorType::Unknown => "the downloader failed",
    }
}

/// Last `ERROR:` line of yt-dlp stderr, or the last non-empty line.
pub fn last_error_line(stderr: &str) -> Option<&str> {
    let lines = stderr.lines().map(str::trim).filter(|l| !l.is_empty());
    let last = lines.clone().last();
    lines.filter(|l| l.starts_with("ERROR:")).last().or(last)
}
