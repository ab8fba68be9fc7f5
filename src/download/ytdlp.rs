//! YtDlpSource: search + download + transcode via the yt-dlp binary.
//!
//! One invocation of yt-dlp does the whole external step: `ytsearch1:` picks
//! the best match, `bestaudio/best` fetches its audio, the FFmpeg
//! post-processor converts it to a 192 kbps MP3 and writes basic metadata,
//! and `--write-thumbnail` drops the artwork next to it. `--print-json` hands
//! back the info dictionary of the downloaded entry on stdout.

use serde::Deserialize;
use std::path::Path;
use std::process::Command;

use crate::core::config;
use crate::download::error::FetchError;
use crate::download::source::{MediaInfo, MediaSource};
use crate::download::ytdlp_errors::{analyze_ytdlp_error, get_error_message, last_error_line};

/// Fields of the yt-dlp info dictionary the pipeline needs.
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
}

impl From<YtDlpInfo> for MediaInfo {
    fn from(info: YtDlpInfo) -> Self {
        MediaInfo {
            title: info.title.filter(|t| !t.trim().is_empty()),
            artist: info.uploader.or(info.channel).filter(|a| !a.trim().is_empty()),
            thumbnail_url: info.thumbnail.filter(|u| !u.trim().is_empty()),
        }
    }
}

/// Download source powered by yt-dlp.
pub struct YtDlpSource {
    ytdl_bin: String,
}

impl Default for YtDlpSource {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlpSource {
    /// Uses the binary configured via `YTDL_BIN`.
    pub fn new() -> Self {
        Self::with_binary(config::YTDL_BIN.clone())
    }

    pub fn with_binary(ytdl_bin: impl Into<String>) -> Self {
        Self {
            ytdl_bin: ytdl_bin.into(),
        }
    }

    /// Command-line arguments for one search-and-download run.
    pub fn build_args(query: &str, workspace: &Path) -> Vec<String> {
        let output_template = workspace.join("%(title).180B.%(ext)s");

        vec![
            format!("ytsearch1:{}", query),
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            config::download::AUDIO_FORMAT.to_string(),
            "--audio-quality".to_string(),
            config::download::AUDIO_QUALITY.to_string(),
            "--add-metadata".to_string(),
            "--write-thumbnail".to_string(),
            "--convert-thumbnails".to_string(),
            "jpg".to_string(),
            "--trim-filenames".to_string(),
            "180".to_string(),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--no-progress".to_string(),
            "--no-check-certificate".to_string(),
            "--print-json".to_string(),
            "-o".to_string(),
            output_template.to_string_lossy().to_string(),
        ]
    }
}

/// Picks the info dictionary of the downloaded entry out of yt-dlp stdout.
///
/// yt-dlp prints one JSON object per line; the last one belongs to the entry
/// that was actually downloaded.
pub fn parse_info_json(stdout: &str) -> Option<MediaInfo> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .filter_map(|line| serde_json::from_str::<YtDlpInfo>(line).ok())
        .last()
        .map(MediaInfo::from)
}

impl MediaSource for YtDlpSource {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    fn search_and_download(&self, query: &str, workspace: &Path) -> Result<MediaInfo, FetchError> {
        let args = Self::build_args(query, workspace);
        log::debug!("yt-dlp command: {} {}", self.ytdl_bin, args.join(" "));

        let output = Command::new(&self.ytdl_bin).args(&args).output().map_err(|e| {
            log::error!("Failed to execute {}: {}", self.ytdl_bin, e);
            FetchError::SearchOrDownloadFailed(format!("failed to run {}: {}", self.ytdl_bin, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let error_type = analyze_ytdlp_error(&stderr);
            let detail = last_error_line(&stderr).unwrap_or("no output");
            log::error!(
                "yt-dlp exited with {} for query '{}' ({:?}): {}",
                output.status,
                query,
                error_type,
                detail
            );
            return Err(FetchError::SearchOrDownloadFailed(format!(
                "{} ({})",
                get_error_message(&error_type),
                detail
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_info_json(&stdout) {
            Some(info) => {
                log::info!(
                    "yt-dlp matched '{}' by '{}' for query '{}'",
                    info.title.as_deref().unwrap_or("?"),
                    info.artist.as_deref().unwrap_or("?"),
                    query
                );
                Ok(info)
            }
            None => {
                log::warn!("yt-dlp printed no info JSON for query '{}'", query);
                Ok(MediaInfo::default())
            }
        }
    }
}
