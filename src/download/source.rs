//! Search/download backend abstraction.
//!
//! The pipeline never talks to a media platform directly. It hands a query and
//! an empty workspace to a `MediaSource`, which must leave exactly one
//! transcoded MP3 (and optionally a thumbnail image) behind and report what it
//! found. `YtDlpSource` is the production backend; tests plug in fakes.

use std::path::Path;

use crate::download::error::FetchError;

/// Metadata reported by a source for the single best match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaInfo {
    /// Display title of the matched item
    pub title: Option<String>,
    /// Uploader / artist of the matched item
    pub artist: Option<String>,
    /// Remote thumbnail URL, used when no image was written to the workspace
    pub thumbnail_url: Option<String>,
}

/// External search + download + transcode capability.
///
/// Implementations run on a blocking worker thread and may block freely.
/// The call is all-or-nothing: an `Err` aborts the pipeline and nothing in
/// the workspace is trusted afterwards.
pub trait MediaSource: Send + Sync {
    /// Human-readable name of this source (e.g., "yt-dlp")
    fn name(&self) -> &str;

    /// Resolves `query` to one item, downloads its best audio into
    /// `workspace`, transcodes it to MP3 and returns the item's metadata.
    fn search_and_download(&self, query: &str, workspace: &Path) -> Result<MediaInfo, FetchError>;
}
