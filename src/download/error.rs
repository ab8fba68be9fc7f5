use thiserror::Error;

/// Structured error type for the fetch pipeline.
///
/// Every stage of [`crate::download::pipeline::FetchPipeline`] reports its
/// failure through one of these variants; the message is what the user sees.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Search, download or transcode step failed (yt-dlp exit, spawn, parse)
    #[error("Search/download failed: {0}")]
    SearchOrDownloadFailed(String),

    /// No compressed audio file in the workspace after the download step
    #[error("MP3 not found after download")]
    ArtifactMissing,

    /// Produced audio exceeds the configured size limit
    #[error("File too large ({size_mib:.1} MB). Max allowed {limit_mib:.1} MB.")]
    ArtifactTooLarge { size_mib: f64, limit_mib: f64 },

    /// Tag container could not be opened or written, even after a retry
    #[error("Failed to write tags: {0}")]
    TaggingFailed(String),

    /// Cover art could not be embedded although a thumbnail was present
    #[error("Failed to embed cover art: {0}")]
    ArtworkEmbedFailed(String),

    /// Scratch workspace could not be created or inspected
    #[error("Workspace error: {0}")]
    Workspace(std::io::Error),

    /// Moving the artifact into the download folder failed
    #[error("Failed to store file: {0}")]
    Relocation(std::io::Error),

    /// Worker thread panicked or was cancelled
    #[error("Download worker failed: {0}")]
    Worker(String),
}

impl FetchError {
    /// Returns subcategory for log lines
    pub fn subcategory(&self) -> &'static str {
        match self {
            FetchError::SearchOrDownloadFailed(_) => "search_or_download",
            FetchError::ArtifactMissing => "artifact_missing",
            FetchError::ArtifactTooLarge { .. } => "artifact_too_large",
            FetchError::TaggingFailed(_) => "tagging",
            FetchError::ArtworkEmbedFailed(_) => "artwork",
            FetchError::Workspace(_) => "workspace",
            FetchError::Relocation(_) => "relocation",
            FetchError::Worker(_) => "worker",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_mentions_measured_size() {
        let err = FetchError::ArtifactTooLarge {
            size_mib: 80.0,
            limit_mib: 50.0,
        };
        assert_eq!(err.to_string(), "File too large (80.0 MB). Max allowed 50.0 MB.");
    }

    #[test]
    fn test_subcategory() {
        assert_eq!(FetchError::ArtifactMissing.subcategory(), "artifact_missing");
        assert_eq!(
            FetchError::SearchOrDownloadFailed("".into()).subcategory(),
            "search_or_download"
        );
        assert_eq!(FetchError::TaggingFailed("".into()).subcategory(), "tagging");
        assert_eq!(FetchError::Worker("".into()).subcategory(), "worker");
    }
}
