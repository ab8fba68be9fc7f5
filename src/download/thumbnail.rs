//! Thumbnail resolution for the cover art.
//!
//! This module provides functions for:
//! - Detecting image formats from magic bytes (JPEG, PNG, WebP)
//! - Locating a thumbnail the downloader wrote into the workspace
//! - Falling back to fetching the thumbnail URL from the search metadata
//!
//! Nothing here ever fails the pipeline: every problem degrades to "no
//! thumbnail".

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::download::workspace::ScratchWorkspace;

/// Image extensions recognized as thumbnails in the workspace
pub const THUMBNAIL_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Image format detected by magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    Unknown,
}

impl ImageFormat {
    /// MIME type for the ID3 picture frame; unknown data is declared as JPEG.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Jpeg | ImageFormat::Unknown => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::WebP => "webp",
            ImageFormat::Jpeg | ImageFormat::Unknown => "jpg",
        }
    }
}

/// Detects image format from the first bytes of a file (magic bytes)
///
/// # Arguments
///
/// * `bytes` - The first bytes of the image file (at least 12 bytes recommended)
///
/// # Returns
///
/// The detected `ImageFormat` or `ImageFormat::Unknown` if the format cannot be determined
pub fn detect_image_format(bytes: &[u8]) -> ImageFormat {
    if bytes.len() < 4 {
        return ImageFormat::Unknown;
    }

    // JPEG: FF D8 FF
    if bytes[0] == 0xFF && bytes[1] == 0xD8 && bytes[2] == 0xFF {
        return ImageFormat::Jpeg;
    }

    // PNG: 89 50 4E 47
    if bytes[0] == 0x89 && bytes[1] == 0x50 && bytes[2] == 0x4E && bytes[3] == 0x47 {
        return ImageFormat::Png;
    }

    // WebP: RIFF....WEBP
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return ImageFormat::WebP;
    }

    ImageFormat::Unknown
}

/// Finds the thumbnail for the current run.
///
/// Prefers an image already present in the workspace; otherwise downloads
/// `thumbnail_url` into it. Returns `None` when neither works.
pub fn resolve_thumbnail(
    workspace: &ScratchWorkspace,
    thumbnail_url: Option<&str>,
    timeout: Duration,
) -> Option<PathBuf> {
    match workspace.find_file(THUMBNAIL_EXTENSIONS) {
        Ok(Some(path)) => {
            log::debug!("Using thumbnail written by downloader: {}", path.display());
            return Some(path);
        }
        Ok(None) => {}
        Err(e) => log::warn!("Failed to scan workspace for thumbnails: {}", e),
    }

    let url = thumbnail_url?;
    fetch_thumbnail(url, workspace.path(), timeout)
}

/// Downloads `url` into `dest_dir` as `thumb.<ext>`.
///
/// Uses a blocking client, so it must run on a worker thread, never on the
/// async runtime itself.
pub fn fetch_thumbnail(url: &str, dest_dir: &Path, timeout: Duration) -> Option<PathBuf> {
    let client = match reqwest::blocking::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            log::warn!("Failed to build HTTP client for thumbnail: {}", e);
            return None;
        }
    };

    let response = match client.get(url).send() {
        Ok(response) => response,
        Err(e) => {
            log::debug!("Thumbnail fetch failed for {}: {}", url, e);
            return None;
        }
    };

    if !response.status().is_success() {
        log::debug!("Thumbnail fetch for {} returned {}", url, response.status());
        return None;
    }

    let bytes = match response.bytes() {
        Ok(bytes) if !bytes.is_empty() => bytes,
        Ok(_) => {
            log::debug!("Thumbnail fetch for {} returned an empty body", url);
            return None;
        }
        Err(e) => {
            log::debug!("Failed to read thumbnail body from {}: {}", url, e);
            return None;
        }
    };

    let format = detect_image_format(&bytes);
    let path = dest_dir.join(format!("thumb.{}", format.extension()));
    match fs::write(&path, &bytes) {
        Ok(()) => {
            log::debug!("Fetched thumbnail ({} bytes, {:?}) from {}", bytes.len(), format, url);
            Some(path)
        }
        Err(e) => {
            log::warn!("Failed to write thumbnail {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn test_detect_image_format() {
        assert_eq!(detect_image_format(JPEG_BYTES), ImageFormat::Jpeg);
        assert_eq!(
            detect_image_format(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A]),
            ImageFormat::Png
        );
        assert_eq!(detect_image_format(b"RIFF\x00\x00\x00\x00WEBPVP8 "), ImageFormat::WebP);
        assert_eq!(detect_image_format(b"abc"), ImageFormat::Unknown);
        assert_eq!(detect_image_format(b"hello world!"), ImageFormat::Unknown);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(ImageFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(ImageFormat::Unknown.mime_type(), "image/jpeg");
        assert_eq!(ImageFormat::WebP.extension(), "webp");
    }

    #[test]
    fn test_prefers_workspace_image() {
        let root = tempfile::tempdir().unwrap();
        let workspace = ScratchWorkspace::create_in(root.path()).unwrap();
        fs::write(workspace.path().join("Song.webp"), b"RIFF\x00\x00\x00\x00WEBP").unwrap();

        // The URL is never contacted when a local image exists
        let found = resolve_thumbnail(&workspace, Some("http://127.0.0.1:9/never"), Duration::from_secs(1));
        assert_eq!(found.unwrap().file_name().unwrap(), "Song.webp");
    }

    #[test]
    fn test_no_image_no_url() {
        let root = tempfile::tempdir().unwrap();
        let workspace = ScratchWorkspace::create_in(root.path()).unwrap();
        assert!(resolve_thumbnail(&workspace, None, Duration::from_secs(1)).is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_thumbnail_from_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vi/abc/hqdefault.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(JPEG_BYTES.to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().to_path_buf();
        let url = format!("{}/vi/abc/hqdefault.jpg", server.uri());

        let fetched = tokio::task::spawn_blocking(move || fetch_thumbnail(&url, &dest, Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fetched.file_name().unwrap(), "thumb.jpg");
        assert_eq!(fs::read(&fetched).unwrap(), JPEG_BYTES);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_thumbnail_http_error_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().to_path_buf();
        let url = format!("{}/missing.jpg", server.uri());

        let fetched = tokio::task::spawn_blocking(move || fetch_thumbnail(&url, &dest, Duration::from_secs(5)))
            .await
            .unwrap();

        assert!(fetched.is_none());
        assert!(!dir.path().join("thumb.jpg").exists());
    }
}
