//! Fetch pipeline: search → download → transcode → tag → relocate.
//!
//! One call to [`FetchPipeline::fetch`] turns a free-text query into a tagged
//! MP3 in the download folder:
//!
//! 1. create a scratch workspace (removed on every exit path)
//! 2. let the [`MediaSource`] search, download and transcode into it
//! 3. locate the produced MP3 (`ArtifactMissing` if there is none)
//! 4. enforce the size limit before anything else touches the file
//! 5. resolve a thumbnail (best effort, never fails)
//! 6. write title/artist tags
//! 7. embed the thumbnail as front cover
//! 8. move the MP3 into a fresh per-run directory of the download folder,
//!    copying the thumbnail next to it
//!
//! The work is blocking, so [`FetchPipeline::fetch`] runs it on
//! `spawn_blocking` and the bot keeps serving other chats meanwhile.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::core::config;
use crate::core::utils::{bytes_to_mib, title_to_filename};
use crate::download::error::FetchError;
use crate::download::source::MediaSource;
use crate::download::tags;
use crate::download::thumbnail;
use crate::download::workspace::ScratchWorkspace;

/// What to do when a thumbnail exists but cannot be embedded as cover art.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtworkPolicy {
    /// Log and deliver the song without embedded artwork
    #[default]
    Tolerate,
    /// Abort the fetch with `ArtworkEmbedFailed`
    Fail,
}

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Persistent folder that receives finished files
    pub download_dir: PathBuf,
    /// Parent of the per-run scratch workspaces
    pub scratch_root: PathBuf,
    /// Timeout of the thumbnail URL fallback
    pub thumbnail_timeout: Duration,
    pub artwork_policy: ArtworkPolicy,
}

impl PipelineConfig {
    pub fn new(download_dir: impl Into<PathBuf>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            scratch_root: scratch_root.into(),
            thumbnail_timeout: config::thumbnail::fetch_timeout(),
            artwork_policy: ArtworkPolicy::default(),
        }
    }

    /// Settings from `DOWNLOAD_FOLDER` / `TEMP_FILES_DIR`.
    pub fn from_env() -> Self {
        Self::new(config::download_dir(), config::scratch_root())
    }

    pub fn with_artwork_policy(mut self, policy: ArtworkPolicy) -> Self {
        self.artwork_policy = policy;
        self
    }

    pub fn with_thumbnail_timeout(mut self, timeout: Duration) -> Self {
        self.thumbnail_timeout = timeout;
        self
    }
}

/// A finished song, handed over to the caller.
///
/// The caller owns the files from here on and must call
/// [`FetchResult::remove_files`] once they have been delivered.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Tagged MP3 in the download folder
    pub audio_path: PathBuf,
    pub title: String,
    pub artist: String,
    /// Copy of the cover image, if one was found
    pub thumbnail_path: Option<PathBuf>,
    /// Final size of `audio_path`
    pub size_bytes: u64,
    /// Per-run directory holding the files above
    run_dir: PathBuf,
}

impl FetchResult {
    /// Deletes the audio, the thumbnail and their per-run directory.
    pub fn remove_files(&self) {
        if let Err(e) = fs::remove_file(&self.audio_path) {
            log::warn!("Failed to remove {}: {}", self.audio_path.display(), e);
        }
        if let Some(thumb) = &self.thumbnail_path {
            if let Err(e) = fs::remove_file(thumb) {
                log::warn!("Failed to remove {}: {}", thumb.display(), e);
            }
        }
        if let Err(e) = fs::remove_dir(&self.run_dir) {
            log::warn!("Failed to remove {}: {}", self.run_dir.display(), e);
        }
    }
}

/// Search-download-tag pipeline over a pluggable [`MediaSource`].
pub struct FetchPipeline {
    source: Arc<dyn MediaSource>,
    config: PipelineConfig,
}

impl FetchPipeline {
    /// Creates the pipeline and the download folder if it is missing.
    pub fn new(source: Arc<dyn MediaSource>, config: PipelineConfig) -> Result<Self, FetchError> {
        fs::create_dir_all(&config.download_dir).map_err(FetchError::Relocation)?;
        Ok(Self { source, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the pipeline on a blocking worker thread.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use dorasong::download::{FetchPipeline, PipelineConfig, YtDlpSource};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let pipeline = Arc::new(FetchPipeline::new(Arc::new(YtDlpSource::new()), PipelineConfig::from_env())?);
    /// let song = pipeline.fetch("Shape of You - Ed Sheeran", 50 * 1024 * 1024).await?;
    /// println!("{} - {}", song.artist, song.title);
    /// song.remove_files();
    /// # Ok(())
    /// # }
    /// ```
    pub async fn fetch(self: &Arc<Self>, query: &str, max_size_bytes: u64) -> Result<FetchResult, FetchError> {
        let pipeline = Arc::clone(self);
        let query = query.to_string();

        tokio::task::spawn_blocking(move || pipeline.fetch_blocking(&query, max_size_bytes))
            .await
            .map_err(|e| FetchError::Worker(e.to_string()))?
    }

    /// Runs the whole pipeline on the current thread.
    pub fn fetch_blocking(&self, query: &str, max_size_bytes: u64) -> Result<FetchResult, FetchError> {
        let workspace = ScratchWorkspace::create_in(&self.config.scratch_root).map_err(FetchError::Workspace)?;
        log::info!(
            "Fetching '{}' via {} in {}",
            query,
            self.source.name(),
            workspace.path().display()
        );

        let info = self.source.search_and_download(query, workspace.path())?;

        let audio = workspace
            .find_file(&[config::download::AUDIO_FORMAT])
            .map_err(FetchError::Workspace)?
            .ok_or(FetchError::ArtifactMissing)?;

        let downloaded_size = enforce_size_limit(&audio, max_size_bytes)?;
        log::debug!("Artifact {} is {:.1} MiB", audio.display(), bytes_to_mib(downloaded_size));

        let title = info.title.unwrap_or_else(|| query.to_string());
        let artist = info
            .artist
            .unwrap_or_else(|| config::download::UNKNOWN_ARTIST.to_string());

        let thumbnail = thumbnail::resolve_thumbnail(
            &workspace,
            info.thumbnail_url.as_deref(),
            self.config.thumbnail_timeout,
        );

        tags::write_title_artist(&audio, &title, &artist)?;

        if let Some(thumb) = &thumbnail {
            self.embed_cover(&audio, thumb)?;
        }

        // Tags and artwork grow the file; the limit applies to what is delivered
        let size_bytes = enforce_size_limit(&audio, max_size_bytes)?;

        let (run_dir, audio_path, thumbnail_path) = self.relocate(&audio, thumbnail.as_deref(), &title)?;
        log::info!(
            "Fetched '{}' by '{}' ({:.1} MiB) -> {}",
            title,
            artist,
            bytes_to_mib(size_bytes),
            audio_path.display()
        );

        Ok(FetchResult {
            audio_path,
            title,
            artist,
            thumbnail_path,
            size_bytes,
            run_dir,
        })
    }

    fn embed_cover(&self, audio: &Path, thumb: &Path) -> Result<(), FetchError> {
        let result = fs::read(thumb)
            .map_err(|e| e.to_string())
            .and_then(|image| tags::embed_cover_art(audio, &image).map_err(|e| e.to_string()));

        match (result, self.config.artwork_policy) {
            (Ok(()), _) => Ok(()),
            (Err(e), ArtworkPolicy::Tolerate) => {
                log::warn!("Skipping cover art for {}: {}", audio.display(), e);
                Ok(())
            }
            (Err(e), ArtworkPolicy::Fail) => Err(FetchError::ArtworkEmbedFailed(e)),
        }
    }

    /// Moves the audio (and copies the thumbnail) into a new per-run directory.
    ///
    /// File names come from the title, the directory name is unique per run, so
    /// two requests for the same song never touch each other's files.
    fn relocate(
        &self,
        audio: &Path,
        thumbnail: Option<&Path>,
        title: &str,
    ) -> Result<(PathBuf, PathBuf, Option<PathBuf>), FetchError> {
        let run_dir = self.config.download_dir.join(Uuid::new_v4().simple().to_string());
        fs::create_dir_all(&run_dir).map_err(FetchError::Relocation)?;

        let audio_path = run_dir.join(format!(
            "{}.{}",
            title_to_filename(title),
            config::download::AUDIO_FORMAT
        ));
        if let Err(e) = move_file(audio, &audio_path) {
            let _ = fs::remove_dir_all(&run_dir);
            return Err(FetchError::Relocation(e));
        }

        let thumbnail_path = thumbnail.and_then(|thumb| {
            let name = thumb.file_name()?;
            let dest = run_dir.join(name);
            match fs::copy(thumb, &dest) {
                Ok(_) => Some(dest),
                Err(e) => {
                    log::warn!("Failed to copy thumbnail {}: {}", thumb.display(), e);
                    None
                }
            }
        });

        Ok((run_dir, audio_path, thumbnail_path))
    }
}

/// Fails with `ArtifactTooLarge` if `path` exceeds `max_size_bytes`.
fn enforce_size_limit(path: &Path, max_size_bytes: u64) -> Result<u64, FetchError> {
    let size = fs::metadata(path).map_err(FetchError::Workspace)?.len();
    if size > max_size_bytes {
        log::warn!(
            "Artifact {} is {:.1} MiB, limit is {:.1} MiB",
            path.display(),
            bytes_to_mib(size),
            bytes_to_mib(max_size_bytes)
        );
        return Err(FetchError::ArtifactTooLarge {
            size_mib: bytes_to_mib(size),
            limit_mib: bytes_to_mib(max_size_bytes),
        });
    }
    Ok(size)
}

/// Renames `from` to `to`, copying across filesystems when rename cannot.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            log::debug!("rename {} failed ({}), copying instead", from.display(), rename_err);
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enforce_size_limit_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        fs::write(&path, vec![0u8; 1024]).unwrap();

        assert_eq!(enforce_size_limit(&path, 1024).unwrap(), 1024);
        let err = enforce_size_limit(&path, 1023).unwrap_err();
        assert!(matches!(err, FetchError::ArtifactTooLarge { .. }));
    }

    #[test]
    fn test_move_file() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("from.mp3");
        let to = dir.path().join("to.mp3");
        fs::write(&from, b"abc").unwrap();

        move_file(&from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"abc");
    }

    struct NoopSource;

    impl MediaSource for NoopSource {
        fn name(&self) -> &str {
            "noop"
        }

        fn search_and_download(
            &self,
            _query: &str,
            _workspace: &Path,
        ) -> Result<crate::download::source::MediaInfo, FetchError> {
            Ok(Default::default())
        }
    }

    fn pipeline_with(policy: ArtworkPolicy, root: &Path) -> FetchPipeline {
        let config = PipelineConfig::new(root.join("downloads"), root.join("scratch")).with_artwork_policy(policy);
        FetchPipeline::new(Arc::new(NoopSource), config).unwrap()
    }

    #[test]
    fn test_unreadable_thumbnail_is_tolerated_by_default() {
        let root = tempfile::tempdir().unwrap();
        let audio = root.path().join("a.mp3");
        fs::write(&audio, [0xFF, 0xFB, 0x90, 0x64]).unwrap();

        let pipeline = pipeline_with(ArtworkPolicy::Tolerate, root.path());
        assert!(pipeline.embed_cover(&audio, &root.path().join("gone.jpg")).is_ok());
    }

    #[test]
    fn test_unreadable_thumbnail_fails_under_strict_policy() {
        let root = tempfile::tempdir().unwrap();
        let audio = root.path().join("a.mp3");
        fs::write(&audio, [0xFF, 0xFB, 0x90, 0x64]).unwrap();

        let pipeline = pipeline_with(ArtworkPolicy::Fail, root.path());
        let err = pipeline.embed_cover(&audio, &root.path().join("gone.jpg")).unwrap_err();
        assert!(matches!(err, FetchError::ArtworkEmbedFailed(_)));
    }

    #[test]
    fn test_new_creates_download_dir() {
        let root = tempfile::tempdir().unwrap();
        let pipeline = pipeline_with(ArtworkPolicy::default(), root.path());
        assert!(pipeline.config().download_dir.is_dir());
    }

    #[test]
    fn test_default_artwork_policy_tolerates() {
        let config = PipelineConfig::new("/tmp/a", "/tmp/b");
        assert_eq!(config.artwork_policy, ArtworkPolicy::Tolerate);
        assert_eq!(config.thumbnail_timeout, Duration::from_secs(15));
    }
}
