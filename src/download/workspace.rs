//! Per-invocation scratch directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated temporary directory owned by exactly one pipeline run.
///
/// The directory is removed when the workspace is dropped, on every exit path
/// of the pipeline including `?` returns and panics unwinding through it.
pub struct ScratchWorkspace {
    path: PathBuf,
    dir: Option<TempDir>,
}

impl ScratchWorkspace {
    /// Creates a fresh `songdl_*` directory under `root`.
    pub fn create_in(root: &Path) -> io::Result<Self> {
        fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new().prefix("songdl_").tempdir_in(root)?;
        let path = dir.path().to_path_buf();
        log::debug!("Created scratch workspace {}", path.display());
        Ok(Self { path, dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First regular file whose extension matches one of `extensions`
    /// (case-insensitive). Entries are visited in name order.
    pub fn find_file(&self, extensions: &[&str]) -> io::Result<Option<PathBuf>> {
        let mut entries: Vec<PathBuf> = fs::read_dir(&self.path)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        entries.sort();

        Ok(entries.into_iter().find(|path| has_extension(path, extensions)))
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                log::warn!("Failed to remove scratch workspace {}: {}", self.path.display(), e);
                // TempDir::close consumed the handle; try once more by path
                let _ = fs::remove_dir_all(&self.path);
            }
        }
    }
}

/// True if `path` ends in one of `extensions`, ignoring case.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = {
            let workspace = ScratchWorkspace::create_in(root.path()).unwrap();
            fs::write(workspace.path().join("a.mp3"), b"data").unwrap();
            workspace.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_find_file_case_insensitive() {
        let root = tempfile::tempdir().unwrap();
        let workspace = ScratchWorkspace::create_in(root.path()).unwrap();
        fs::write(workspace.path().join("song.webm"), b"x").unwrap();
        fs::write(workspace.path().join("Song.MP3"), b"x").unwrap();

        let found = workspace.find_file(&["mp3"]).unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "Song.MP3");
        assert!(workspace.find_file(&["png"]).unwrap().is_none());
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("/a/b.JPEG"), &["jpg", "jpeg"]));
        assert!(!has_extension(Path::new("/a/b"), &["jpg"]));
    }
}
