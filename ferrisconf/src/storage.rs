//! Artifact storage.
//!
//! Backups and rendered configurations are plain-text files at caller-chosen
//! paths. Writes always overwrite and default to owner-only permissions;
//! concurrent writers to the same path are not coordinated.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use tokio::io::AsyncWriteExt;

use crate::error::FatalError;

/// Storage collaborator for configuration artifacts.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Create `path` and all missing parents. Idempotent.
    async fn ensure_dir(&self, path: &Path) -> io::Result<()>;

    /// Write `contents` to `path`, replacing anything already there.
    async fn write_file(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Check whether `path` exists.
    ///
    /// An error means existence could not be determined (e.g. permission
    /// denied on a parent), not that the path is missing.
    async fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Read `path` into a string.
    async fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Permission bits for written artifacts unless overridden.
pub const DEFAULT_FILE_MODE: u32 = 0o600;

/// Local filesystem storage backed by `tokio::fs`.
///
/// Files are written to a sibling temporary file and renamed over the
/// target, so a failed write never leaves a truncated artifact behind.
#[derive(Debug, Clone, Copy)]
pub struct FsStorage {
    /// Unix permission bits applied to written files; `None` leaves them to
    /// the process umask.
    mode: Option<u32>,
}

impl Default for FsStorage {
    fn default() -> Self {
        Self {
            mode: Some(DEFAULT_FILE_MODE),
        }
    }
}

impl FsStorage {
    /// Create storage that writes owner-only files ([`DEFAULT_FILE_MODE`]).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage that sets `mode` on every written file.
    ///
    /// Ignored on non-unix targets.
    pub fn with_mode(mode: u32) -> Self {
        Self { mode: Some(mode) }
    }

    /// Create storage that leaves file permissions to the process umask.
    pub fn umask() -> Self {
        Self { mode: None }
    }

    /// Configured permission bits.
    pub fn mode(&self) -> Option<u32> {
        self.mode
    }

    async fn write_temp(&self, temp: &Path, contents: &str) -> io::Result<()> {
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        if let Some(mode) = self.mode {
            options.mode(mode);
        }

        let mut file = options.open(temp).await?;
        file.write_all(contents.as_bytes()).await?;
        file.sync_all().await?;

        // `mode` only applies on creation; a stale temp file needs an explicit chmod.
        #[cfg(unix)]
        if let Some(mode) = self.mode {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(temp, std::fs::Permissions::from_mode(mode)).await?;
        }

        Ok(())
    }
}

/// `<dir>/.<name>.tmp` next to `path`.
fn temp_path(path: &Path) -> io::Result<PathBuf> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("`{}` has no file name", path.display()),
        )
    })?;

    let mut temp = OsString::from(".");
    temp.push(name);
    temp.push(".tmp");
    Ok(path.with_file_name(temp))
}

#[async_trait]
impl Storage for FsStorage {
    async fn ensure_dir(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn write_file(&self, path: &Path, contents: &str) -> io::Result<()> {
        let temp = temp_path(path)?;

        let written = match self.write_temp(&temp, contents).await {
            Ok(()) => tokio::fs::rename(&temp, path).await,
            Err(e) => Err(e),
        };

        if written.is_err() {
            if let Err(e) = tokio::fs::remove_file(&temp).await {
                debug!("Failed to remove {}: {}", temp.display(), e);
            }
        }

        written
    }

    async fn exists(&self, path: &Path) -> io::Result<bool> {
        tokio::fs::try_exists(path).await
    }

    async fn read_to_string(&self, path: &Path) -> io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}

/// Create the parent directory of `path`, then overwrite `path` with `contents`.
pub(crate) async fn persist(
    storage: &dyn Storage,
    path: &Path,
    contents: &str,
) -> Result<(), FatalError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        storage
            .ensure_dir(parent)
            .await
            .map_err(|source| FatalError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    storage
        .write_file(path, contents)
        .await
        .map_err(|source| FatalError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_creates_parents_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site-a").join("r1").join("running.cfg");
        let storage = FsStorage::new();

        persist(&storage, &path, "hostname r1\nntp server 10.0.0.1\n")
            .await
            .unwrap();
        persist(&storage, &path, "hostname r1\n").await.unwrap();

        assert!(storage.exists(&path).await.unwrap());
        assert_eq!(
            storage.read_to_string(&path).await.unwrap(),
            "hostname r1\n"
        );

        // Only the artifact is left behind.
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![OsString::from("running.cfg")]);
    }

    #[tokio::test]
    async fn test_exists_missing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsStorage::new();
        assert!(!storage.exists(&dir.path().join("nope.cfg")).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_target_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory cannot be replaced by a file.
        let path = dir.path().join("r1.cfg");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();

        let storage = FsStorage::new();
        assert!(storage.write_file(&path, "hostname r1\n").await.is_err());

        assert!(path.join("keep").exists());
        assert!(!dir.path().join(".r1.cfg.tmp").exists());
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path(Path::new("backups/r1.cfg")).unwrap(),
            PathBuf::from("backups/.r1.cfg.tmp")
        );
        assert_eq!(
            temp_path(Path::new("/")).unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_default_mode_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r1.cfg");

        FsStorage::default().write_file(&path, "hostname r1\n").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, DEFAULT_FILE_MODE);
        assert_eq!(FsStorage::umask().mode(), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_write_file_applies_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r1.cfg");
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let storage = FsStorage::with_mode(0o640);
        storage.write_file(&path, "new\n").await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
    }
}
