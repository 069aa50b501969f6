use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info};

use crate::error::FileServerError;
use crate::etag::{self, ETag};
use crate::locks::{PathGuard, PathLocks};
use crate::path::RelativePath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Direct children of a directory, base names only, in OS iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    pub files: Vec<String>,
    pub directories: Vec<String>,
}

/// Filesystem access rooted at one directory.
///
/// Every method re-reads the OS state; nothing about an entry is cached.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    locks: PathLocks,
}

/// Make sure `path` can serve as a root: create it when missing, reject it
/// when it exists as anything but a directory. Returns the canonical path.
pub fn prepare_root(path: &Path) -> Result<PathBuf, FileServerError> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            return Err(FileServerError::RootNotDirectory(
                path.display().to_string(),
            ));
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Creating data directory: {}", path.display());
            std::fs::create_dir_all(path)?;
        }
        Err(e) => return Err(FileServerError::Io(e)),
    }

    Ok(path.canonicalize()?)
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: PathLocks::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of `rel` under the root.
    pub fn resolve(&self, rel: &RelativePath) -> PathBuf {
        rel.join_to(&self.root)
    }

    /// Serialize access to one path for the lifetime of the returned guard.
    pub async fn lock(&self, rel: &RelativePath) -> PathGuard {
        self.locks.lock(&self.resolve(rel)).await
    }

    /// What currently lives at `rel`, following symlinks. `None` when nothing does.
    pub async fn kind(&self, rel: &RelativePath) -> Result<Option<EntryKind>, FileServerError> {
        match fs::metadata(self.resolve(rel)).await {
            Ok(metadata) if metadata.is_dir() => Ok(Some(EntryKind::Directory)),
            Ok(_) => Ok(Some(EntryKind::File)),
            // A component of the path is a regular file (`/f/g` with `f` a file).
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(FileServerError::Io(e)),
        }
    }

    /// Partition the children of the directory at `rel` into files and directories.
    pub async fn list(&self, rel: &RelativePath) -> Result<DirListing, FileServerError> {
        let dir = self.resolve(rel);
        let mut listing = DirListing::default();
        let mut entries = fs::read_dir(&dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = match fs::metadata(entry.path()).await {
                Ok(metadata) => metadata.is_dir(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    // Removed between read_dir and stat.
                    if fs::symlink_metadata(entry.path()).await.is_err() {
                        continue;
                    }
                    // Dangling symlink: still listed, as a file.
                    false
                }
                Err(e) => return Err(FileServerError::Io(e)),
            };

            if is_dir {
                listing.directories.push(name);
            } else {
                listing.files.push(name);
            }
        }

        debug!(
            "Listed {}: {} files, {} directories",
            dir.display(),
            listing.files.len(),
            listing.directories.len()
        );
        Ok(listing)
    }

    /// Create the directory at `rel` and any missing parents. Succeeds when it already exists.
    pub async fn create_dir_all(&self, rel: &RelativePath) -> Result<(), FileServerError> {
        fs::create_dir_all(self.resolve(rel)).await?;
        Ok(())
    }

    /// Replace the file at `rel` with `data`, creating parent directories.
    ///
    /// The bytes go to a temp file beside the target which is then renamed
    /// over it, so readers see either the old or the new contents.
    pub async fn replace_file(&self, rel: &RelativePath, data: Bytes) -> Result<(), FileServerError> {
        if rel.is_root() {
            return Err(FileServerError::InvalidPath(
                "Cannot write a file at the root".to_string(),
            ));
        }
        if self.kind(rel).await? == Some(EntryKind::Directory) {
            return Err(FileServerError::NotAFile);
        }

        let target = self.resolve(rel);
        let parent = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&parent).await?;

        tokio::task::spawn_blocking(move || write_replacing(&parent, &target, &data))
            .await
            .map_err(|err| FileServerError::Io(io::Error::other(err.to_string())))??;
        Ok(())
    }

    /// Remove the entry at `rel`, recursively for directories.
    pub async fn remove(&self, rel: &RelativePath) -> Result<EntryKind, FileServerError> {
        let path = self.resolve(rel);
        match self.kind(rel).await? {
            None => Err(FileServerError::NotFound(rel.to_string())),
            Some(EntryKind::Directory) => {
                fs::remove_dir_all(&path).await?;
                Ok(EntryKind::Directory)
            }
            Some(EntryKind::File) => {
                fs::remove_file(&path).await?;
                Ok(EntryKind::File)
            }
        }
    }

    /// Open the file at `rel` for streaming, with its current length.
    pub async fn open(&self, rel: &RelativePath) -> Result<(fs::File, u64), FileServerError> {
        let file = fs::File::open(self.resolve(rel)).await?;
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    pub async fn etag(&self, rel: &RelativePath) -> ETag {
        etag::for_path(&self.resolve(rel)).await
    }
}

fn is_missing(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

fn write_replacing(parent: &Path, target: &Path, data: &[u8]) -> io::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".upload-")
        .tempfile_in(parent)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }

    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}
