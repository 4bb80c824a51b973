//! Filesystem primitives with safe failure behavior.
//!
//! All mutation funnels through here: moves fall back to copy+delete across
//! filesystems, deletes are soft (moved into a backup tree under the data
//! source), and directory moves retry before falling back so a transient
//! lock does not immediately degrade a cheap rename into a full copy.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

/// Backup tree under the data source that receives soft-deleted files.
pub const BACKUP_FOLDER: &str = ".backup";

/// Bounded retry for move operations on possibly-locked files.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 5,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Zero-delay policy for tests.
    pub fn immediate() -> Self {
        RetryPolicy {
            attempts: 5,
            delay: Duration::ZERO,
        }
    }
}

/// Move a file, creating parent directories as needed. Falls back to
/// copy+delete when a plain rename is not possible (cross-device).
pub async fn move_file(src: &Path, dest: &Path) -> Result<()> {
    if src == dest {
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    match tokio::fs::rename(src, dest).await {
        Ok(()) => {
            debug!(src = %src.display(), dest = %dest.display(), "moved file");
            Ok(())
        }
        Err(rename_err) => {
            // cross-filesystem: copy then delete
            tokio::fs::copy(src, dest).await.with_context(|| {
                format!(
                    "moving {} to {} (rename: {rename_err})",
                    src.display(),
                    dest.display()
                )
            })?;
            tokio::fs::remove_file(src)
                .await
                .with_context(|| format!("removing {} after copy", src.display()))?;
            debug!(src = %src.display(), dest = %dest.display(), "moved file (copy+delete)");
            Ok(())
        }
    }
}

/// Copy a file (overwriting), creating parent directories as needed.
pub async fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    if src == dest {
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tokio::fs::copy(src, dest)
        .await
        .with_context(|| format!("copying {} to {}", src.display(), dest.display()))?;
    debug!(src = %src.display(), dest = %dest.display(), "copied file");
    Ok(())
}

/// Move a whole directory tree.
///
/// Tries a plain rename first, retrying per `retry` since a transient lock
/// (open file, virus scanner) often clears within seconds. Only after the
/// retries are exhausted does it fall back to a recursive copy + delete;
/// if that fails too the destination is left for the caller to abort on.
pub async fn move_directory(src: &Path, dest: &Path, retry: &RetryPolicy) -> Result<()> {
    if src == dest {
        return Ok(());
    }
    if !src.is_dir() {
        bail!("source {} is not a directory", src.display());
    }
    if dest.exists() {
        bail!("destination {} already exists", dest.display());
    }
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let mut last_err = None;
    for attempt in 1..=retry.attempts.max(1) {
        match tokio::fs::rename(src, dest).await {
            Ok(()) => {
                info!(src = %src.display(), dest = %dest.display(), "moved folder");
                return Ok(());
            }
            Err(e) => {
                debug!(
                    attempt,
                    error = %e,
                    src = %src.display(),
                    "folder rename did not work - waiting and trying again"
                );
                last_err = Some(e);
                if attempt < retry.attempts {
                    tokio::time::sleep(retry.delay).await;
                }
            }
        }
    }

    // cross-device or stubbornly locked: copy the tree, then delete the old
    warn!(
        src = %src.display(),
        dest = %dest.display(),
        "folder rename failed, falling back to copy+delete"
    );
    copy_dir_recursive(src, dest).await.with_context(|| {
        format!(
            "moving directory {} to {} (rename: {})",
            src.display(),
            dest.display(),
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )
    })?;
    tokio::fs::remove_dir_all(src)
        .await
        .with_context(|| format!("removing {} after copy", src.display()))?;
    info!(src = %src.display(), dest = %dest.display(), "moved folder (copy+delete)");
    Ok(())
}

async fn copy_dir_recursive(src: &Path, dest: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dest).await?;
    let mut entries = tokio::fs::read_dir(src).await?;
    while let Some(entry) = entries.next_entry().await? {
        let target = dest.join(entry.file_name());
        if entry.file_type().await?.is_dir() {
            Box::pin(copy_dir_recursive(&entry.path(), &target)).await?;
        } else {
            tokio::fs::copy(entry.path(), &target).await?;
        }
    }
    Ok(())
}

/// Soft-delete a file by moving it into the data source's backup tree,
/// keeping its relative location: `<ds>/.backup/<relative path>`.
pub async fn delete_with_backup(file: &Path, data_source: &Path) -> Result<()> {
    let relative = match file.strip_prefix(data_source) {
        Ok(rel) => rel,
        Err(_) => bail!(
            "refusing to delete {}: not below data source {}",
            file.display(),
            data_source.display()
        ),
    };
    if file.is_dir() {
        bail!("refusing to delete {}: is a directory", file.display());
    }

    let backup = data_source.join(BACKUP_FOLDER).join(relative);
    if let Some(parent) = backup.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    // a previous backup of the same name gets replaced
    let _ = tokio::fs::remove_file(&backup).await;
    move_file(file, &backup).await
}

/// Remove `path` if it is an empty directory. Returns whether it was
/// removed.
pub async fn remove_dir_if_empty(path: &Path) -> bool {
    let Ok(mut entries) = tokio::fs::read_dir(path).await else {
        return false;
    };
    match entries.next_entry().await {
        Ok(None) => match tokio::fs::remove_dir(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed empty directory");
                true
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "could not remove directory");
                false
            }
        },
        _ => false,
    }
}

/// `child` relative to `parent`, or `child` unchanged when not below it.
pub fn relative_to(parent: &Path, child: &Path) -> PathBuf {
    child
        .strip_prefix(parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| child.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn move_file_creates_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("a.txt");
        tokio::fs::write(&src, b"x").await.expect("write");
        let dest = dir.path().join("sub/dir/b.txt");

        move_file(&src, &dest).await.expect("move");
        assert!(!src.exists());
        assert!(dest.exists());
    }

    #[tokio::test]
    async fn move_directory_renames_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("old");
        tokio::fs::create_dir_all(src.join("nested")).await.expect("mkdir");
        tokio::fs::write(src.join("nested/file.txt"), b"x").await.expect("write");
        let dest = dir.path().join("new");

        move_directory(&src, &dest, &RetryPolicy::immediate())
            .await
            .expect("move");
        assert!(!src.exists());
        assert!(dest.join("nested/file.txt").exists());
    }

    #[tokio::test]
    async fn move_directory_refuses_existing_destination() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("old");
        let dest = dir.path().join("new");
        tokio::fs::create_dir_all(&src).await.expect("mkdir");
        tokio::fs::create_dir_all(&dest).await.expect("mkdir");

        let result = move_directory(&src, &dest, &RetryPolicy::immediate()).await;
        assert!(result.is_err());
        assert!(src.exists());
    }

    #[tokio::test]
    async fn delete_with_backup_preserves_relative_location() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ds = dir.path();
        let file = ds.join("Movie/poster.jpg");
        tokio::fs::create_dir_all(file.parent().expect("parent"))
            .await
            .expect("mkdir");
        tokio::fs::write(&file, b"img").await.expect("write");

        delete_with_backup(&file, ds).await.expect("delete");
        assert!(!file.exists());
        assert!(ds.join(".backup/Movie/poster.jpg").exists());
    }

    #[tokio::test]
    async fn delete_with_backup_rejects_paths_outside_the_datasource() {
        let dir = tempfile::tempdir().expect("tempdir");
        let other = tempfile::tempdir().expect("tempdir");
        let file = other.path().join("file.txt");
        tokio::fs::write(&file, b"x").await.expect("write");

        assert!(delete_with_backup(&file, dir.path()).await.is_err());
        assert!(file.exists());
    }

    #[tokio::test]
    async fn remove_dir_if_empty_only_removes_empty_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let empty = dir.path().join("empty");
        let full = dir.path().join("full");
        tokio::fs::create_dir_all(&empty).await.expect("mkdir");
        tokio::fs::create_dir_all(&full).await.expect("mkdir");
        tokio::fs::write(full.join("f"), b"x").await.expect("write");

        assert!(remove_dir_if_empty(&empty).await);
        assert!(!remove_dir_if_empty(&full).await);
        assert!(full.exists());
    }
}
