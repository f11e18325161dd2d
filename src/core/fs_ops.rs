// src/core/fs_ops.rs
//! File system operations for the uploads directory

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::app_log;

/// Public URL prefix under which the uploads directory is served.
pub const UPLOADS_ROUTE: &str = "/uploads";

pub struct FsOps;

impl FsOps {
    pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            app_log!(info, "Created directory: {}", path.display());
        }
        Ok(())
    }

    /// Allocate a fresh, collision-free path for an upload inside `uploads_root/category`.
    /// Returns the filesystem path and the URL it will be served from.
    pub async fn allocate_upload(
        uploads_root: &Path,
        category: &str,
        extension: &str,
    ) -> Result<(PathBuf, String)> {
        let dir = uploads_root.join(category);
        Self::ensure_dir_exists(&dir).await?;

        let file_name = format!("{}.{}", uuid::Uuid::new_v4().simple(), extension);
        let url = format!("{}/{}/{}", UPLOADS_ROUTE, category, file_name);
        Ok((dir.join(file_name), url))
    }

    /// Map an `/uploads/...` URL back to its file, refusing anything outside the root.
    pub fn upload_path_for_url(uploads_root: &Path, url: &str) -> Option<PathBuf> {
        let relative = url.strip_prefix(UPLOADS_ROUTE)?.trim_start_matches('/');
        if relative.is_empty() || relative.split('/').any(|part| part == ".." || part.is_empty()) {
            return None;
        }
        Some(uploads_root.join(relative))
    }

    /// Best-effort removal of uploads that were persisted before a later step failed.
    pub async fn remove_uploads(uploads_root: &Path, urls: &[String]) {
        for url in urls {
            let Some(path) = Self::upload_path_for_url(uploads_root, url) else {
                continue;
            };
            if let Err(e) = fs::remove_file(&path).await {
                app_log!(warn, "Failed to remove upload {}: {}", path.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_path_for_url() {
        let root = Path::new("/srv/uploads");
        assert_eq!(
            FsOps::upload_path_for_url(root, "/uploads/applications/a.pdf"),
            Some(PathBuf::from("/srv/uploads/applications/a.pdf"))
        );
        assert_eq!(FsOps::upload_path_for_url(root, "/uploads/../etc/passwd"), None);
        assert_eq!(FsOps::upload_path_for_url(root, "/static/a.pdf"), None);
        assert_eq!(FsOps::upload_path_for_url(root, "/uploads/"), None);
    }

    #[tokio::test]
    async fn test_allocate_upload_creates_category_dir() {
        let root = std::env::temp_dir().join(format!("jobboard-fs-{}", uuid::Uuid::new_v4()));
        let (path, url) = FsOps::allocate_upload(&root, "applications", "pdf")
            .await
            .unwrap();

        assert!(root.join("applications").is_dir());
        assert!(url.starts_with("/uploads/applications/"));
        assert!(url.ends_with(".pdf"));
        assert_eq!(FsOps::upload_path_for_url(&root, &url), Some(path));

        let _ = fs::remove_dir_all(&root).await;
    }
}
