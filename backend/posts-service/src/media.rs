/// Storage for uploaded post images
///
/// Files are stored under `posts/` with a unique prefix so two uploads with
/// the same name never collide. Posts keep the returned relative key; the
/// public URL is derived from it at render time.
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::forms::UploadedFile;
use crate::models::POST_IMAGE_DIR;

const MAX_STORED_NAME_CHARS: usize = 100;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
}

#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Persist an upload and return its storage key
    async fn save(&self, file: &UploadedFile) -> Result<String, MediaError>;

    /// Public URL of a stored key
    fn url(&self, key: &str) -> String;
}

/// Media storage on the local filesystem
#[derive(Debug, Clone)]
pub struct FsMediaStorage {
    root: PathBuf,
    url_prefix: String,
    max_bytes: usize,
}

impl FsMediaStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
            max_bytes,
        }
    }
}

#[async_trait]
impl MediaStorage for FsMediaStorage {
    async fn save(&self, file: &UploadedFile) -> Result<String, MediaError> {
        if file.data.len() > self.max_bytes {
            return Err(MediaError::TooLarge {
                size: file.data.len(),
                limit: self.max_bytes,
            });
        }

        let key = unique_key(&file.filename);
        let path = self.root.join(&key);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, &file.data).await?;

        tracing::debug!(key = %key, bytes = file.data.len(), "stored upload");
        Ok(key)
    }

    fn url(&self, key: &str) -> String {
        media_url(&self.url_prefix, key)
    }
}

/// Join a URL prefix and a storage key with exactly one slash
pub fn media_url(prefix: &str, key: &str) -> String {
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}

fn unique_key(filename: &str) -> String {
    format!(
        "{}/{}-{}",
        POST_IMAGE_DIR,
        Uuid::new_v4().simple(),
        sanitize_filename(filename)
    )
}

/// Base name of an uploaded file reduced to URL- and path-safe characters
fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STORED_NAME_CHARS)
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, data: &[u8]) -> UploadedFile {
        UploadedFile {
            filename: name.to_string(),
            content_type: Some("image/gif".into()),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("small.gif"), "small.gif");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\tmp\\cat pic.png"), "cat_pic.png");
        assert_eq!(sanitize_filename("картинка.gif"), "________.gif");
        assert_eq!(sanitize_filename(""), "upload");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
    }

    #[test]
    fn test_media_url() {
        assert_eq!(media_url("/media/", "posts/a.gif"), "/media/posts/a.gif");
        assert_eq!(media_url("/media", "/posts/a.gif"), "/media/posts/a.gif");
    }

    #[tokio::test]
    async fn test_save_writes_under_posts() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsMediaStorage::new(dir.path(), "/media/", 1024);

        let key = storage.save(&upload("small.gif", crate::forms::SMALL_GIF)).await.unwrap();

        assert!(key.starts_with("posts/"));
        assert!(key.ends_with("-small.gif"));
        assert_eq!(std::fs::read(dir.path().join(&key)).unwrap(), crate::forms::SMALL_GIF);
        assert_eq!(storage.url(&key), format!("/media/{}", key));
    }

    #[tokio::test]
    async fn test_same_name_gets_distinct_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsMediaStorage::new(dir.path(), "/media/", 1024);

        let first = storage.save(&upload("a.gif", b"1")).await.unwrap();
        let second = storage.save(&upload("a.gif", b"2")).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FsMediaStorage::new(dir.path(), "/media/", 4);

        let err = storage.save(&upload("a.gif", b"too large")).await.unwrap_err();
        assert!(matches!(err, MediaError::TooLarge { size: 9, limit: 4 }));
    }
}
