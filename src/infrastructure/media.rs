// Media store - uploaded post images under the media root

use once_cell::sync::Lazy;
use rand::distr::Alphanumeric;
use rand::Rng;
use regex::Regex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

pub const MEDIA_URL: &str = "/media/";
const POST_IMAGE_DIR: &str = "posts";
const MAX_NAME_ATTEMPTS: usize = 16;

static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid filename regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Gif,
    Png,
    Jpeg,
    Webp,
    Bmp,
}

impl ImageKind {
    /// Sniffs the file signature; extensions and declared content types are ignored.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(ImageKind::Gif)
        } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageKind::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpeg)
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(ImageKind::Webp)
        } else if data.starts_with(b"BM") && data.len() > 14 {
            Some(ImageKind::Bmp)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Gif => "gif",
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
            ImageKind::Webp => "webp",
            ImageKind::Bmp => "bmp",
        }
    }
}

/// A file taken from a form submission, not yet validated.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Public URL for a stored media path such as `posts/small.gif`.
pub fn media_url(path: &str) -> String {
    format!("{}{}", MEDIA_URL, path)
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes an image under `posts/` and returns its path relative to the
    /// media root. Existing files are never overwritten: a random suffix is
    /// added to the name instead.
    pub async fn save_post_image(&self, upload: &ImageUpload, kind: ImageKind) -> AppResult<String> {
        let dir = self.root.join(POST_IMAGE_DIR);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create {}: {}", dir.display(), e)))?;

        let (stem, extension) = split_filename(&upload.filename, kind);
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{}.{}", stem, extension)
            } else {
                format!("{}_{}.{}", stem, random_suffix(), extension)
            };

            let path = dir.join(&name);
            let file = fs::OpenOptions::new().write(true).create_new(true).open(&path).await;
            let mut file = match file {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(AppError::Internal(format!(
                        "Failed to open {}: {}",
                        path.display(),
                        e
                    )))
                }
            };
            file.write_all(&upload.data)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to write {}: {}", path.display(), e)))?;
            file.flush()
                .await
                .map_err(|e| AppError::Internal(format!("Failed to write {}: {}", path.display(), e)))?;

            let relative = format!("{}/{}", POST_IMAGE_DIR, name);
            info!("Stored upload as {}", relative);
            return Ok(relative);
        }

        Err(AppError::Internal(format!(
            "No free file name for upload {}",
            upload.filename
        )))
    }

    /// Deletes a stored file given its media-relative path. Already gone is fine.
    pub async fn remove(&self, path: &str) {
        let full = self.root.join(path);
        match fs::remove_file(&full).await {
            Ok(()) => info!("Removed upload {}", path),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", full.display(), e),
        }
    }
}

/// Sanitized stem plus extension; falls back to the detected kind's extension.
fn split_filename(filename: &str, kind: ImageKind) -> (String, String) {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
    let (stem, extension) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, ext.to_ascii_lowercase()),
        _ => (base, kind.extension().to_string()),
    };

    let stem = UNSAFE_FILENAME_CHARS.replace_all(stem, "_");
    let stem = stem.trim_matches('.');
    let stem = if stem.is_empty() { "image" } else { stem };

    let extension = UNSAFE_FILENAME_CHARS.replace_all(&extension, "").to_string();
    let extension = if extension.is_empty() {
        kind.extension().to_string()
    } else {
        extension
    };
    (stem.to_string(), extension)
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_GIF: &[u8] = b"GIF89a\x02\x00\x01\x00\x80\x00\x00\x00\x00\x00\xFF\xFF\xFF\x21\xF9\x04\x00\x00\x00\x00\x00\x2C\x00\x00\x00\x00\x02\x00\x01\x00\x00\x02\x02\x0C\x0A\x00\x3B";

    #[test]
    fn test_detect() {
        assert_eq!(ImageKind::detect(SMALL_GIF), Some(ImageKind::Gif));
        assert_eq!(ImageKind::detect(b"\x89PNG\r\n\x1a\n...."), Some(ImageKind::Png));
        assert_eq!(ImageKind::detect(b"plain text"), None);
        assert_eq!(ImageKind::detect(b""), None);
    }

    #[test]
    fn test_split_filename() {
        assert_eq!(
            split_filename("small.gif", ImageKind::Gif),
            ("small".to_string(), "gif".to_string())
        );
        assert_eq!(
            split_filename("../../etc/my photo.PNG", ImageKind::Png),
            ("my_photo".to_string(), "png".to_string())
        );
        assert_eq!(
            split_filename("noext", ImageKind::Jpeg),
            ("noext".to_string(), "jpg".to_string())
        );
        assert_eq!(
            split_filename("фото.gif", ImageKind::Gif),
            ("_".to_string(), "gif".to_string())
        );
    }

    #[test]
    fn test_media_url() {
        assert_eq!(media_url("posts/small.gif"), "/media/posts/small.gif");
    }

    #[tokio::test]
    async fn test_save_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let upload = ImageUpload {
            filename: "small.gif".to_string(),
            data: SMALL_GIF.to_vec(),
        };

        let first = store.save_post_image(&upload, ImageKind::Gif).await.unwrap();
        let second = store.save_post_image(&upload, ImageKind::Gif).await.unwrap();
        assert_eq!(first, "posts/small.gif");
        assert_ne!(first, second);
        assert!(second.starts_with("posts/small_") && second.ends_with(".gif"));

        let stored = std::fs::read(dir.path().join(&first)).unwrap();
        assert_eq!(stored, SMALL_GIF);
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let upload = ImageUpload {
            filename: "small.gif".to_string(),
            data: SMALL_GIF.to_vec(),
        };

        let path = store.save_post_image(&upload, ImageKind::Gif).await.unwrap();
        store.remove(&path).await;
        assert!(!dir.path().join(&path).exists());
        store.remove(&path).await;
    }
}
