//! Storage backend abstraction for uploaded pictures.
//!
//! Uploads are content addressed: the key is the blake3 hash of the bytes
//! plus an extension derived from the MIME type, nested under two prefix
//! directories (`ab/cd/abcd...ef.png`). The key is what gets stored on the
//! profile row and is appended to `storage.public_url` when rendering.

pub mod local;

use async_trait::async_trait;

/// Storage operation errors.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error
    Io(std::io::Error),
    /// Upload refused before it reached the backend
    Rejected(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {}", e),
            StorageError::Rejected(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Trait for storage backends.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store a file under `key`, creating prefix directories as needed.
    async fn put_object(&self, data: Vec<u8>, key: &str) -> Result<(), StorageError>;

    /// Remove a file. Missing files are not an error.
    async fn delete_object(&self, key: &str) -> Result<(), StorageError>;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// URL a stored key is served under.
pub fn media_url(key: &str) -> String {
    format!(
        "{}/{}",
        crate::app_config::storage().public_url.trim_end_matches('/'),
        key
    )
}

/// Maps an accepted image MIME type to the extension used in keys.
pub fn image_extension(mime: &mime::Mime) -> Option<&'static str> {
    if mime.type_() != mime::IMAGE {
        return None;
    }
    match mime.subtype().as_str() {
        "jpeg" | "jpg" | "pjpeg" => Some("jpg"),
        "png" => Some("png"),
        "gif" => Some("gif"),
        "webp" => Some("webp"),
        _ => None,
    }
}

/// `ab/cd/{blake3}.{ext}`
pub fn content_key(data: &[u8], extension: &str) -> String {
    let hash = blake3::hash(data).to_hex();
    format!("{}/{}/{}.{}", &hash[0..2], &hash[2..4], hash, extension)
}

/// Checks type and size and returns the key the upload will be stored under.
pub fn prepare_image(
    data: &[u8],
    mime: Option<&mime::Mime>,
    max_bytes: usize,
) -> Result<String, StorageError> {
    if data.is_empty() {
        return Err(StorageError::Rejected("The submitted file is empty.".to_owned()));
    }
    if data.len() > max_bytes {
        return Err(StorageError::Rejected(format!(
            "Pictures may be at most {} MB.",
            max_bytes / (1024 * 1024)
        )));
    }
    let extension = mime.and_then(image_extension).ok_or_else(|| {
        StorageError::Rejected("Upload a JPEG, PNG, GIF or WebP image.".to_owned())
    })?;
    Ok(content_key(data, extension))
}

/// Storage backend configured by `[storage]`.
pub fn from_config(config: &crate::app_config::StorageConfig) -> Result<local::LocalStorage, StorageError> {
    local::LocalStorage::new(std::path::PathBuf::from(&config.local_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension(&mime::IMAGE_JPEG), Some("jpg"));
        assert_eq!(image_extension(&mime::IMAGE_PNG), Some("png"));
        assert_eq!(image_extension(&mime::IMAGE_SVG), None);
        assert_eq!(image_extension(&mime::TEXT_PLAIN), None);
    }

    #[test]
    fn test_content_key_is_stable() {
        let a = content_key(b"same bytes", "png");
        let b = content_key(b"same bytes", "png");
        assert_eq!(a, b);
        assert!(a.ends_with(".png"));
        assert_eq!(&a[0..2], &a[6..8]);
        assert_ne!(a, content_key(b"other bytes", "png"));
    }

    #[test]
    fn test_media_url() {
        assert_eq!(media_url("ab/cd/abcd.png"), "/media/ab/cd/abcd.png");
    }

    #[test]
    fn test_prepare_image_rejects() {
        assert!(matches!(
            prepare_image(b"", Some(&mime::IMAGE_PNG), 1024),
            Err(StorageError::Rejected(_))
        ));
        assert!(matches!(
            prepare_image(&[0u8; 2048], Some(&mime::IMAGE_PNG), 1024),
            Err(StorageError::Rejected(_))
        ));
        assert!(matches!(
            prepare_image(b"data", Some(&mime::TEXT_PLAIN), 1024),
            Err(StorageError::Rejected(_))
        ));
        assert!(prepare_image(b"data", Some(&mime::IMAGE_GIF), 1024).is_ok());
    }
}
