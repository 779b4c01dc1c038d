//! File storage for uploaded résumés.
//!
//! Records keep only the storage key (`resumes/<uuid>.<ext>`); the bytes live in
//! a `FileStorage` backend selected at startup. `AppState` carries it as
//! `Arc<dyn FileStorage>`.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;

pub mod local;
#[cfg(test)]
pub mod memory;
pub mod s3;

pub use local::LocalStorage;
pub use s3::S3Storage;

/// Namespace all résumé uploads are stored under.
pub const RESUME_PREFIX: &str = "resumes";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Where a stored file can be reached, handed to the extraction hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    pub key: String,
    /// Backend-specific address: a filesystem path or an `s3://bucket/key` URI.
    pub uri: String,
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Short backend name ("local", "s3").
    fn backend(&self) -> &'static str;

    async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>)
        -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Removes a file. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    fn locate(&self, key: &str) -> FileLocation;
}

/// Generates a collision-free key for an uploaded file: `resumes/<uuid-v4>.<ext>`.
///
/// The extension is whatever follows the last `.` of the original name, kept only
/// when it is non-empty, alphanumeric and at most 16 characters.
pub fn resume_upload_path(filename: &str) -> String {
    let token = Uuid::new_v4();
    match extension_of(filename) {
        Some(ext) => format!("{RESUME_PREFIX}/{token}.{ext}"),
        None => format!("{RESUME_PREFIX}/{token}"),
    }
}

/// Longest extension kept in a storage key.
const MAX_EXTENSION_LEN: usize = 16;

fn extension_of(filename: &str) -> Option<&str> {
    let (_, ext) = filename.rsplit_once('.')?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext)
}

/// Rejects keys that could escape the storage root.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if invalid {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Content type served for a stored key, by extension.
pub fn content_type_for(key: &str) -> &'static str {
    let ext = extension_of(key).map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => {
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        }
        Some("odt") => "application/vnd.oasis.opendocument.text",
        Some("rtf") => "application/rtf",
        Some("txt") => "text/plain; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_upload_path_keeps_extension() {
        let key = resume_upload_path("Jane Doe CV.pdf");
        assert!(key.starts_with("resumes/"));
        assert!(key.ends_with(".pdf"));
        let token = key
            .trim_start_matches("resumes/")
            .trim_end_matches(".pdf");
        assert!(Uuid::parse_str(token).is_ok(), "token was {token}");
    }

    #[test]
    fn test_overlong_extension_dropped() {
        let key = resume_upload_path(&format!("a.{}", "x".repeat(300)));
        let token = key.trim_start_matches("resumes/");
        assert!(Uuid::parse_str(token).is_ok(), "key was {key}");

        let key = resume_upload_path(&format!("a.{}", "d".repeat(16)));
        assert!(key.ends_with(&format!(".{}", "d".repeat(16))));
    }

    #[test]
    fn test_upload_path_uses_last_extension() {
        assert!(resume_upload_path("archive.tar.gz").ends_with(".gz"));
    }

    #[test]
    fn test_upload_path_without_extension() {
        let key = resume_upload_path("resume");
        assert!(!key.contains('.'));
        assert!(resume_upload_path("weird.").split('/').nth(1).is_some_and(|s| !s.contains('.')));
        assert!(!resume_upload_path("evil.p/df").ends_with("p/df"));
    }

    #[test]
    fn test_same_filename_never_collides() {
        let keys: HashSet<String> = (0..500).map(|_| resume_upload_path("cv.pdf")).collect();
        assert_eq!(keys.len(), 500);
    }

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("resumes/abc.pdf").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("resumes/../../x").is_err());
        assert!(validate_key("/abs/path").is_err());
        assert!(validate_key("resumes//x").is_err());
        assert!(validate_key("resumes\\x").is_err());
        assert!(validate_key("").is_err());
    }

    #[test]
    fn test_content_type_by_extension() {
        assert_eq!(content_type_for("resumes/a.PDF"), "application/pdf");
        assert_eq!(content_type_for("resumes/a"), "application/octet-stream");
        assert_eq!(content_type_for("resumes/a.jpeg"), "image/jpeg");
    }
}
