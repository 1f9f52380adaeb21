//! Bucket/key blob store with public URLs.
//!
//! # Responsibility
//! - Store uploaded bytes under `<bucket>/<key>`.
//! - Derive the public URL a stored object is served from.
//!
//! # Invariants
//! - Buckets and keys are single path segments; traversal is rejected.
//! - Uploads never overwrite an existing object.

use crate::repo::now_epoch_ms;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const NOTE_IMAGES_BUCKET: &str = "note-images";

pub type BlobResult<T> = Result<T, BlobError>;

#[derive(Debug)]
pub enum BlobError {
    InvalidName(String),
    AlreadyExists { bucket: String, key: String },
    NotFound { bucket: String, key: String },
    Io(std::io::Error),
}

impl Display for BlobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(name) => write!(f, "invalid blob name `{name}`"),
            Self::AlreadyExists { bucket, key } => {
                write!(f, "object already exists: {bucket}/{key}")
            }
            Self::NotFound { bucket, key } => write!(f, "object not found: {bucket}/{key}"),
            Self::Io(err) => write!(f, "blob storage I/O failed: {err}"),
        }
    }
}

impl Error for BlobError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BlobError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Object storage seam.
pub trait BlobStore {
    /// Stores `bytes` and returns the stored object path (`key`).
    fn upload(&self, bucket: &str, key: &str, bytes: &[u8]) -> BlobResult<String>;
    fn read(&self, bucket: &str, key: &str) -> BlobResult<Vec<u8>>;
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Filesystem-backed store rooted at one directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    /// `public_base_url` is the origin objects are served from, e.g.
    /// `http://127.0.0.1:37240`.
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, key: &str) -> BlobResult<PathBuf> {
        validate_segment(bucket)?;
        validate_segment(key)?;
        Ok(self.root.join(bucket).join(key))
    }
}

impl BlobStore for FsBlobStore {
    fn upload(&self, bucket: &str, key: &str, bytes: &[u8]) -> BlobResult<String> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(BlobError::AlreadyExists {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                });
            }
            Err(err) => {
                error!(
                    "event=blob_upload module=storage status=error bucket={bucket} key={key} error={err}"
                );
                return Err(err.into());
            }
        };
        file.write_all(bytes)?;
        file.sync_all()?;

        info!(
            "event=blob_upload module=storage status=ok bucket={bucket} key={key} bytes={}",
            bytes.len()
        );
        Ok(key.to_string())
    }

    fn read(&self, bucket: &str, key: &str) -> BlobResult<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        fs::read(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => BlobError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => BlobError::Io(err),
        })
    }

    /// Segments are percent-encoded; the HTTP layer decodes them back.
    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/blobs/{}/{}",
            self.public_base_url,
            urlencoding::encode(bucket),
            urlencoding::encode(path)
        )
    }
}

/// Object key for an uploaded note image: `<epoch-ms>-<sanitized name>`.
pub fn image_object_key(file_name: &str, now_ms: i64) -> String {
    let sanitized = sanitize_filename::sanitize(file_name.trim());
    let name = if sanitized.trim().is_empty() {
        "image".to_string()
    } else {
        sanitized.replace(' ', "_")
    };
    format!("{now_ms}-{name}")
}

/// Stores an image in the note-images bucket and returns its public URL.
pub fn upload_note_image(
    store: &dyn BlobStore,
    file_name: &str,
    bytes: &[u8],
) -> BlobResult<String> {
    let key = image_object_key(file_name, now_epoch_ms());
    let path = store.upload(NOTE_IMAGES_BUCKET, &key, bytes)?;
    Ok(store.public_url(NOTE_IMAGES_BUCKET, &path))
}

fn validate_segment(segment: &str) -> BlobResult<()> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);
    if invalid {
        return Err(BlobError::InvalidName(segment.to_string()));
    }
    Ok(())
}
