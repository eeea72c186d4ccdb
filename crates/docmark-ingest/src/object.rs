//! Object store access: `get(bucket, key) -> (bytes, contentType)`.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use docmark_core::{Error, Result};

/// Raw object content plus the MIME type the store declares for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Trait for object store backends.
pub trait ObjectStore: Send + Sync {
    /// Fetch an object. Fails with `ObjectNotFound` or `Access`.
    fn get(&self, bucket: &str, key: &str) -> Result<StoredObject>;
}

/// Object store laid out on disk as `root/<bucket>/<key>`.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store an object (used by uploaders and tests).
    pub fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        Ok(())
    }

    /// Resolve an object path, refusing anything that escapes the bucket directory.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        if !is_plain_relative(bucket) || bucket.contains('/') || !is_plain_relative(key) {
            return Err(Error::Access(format!(
                "path traversal not allowed: {}/{}",
                bucket, key
            )));
        }
        Ok(self.root.join(bucket).join(key))
    }
}

impl ObjectStore for FsObjectStore {
    fn get(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        let path = self.object_path(bucket, key)?;
        let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => {
                Error::Access(format!("{}/{}: {}", bucket, key, e))
            }
            _ if path.is_dir() => Error::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            _ => Error::Io(e),
        })?;

        debug!("Fetched {}/{} ({} bytes)", bucket, key, bytes.len());
        Ok(StoredObject {
            content_type: Some(guess_content_type(key).to_string()),
            bytes,
        })
    }
}

fn is_plain_relative(part: &str) -> bool {
    !part.is_empty()
        && Path::new(part)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// MIME type for a key, by extension.
pub fn guess_content_type(key: &str) -> &'static str {
    match crate::policy::extension_of(key).as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("doc") => "application/msword",
        Some("html") | Some("htm") => "text/html",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}
