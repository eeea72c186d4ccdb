//! Content keys: the identifier a Result Record is stored under.

use sha2::{Digest, Sha256};

use docmark_core::{Error, Result};

/// Derive the content key (`fileHash`) from an object key.
///
/// Uploads are stored as `<fileHash>/<filename>`; the first path segment is the key.
pub fn content_key(object_key: &str) -> Result<&str> {
    match object_key.split_once('/') {
        Some((first, rest)) if !first.is_empty() && !rest.is_empty() => Ok(first),
        _ => Err(Error::BadRequest(format!(
            "object key '{}' is not of the form <fileHash>/<filename>",
            object_key
        ))),
    }
}

/// Compute SHA-256 content hash of raw bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_segment_is_key() {
        assert_eq!(content_key("h1/doc.pdf").unwrap(), "h1");
        assert_eq!(content_key("abc123/nested/dir/doc.pdf").unwrap(), "abc123");
    }

    #[test]
    fn test_keys_without_segment_rejected() {
        for key in ["doc.pdf", "/doc.pdf", "h1/", ""] {
            assert!(matches!(content_key(key), Err(Error::BadRequest(_))), "{}", key);
        }
    }

    #[test]
    fn test_content_hash_is_sha256_hex() {
        assert_eq!(
            content_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
