//! The `ObjectStore` trait for binary note files, plus key helpers.
//!
//! Keys are relative, `/`-separated paths of the form
//! `{user_id}/{unix_millis}-{tag}-{file_name}`, where `tag` is eight random
//! hex digits. Backends map them onto whatever storage they use;
//! [`validate_key`] guards against traversal.

use std::future::Future;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, store::StoreError};

const MAX_FILE_NAME: usize = 100;

/// Metadata returned after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
  pub key:          String,
  /// SHA-256 hex digest of the stored bytes.
  pub content_hash: String,
  pub size:         u64,
  pub content_type: String,
}

/// Abstraction over a binary object store with public URLs.
pub trait ObjectStore: Send + Sync {
  type Error: StoreError;

  /// Store `data` under `key`. A taken key is a conflict.
  fn put(
    &self,
    key: String,
    data: Bytes,
    content_type: String,
  ) -> impl Future<Output = Result<StoredObject, Self::Error>> + Send + '_;

  /// Fetch the bytes stored under `key`. Returns `None` if absent.
  fn get(
    &self,
    key: String,
  ) -> impl Future<Output = Result<Option<Bytes>, Self::Error>> + Send + '_;

  /// Remove the object under `key`. Returns `false` if nothing was there.
  fn delete(
    &self,
    key: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The public URL clients use to view or download `key`.
  fn public_url(&self, key: &str) -> String;
}

/// Reject keys that are empty, absolute, or contain `.`/`..`/empty segments
/// or backslashes.
pub fn validate_key(key: &str) -> Result<()> {
  let bad = key.is_empty()
    || key.starts_with('/')
    || key.contains('\\')
    || key
      .split('/')
      .any(|seg| seg.is_empty() || seg == "." || seg == "..");
  if bad {
    return Err(Error::InvalidObjectKey(key.to_owned()));
  }
  Ok(())
}

/// Replace anything outside `[A-Za-z0-9._-]` with `_` and cap the length.
pub fn sanitize_file_name(name: &str) -> String {
  let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
  let cleaned: String = base
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
        c
      } else {
        '_'
      }
    })
    .take(MAX_FILE_NAME)
    .collect();
  let trimmed = cleaned.trim_matches('.');
  if trimmed.is_empty() {
    "file.pdf".to_owned()
  } else {
    trimmed.to_owned()
  }
}

/// Build the storage key for a user's upload. The random tag keeps two
/// uploads of one file name within the same millisecond apart.
pub fn object_key(user_id: Uuid, at: DateTime<Utc>, file_name: &str) -> String {
  let tag = Uuid::new_v4().simple().to_string();
  format!(
    "{user_id}/{}-{}-{}",
    at.timestamp_millis(),
    &tag[..8],
    sanitize_file_name(file_name)
  )
}

/// The final path segment of a key, used as a download file name.
pub fn key_file_name(key: &str) -> &str { key.rsplit('/').next().unwrap_or(key) }

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn keys_are_scoped_by_user_and_time() {
    let user = Uuid::nil();
    let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    let key = object_key(user, at, "Unit 3 notes.pdf");
    let rest = key
      .strip_prefix("00000000-0000-0000-0000-000000000000/1700000000123-")
      .unwrap();
    let (tag, name) = rest.split_once('-').unwrap();
    assert_eq!(tag.len(), 8);
    assert!(tag.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(name, "Unit_3_notes.pdf");
  }

  #[test]
  fn same_name_in_same_millisecond_gets_distinct_keys() {
    let user = Uuid::new_v4();
    let at = Utc::now();
    let first = object_key(user, at, "os.pdf");
    let second = object_key(user, at, "os.pdf");
    assert_ne!(first, second);
  }

  #[test]
  fn generated_keys_validate() {
    let key = object_key(Uuid::new_v4(), Utc::now(), "../../etc/passwd");
    assert!(validate_key(&key).is_ok());
    assert!(key.ends_with("-passwd"));
  }

  #[test]
  fn traversal_is_rejected() {
    for key in ["", "/abs.pdf", "a/../b.pdf", "a//b.pdf", "./a.pdf", "a\\b.pdf"] {
      assert!(validate_key(key).is_err(), "{key:?} should be rejected");
    }
    assert!(validate_key("user/123-notes.pdf").is_ok());
  }

  #[test]
  fn sanitize_never_returns_empty() {
    assert_eq!(sanitize_file_name("..."), "file.pdf");
    assert_eq!(sanitize_file_name("C:\\docs\\os.pdf"), "os.pdf");
  }

  #[test]
  fn file_name_is_last_segment() {
    assert_eq!(key_file_name("u/1-os.pdf"), "1-os.pdf");
  }
}
