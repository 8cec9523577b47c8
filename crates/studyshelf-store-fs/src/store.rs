//! [`FsObjectStore`], the local-directory implementation of [`ObjectStore`].

use std::{
  io::ErrorKind,
  path::{Path, PathBuf},
  sync::Arc,
};

use bytes::Bytes;
use sha2::{Digest, Sha256};
use studyshelf_core::object::{ObjectStore, StoredObject, validate_key};
use tokio::{fs, io::AsyncWriteExt as _};

use crate::{Error, Result};

/// Note files stored under `root`, served from `{public_base_url}/files/`.
///
/// Cloning is cheap.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
  inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
  root:            PathBuf,
  public_base_url: String,
}

impl FsObjectStore {
  /// Use (and create if needed) `root` as the storage directory.
  pub async fn open(
    root: impl AsRef<Path>,
    public_base_url: impl Into<String>,
  ) -> Result<Self> {
    let root = root.as_ref().to_path_buf();
    fs::create_dir_all(&root).await?;
    Ok(Self {
      inner: Arc::new(Inner {
        root,
        public_base_url: public_base_url.into().trim_end_matches('/').to_owned(),
      }),
    })
  }

  pub fn root(&self) -> &Path { &self.inner.root }

  fn path_for(&self, key: &str) -> Result<PathBuf> {
    validate_key(key)?;
    Ok(self.inner.root.join(key))
  }
}

/// Hex SHA-256 of `data`.
pub fn content_hash(data: &[u8]) -> String { hex::encode(Sha256::digest(data)) }

impl ObjectStore for FsObjectStore {
  type Error = Error;

  async fn put(
    &self,
    key: String,
    data: Bytes,
    content_type: String,
  ) -> Result<StoredObject> {
    let path = self.path_for(&key)?;
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).await?;
    }

    let mut file = match fs::OpenOptions::new()
      .write(true)
      .create_new(true)
      .open(&path)
      .await
    {
      Ok(f) => f,
      Err(e) if e.kind() == ErrorKind::AlreadyExists => {
        return Err(Error::AlreadyExists(key));
      }
      Err(e) => return Err(e.into()),
    };
    file.write_all(&data).await?;
    file.flush().await?;

    Ok(StoredObject {
      content_hash: content_hash(&data),
      size: data.len() as u64,
      key,
      content_type,
    })
  }

  async fn get(&self, key: String) -> Result<Option<Bytes>> {
    let path = self.path_for(&key)?;
    match fs::read(&path).await {
      Ok(data) => Ok(Some(Bytes::from(data))),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  async fn delete(&self, key: String) -> Result<bool> {
    let path = self.path_for(&key)?;
    match fs::remove_file(&path).await {
      Ok(()) => Ok(true),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
      Err(e) => Err(e.into()),
    }
  }

  fn public_url(&self, key: &str) -> String {
    format!("{}/files/{key}", self.inner.public_base_url)
  }
}
