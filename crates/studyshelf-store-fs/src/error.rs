//! Error type for `studyshelf-store-fs`.

use studyshelf_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] studyshelf_core::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("object already exists: {0}")]
  AlreadyExists(String),
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool { matches!(self, Error::AlreadyExists(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
