//! Error type for `studyshelf-store-sqlite`.

use studyshelf_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] studyshelf_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("cannot decode column: {0}")]
  Decode(String),

  #[error("note not found: {0}")]
  NoteNotFound(uuid::Uuid),

  #[error("email already registered: {0}")]
  EmailTaken(String),

  /// Another review landed between the status check and the update.
  #[error("note {0} was reviewed concurrently")]
  ConcurrentReview(uuid::Uuid),
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool {
    matches!(
      self,
      Error::EmailTaken(_)
        | Error::ConcurrentReview(_)
        | Error::Core(studyshelf_core::Error::InvalidTransition { .. })
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
