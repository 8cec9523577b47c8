//! Error types for `studyshelf-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::{note::NoteStatus, review::ReviewDecision};

#[derive(Debug, Error)]
pub enum Error {
  #[error("duplicate curriculum id {id:?} under {parent:?}")]
  DuplicateNodeId { parent: String, id: String },

  #[error("invalid curriculum catalog: {0}")]
  InvalidCatalog(String),

  #[error("title alias {pattern:?} points at unknown subject {subject_id:?}")]
  UnknownAliasTarget { pattern: String, subject_id: String },

  #[error("note not found: {0}")]
  NoteNotFound(Uuid),

  #[error("cannot {decision} a note that is already {from}")]
  InvalidTransition {
    from:     NoteStatus,
    decision: ReviewDecision,
  },

  #[error("unknown note status: {0:?}")]
  UnknownStatus(String),

  #[error("invalid object key: {0:?}")]
  InvalidObjectKey(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
