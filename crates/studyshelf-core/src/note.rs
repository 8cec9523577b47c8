//! Uploaded study material and its curriculum foreign keys.
//!
//! A note is created in [`NoteStatus::Pending`] by a student upload and is
//! only ever mutated by an admin review (see [`crate::review`]). Notes are
//! never physically deleted.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Review status of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
  Pending,
  Approved,
  Rejected,
}

impl NoteStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Approved => "approved",
      Self::Rejected => "rejected",
    }
  }

  pub fn is_terminal(&self) -> bool { !matches!(self, Self::Pending) }
}

impl fmt::Display for NoteStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for NoteStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "pending" => Ok(Self::Pending),
      "approved" => Ok(Self::Approved),
      "rejected" => Ok(Self::Rejected),
      other => Err(Error::UnknownStatus(other.to_owned())),
    }
  }
}

// ─── Note ────────────────────────────────────────────────────────────────────

/// A stored note. The curriculum keys are optional and, when present, are
/// expected (but not guaranteed) to reference catalog identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
  pub id:                     Uuid,
  pub user_id:                Uuid,
  pub course_id:              Option<Uuid>,
  pub title:                  String,
  pub description:            String,
  /// Public URL of the stored file.
  pub file_url:               String,
  /// Object-store key behind `file_url`.
  pub file_path:              String,
  /// MIME type of the stored file.
  pub file_type:              String,
  pub status:                 NoteStatus,
  pub created_at:             DateTime<Utc>,
  pub updated_at:             DateTime<Utc>,
  pub year_id:                Option<String>,
  pub semester_id:            Option<String>,
  pub subject_id:             Option<String>,
  pub unit_number:            Option<u8>,
  pub is_important_questions: Option<bool>,
  pub notes_type:             Option<String>,
}

impl Note {
  pub fn is_owned_by(&self, user_id: Uuid) -> bool { self.user_id == user_id }
}

// ─── NewNote ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::NoteStore::create_note`].
/// `id`, `status` and both timestamps are always set by the store.
#[derive(Debug, Clone)]
pub struct NewNote {
  pub user_id:                Uuid,
  pub course_id:              Option<Uuid>,
  pub title:                  String,
  pub description:            String,
  pub file_url:               String,
  pub file_path:              String,
  pub file_type:              String,
  pub year_id:                Option<String>,
  pub semester_id:            Option<String>,
  pub subject_id:             Option<String>,
  pub unit_number:            Option<u8>,
  pub is_important_questions: Option<bool>,
  pub notes_type:             Option<String>,
}

impl NewNote {
  /// Convenience constructor with every optional field unset.
  pub fn new(
    user_id: Uuid,
    title: impl Into<String>,
    file_url: impl Into<String>,
    file_path: impl Into<String>,
  ) -> Self {
    Self {
      user_id,
      course_id: None,
      title: title.into(),
      description: String::new(),
      file_url: file_url.into(),
      file_path: file_path.into(),
      file_type: "application/pdf".to_owned(),
      year_id: None,
      semester_id: None,
      subject_id: None,
      unit_number: None,
      is_important_questions: None,
      notes_type: None,
    }
  }
}
