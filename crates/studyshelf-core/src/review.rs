//! The upload/review state machine.
//!
//! ```text
//! pending ──approve──▶ approved
//!    └─────reject────▶ rejected
//! ```
//!
//! Both targets are terminal; there is no path backwards and no rollback.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, note::NoteStatus};

/// An admin's verdict on a pending note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
  Approve,
  Reject,
}

impl ReviewDecision {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Approve => "approve",
      Self::Reject => "reject",
    }
  }

  /// The status a pending note moves to under this decision.
  pub fn target(self) -> NoteStatus {
    match self {
      Self::Approve => NoteStatus::Approved,
      Self::Reject => NoteStatus::Rejected,
    }
  }
}

impl fmt::Display for ReviewDecision {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl NoteStatus {
  /// Apply `decision`, returning the new status. Only pending notes can be
  /// reviewed.
  pub fn review(self, decision: ReviewDecision) -> Result<NoteStatus> {
    match self {
      NoteStatus::Pending => Ok(decision.target()),
      from => Err(Error::InvalidTransition { from, decision }),
    }
  }
}

/// Append-only record of a review, kept alongside the status change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
  pub review_id:   Uuid,
  pub note_id:     Uuid,
  pub reviewer_id: Uuid,
  pub decision:    ReviewDecision,
  pub from_status: NoteStatus,
  pub to_status:   NoteStatus,
  pub reviewed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pending_can_be_approved_or_rejected() {
    assert_eq!(
      NoteStatus::Pending.review(ReviewDecision::Approve).unwrap(),
      NoteStatus::Approved
    );
    assert_eq!(
      NoteStatus::Pending.review(ReviewDecision::Reject).unwrap(),
      NoteStatus::Rejected
    );
  }

  #[test]
  fn rejected_never_becomes_approved() {
    let err = NoteStatus::Rejected
      .review(ReviewDecision::Approve)
      .unwrap_err();
    assert!(matches!(
      err,
      Error::InvalidTransition { from: NoteStatus::Rejected, decision: ReviewDecision::Approve }
    ));
  }

  #[test]
  fn approved_is_terminal() {
    assert!(NoteStatus::Approved.is_terminal());
    assert!(NoteStatus::Approved.review(ReviewDecision::Reject).is_err());
    assert!(NoteStatus::Approved.review(ReviewDecision::Approve).is_err());
  }

  #[test]
  fn status_parses_its_own_display() {
    for status in [NoteStatus::Pending, NoteStatus::Approved, NoteStatus::Rejected] {
      assert_eq!(status.to_string().parse::<NoteStatus>().unwrap(), status);
    }
    assert!("archived".parse::<NoteStatus>().is_err());
  }

  #[test]
  fn error_message_names_both_sides() {
    let err = NoteStatus::Approved
      .review(ReviewDecision::Reject)
      .unwrap_err();
    assert_eq!(err.to_string(), "cannot reject a note that is already approved");
  }
}
