//! The `NoteStore` and `AccountStore` traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g.
//! `studyshelf-store-sqlite`). Higher layers (`studyshelf-api`) depend on
//! these abstractions, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  course::{Course, NewCourse},
  identity::{Account, NewAccount, Profile, Session},
  note::{NewNote, Note, NoteStatus},
  review::{Review, ReviewDecision},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Error bound shared by every backend trait.
///
/// `is_conflict` marks failures caused by the current state of the data (a
/// taken email, a note reviewed by someone else, an occupied object key)
/// rather than by the backend itself.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn is_conflict(&self) -> bool { false }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`NoteStore::list_notes`]. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct NoteQuery {
  pub status:    Option<NoteStatus>,
  /// Restrict to one uploader.
  pub user_id:   Option<Uuid>,
  pub course_id: Option<Uuid>,
  pub limit:     Option<usize>,
  pub offset:    Option<usize>,
}

// ─── Notes ───────────────────────────────────────────────────────────────────

/// Abstraction over the note/course collection.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait NoteStore: Send + Sync {
  type Error: StoreError;

  // ── Courses ───────────────────────────────────────────────────────────

  fn add_course(
    &self,
    input: NewCourse,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  fn get_course(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  fn list_courses(
    &self,
  ) -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + '_;

  // ── Notes ─────────────────────────────────────────────────────────────

  /// Persist a new note in `pending` state. `id`, `status`, `created_at`
  /// and `updated_at` are set by the store.
  fn create_note(
    &self,
    input: NewNote,
  ) -> impl Future<Output = Result<Note, Self::Error>> + Send + '_;

  /// Retrieve a note by id. Returns `None` if not found.
  fn get_note(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Note>, Self::Error>> + Send + '_;

  fn list_notes<'a>(
    &'a self,
    query: &'a NoteQuery,
  ) -> impl Future<Output = Result<Vec<Note>, Self::Error>> + Send + 'a;

  // ── Review ────────────────────────────────────────────────────────────

  /// Move a pending note to the status implied by `decision`, advancing
  /// `updated_at` and recording a [`Review`].
  ///
  /// Returns an error if the note does not exist or is no longer pending;
  /// losing a race with another reviewer is a conflict.
  fn review_note(
    &self,
    id: Uuid,
    decision: ReviewDecision,
    reviewer_id: Uuid,
  ) -> impl Future<Output = Result<(Note, Review), Self::Error>> + Send + '_;

  /// Review history for a note, oldest first.
  fn list_reviews(
    &self,
    note_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Review>, Self::Error>> + Send + '_;
}

// ─── Accounts ────────────────────────────────────────────────────────────────

/// Abstraction over user accounts and sign-in sessions.
pub trait AccountStore: Send + Sync {
  type Error: StoreError;

  /// Create an account. A taken email is a conflict.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Look up an account by (normalised) email.
  fn find_account(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  fn create_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Find a session by token digest, with its owner's profile. Expiry is the
  /// caller's concern.
  fn find_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<Option<(Session, Profile)>, Self::Error>> + Send + '_;

  /// Delete a session. Returns `false` if it did not exist.
  fn delete_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
