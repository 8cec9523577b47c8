//! Handlers for the admin moderation queue. Every route requires an admin
//! identity.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/notes` | `?status=pending\|approved\|rejected`, default `pending` |
//! | `POST` | `/admin/notes/{id}/approve` | 409 unless the note is pending |
//! | `POST` | `/admin/notes/{id}/reject`  | 409 unless the note is pending |
//! | `GET`  | `/admin/notes/{id}/reviews` | Review history, oldest first |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use studyshelf_core::{
  identity::Identity,
  note::{Note, NoteStatus},
  object::ObjectStore,
  resolver::ResolvedNote,
  review::{Review, ReviewDecision},
  store::{NoteQuery, NoteStore},
};
use uuid::Uuid;

use crate::{ApiState, Backend, auth::AdminUser, error::ApiError};

// ─── Queue ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct QueueParams {
  pub status: Option<NoteStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /admin/notes[?status=<status>]`
pub async fn queue<S, O>(
  State(state): State<ApiState<S, O>>,
  AdminUser(_): AdminUser,
  Query(params): Query<QueueParams>,
) -> Result<Json<Vec<ResolvedNote>>, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  let query = NoteQuery {
    status: Some(params.status.unwrap_or(NoteStatus::Pending)),
    limit: params.limit,
    offset: params.offset,
    ..Default::default()
  };
  let notes = state
    .store
    .list_notes(&query)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(
    notes
      .into_iter()
      .map(|note| state.resolver.resolve_note(note, &state.catalog))
      .collect(),
  ))
}

// ─── Decisions ───────────────────────────────────────────────────────────────

/// The note after review, with the record of the decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewOutcome {
  pub note:   Note,
  pub review: Review,
}

async fn decide<S, O>(
  state: &ApiState<S, O>,
  admin: &Identity,
  id: Uuid,
  decision: ReviewDecision,
) -> Result<ReviewOutcome, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  let current = state
    .store
    .get_note(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("note {id} not found")))?;

  current
    .status
    .review(decision)
    .map_err(|e| ApiError::Conflict(e.to_string()))?;

  let (note, review) = state
    .store
    .review_note(id, decision, admin.profile.id)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    note_id = %note.id,
    reviewer = %admin.profile.email,
    from = %review.from_status,
    to = %review.to_status,
    "note reviewed"
  );
  Ok(ReviewOutcome { note, review })
}

/// `POST /admin/notes/{id}/approve`
pub async fn approve<S, O>(
  State(state): State<ApiState<S, O>>,
  AdminUser(admin): AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<ReviewOutcome>, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  decide(&state, &admin, id, ReviewDecision::Approve)
    .await
    .map(Json)
}

/// `POST /admin/notes/{id}/reject`
pub async fn reject<S, O>(
  State(state): State<ApiState<S, O>>,
  AdminUser(admin): AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<ReviewOutcome>, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  decide(&state, &admin, id, ReviewDecision::Reject)
    .await
    .map(Json)
}

// ─── History ─────────────────────────────────────────────────────────────────

/// `GET /admin/notes/{id}/reviews`
pub async fn history<S, O>(
  State(state): State<ApiState<S, O>>,
  AdminUser(_): AdminUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  state
    .store
    .get_note(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("note {id} not found")))?;

  let reviews = state
    .store
    .list_reviews(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(reviews))
}
