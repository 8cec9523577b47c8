//! Handlers for `/notes` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/notes` | Approved notes only, resolved against the catalog |
//! | `POST` | `/notes` | Signed in. JSON metadata + base64 PDF; 201 + pending note |
//! | `GET`  | `/notes/{id}` | Non-approved notes are visible to the owner and admins only |
//! | `GET`  | `/me/notes` | The caller's uploads, any status |
//!
//! Browse filters (`year_id`, `semester_id`, `subject_id`) apply to each
//! note's resolved catalog position rather than to its stored keys, so paging
//! happens after filtering.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use studyshelf_core::{
  note::{NewNote, NoteStatus},
  object::{ObjectStore, object_key},
  resolver::{CurriculumFilter, ResolvedNote},
  store::{NoteQuery, NoteStore},
};
use uuid::Uuid;

use crate::{
  ApiState, Backend,
  auth::{CurrentUser, MaybeUser},
  error::ApiError,
};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Treat `?year_id=` the same as an absent parameter.
fn non_blank(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

// ─── Browse ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct BrowseParams {
  pub year_id:     Option<String>,
  pub semester_id: Option<String>,
  pub subject_id:  Option<String>,
  pub course_id:   Option<Uuid>,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

/// `GET /notes[?year_id=&semester_id=&subject_id=&course_id=&limit=&offset=]`
pub async fn browse<S, O>(
  State(state): State<ApiState<S, O>>,
  Query(params): Query<BrowseParams>,
) -> Result<Json<Vec<ResolvedNote>>, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  let query = NoteQuery {
    status: Some(NoteStatus::Approved),
    course_id: params.course_id,
    ..Default::default()
  };
  let notes = state
    .store
    .list_notes(&query)
    .await
    .map_err(ApiError::store)?;

  let filter = CurriculumFilter {
    year_id:     non_blank(params.year_id),
    semester_id: non_blank(params.semester_id),
    subject_id:  non_blank(params.subject_id),
  };

  let resolved: Vec<ResolvedNote> = notes
    .into_iter()
    .map(|note| state.resolver.resolve_note(note, &state.catalog))
    .filter(|r| r.resolution.matches(&filter))
    .skip(params.offset.unwrap_or(0))
    .take(params.limit.unwrap_or(usize::MAX))
    .collect();

  Ok(Json(resolved))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /notes/{id}`
pub async fn get_one<S, O>(
  State(state): State<ApiState<S, O>>,
  MaybeUser(viewer): MaybeUser,
  Path(id): Path<Uuid>,
) -> Result<Json<ResolvedNote>, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  let not_found = || ApiError::NotFound(format!("note {id} not found"));

  let note = state
    .store
    .get_note(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;

  let visible = note.status == NoteStatus::Approved
    || viewer
      .as_ref()
      .is_some_and(|v| v.is_admin() || note.is_owned_by(v.profile.id));
  if !visible {
    return Err(not_found());
  }

  Ok(Json(state.resolver.resolve_note(note, &state.catalog)))
}

// ─── Mine ────────────────────────────────────────────────────────────────────

/// `GET /me/notes`
pub async fn mine<S, O>(
  State(state): State<ApiState<S, O>>,
  CurrentUser(me): CurrentUser,
) -> Result<Json<Vec<ResolvedNote>>, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  let query = NoteQuery { user_id: Some(me.profile.id), ..Default::default() };
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

// ─── Upload ──────────────────────────────────────────────────────────────────

/// Body of `POST /notes`. The file travels base64-encoded in
/// `file_base64`.
#[derive(Debug, Deserialize)]
pub struct UploadBody {
  pub title:                  String,
  #[serde(default)]
  pub description:            String,
  pub course_id:              Option<Uuid>,
  pub file_name:              String,
  pub content_type:           Option<String>,
  pub file_base64:            String,
  pub year_id:                Option<String>,
  pub semester_id:            Option<String>,
  pub subject_id:             Option<String>,
  pub unit_number:            Option<u8>,
  pub is_important_questions: Option<bool>,
  pub notes_type:             Option<String>,
}

/// `POST /notes`
pub async fn upload<S, O>(
  State(state): State<ApiState<S, O>>,
  CurrentUser(me): CurrentUser,
  Json(body): Json<UploadBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  let title = body.title.trim().to_owned();
  if title.is_empty() {
    return Err(ApiError::BadRequest("title must not be empty".into()));
  }
  match body.content_type.as_deref() {
    None | Some(PDF_CONTENT_TYPE) => {}
    Some(other) => {
      return Err(ApiError::UnsupportedMediaType(format!(
        "only {PDF_CONTENT_TYPE} uploads are accepted, got {other}"
      )));
    }
  }

  let data = STANDARD
    .decode(body.file_base64.as_bytes())
    .map_err(|e| ApiError::BadRequest(format!("file_base64 is not valid base64: {e}")))?;
  if data.is_empty() {
    return Err(ApiError::BadRequest("file is empty".into()));
  }
  let max = state.settings.max_upload_bytes;
  if data.len() > max {
    return Err(ApiError::PayloadTooLarge(format!(
      "file is {} bytes, the limit is {max}",
      data.len()
    )));
  }
  if !data.starts_with(PDF_MAGIC) {
    return Err(ApiError::UnsupportedMediaType("file is not a PDF".into()));
  }

  if let Some(course_id) = body.course_id {
    let course = state
      .store
      .get_course(course_id)
      .await
      .map_err(ApiError::store)?;
    if course.is_none() {
      return Err(ApiError::BadRequest(format!("course {course_id} does not exist")));
    }
  }

  let key = object_key(me.profile.id, Utc::now(), &body.file_name);
  let stored = state
    .objects
    .put(key, Bytes::from(data), PDF_CONTENT_TYPE.to_owned())
    .await
    .map_err(ApiError::store)?;
  let file_url = state.objects.public_url(&stored.key);

  let input = NewNote {
    user_id: me.profile.id,
    course_id: body.course_id,
    title,
    description: body.description.trim().to_owned(),
    file_url,
    file_path: stored.key.clone(),
    file_type: stored.content_type.clone(),
    year_id: non_blank(body.year_id),
    semester_id: non_blank(body.semester_id),
    subject_id: non_blank(body.subject_id),
    unit_number: body.unit_number,
    is_important_questions: body.is_important_questions,
    notes_type: non_blank(body.notes_type),
  };

  let note = match state.store.create_note(input).await {
    Ok(note) => note,
    Err(e) => {
      tracing::warn!(key = %stored.key, "note insert failed, stored file is orphaned");
      return Err(ApiError::store(e));
    }
  };

  tracing::info!(
    note_id = %note.id,
    user_id = %me.profile.id,
    size = stored.size,
    content_hash = %stored.content_hash,
    "note uploaded for review"
  );
  Ok((StatusCode::CREATED, Json(note)))
}
