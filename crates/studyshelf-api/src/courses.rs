//! Handlers for `/courses` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/courses` | Public |
//! | `POST` | `/courses` | Admin only. Body: `{"name":"B.Tech CSE"}` |

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use studyshelf_core::{
  course::{Course, NewCourse},
  object::ObjectStore,
  store::NoteStore,
};

use crate::{ApiState, Backend, auth::AdminUser, error::ApiError};

/// `GET /courses`
pub async fn list<S, O>(
  State(state): State<ApiState<S, O>>,
) -> Result<Json<Vec<Course>>, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  let courses = state.store.list_courses().await.map_err(ApiError::store)?;
  Ok(Json(courses))
}

/// `POST /courses`
pub async fn create<S, O>(
  State(state): State<ApiState<S, O>>,
  AdminUser(admin): AdminUser,
  Json(mut body): Json<NewCourse>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  body.name = body.name.trim().to_owned();
  if body.name.is_empty() {
    return Err(ApiError::BadRequest("course name must not be empty".into()));
  }

  let course = state.store.add_course(body).await.map_err(ApiError::store)?;
  tracing::info!(course_id = %course.id, admin = %admin.profile.email, "course added");
  Ok((StatusCode::CREATED, Json(course)))
}
