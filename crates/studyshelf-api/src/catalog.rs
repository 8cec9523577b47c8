//! Handlers for `/catalog` endpoints. All are public.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/catalog` | Full year → semester → subject tree |
//! | `GET`  | `/catalog/years/{id}` | 404 if not found |
//! | `GET`  | `/catalog/subjects/{id}` | Subject with its ancestors |
//! | `GET`  | `/catalog/search?q=` | Literal name/code match |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use studyshelf_core::{
  catalog::{Catalog, Subject, SubjectPath, Year},
  object::ObjectStore,
};

use crate::{ApiState, Backend, error::ApiError};

/// A subject located in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectEntry {
  pub year_id:       String,
  pub year_name:     String,
  pub semester_id:   String,
  pub semester_name: String,
  pub subject:       Subject,
}

impl From<SubjectPath<'_>> for SubjectEntry {
  fn from(path: SubjectPath<'_>) -> Self {
    Self {
      year_id:       path.year.id.clone(),
      year_name:     path.year.name.clone(),
      semester_id:   path.semester.id.clone(),
      semester_name: path.semester.name.clone(),
      subject:       path.subject.clone(),
    }
  }
}

/// `GET /catalog`
pub async fn tree<S, O>(State(state): State<ApiState<S, O>>) -> Json<Catalog>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  Json(state.catalog.as_ref().clone())
}

/// `GET /catalog/years/{id}`
pub async fn year<S, O>(
  State(state): State<ApiState<S, O>>,
  Path(id): Path<String>,
) -> Result<Json<Year>, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  let year = state
    .catalog
    .year(&id)
    .cloned()
    .ok_or_else(|| ApiError::NotFound(format!("year {id} not found")))?;
  Ok(Json(year))
}

/// `GET /catalog/subjects/{id}`
pub async fn subject<S, O>(
  State(state): State<ApiState<S, O>>,
  Path(id): Path<String>,
) -> Result<Json<SubjectEntry>, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  let path = state
    .catalog
    .subject(&id)
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;
  Ok(Json(path.into()))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  #[serde(default)]
  pub q: String,
}

/// `GET /catalog/search?q=<text>`
pub async fn search<S, O>(
  State(state): State<ApiState<S, O>>,
  Query(params): Query<SearchParams>,
) -> Json<Vec<SubjectEntry>>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  Json(
    state
      .catalog
      .search(&params.q)
      .into_iter()
      .map(SubjectEntry::from)
      .collect(),
  )
}
