//! Serving and removing stored note files.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/files/{*key}` | Public. `?download=true` forces an attachment |
//! | `DELETE` | `/admin/files/{*key}` | Admin only; cleans up orphaned uploads |

use axum::{
  extract::{Path, Query, State},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::Deserialize;
use studyshelf_core::object::{ObjectStore, key_file_name, validate_key};

use crate::{ApiState, Backend, auth::AdminUser, error::ApiError};

fn content_type_for(key: &str) -> &'static str {
  let ext = key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
  match ext.as_deref() {
    Some("pdf") => "application/pdf",
    _ => "application/octet-stream",
  }
}

fn checked_key(key: &str) -> Result<(), ApiError> {
  validate_key(key).map_err(|e| ApiError::BadRequest(e.to_string()))
}

#[derive(Debug, Default, Deserialize)]
pub struct ServeParams {
  #[serde(default)]
  pub download: bool,
}

/// `GET /files/{*key}`
pub async fn serve<S, O>(
  State(state): State<ApiState<S, O>>,
  Path(key): Path<String>,
  Query(params): Query<ServeParams>,
) -> Result<Response, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  checked_key(&key)?;
  let data = state
    .objects
    .get(key.clone())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("file {key} not found")))?;

  let disposition = if params.download { "attachment" } else { "inline" };
  let disposition = format!("{disposition}; filename=\"{}\"", key_file_name(&key));
  let disposition = HeaderValue::from_str(&disposition)
    .map_err(|e| ApiError::Internal(format!("bad disposition header: {e}")))?;

  Ok(
    (
      [
        (header::CONTENT_TYPE, HeaderValue::from_static(content_type_for(&key))),
        (header::CONTENT_DISPOSITION, disposition),
      ],
      data,
    )
      .into_response(),
  )
}

/// `DELETE /admin/files/{*key}`
pub async fn remove<S, O>(
  State(state): State<ApiState<S, O>>,
  AdminUser(admin): AdminUser,
  Path(key): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  checked_key(&key)?;
  let removed = state
    .objects
    .delete(key.clone())
    .await
    .map_err(ApiError::store)?;
  if !removed {
    return Err(ApiError::NotFound(format!("file {key} not found")));
  }
  tracing::info!(%key, admin = %admin.profile.email, "stored file removed");
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pdf_extension_is_case_insensitive() {
    assert_eq!(content_type_for("u/1-notes.PDF"), "application/pdf");
    assert_eq!(content_type_for("u/1-notes.pdf"), "application/pdf");
    assert_eq!(content_type_for("u/1-notes"), "application/octet-stream");
  }
}
