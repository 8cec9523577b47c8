//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/signup` | 201 with a fresh session; 409 if the email is taken |
//! | `POST` | `/auth/login`  | 401 on bad credentials |
//! | `POST` | `/auth/logout` | 204; revokes the presented token |
//! | `GET`  | `/auth/me`     | The caller's identity and role |

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studyshelf_core::{
  identity::{Identity, NewAccount, Profile, Session, normalize_email},
  object::ObjectStore,
  store::AccountStore,
};

use crate::{
  ApiState, Backend,
  auth::{
    CurrentUser, bearer_token, hash_password, new_token, token_digest,
    verify_password,
  },
  error::ApiError,
};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct SignupBody {
  pub email:     String,
  pub password:  String,
  pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// A bearer token and who it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
  pub identity:   Identity,
}

async fn open_session<S, O>(
  state: &ApiState<S, O>,
  profile: Profile,
) -> Result<SessionResponse, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  let token = new_token();
  let now = Utc::now();
  let session = Session {
    token_hash: token_digest(&token),
    user_id:    profile.id,
    created_at: now,
    expires_at: now + state.settings.session_ttl,
  };
  let expires_at = session.expires_at;
  state
    .store
    .create_session(session)
    .await
    .map_err(ApiError::store)?;

  Ok(SessionResponse {
    token,
    expires_at,
    identity: state.roles.identify(profile),
  })
}

/// `POST /auth/signup`
pub async fn signup<S, O>(
  State(state): State<ApiState<S, O>>,
  Json(body): Json<SignupBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  let email = normalize_email(&body.email);
  if !email.contains('@') {
    return Err(ApiError::BadRequest("a valid email is required".into()));
  }
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  let existing = state
    .store
    .find_account(email.clone())
    .await
    .map_err(ApiError::store)?;
  if existing.is_some() {
    return Err(ApiError::Conflict(format!("{email} is already registered")));
  }

  let profile = state
    .store
    .create_account(NewAccount {
      email,
      full_name: body
        .full_name
        .map(|n| n.trim().to_owned())
        .filter(|n| !n.is_empty()),
      password_hash: hash_password(&body.password)?,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user_id = %profile.id, "account created");

  let session = open_session(&state, profile).await?;
  Ok((StatusCode::CREATED, Json(session)))
}

/// `POST /auth/login`
pub async fn login<S, O>(
  State(state): State<ApiState<S, O>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<SessionResponse>, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  let account = state
    .store
    .find_account(normalize_email(&body.email))
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;

  if !verify_password(&body.password, &account.password_hash) {
    tracing::debug!(user_id = %account.profile.id, "password mismatch");
    return Err(ApiError::Unauthorized);
  }

  let session = open_session(&state, account.profile).await?;
  Ok(Json(session))
}

/// `POST /auth/logout`
pub async fn logout<S, O>(
  State(state): State<ApiState<S, O>>,
  headers: HeaderMap,
) -> Result<StatusCode, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
  let removed = state
    .store
    .delete_session(token_digest(token))
    .await
    .map_err(ApiError::store)?;
  if !removed {
    return Err(ApiError::Unauthorized);
  }
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/me`
pub async fn me<S, O>(
  State(_): State<ApiState<S, O>>,
  CurrentUser(identity): CurrentUser,
) -> Json<Identity>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  Json(identity)
}
