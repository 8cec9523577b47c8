//! Bearer-token authentication: extractors, password hashing and session
//! tokens.
//!
//! Tokens are 32 random bytes, hex-encoded. The store only ever sees their
//! SHA-256 digest. Roles come from the [`RolePolicy`] in [`ApiState`], never
//! from the database.
//!
//! [`RolePolicy`]: studyshelf_core::identity::RolePolicy

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest, Sha256};
use studyshelf_core::{
  identity::Identity, object::ObjectStore, store::AccountStore,
};

use crate::{ApiState, Backend, error::ApiError};

// ─── Credentials ─────────────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

/// `false` for a wrong password and for an unparseable hash alike.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
    .is_ok()
}

/// A fresh random session token.
pub fn new_token() -> String {
  let mut buf = [0u8; 32];
  OsRng.fill_bytes(&mut buf);
  hex::encode(buf)
}

/// The digest stored in place of a token.
pub fn token_digest(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

/// The token from an `Authorization: Bearer …` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// Resolve a token to an identity. Unknown and expired tokens are `None`.
pub async fn authenticate<S, O>(
  state: &ApiState<S, O>,
  token: &str,
) -> Result<Option<Identity>, ApiError>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  let found = state
    .store
    .find_session(token_digest(token))
    .await
    .map_err(ApiError::store)?;

  Ok(match found {
    Some((session, profile)) if !session.is_expired(Utc::now()) => {
      Some(state.roles.identify(profile))
    }
    _ => None,
  })
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// Present in a handler means the request carried a valid session.
pub struct CurrentUser(pub Identity);

/// Like [`CurrentUser`], but anonymous requests are allowed through. A token
/// that is present but invalid is still rejected.
pub struct MaybeUser(pub Option<Identity>);

/// A [`CurrentUser`] whose role claim is admin.
pub struct AdminUser(pub Identity);

impl<S, O> FromRequestParts<ApiState<S, O>> for CurrentUser
where
  S: Backend,
  O: ObjectStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S, O>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let identity = authenticate(state, token)
      .await?
      .ok_or(ApiError::Unauthorized)?;
    Ok(CurrentUser(identity))
  }
}

impl<S, O> FromRequestParts<ApiState<S, O>> for MaybeUser
where
  S: Backend,
  O: ObjectStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S, O>,
  ) -> Result<Self, Self::Rejection> {
    match bearer_token(&parts.headers) {
      None => Ok(MaybeUser(None)),
      Some(token) => {
        let identity = authenticate(state, token)
          .await?
          .ok_or(ApiError::Unauthorized)?;
        Ok(MaybeUser(Some(identity)))
      }
    }
  }
}

impl<S, O> FromRequestParts<ApiState<S, O>> for AdminUser
where
  S: Backend,
  O: ObjectStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S, O>,
  ) -> Result<Self, Self::Rejection> {
    let CurrentUser(identity) = CurrentUser::from_request_parts(parts, state).await?;
    if !identity.is_admin() {
      return Err(ApiError::Forbidden);
    }
    Ok(AdminUser(identity))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  #[test]
  fn password_roundtrip() {
    let hash = hash_password("correct horse").unwrap();
    assert!(verify_password("correct horse", &hash));
    assert!(!verify_password("wrong horse", &hash));
    assert!(!verify_password("correct horse", "not-a-phc-string"));
  }

  #[test]
  fn tokens_are_random_hex() {
    let a = new_token();
    let b = new_token();
    assert_eq!(a.len(), 64);
    assert_ne!(a, b);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
  }

  #[test]
  fn digest_is_stable_and_differs_from_token() {
    let token = new_token();
    assert_eq!(token_digest(&token), token_digest(&token));
    assert_ne!(token_digest(&token), token);
  }

  #[test]
  fn bearer_parsing() {
    let mut headers = HeaderMap::new();
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
    assert_eq!(bearer_token(&headers), Some("abc"));

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
    assert_eq!(bearer_token(&headers), None);
  }
}
