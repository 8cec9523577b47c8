//! JSON REST API for StudyShelf.
//!
//! Exposes axum [`Router`]s backed by any [`NoteStore`] + [`AccountStore`]
//! and any [`ObjectStore`]. TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! Router::new()
//!   .nest("/api", studyshelf_api::api_router(state.clone()))
//!   .merge(studyshelf_api::files_router(state))
//! ```

pub mod auth;
pub mod catalog;
pub mod courses;
pub mod error;
pub mod files;
pub mod notes;
pub mod review;
pub mod sessions;

use std::sync::Arc;

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use studyshelf_core::{
  catalog::Catalog,
  identity::RolePolicy,
  object::ObjectStore,
  resolver::Resolver,
  store::{AccountStore, NoteStore},
};

pub use error::ApiError;


/// Default cap on uploaded file size: 20 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Everything a handler needs from the backend.
pub trait Backend: NoteStore + AccountStore + 'static {}

impl<T> Backend for T where T: NoteStore + AccountStore + 'static {}

// ─── Settings ────────────────────────────────────────────────────────────────

/// Tunables the API reads at request time.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  pub max_upload_bytes: usize,
  pub session_ttl:      chrono::Duration,
}

impl Default for ApiSettings {
  fn default() -> Self {
    Self {
      max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
      session_ttl:      chrono::Duration::hours(168),
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S, O> {
  pub store:    Arc<S>,
  pub objects:  Arc<O>,
  pub catalog:  Arc<Catalog>,
  pub resolver: Arc<Resolver>,
  pub roles:    Arc<RolePolicy>,
  pub settings: Arc<ApiSettings>,
}

impl<S, O> Clone for ApiState<S, O> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      objects:  self.objects.clone(),
      catalog:  self.catalog.clone(),
      resolver: self.resolver.clone(),
      roles:    self.roles.clone(),
      settings: self.settings.clone(),
    }
  }
}

// ─── Routers ─────────────────────────────────────────────────────────────────

/// Build the JSON API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, O>(state: ApiState<S, O>) -> Router<()>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  // Uploads arrive base64-encoded inside JSON, so allow for the 4/3 blow-up
  // plus the metadata fields.
  let body_limit = state.settings.max_upload_bytes / 3 * 4 + 64 * 1024;

  Router::new()
    // Catalog
    .route("/catalog", get(catalog::tree::<S, O>))
    .route("/catalog/years/{id}", get(catalog::year::<S, O>))
    .route("/catalog/subjects/{id}", get(catalog::subject::<S, O>))
    .route("/catalog/search", get(catalog::search::<S, O>))
    // Courses
    .route("/courses", get(courses::list::<S, O>).post(courses::create::<S, O>))
    // Notes
    .route("/notes", get(notes::browse::<S, O>).post(notes::upload::<S, O>))
    .route("/notes/{id}", get(notes::get_one::<S, O>))
    .route("/me/notes", get(notes::mine::<S, O>))
    // Review
    .route("/admin/notes", get(review::queue::<S, O>))
    .route("/admin/notes/{id}/approve", post(review::approve::<S, O>))
    .route("/admin/notes/{id}/reject", post(review::reject::<S, O>))
    .route("/admin/notes/{id}/reviews", get(review::history::<S, O>))
    .route("/admin/files/{*key}", axum::routing::delete(files::remove::<S, O>))
    // Sessions
    .route("/auth/signup", post(sessions::signup::<S, O>))
    .route("/auth/login", post(sessions::login::<S, O>))
    .route("/auth/logout", post(sessions::logout::<S, O>))
    .route("/auth/me", get(sessions::me::<S, O>))
    .layer(DefaultBodyLimit::max(body_limit))
    .with_state(state)
}

/// Serve stored note files at `/files/{key}`, the path behind every public
/// URL the object store hands out.
pub fn files_router<S, O>(state: ApiState<S, O>) -> Router<()>
where
  S: Backend,
  O: ObjectStore + 'static,
{
  Router::new()
    .route("/files/{*key}", get(files::serve::<S, O>))
    .with_state(state)
}
