//! Process wiring for the StudyShelf server: configuration, backend
//! construction and the top-level router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::{Router, routing::get};
use serde::Deserialize;
use studyshelf_api::{ApiSettings, ApiState, Backend, DEFAULT_MAX_UPLOAD_BYTES};
use studyshelf_core::{
  catalog::Catalog,
  identity::RolePolicy,
  object::ObjectStore,
  resolver::{Resolver, TitleAlias},
};
use studyshelf_store_fs::FsObjectStore;
use studyshelf_store_sqlite::SqliteStore;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `STUDYSHELF_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  /// Origin used to build public file URLs. Defaults to `http://{host}:{port}`.
  pub public_base_url:   Option<String>,
  #[serde(default = "default_store_path")]
  pub store_path:        PathBuf,
  #[serde(default = "default_files_dir")]
  pub files_dir:         PathBuf,
  /// Replace the bundled curriculum with this JSON file.
  pub catalog_path:      Option<PathBuf>,
  #[serde(default)]
  pub admin_emails:      Vec<String>,
  #[serde(default)]
  pub title_aliases:     Vec<TitleAlias>,
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes:  usize,
  #[serde(default = "default_session_ttl_hours")]
  pub session_ttl_hours: i64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/studyshelf/studyshelf.db") }
fn default_files_dir() -> PathBuf { PathBuf::from("~/.local/share/studyshelf/files") }
fn default_max_upload_bytes() -> usize { DEFAULT_MAX_UPLOAD_BYTES }
fn default_session_ttl_hours() -> i64 { 168 }

impl ServerConfig {
  /// Layer `path` (optional) under `STUDYSHELF_*` environment variables.
  /// `STUDYSHELF_ADMIN_EMAILS` is a comma-separated list.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("STUDYSHELF")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("admin_emails"),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn public_base_url(&self) -> String {
    self
      .public_base_url
      .clone()
      .unwrap_or_else(|| format!("http://{}", self.address()))
  }

  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings {
      max_upload_bytes: self.max_upload_bytes,
      session_ttl:      chrono::Duration::hours(self.session_ttl_hours),
    }
  }

  /// The bundled catalog, or the override at `catalog_path`.
  pub fn catalog(&self) -> anyhow::Result<Catalog> {
    match &self.catalog_path {
      None => Catalog::bundled().context("bundled catalog is invalid"),
      Some(path) => {
        let path = expand_tilde(path);
        let raw = std::fs::read_to_string(&path)
          .with_context(|| format!("failed to read catalog at {path:?}"))?;
        Catalog::from_json(&raw)
          .with_context(|| format!("invalid catalog at {path:?}"))
      }
    }
  }

  /// Everything that does not need a backend: catalog, aliases and roles.
  pub fn validate(&self) -> anyhow::Result<(Catalog, Resolver, RolePolicy)> {
    if self.session_ttl_hours <= 0 {
      anyhow::bail!("session_ttl_hours must be positive");
    }
    if self.max_upload_bytes == 0 {
      anyhow::bail!("max_upload_bytes must be positive");
    }

    let catalog = self.catalog()?;
    TitleAlias::validate_all(&self.title_aliases, &catalog)
      .context("invalid title_aliases")?;
    let resolver = Resolver::standard(self.title_aliases.clone());
    let roles = RolePolicy::new(&self.admin_emails);
    Ok((catalog, resolver, roles))
  }
}

// ─── State & router ──────────────────────────────────────────────────────────

pub type ServerState = ApiState<SqliteStore, FsObjectStore>;

/// Open both backends and assemble the shared API state.
pub async fn open_state(cfg: &ServerConfig) -> anyhow::Result<ServerState> {
  let (catalog, resolver, roles) = cfg.validate()?;
  if !roles.has_admins() {
    tracing::warn!("no admin_emails configured; uploads cannot be reviewed");
  }

  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent() {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let files_dir = expand_tilde(&cfg.files_dir);
  let objects = FsObjectStore::open(&files_dir, cfg.public_base_url())
    .await
    .with_context(|| format!("failed to open files directory {files_dir:?}"))?;

  tracing::info!(
    store = ?store_path,
    files = ?files_dir,
    years = catalog.years().len(),
    aliases = cfg.title_aliases.len(),
    "backends ready"
  );

  Ok(ApiState {
    store:    Arc::new(store),
    objects:  Arc::new(objects),
    catalog:  Arc::new(catalog),
    resolver: Arc::new(resolver),
    roles:    Arc::new(roles),
    settings: Arc::new(cfg.api_settings()),
  })
}

/// `/api/*`, `/files/*` and `/healthz`, with request tracing.
pub fn router<S, O>(state: ApiState<S, O>) -> Router
where
  S: Backend,
  O: ObjectStore + 'static,
{
  Router::new()
    .nest("/api", studyshelf_api::api_router(state.clone()))
    .merge(studyshelf_api::files_router(state))
    .route("/healthz", get(|| async { "ok" }))
    .layer(TraceLayer::new_for_http())
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("studyshelf-server-{}-{name}", Uuid::new_v4()))
  }

  fn write_config(body: &str) -> PathBuf {
    let path = temp_path("config.toml");
    std::fs::write(&path, body).unwrap();
    path
  }

  #[test]
  fn missing_file_gives_defaults() {
    let cfg = ServerConfig::load(&temp_path("absent.toml")).unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    assert_eq!(cfg.session_ttl_hours, 168);
    assert!(cfg.admin_emails.is_empty());
    assert_eq!(cfg.public_base_url(), "http://127.0.0.1:8080");
  }

  #[test]
  fn file_values_are_read() {
    let path = write_config(
      r#"
port = 9000
public_base_url = "https://notes.college.edu"
admin_emails = ["Admin@College.edu"]

[[title_aliases]]
pattern = "Probability and Statistics"
subject_id = "probability-and-statistics"
"#,
    );
    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.public_base_url(), "https://notes.college.edu");
    assert_eq!(cfg.title_aliases.len(), 1);

    let (_, _, roles) = cfg.validate().unwrap();
    assert!(roles.has_admins());
  }

  #[test]
  fn alias_to_unknown_subject_fails_validation() {
    let path = write_config(
      r#"
[[title_aliases]]
pattern = "Quantum"
subject_id = "quantum-computing"
"#,
    );
    let cfg = ServerConfig::load(&path).unwrap();
    assert!(cfg.validate().is_err());
  }

  #[test]
  fn catalog_override_is_loaded() {
    let catalog = temp_path("catalog.json");
    std::fs::write(
      &catalog,
      r#"{"years":[{"id":"y1","name":"First","semesters":[
        {"id":"s1","name":"Autumn","subjects":[
          {"id":"algebra","name":"Algebra","code":"AL1"}]}]}]}"#,
    )
    .unwrap();
    let path = write_config(&format!("catalog_path = {:?}\n", catalog.to_string_lossy()));

    let cfg = ServerConfig::load(&path).unwrap();
    let (catalog, _, _) = cfg.validate().unwrap();
    assert!(catalog.subject("algebra").is_some());
    assert!(catalog.subject("operating-systems").is_none());
  }

  #[test]
  fn non_positive_ttl_is_rejected() {
    let path = write_config("session_ttl_hours = 0\n");
    let cfg = ServerConfig::load(&path).unwrap();
    assert!(cfg.validate().is_err());
  }

  #[test]
  fn tilde_expands_to_home() {
    let expanded = expand_tilde(Path::new("~/data/db"));
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(expanded, PathBuf::from(home).join("data/db"));
    }
    assert_eq!(expand_tilde(Path::new("/abs/db")), PathBuf::from("/abs/db"));
  }

  #[tokio::test]
  async fn router_serves_health_and_api() {
    let dir = temp_path("data");
    let path = write_config(&format!(
      "store_path = {:?}\nfiles_dir = {:?}\n",
      dir.join("db.sqlite").to_string_lossy(),
      dir.join("files").to_string_lossy(),
    ));
    let cfg = ServerConfig::load(&path).unwrap();
    let state = open_state(&cfg).await.unwrap();
    let app = router(state);

    let resp = app
      .clone()
      .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
      .oneshot(Request::get("/api/catalog/years/year-1").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }
}
