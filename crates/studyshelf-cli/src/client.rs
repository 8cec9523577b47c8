//! Async HTTP client wrapping the StudyShelf JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use studyshelf_core::{
  catalog::{Catalog, Year},
  course::Course,
  identity::Identity,
  note::{Note, NoteStatus},
  resolver::{CurriculumFilter, ResolvedNote},
  review::Review,
};
use uuid::Uuid;

/// Connection settings for the StudyShelf API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  /// Session token from `studyshelf login`. Empty means anonymous.
  pub token:    String,
}

#[derive(Debug, Deserialize)]
pub struct SessionInfo {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
  pub identity:   Identity,
}

#[derive(Debug, Deserialize)]
pub struct ReviewOutcome {
  pub note:   Note,
  pub review: Review,
}

#[derive(Deserialize)]
struct CatalogBody {
  years: Vec<Year>,
}

/// Metadata sent alongside an uploaded PDF.
#[derive(Debug, Default, Clone, Serialize)]
pub struct UploadMeta {
  pub title:                  String,
  pub description:            String,
  pub course_id:              Option<Uuid>,
  pub year_id:                Option<String>,
  pub semester_id:            Option<String>,
  pub subject_id:             Option<String>,
  pub unit_number:            Option<u8>,
  pub is_important_questions: Option<bool>,
  pub notes_type:             Option<String>,
}

/// Async HTTP client for the StudyShelf JSON REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(60))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.token.is_empty() {
      req
    } else {
      req.bearer_auth(&self.config.token)
    }
  }

  /// Send `req`, turning non-2xx responses into errors carrying the server's
  /// `{"error": ...}` message.
  async fn send(&self, what: &str, req: RequestBuilder) -> Result<Response> {
    let resp = self
      .auth(req)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;

    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = resp
      .json::<Value>()
      .await
      .ok()
      .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
      .unwrap_or_default();
    Err(anyhow!("{what} → {status} {message}"))
  }

  async fn json<T: DeserializeOwned>(&self, what: &str, req: RequestBuilder) -> Result<T> {
    self
      .send(what, req)
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising response to {what}"))
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// `POST /api/auth/signup`
  pub async fn signup(
    &self,
    email: &str,
    password: &str,
    full_name: Option<&str>,
  ) -> Result<SessionInfo> {
    let body = json!({ "email": email, "password": password, "full_name": full_name });
    self
      .json("POST /auth/signup", self.client.post(self.url("/auth/signup")).json(&body))
      .await
  }

  /// `POST /api/auth/login`
  pub async fn login(&self, email: &str, password: &str) -> Result<SessionInfo> {
    let body = json!({ "email": email, "password": password });
    self
      .json("POST /auth/login", self.client.post(self.url("/auth/login")).json(&body))
      .await
  }

  /// `POST /api/auth/logout`
  pub async fn logout(&self) -> Result<()> {
    self
      .send("POST /auth/logout", self.client.post(self.url("/auth/logout")))
      .await?;
    Ok(())
  }

  /// `GET /api/auth/me`
  pub async fn me(&self) -> Result<Identity> {
    self
      .json("GET /auth/me", self.client.get(self.url("/auth/me")))
      .await
  }

  // ── Catalog & courses ─────────────────────────────────────────────────────

  /// `GET /api/catalog`, validated locally.
  pub async fn catalog(&self) -> Result<Catalog> {
    let body: CatalogBody = self
      .json("GET /catalog", self.client.get(self.url("/catalog")))
      .await?;
    Catalog::new(body.years).context("server returned an invalid catalog")
  }

  /// `GET /api/courses`
  pub async fn courses(&self) -> Result<Vec<Course>> {
    self
      .json("GET /courses", self.client.get(self.url("/courses")))
      .await
  }

  // ── Notes ─────────────────────────────────────────────────────────────────

  /// `GET /api/notes` with catalog filters and paging.
  pub async fn browse(
    &self,
    filter: &CurriculumFilter,
    limit: Option<usize>,
    offset: Option<usize>,
  ) -> Result<Vec<ResolvedNote>> {
    let mut query: Vec<(&str, String)> = Vec::new();
    for (key, value) in [
      ("year_id", &filter.year_id),
      ("semester_id", &filter.semester_id),
      ("subject_id", &filter.subject_id),
    ] {
      if let Some(v) = value {
        query.push((key, v.clone()));
      }
    }
    if let Some(limit) = limit {
      query.push(("limit", limit.to_string()));
    }
    if let Some(offset) = offset {
      query.push(("offset", offset.to_string()));
    }

    self
      .json("GET /notes", self.client.get(self.url("/notes")).query(&query))
      .await
  }

  /// `GET /api/notes/{id}`
  pub async fn note(&self, id: Uuid) -> Result<ResolvedNote> {
    self
      .json("GET /notes/{id}", self.client.get(self.url(&format!("/notes/{id}"))))
      .await
  }

  /// `GET /api/me/notes`
  pub async fn my_notes(&self) -> Result<Vec<ResolvedNote>> {
    self
      .json("GET /me/notes", self.client.get(self.url("/me/notes")))
      .await
  }

  /// `POST /api/notes`
  pub async fn upload(&self, meta: &UploadMeta, file_name: &str, data: &[u8]) -> Result<Note> {
    let mut body = serde_json::to_value(meta).context("serialising upload metadata")?;
    body["file_name"] = json!(file_name);
    body["content_type"] = json!("application/pdf");
    body["file_base64"] = json!(STANDARD.encode(data));

    self
      .json("POST /notes", self.client.post(self.url("/notes")).json(&body))
      .await
  }

  /// Fetch the bytes behind a note's public `file_url`.
  pub async fn download(&self, file_url: &str) -> Result<Vec<u8>> {
    let resp = self
      .send("GET file", self.client.get(file_url).query(&[("download", "true")]))
      .await?;
    let bytes = resp.bytes().await.context("reading file body")?;
    Ok(bytes.to_vec())
  }

  // ── Review ────────────────────────────────────────────────────────────────

  /// `GET /api/admin/notes?status=<status>`
  pub async fn queue(&self, status: NoteStatus) -> Result<Vec<ResolvedNote>> {
    self
      .json(
        "GET /admin/notes",
        self
          .client
          .get(self.url("/admin/notes"))
          .query(&[("status", status.as_str())]),
      )
      .await
  }

  /// `POST /api/admin/notes/{id}/approve`
  pub async fn approve(&self, id: Uuid) -> Result<ReviewOutcome> {
    let url = self.url(&format!("/admin/notes/{id}/approve"));
    self.json("POST approve", self.client.post(url)).await
  }

  /// `POST /api/admin/notes/{id}/reject`
  pub async fn reject(&self, id: Uuid) -> Result<ReviewOutcome> {
    let url = self.url(&format!("/admin/notes/{id}/reject"));
    self.json("POST reject", self.client.post(url)).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base: &str) -> ApiClient {
    ApiClient::new(ApiConfig { base_url: base.into(), token: String::new() }).unwrap()
  }

  #[test]
  fn api_paths_are_prefixed() {
    assert_eq!(
      client("http://localhost:8080/").url("/notes"),
      "http://localhost:8080/api/notes"
    );
    assert_eq!(
      client("https://notes.college.edu").url("/auth/me"),
      "https://notes.college.edu/api/auth/me"
    );
  }

  #[test]
  fn upload_meta_serialises_optional_keys() {
    let meta = UploadMeta {
      title: "OS unit 1".into(),
      subject_id: Some("operating-systems".into()),
      ..Default::default()
    };
    let v = serde_json::to_value(&meta).unwrap();
    assert_eq!(v["title"], "OS unit 1");
    assert_eq!(v["subject_id"], "operating-systems");
    assert!(v["year_id"].is_null());
  }
}
