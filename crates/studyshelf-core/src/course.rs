//! Courses, the degree programmes notes are filed under (e.g. "B.Tech CSE").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
  pub id:          Uuid,
  pub name:        String,
  pub code:        Option<String>,
  pub description: Option<String>,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::NoteStore::add_course`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewCourse {
  pub name:        String,
  pub code:        Option<String>,
  pub description: Option<String>,
}
