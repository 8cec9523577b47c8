//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings with microsecond
//! precision, so lexical order is chronological order. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use studyshelf_core::{
  course::Course,
  identity::{Account, Profile, Session},
  note::{Note, NoteStatus},
  review::{Review, ReviewDecision},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the database keeps.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<NoteStatus> { Ok(s.parse()?) }

pub fn decode_decision(s: &str) -> Result<ReviewDecision> {
  match s {
    "approve" => Ok(ReviewDecision::Approve),
    "reject" => Ok(ReviewDecision::Reject),
    other => Err(Error::Decode(format!("unknown review decision: {other:?}"))),
  }
}

fn decode_unit(n: Option<i64>) -> Result<Option<u8>> {
  n.map(|v| {
    u8::try_from(v).map_err(|_| Error::Decode(format!("unit number out of range: {v}")))
  })
  .transpose()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawNote::from_row`].
pub const NOTE_COLUMNS: &str = "note_id, user_id, course_id, title, description,
  file_url, file_path, file_type, status, created_at, updated_at,
  year_id, semester_id, subject_id, unit_number, is_important_questions,
  notes_type";

/// Raw values read directly from a `notes` row.
pub struct RawNote {
  pub note_id:                String,
  pub user_id:                String,
  pub course_id:              Option<String>,
  pub title:                  String,
  pub description:            String,
  pub file_url:               String,
  pub file_path:              String,
  pub file_type:              String,
  pub status:                 String,
  pub created_at:             String,
  pub updated_at:             String,
  pub year_id:                Option<String>,
  pub semester_id:            Option<String>,
  pub subject_id:             Option<String>,
  pub unit_number:            Option<i64>,
  pub is_important_questions: Option<bool>,
  pub notes_type:             Option<String>,
}

impl RawNote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      note_id:                row.get(0)?,
      user_id:                row.get(1)?,
      course_id:              row.get(2)?,
      title:                  row.get(3)?,
      description:            row.get(4)?,
      file_url:               row.get(5)?,
      file_path:              row.get(6)?,
      file_type:              row.get(7)?,
      status:                 row.get(8)?,
      created_at:             row.get(9)?,
      updated_at:             row.get(10)?,
      year_id:                row.get(11)?,
      semester_id:            row.get(12)?,
      subject_id:             row.get(13)?,
      unit_number:            row.get(14)?,
      is_important_questions: row.get(15)?,
      notes_type:             row.get(16)?,
    })
  }

  pub fn into_note(self) -> Result<Note> {
    Ok(Note {
      id:                     decode_uuid(&self.note_id)?,
      user_id:                decode_uuid(&self.user_id)?,
      course_id:              self.course_id.as_deref().map(decode_uuid).transpose()?,
      title:                  self.title,
      description:            self.description,
      file_url:               self.file_url,
      file_path:              self.file_path,
      file_type:              self.file_type,
      status:                 decode_status(&self.status)?,
      created_at:             decode_dt(&self.created_at)?,
      updated_at:             decode_dt(&self.updated_at)?,
      year_id:                self.year_id,
      semester_id:            self.semester_id,
      subject_id:             self.subject_id,
      unit_number:            decode_unit(self.unit_number)?,
      is_important_questions: self.is_important_questions,
      notes_type:             self.notes_type,
    })
  }
}

/// Raw strings read directly from a `courses` row.
pub struct RawCourse {
  pub course_id:   String,
  pub name:        String,
  pub code:        Option<String>,
  pub description: Option<String>,
  pub created_at:  String,
}

impl RawCourse {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      course_id:   row.get(0)?,
      name:        row.get(1)?,
      code:        row.get(2)?,
      description: row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      id:          decode_uuid(&self.course_id)?,
      name:        self.name,
      code:        self.code,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `profiles` row.
pub struct RawAccount {
  pub user_id:       String,
  pub email:         String,
  pub full_name:     Option<String>,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      email:         row.get(1)?,
      full_name:     row.get(2)?,
      password_hash: row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      profile:       Profile {
        id:        decode_uuid(&self.user_id)?,
        email:     self.email,
        full_name: self.full_name,
      },
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// A `sessions` row joined with its owner's profile columns.
pub struct RawSession {
  pub token_hash: String,
  pub user_id:    String,
  pub created_at: String,
  pub expires_at: String,
  pub email:      String,
  pub full_name:  Option<String>,
}

impl RawSession {
  pub fn into_parts(self) -> Result<(Session, Profile)> {
    let user_id = decode_uuid(&self.user_id)?;
    Ok((
      Session {
        token_hash: self.token_hash,
        user_id,
        created_at: decode_dt(&self.created_at)?,
        expires_at: decode_dt(&self.expires_at)?,
      },
      Profile {
        id:        user_id,
        email:     self.email,
        full_name: self.full_name,
      },
    ))
  }
}

/// Raw strings read directly from a `reviews` row.
pub struct RawReview {
  pub review_id:   String,
  pub note_id:     String,
  pub reviewer_id: String,
  pub decision:    String,
  pub from_status: String,
  pub to_status:   String,
  pub reviewed_at: String,
}

impl RawReview {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      review_id:   row.get(0)?,
      note_id:     row.get(1)?,
      reviewer_id: row.get(2)?,
      decision:    row.get(3)?,
      from_status: row.get(4)?,
      to_status:   row.get(5)?,
      reviewed_at: row.get(6)?,
    })
  }

  pub fn into_review(self) -> Result<Review> {
    Ok(Review {
      review_id:   decode_uuid(&self.review_id)?,
      note_id:     decode_uuid(&self.note_id)?,
      reviewer_id: decode_uuid(&self.reviewer_id)?,
      decision:    decode_decision(&self.decision)?,
      from_status: decode_status(&self.from_status)?,
      to_status:   decode_status(&self.to_status)?,
      reviewed_at: decode_dt(&self.reviewed_at)?,
    })
  }
}
