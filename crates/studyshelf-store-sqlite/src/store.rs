//! [`SqliteStore`], the SQLite implementation of [`NoteStore`] and
//! [`AccountStore`].

use std::path::Path;

use chrono::Duration;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use studyshelf_core::{
  course::{Course, NewCourse},
  identity::{Account, NewAccount, Profile, Session},
  note::{NewNote, Note, NoteStatus},
  review::{Review, ReviewDecision},
  store::{AccountStore, NoteQuery, NoteStore},
};

use crate::{
  Error, Result,
  encode::{
    NOTE_COLUMNS, RawAccount, RawCourse, RawNote, RawReview, RawSession,
    encode_dt, encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A StudyShelf store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Write `review` if its note is still in `review.from_status`, inside one
  /// transaction. Returns `false` when the note has moved on since it was
  /// read.
  pub(crate) async fn apply_review(&self, review: Review) -> Result<bool> {
    let applied = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE notes SET status = ?1, updated_at = ?2
           WHERE note_id = ?3 AND status = ?4",
          rusqlite::params![
            review.to_status.as_str(),
            encode_dt(review.reviewed_at),
            encode_uuid(review.note_id),
            review.from_status.as_str(),
          ],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO reviews (
             review_id, note_id, reviewer_id, decision,
             from_status, to_status, reviewed_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            encode_uuid(review.review_id),
            encode_uuid(review.note_id),
            encode_uuid(review.reviewer_id),
            review.decision.as_str(),
            review.from_status.as_str(),
            review.to_status.as_str(),
            encode_dt(review.reviewed_at),
          ],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;
    Ok(applied)
  }
}

// ─── NoteStore impl ──────────────────────────────────────────────────────────

impl NoteStore for SqliteStore {
  type Error = Error;

  // ── Courses ───────────────────────────────────────────────────────────────

  async fn add_course(&self, input: NewCourse) -> Result<Course> {
    let course = Course {
      id:          Uuid::new_v4(),
      name:        input.name,
      code:        input.code,
      description: input.description,
      created_at:  now(),
    };

    let id_str      = encode_uuid(course.id);
    let name        = course.name.clone();
    let code        = course.code.clone();
    let description = course.description.clone();
    let at_str      = encode_dt(course.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO courses (course_id, name, code, description, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, name, code, description, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(course)
  }

  async fn get_course(&self, id: Uuid) -> Result<Option<Course>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCourse> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT course_id, name, code, description, created_at
             FROM courses WHERE course_id = ?1",
            rusqlite::params![id_str],
            RawCourse::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawCourse::into_course).transpose()
  }

  async fn list_courses(&self) -> Result<Vec<Course>> {
    let raws: Vec<RawCourse> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT course_id, name, code, description, created_at
           FROM courses ORDER BY name",
        )?;
        let rows = stmt
          .query_map([], RawCourse::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCourse::into_course).collect()
  }

  // ── Notes ─────────────────────────────────────────────────────────────────

  async fn create_note(&self, input: NewNote) -> Result<Note> {
    let created_at = now();
    let note = Note {
      id: Uuid::new_v4(),
      user_id: input.user_id,
      course_id: input.course_id,
      title: input.title,
      description: input.description,
      file_url: input.file_url,
      file_path: input.file_path,
      file_type: input.file_type,
      status: NoteStatus::Pending,
      created_at,
      updated_at: created_at,
      year_id: input.year_id,
      semester_id: input.semester_id,
      subject_id: input.subject_id,
      unit_number: input.unit_number,
      is_important_questions: input.is_important_questions,
      notes_type: input.notes_type,
    };

    let row = note.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notes (
             note_id, user_id, course_id, title, description,
             file_url, file_path, file_type, status, created_at, updated_at,
             year_id, semester_id, subject_id, unit_number,
             is_important_questions, notes_type
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
          rusqlite::params![
            encode_uuid(row.id),
            encode_uuid(row.user_id),
            row.course_id.map(encode_uuid),
            row.title,
            row.description,
            row.file_url,
            row.file_path,
            row.file_type,
            row.status.as_str(),
            encode_dt(row.created_at),
            encode_dt(row.updated_at),
            row.year_id,
            row.semester_id,
            row.subject_id,
            row.unit_number,
            row.is_important_questions,
            row.notes_type,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(note)
  }

  async fn get_note(&self, id: Uuid) -> Result<Option<Note>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawNote> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE note_id = ?1"),
            rusqlite::params![id_str],
            RawNote::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawNote::into_note).transpose()
  }

  async fn list_notes(&self, query: &NoteQuery) -> Result<Vec<Note>> {
    let status_str = query.status.map(|s| s.as_str().to_owned());
    let user_str   = query.user_id.map(encode_uuid);
    let course_str = query.course_id.map(encode_uuid);
    let limit_val  = query.limit.map_or(-1, |l| l as i64);
    let offset_val = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawNote> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {NOTE_COLUMNS} FROM notes
           WHERE (?1 IS NULL OR status    = ?1)
             AND (?2 IS NULL OR user_id   = ?2)
             AND (?3 IS NULL OR course_id = ?3)
           ORDER BY created_at DESC, note_id
           LIMIT ?4 OFFSET ?5"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![status_str, user_str, course_str, limit_val, offset_val],
            RawNote::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawNote::into_note).collect()
  }

  // ── Review ────────────────────────────────────────────────────────────────

  async fn review_note(
    &self,
    id:          Uuid,
    decision:    ReviewDecision,
    reviewer_id: Uuid,
  ) -> Result<(Note, Review)> {
    let note = self.get_note(id).await?.ok_or(Error::NoteNotFound(id))?;
    let to_status = note.status.review(decision)?;

    // updated_at must strictly advance, even on a coarse clock.
    let reviewed_at = now().max(note.updated_at + Duration::microseconds(1));

    let review = Review {
      review_id: Uuid::new_v4(),
      note_id: id,
      reviewer_id,
      decision,
      from_status: note.status,
      to_status,
      reviewed_at,
    };

    let applied = self.apply_review(review.clone()).await?;
    if !applied {
      return Err(Error::ConcurrentReview(id));
    }

    let updated = Note {
      status: to_status,
      updated_at: reviewed_at,
      ..note
    };
    Ok((updated, review))
  }

  async fn list_reviews(&self, note_id: Uuid) -> Result<Vec<Review>> {
    let id_str = encode_uuid(note_id);

    let raws: Vec<RawReview> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT review_id, note_id, reviewer_id, decision,
                  from_status, to_status, reviewed_at
           FROM reviews WHERE note_id = ?1
           ORDER BY reviewed_at",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawReview::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReview::into_review).collect()
  }
}

// ─── AccountStore impl ───────────────────────────────────────────────────────

impl AccountStore for SqliteStore {
  type Error = Error;

  async fn create_account(&self, input: NewAccount) -> Result<Profile> {
    let profile = Profile {
      id:        Uuid::new_v4(),
      email:     input.email,
      full_name: input.full_name,
    };

    let id_str    = encode_uuid(profile.id);
    let email     = profile.email.clone();
    let full_name = profile.full_name.clone();
    let hash      = input.password_hash;
    let at_str    = encode_dt(now());

    let inserted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "INSERT INTO profiles (user_id, email, full_name, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (email) DO NOTHING",
          rusqlite::params![id_str, email, full_name, hash, at_str],
        )?;
        Ok(changed == 1)
      })
      .await?;

    if !inserted {
      return Err(Error::EmailTaken(profile.email));
    }
    Ok(profile)
  }

  async fn find_account(&self, email: String) -> Result<Option<Account>> {
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, email, full_name, password_hash, created_at
             FROM profiles WHERE email = ?1",
            rusqlite::params![email],
            RawAccount::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, email, full_name, password_hash, created_at
             FROM profiles WHERE user_id = ?1",
            rusqlite::params![id_str],
            RawAccount::from_row,
          )
          .optional()?)
      })
      .await?;

    Ok(raw.map(RawAccount::into_account).transpose()?.map(|a| a.profile))
  }

  async fn create_session(&self, session: Session) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            session.token_hash,
            encode_uuid(session.user_id),
            encode_dt(session.created_at),
            encode_dt(session.expires_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_session(&self, token_hash: String) -> Result<Option<(Session, Profile)>> {
    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT s.token_hash, s.user_id, s.created_at, s.expires_at,
                    p.email, p.full_name
             FROM sessions s
             JOIN profiles p ON p.user_id = s.user_id
             WHERE s.token_hash = ?1",
            rusqlite::params![token_hash],
            |row| {
              Ok(RawSession {
                token_hash: row.get(0)?,
                user_id:    row.get(1)?,
                created_at: row.get(2)?,
                expires_at: row.get(3)?,
                email:      row.get(4)?,
                full_name:  row.get(5)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSession::into_parts).transpose()
  }

  async fn delete_session(&self, token_hash: String) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "DELETE FROM sessions WHERE token_hash = ?1",
          rusqlite::params![token_hash],
        )?;
        Ok(changed > 0)
      })
      .await?;
    Ok(deleted)
  }
}
