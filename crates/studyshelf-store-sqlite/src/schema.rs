//! SQL schema for the StudyShelf SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS courses (
    course_id   TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    code        TEXT,
    description TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS profiles (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,   -- normalised: trimmed, lower-case
    full_name     TEXT,
    password_hash TEXT NOT NULL,          -- argon2 PHC string
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,          -- hex SHA-256 of the bearer token
    user_id    TEXT NOT NULL REFERENCES profiles(user_id),
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

-- Notes are never deleted. The only UPDATE is the pending -> approved/rejected
-- transition.
CREATE TABLE IF NOT EXISTS notes (
    note_id                TEXT PRIMARY KEY,
    user_id                TEXT NOT NULL REFERENCES profiles(user_id),
    course_id              TEXT REFERENCES courses(course_id),
    title                  TEXT NOT NULL,
    description            TEXT NOT NULL DEFAULT '',
    file_url               TEXT NOT NULL,
    file_path              TEXT NOT NULL,
    file_type              TEXT NOT NULL,
    status                 TEXT NOT NULL DEFAULT 'pending'
                           CHECK (status IN ('pending', 'approved', 'rejected')),
    created_at             TEXT NOT NULL,
    updated_at             TEXT NOT NULL,
    -- Curriculum keys: free text, not enforced against the bundled catalog.
    year_id                TEXT,
    semester_id            TEXT,
    subject_id             TEXT,
    unit_number            INTEGER,
    is_important_questions INTEGER,
    notes_type             TEXT
);

-- Append-only review history.
CREATE TABLE IF NOT EXISTS reviews (
    review_id   TEXT PRIMARY KEY,
    note_id     TEXT NOT NULL REFERENCES notes(note_id),
    reviewer_id TEXT NOT NULL REFERENCES profiles(user_id),
    decision    TEXT NOT NULL,
    from_status TEXT NOT NULL,
    to_status   TEXT NOT NULL,
    reviewed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS notes_status_idx   ON notes(status);
CREATE INDEX IF NOT EXISTS notes_user_idx     ON notes(user_id);
CREATE INDEX IF NOT EXISTS notes_created_idx  ON notes(created_at);
CREATE INDEX IF NOT EXISTS reviews_note_idx   ON reviews(note_id);
CREATE INDEX IF NOT EXISTS sessions_user_idx  ON sessions(user_id);

PRAGMA user_version = 1;
";
