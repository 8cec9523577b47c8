//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use studyshelf_core::{
  course::NewCourse,
  identity::{NewAccount, Profile, Session},
  note::{NewNote, NoteStatus},
  review::{Review, ReviewDecision},
  store::{AccountStore, NoteQuery, NoteStore, StoreError},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn account(s: &SqliteStore, email: &str) -> Profile {
  s.create_account(NewAccount {
    email:         email.into(),
    full_name:     Some("Test User".into()),
    password_hash: "$argon2id$fake".into(),
  })
  .await
  .unwrap()
}

fn upload(user_id: Uuid, title: &str) -> NewNote {
  NewNote::new(
    user_id,
    title,
    format!("http://localhost/files/{user_id}/1-notes.pdf"),
    format!("{user_id}/1-notes.pdf"),
  )
}

// ─── Courses ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_list_courses() {
  let s = store().await;
  let cse = s
    .add_course(NewCourse {
      name:        "B.Tech CSE".into(),
      code:        Some("CSE".into()),
      description: None,
    })
    .await
    .unwrap();
  s.add_course(NewCourse {
    name:        "B.Tech ECE".into(),
    code:        None,
    description: Some("Electronics".into()),
  })
  .await
  .unwrap();

  let all = s.list_courses().await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].name, "B.Tech CSE");

  let fetched = s.get_course(cse.id).await.unwrap().unwrap();
  assert_eq!(fetched, cse);
  assert!(s.get_course(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Notes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn created_note_is_pending() {
  let s = store().await;
  let user = account(&s, "student@college.edu").await;

  let note = s.create_note(upload(user.id, "OS unit 1")).await.unwrap();
  assert_eq!(note.status, NoteStatus::Pending);
  assert_eq!(note.created_at, note.updated_at);

  let fetched = s.get_note(note.id).await.unwrap().unwrap();
  assert_eq!(fetched, note);
}

#[tokio::test]
async fn optional_fields_roundtrip() {
  let s = store().await;
  let user = account(&s, "student@college.edu").await;
  let course = s
    .add_course(NewCourse { name: "CSE".into(), code: None, description: None })
    .await
    .unwrap();

  let mut input = upload(user.id, "II Year - Semester II - Discrete Mathematics");
  input.course_id = Some(course.id);
  input.description = "Sets, relations, functions".into();
  input.year_id = Some("year-2".into());
  input.semester_id = Some("year-2-sem-2".into());
  input.subject_id = Some("discrete-mathematics".into());
  input.unit_number = Some(3);
  input.is_important_questions = Some(true);
  input.notes_type = Some("handwritten".into());

  let note = s.create_note(input).await.unwrap();
  let fetched = s.get_note(note.id).await.unwrap().unwrap();

  assert_eq!(fetched.course_id, Some(course.id));
  assert_eq!(fetched.unit_number, Some(3));
  assert_eq!(fetched.is_important_questions, Some(true));
  assert_eq!(fetched.subject_id.as_deref(), Some("discrete-mathematics"));
  assert_eq!(fetched.notes_type.as_deref(), Some("handwritten"));
}

#[tokio::test]
async fn get_note_missing_returns_none() {
  let s = store().await;
  assert!(s.get_note(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_notes_filters_by_status_and_user() {
  let s = store().await;
  let alice = account(&s, "alice@college.edu").await;
  let bob = account(&s, "bob@college.edu").await;
  let admin = account(&s, "admin@college.edu").await;

  let a1 = s.create_note(upload(alice.id, "a1")).await.unwrap();
  s.create_note(upload(alice.id, "a2")).await.unwrap();
  s.create_note(upload(bob.id, "b1")).await.unwrap();
  s.review_note(a1.id, ReviewDecision::Approve, admin.id)
    .await
    .unwrap();

  let all = s.list_notes(&NoteQuery::default()).await.unwrap();
  assert_eq!(all.len(), 3);

  let pending = s
    .list_notes(&NoteQuery { status: Some(NoteStatus::Pending), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(pending.len(), 2);

  let alices = s
    .list_notes(&NoteQuery { user_id: Some(alice.id), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(alices.len(), 2);
  assert!(alices.iter().all(|n| n.user_id == alice.id));

  let approved = s
    .list_notes(&NoteQuery { status: Some(NoteStatus::Approved), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(approved.len(), 1);
  assert_eq!(approved[0].id, a1.id);
}

#[tokio::test]
async fn list_notes_newest_first_with_paging() {
  let s = store().await;
  let user = account(&s, "student@college.edu").await;
  for i in 0..5 {
    s.create_note(upload(user.id, &format!("note {i}"))).await.unwrap();
  }

  let page = s
    .list_notes(&NoteQuery { limit: Some(2), offset: Some(1), ..Default::default() })
    .await
    .unwrap();
  let titles: Vec<_> = page.iter().map(|n| n.title.as_str()).collect();
  assert_eq!(titles, ["note 3", "note 2"]);
}

// ─── Review ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn approve_advances_updated_at() {
  let s = store().await;
  let user = account(&s, "student@college.edu").await;
  let admin = account(&s, "admin@college.edu").await;
  let note = s.create_note(upload(user.id, "CN notes")).await.unwrap();

  let (approved, review) = s
    .review_note(note.id, ReviewDecision::Approve, admin.id)
    .await
    .unwrap();

  assert_eq!(approved.status, NoteStatus::Approved);
  assert!(approved.updated_at > note.updated_at);
  assert_eq!(review.from_status, NoteStatus::Pending);
  assert_eq!(review.to_status, NoteStatus::Approved);
  assert_eq!(review.reviewer_id, admin.id);

  let fetched = s.get_note(note.id).await.unwrap().unwrap();
  assert_eq!(fetched.status, NoteStatus::Approved);
  assert_eq!(fetched.updated_at, approved.updated_at);
  assert_eq!(fetched.created_at, note.created_at);
}

#[tokio::test]
async fn rejected_note_cannot_be_approved() {
  let s = store().await;
  let user = account(&s, "student@college.edu").await;
  let admin = account(&s, "admin@college.edu").await;
  let note = s.create_note(upload(user.id, "spam")).await.unwrap();

  s.review_note(note.id, ReviewDecision::Reject, admin.id)
    .await
    .unwrap();
  let err = s
    .review_note(note.id, ReviewDecision::Approve, admin.id)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(studyshelf_core::Error::InvalidTransition { from: NoteStatus::Rejected, .. })
  ));

  let fetched = s.get_note(note.id).await.unwrap().unwrap();
  assert_eq!(fetched.status, NoteStatus::Rejected);

  let history = s.list_reviews(note.id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].decision, ReviewDecision::Reject);
}

#[tokio::test]
async fn review_missing_note_errors() {
  let s = store().await;
  let admin = account(&s, "admin@college.edu").await;
  let id = Uuid::new_v4();
  let err = s
    .review_note(id, ReviewDecision::Approve, admin.id)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::NoteNotFound(missing) if missing == id));
}

fn review_from_pending(note_id: Uuid, reviewer_id: Uuid, decision: ReviewDecision) -> Review {
  Review {
    review_id: Uuid::new_v4(),
    note_id,
    reviewer_id,
    decision,
    from_status: NoteStatus::Pending,
    to_status: decision.target(),
    reviewed_at: Utc::now(),
  }
}

#[tokio::test]
async fn review_from_stale_read_is_not_applied() {
  let s = store().await;
  let user = account(&s, "student@college.edu").await;
  let first = account(&s, "admin@college.edu").await;
  let second = account(&s, "head@college.edu").await;
  let note = s.create_note(upload(user.id, "spam")).await.unwrap();

  // Both admins read the note while it was pending.
  let reject = review_from_pending(note.id, first.id, ReviewDecision::Reject);
  let approve = review_from_pending(note.id, second.id, ReviewDecision::Approve);

  assert!(s.apply_review(reject).await.unwrap());
  assert!(!s.apply_review(approve).await.unwrap());

  let fetched = s.get_note(note.id).await.unwrap().unwrap();
  assert_eq!(fetched.status, NoteStatus::Rejected);
  let history = s.list_reviews(note.id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].reviewer_id, first.id);
}

#[tokio::test]
async fn racing_reviews_have_one_winner() {
  let s = store().await;
  let user = account(&s, "student@college.edu").await;
  let admin = account(&s, "admin@college.edu").await;
  let note = s.create_note(upload(user.id, "CN notes")).await.unwrap();

  let (a, b) = tokio::join!(
    s.review_note(note.id, ReviewDecision::Reject, admin.id),
    s.review_note(note.id, ReviewDecision::Approve, admin.id),
  );
  let (winner, loser) = match (a, b) {
    (Ok(won), Err(lost)) | (Err(lost), Ok(won)) => (won, lost),
    other => panic!("expected exactly one winner, got {other:?}"),
  };
  assert!(loser.is_conflict(), "{loser}");

  let fetched = s.get_note(note.id).await.unwrap().unwrap();
  assert_eq!(fetched.status, winner.0.status);
  assert_eq!(s.list_reviews(note.id).await.unwrap().len(), 1);
}

#[test]
fn lost_review_is_a_conflict() {
  assert!(Error::ConcurrentReview(Uuid::nil()).is_conflict());
  assert!(Error::EmailTaken("a@b.c".into()).is_conflict());
  assert!(!Error::NoteNotFound(Uuid::nil()).is_conflict());
  assert!(!Error::Decode("bad".into()).is_conflict());
}

// ─── Accounts & sessions ─────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  account(&s, "student@college.edu").await;
  let err = s
    .create_account(NewAccount {
      email:         "student@college.edu".into(),
      full_name:     None,
      password_hash: "x".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::EmailTaken(_)));
  assert!(err.is_conflict());
}

#[tokio::test]
async fn find_account_and_profile() {
  let s = store().await;
  let profile = account(&s, "student@college.edu").await;

  let found = s
    .find_account("student@college.edu".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(found.profile, profile);
  assert_eq!(found.password_hash, "$argon2id$fake");

  assert_eq!(s.get_profile(profile.id).await.unwrap(), Some(profile));
  assert!(s.find_account("nobody@college.edu".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn session_lifecycle() {
  let s = store().await;
  let profile = account(&s, "student@college.edu").await;
  let now = Utc::now();

  s.create_session(Session {
    token_hash: "abc123".into(),
    user_id:    profile.id,
    created_at: now,
    expires_at: now + Duration::hours(1),
  })
  .await
  .unwrap();

  let (session, owner) = s.find_session("abc123".into()).await.unwrap().unwrap();
  assert_eq!(owner, profile);
  assert!(!session.is_expired(now));

  assert!(s.delete_session("abc123".into()).await.unwrap());
  assert!(!s.delete_session("abc123".into()).await.unwrap());
  assert!(s.find_session("abc123".into()).await.unwrap().is_none());
}
