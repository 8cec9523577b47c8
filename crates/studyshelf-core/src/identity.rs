//! Profiles, accounts, sessions and the role claim.
//!
//! Roles are not stored. They are computed from a [`RolePolicy`] built from
//! configuration and attached to the authenticated [`Identity`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Profiles & accounts ─────────────────────────────────────────────────────

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub id:        Uuid,
  pub email:     String,
  pub full_name: Option<String>,
}

/// A profile plus its credential material. Never serialised to clients.
#[derive(Debug, Clone)]
pub struct Account {
  pub profile:       Profile,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::AccountStore::create_account`].
#[derive(Debug, Clone)]
pub struct NewAccount {
  /// Already normalised with [`normalize_email`].
  pub email:         String,
  pub full_name:     Option<String>,
  pub password_hash: String,
}

/// A sign-in session. Only the SHA-256 digest of the bearer token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub token_hash: String,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool { now >= self.expires_at }
}

/// Lower-case and trim an email address for storage and comparison.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

// ─── Roles ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Student,
  Admin,
}

/// An authenticated user together with their role claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub profile: Profile,
  pub role:    Role,
}

impl Identity {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// Assigns roles from an email allow-list supplied by configuration.
#[derive(Debug, Clone, Default)]
pub struct RolePolicy {
  admin_emails: HashSet<String>,
}

impl RolePolicy {
  pub fn new<I, S>(admin_emails: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Self {
      admin_emails: admin_emails
        .into_iter()
        .map(|e| normalize_email(e.as_ref()))
        .filter(|e| !e.is_empty())
        .collect(),
    }
  }

  pub fn has_admins(&self) -> bool { !self.admin_emails.is_empty() }

  pub fn role_for(&self, email: &str) -> Role {
    if self.admin_emails.contains(&normalize_email(email)) {
      Role::Admin
    } else {
      Role::Student
    }
  }

  pub fn identify(&self, profile: Profile) -> Identity {
    let role = self.role_for(&profile.email);
    Identity { profile, role }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn profile(email: &str) -> Profile {
    Profile { id: Uuid::new_v4(), email: email.into(), full_name: None }
  }

  #[test]
  fn admin_match_ignores_case_and_whitespace() {
    let policy = RolePolicy::new([" Admin@College.edu "]);
    assert_eq!(policy.role_for("admin@college.edu"), Role::Admin);
    assert_eq!(policy.role_for("ADMIN@COLLEGE.EDU"), Role::Admin);
    assert_eq!(policy.role_for("student@college.edu"), Role::Student);
  }

  #[test]
  fn empty_policy_has_no_admins() {
    let policy = RolePolicy::new(Vec::<String>::new());
    assert!(!policy.has_admins());
    assert!(!policy.identify(profile("anyone@college.edu")).is_admin());
  }

  #[test]
  fn blank_entries_are_ignored() {
    let policy = RolePolicy::new(["", "  "]);
    assert!(!policy.has_admins());
  }

  #[test]
  fn session_expiry_is_inclusive() {
    let now = Utc::now();
    let session = Session {
      token_hash: "x".into(),
      user_id:    Uuid::new_v4(),
      created_at: now,
      expires_at: now,
    };
    assert!(session.is_expired(now));
    assert!(!session.is_expired(now - chrono::Duration::seconds(1)));
  }
}
