//! The curriculum catalog: a static, read-only taxonomy of years, semesters
//! and subjects.
//!
//! The catalog is bundled into the binary at compile time and never mutated at
//! runtime. Identifiers are stable, human-assigned strings such as
//! `"year-2-sem-2"`; they are unique within their parent's children, and
//! subject identifiers are unique across the whole catalog so that a bare
//! `subject_id` foreign key is never ambiguous.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const BUNDLED: &str = include_str!("../data/curriculum.json");

// ─── Nodes ───────────────────────────────────────────────────────────────────

/// A leaf of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
  pub id:                     String,
  pub name:                   String,
  pub code:                   String,
  #[serde(default)]
  pub has_lab:                bool,
  /// Leaf that collects important questions rather than lecture notes.
  #[serde(default)]
  pub is_important_questions: bool,
}

impl Subject {
  /// Whether `text` contains this subject's name or code as a literal
  /// substring. No case, punctuation or whitespace normalisation.
  pub fn appears_in(&self, text: &str) -> bool {
    text.contains(&self.name) || text.contains(&self.code)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Semester {
  pub id:       String,
  pub name:     String,
  pub subjects: Vec<Subject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Year {
  pub id:        String,
  pub name:      String,
  pub semesters: Vec<Semester>,
}

// ─── Paths ───────────────────────────────────────────────────────────────────

/// A semester together with the year that owns it.
#[derive(Debug, Clone, Copy)]
pub struct SemesterPath<'a> {
  pub year:     &'a Year,
  pub semester: &'a Semester,
}

/// A subject together with its ancestors.
#[derive(Debug, Clone, Copy)]
pub struct SubjectPath<'a> {
  pub year:     &'a Year,
  pub semester: &'a Semester,
  pub subject:  &'a Subject,
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CatalogFile {
  years: Vec<Year>,
}

/// The validated, immutable curriculum tree.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
  years: Vec<Year>,
}

impl Catalog {
  /// Build a catalog, rejecting duplicate identifiers and empty names or
  /// codes (an empty code would be a substring of every title).
  pub fn new(years: Vec<Year>) -> Result<Self> {
    let mut year_ids = HashSet::new();
    let mut subject_ids = HashSet::new();

    for year in &years {
      require_text("year id", &year.id)?;
      require_text("year name", &year.name)?;
      if !year_ids.insert(year.id.as_str()) {
        return Err(duplicate("catalog", &year.id));
      }

      let mut semester_ids = HashSet::new();
      for semester in &year.semesters {
        require_text("semester id", &semester.id)?;
        require_text("semester name", &semester.name)?;
        if !semester_ids.insert(semester.id.as_str()) {
          return Err(duplicate(&year.id, &semester.id));
        }

        for subject in &semester.subjects {
          require_text("subject id", &subject.id)?;
          require_text("subject name", &subject.name)?;
          require_text("subject code", &subject.code)?;
          if !subject_ids.insert(subject.id.as_str()) {
            return Err(duplicate(&semester.id, &subject.id));
          }
        }
      }
    }

    Ok(Self { years })
  }

  /// Parse a catalog from its JSON form: `{"years": [...]}`.
  pub fn from_json(raw: &str) -> Result<Self> {
    let file: CatalogFile = serde_json::from_str(raw)?;
    Self::new(file.years)
  }

  /// The catalog compiled into this binary.
  pub fn bundled() -> Result<Self> { Self::from_json(BUNDLED) }

  pub fn years(&self) -> &[Year] { &self.years }

  pub fn year(&self, id: &str) -> Option<&Year> {
    self.years.iter().find(|y| y.id == id)
  }

  pub fn semester(&self, id: &str) -> Option<SemesterPath<'_>> {
    self.semesters().find(|p| p.semester.id == id)
  }

  pub fn subject(&self, id: &str) -> Option<SubjectPath<'_>> {
    self.subjects().find(|p| p.subject.id == id)
  }

  /// Every semester in catalog order.
  pub fn semesters(&self) -> impl Iterator<Item = SemesterPath<'_>> {
    self.years.iter().flat_map(|year| {
      year
        .semesters
        .iter()
        .map(move |semester| SemesterPath { year, semester })
    })
  }

  /// Every subject in catalog order.
  pub fn subjects(&self) -> impl Iterator<Item = SubjectPath<'_>> {
    self.semesters().flat_map(|SemesterPath { year, semester }| {
      semester
        .subjects
        .iter()
        .map(move |subject| SubjectPath { year, semester, subject })
    })
  }

  /// Linear scan for subjects whose name or code contains `query`.
  pub fn search(&self, query: &str) -> Vec<SubjectPath<'_>> {
    if query.is_empty() {
      return Vec::new();
    }
    self
      .subjects()
      .filter(|p| p.subject.name.contains(query) || p.subject.code.contains(query))
      .collect()
  }
}

fn require_text(what: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::InvalidCatalog(format!("{what} must not be empty")));
  }
  Ok(())
}

fn duplicate(parent: &str, id: &str) -> Error {
  Error::DuplicateNodeId {
    parent: parent.to_owned(),
    id:     id.to_owned(),
  }
}
