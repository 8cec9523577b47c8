//! Note-to-curriculum resolution.
//!
//! Maps a [`Note`] onto zero or more catalog positions for display grouping
//! and filtering. Explicit foreign keys win; when none of them resolve, the
//! note title is scanned for literal catalog terms.
//!
//! Resolution is an ordered list of [`ResolutionRule`]s. The first rule that
//! produces any association decides the outcome; later rules are not
//! consulted. [`Resolver::standard`] wires the default precedence:
//!
//! 1. [`ForeignKeyRule`]: `subject_id` found in the catalog.
//! 2. [`ScopeRule`]: a valid semester or year key when there is no usable
//!    subject key.
//! 3. [`AliasRule`]: configured literal title patterns pinned to a subject.
//! 4. [`TitleRule`]: subjects whose name or code occurs in the title.
//! 5. [`TitleScopeRule`]: year/semester display names occurring in the
//!    title.
//!
//! Matching is literal substring containment with no normalisation, and
//! ambiguous matches are all returned. A note that nothing matches resolves
//! to an empty [`Resolution`] and is silently left out of filtered views.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  catalog::{Catalog, SemesterPath, SubjectPath, Year},
  note::Note,
};

// ─── Associations ────────────────────────────────────────────────────────────

/// Which rule produced an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
  ForeignKey,
  Alias,
  Title,
  PartialForeignKey,
  TitleScope,
}

/// A position in the catalog. Always names a year; semester and subject are
/// present when the match was that specific.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
  pub year_id:     String,
  pub semester_id: Option<String>,
  pub subject_id:  Option<String>,
  pub source:      MatchSource,
}

impl Association {
  fn subject(path: SubjectPath<'_>, source: MatchSource) -> Self {
    Self {
      year_id: path.year.id.clone(),
      semester_id: Some(path.semester.id.clone()),
      subject_id: Some(path.subject.id.clone()),
      source,
    }
  }

  fn semester(path: SemesterPath<'_>, source: MatchSource) -> Self {
    Self {
      year_id: path.year.id.clone(),
      semester_id: Some(path.semester.id.clone()),
      subject_id: None,
      source,
    }
  }

  fn year(year: &Year, source: MatchSource) -> Self {
    Self {
      year_id: year.id.clone(),
      semester_id: None,
      subject_id: None,
      source,
    }
  }

  /// Whether this association lies inside the filtered part of the catalog.
  pub fn matches(&self, filter: &CurriculumFilter) -> bool {
    filter
      .year_id
      .as_deref()
      .is_none_or(|y| y == self.year_id)
      && filter
        .semester_id
        .as_deref()
        .is_none_or(|s| self.semester_id.as_deref() == Some(s))
      && filter
        .subject_id
        .as_deref()
        .is_none_or(|s| self.subject_id.as_deref() == Some(s))
  }
}

/// A browse filter: any combination of catalog identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumFilter {
  pub year_id:     Option<String>,
  pub semester_id: Option<String>,
  pub subject_id:  Option<String>,
}

impl CurriculumFilter {
  pub fn is_empty(&self) -> bool {
    self.year_id.is_none() && self.semester_id.is_none() && self.subject_id.is_none()
  }
}

/// The outcome of resolving one note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
  pub associations: Vec<Association>,
}

impl Resolution {
  pub fn is_unmatched(&self) -> bool { self.associations.is_empty() }

  /// The first association, for callers that show one position per note.
  pub fn primary(&self) -> Option<&Association> { self.associations.first() }

  /// An empty filter admits every note; otherwise at least one association
  /// has to fall inside it.
  pub fn matches(&self, filter: &CurriculumFilter) -> bool {
    filter.is_empty() || self.associations.iter().any(|a| a.matches(filter))
  }
}

/// A note bundled with where it sits in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedNote {
  pub note:       Note,
  pub resolution: Resolution,
}

// ─── Rules ───────────────────────────────────────────────────────────────────

/// One step of the resolution precedence.
pub trait ResolutionRule: fmt::Debug + Send + Sync {
  fn resolve(&self, note: &Note, catalog: &Catalog) -> Vec<Association>;
}

/// Treat blank foreign keys the same as missing ones.
fn key(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// The part of the catalog the note's year/semester keys point at, if those
/// keys are valid and agree with each other.
enum Scope<'a> {
  Semester(SemesterPath<'a>),
  Year(&'a Year),
  Everything,
}

fn scope<'a>(note: &Note, catalog: &'a Catalog) -> Scope<'a> {
  let year = key(&note.year_id).and_then(|id| catalog.year(id));
  let semester = key(&note.semester_id)
    .and_then(|id| catalog.semester(id))
    .filter(|path| year.is_none_or(|y| y.id == path.year.id));

  match (semester, year) {
    (Some(path), _) => Scope::Semester(path),
    (None, Some(year)) => Scope::Year(year),
    (None, None) => Scope::Everything,
  }
}

/// Direct lookup of `subject_id`. A subject that exists wins even when the
/// note's year or semester keys point elsewhere.
#[derive(Debug, Default)]
pub struct ForeignKeyRule;

impl ResolutionRule for ForeignKeyRule {
  fn resolve(&self, note: &Note, catalog: &Catalog) -> Vec<Association> {
    key(&note.subject_id)
      .and_then(|id| catalog.subject(id))
      .map(|path| Association::subject(path, MatchSource::ForeignKey))
      .into_iter()
      .collect()
  }
}

/// A literal title pattern pinned to a subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleAlias {
  pub pattern:    String,
  pub subject_id: String,
}

impl TitleAlias {
  /// Check that every alias has a pattern and targets a real subject.
  pub fn validate_all(aliases: &[TitleAlias], catalog: &Catalog) -> Result<()> {
    for alias in aliases {
      if alias.pattern.is_empty() || catalog.subject(&alias.subject_id).is_none() {
        return Err(Error::UnknownAliasTarget {
          pattern:    alias.pattern.clone(),
          subject_id: alias.subject_id.clone(),
        });
      }
    }
    Ok(())
  }
}

/// Data-driven exceptions ahead of the general title scan.
#[derive(Debug, Default)]
pub struct AliasRule {
  aliases: Vec<TitleAlias>,
}

impl AliasRule {
  pub fn new(aliases: Vec<TitleAlias>) -> Self { Self { aliases } }
}

impl ResolutionRule for AliasRule {
  fn resolve(&self, note: &Note, catalog: &Catalog) -> Vec<Association> {
    let mut out: Vec<Association> = Vec::new();
    for alias in &self.aliases {
      if alias.pattern.is_empty() || !note.title.contains(&alias.pattern) {
        continue;
      }
      let Some(path) = catalog.subject(&alias.subject_id) else {
        continue;
      };
      if out
        .iter()
        .all(|a| a.subject_id.as_deref() != Some(path.subject.id.as_str()))
      {
        out.push(Association::subject(path, MatchSource::Alias));
      }
    }
    out
  }
}

/// Subjects whose name or code occurs in the title.
#[derive(Debug, Default)]
pub struct TitleRule;

impl ResolutionRule for TitleRule {
  fn resolve(&self, note: &Note, catalog: &Catalog) -> Vec<Association> {
    catalog
      .subjects()
      .filter(|path| path.subject.appears_in(&note.title))
      .map(|path| Association::subject(path, MatchSource::Title))
      .collect()
  }
}

/// Valid semester or year keys without a usable subject.
#[derive(Debug, Default)]
pub struct ScopeRule;

impl ResolutionRule for ScopeRule {
  fn resolve(&self, note: &Note, catalog: &Catalog) -> Vec<Association> {
    match scope(note, catalog) {
      Scope::Semester(path) => {
        vec![Association::semester(path, MatchSource::PartialForeignKey)]
      }
      Scope::Year(year) => {
        vec![Association::year(year, MatchSource::PartialForeignKey)]
      }
      Scope::Everything => Vec::new(),
    }
  }
}

/// Year and semester display names occurring in the title.
#[derive(Debug, Default)]
pub struct TitleScopeRule;

impl ResolutionRule for TitleScopeRule {
  fn resolve(&self, note: &Note, catalog: &Catalog) -> Vec<Association> {
    let title = &note.title;
    let semesters: Vec<Association> = catalog
      .semesters()
      .filter(|p| title.contains(&p.year.name) && title.contains(&p.semester.name))
      .map(|p| Association::semester(p, MatchSource::TitleScope))
      .collect();
    if !semesters.is_empty() {
      return semesters;
    }

    catalog
      .years()
      .iter()
      .filter(|y| title.contains(&y.name))
      .map(|y| Association::year(y, MatchSource::TitleScope))
      .collect()
  }
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// An ordered chain of [`ResolutionRule`]s.
#[derive(Debug)]
pub struct Resolver {
  rules: Vec<Box<dyn ResolutionRule>>,
}

impl Resolver {
  pub fn new(rules: Vec<Box<dyn ResolutionRule>>) -> Self { Self { rules } }

  /// The default precedence, with `aliases` as the exception list.
  pub fn standard(aliases: Vec<TitleAlias>) -> Self {
    Self::new(vec![
      Box::new(ForeignKeyRule),
      Box::new(ScopeRule),
      Box::new(AliasRule::new(aliases)),
      Box::new(TitleRule),
      Box::new(TitleScopeRule),
    ])
  }

  pub fn resolve(&self, note: &Note, catalog: &Catalog) -> Resolution {
    self
      .rules
      .iter()
      .map(|rule| rule.resolve(note, catalog))
      .find(|found| !found.is_empty())
      .map(|associations| Resolution { associations })
      .unwrap_or_default()
  }

  pub fn resolve_note(&self, note: Note, catalog: &Catalog) -> ResolvedNote {
    let resolution = self.resolve(&note, catalog);
    ResolvedNote { note, resolution }
  }
}

impl Default for Resolver {
  fn default() -> Self { Self::standard(Vec::new()) }
}
