//! Plain-text rendering of API results, and fuzzy subject lookup.

use std::fmt::Write as _;

use fuzzy_matcher::{FuzzyMatcher, skim::SkimMatcherV2};
use studyshelf_core::{
  catalog::{Catalog, SubjectPath},
  note::Note,
  resolver::{Association, MatchSource, ResolvedNote},
};

/// Subjects whose name or code fuzzy-matches `query`, best first.
pub fn find_subjects<'a>(catalog: &'a Catalog, query: &str) -> Vec<SubjectPath<'a>> {
  let matcher = SkimMatcherV2::default();
  let mut scored: Vec<(i64, SubjectPath<'a>)> = catalog
    .subjects()
    .filter_map(|path| {
      let by_name = matcher.fuzzy_match(&path.subject.name, query);
      let by_code = matcher.fuzzy_match(&path.subject.code, query);
      by_name.max(by_code).map(|score| (score, path))
    })
    .collect();
  // Stable sort keeps catalog order between equal scores.
  scored.sort_by(|a, b| b.0.cmp(&a.0));
  scored.into_iter().map(|(_, path)| path).collect()
}

pub fn subject_line(path: &SubjectPath<'_>) -> String {
  let mut flags = String::new();
  if path.subject.has_lab {
    flags.push_str(" [lab]");
  }
  if path.subject.is_important_questions {
    flags.push_str(" [important questions]");
  }
  format!(
    "{:<8} {} ({} / {}) id={}{flags}",
    path.subject.code, path.subject.name, path.year.name, path.semester.name, path.subject.id
  )
}

pub fn catalog_tree(catalog: &Catalog) -> String {
  let mut out = String::new();
  for year in catalog.years() {
    let _ = writeln!(out, "{} [{}]", year.name, year.id);
    for semester in &year.semesters {
      let _ = writeln!(out, "  {} [{}]", semester.name, semester.id);
      for subject in &semester.subjects {
        let _ = writeln!(out, "    {:<8} {} [{}]", subject.code, subject.name, subject.id);
      }
    }
  }
  out
}

fn source_label(source: MatchSource) -> &'static str {
  match source {
    MatchSource::ForeignKey => "keys",
    MatchSource::Alias => "alias",
    MatchSource::Title => "title",
    MatchSource::PartialForeignKey => "partial keys",
    MatchSource::TitleScope => "title scope",
  }
}

/// `year-2 / year-2-sem-2 / discrete-mathematics (title)`
pub fn position(assoc: &Association) -> String {
  let mut parts = vec![assoc.year_id.as_str()];
  parts.extend(assoc.semester_id.as_deref());
  parts.extend(assoc.subject_id.as_deref());
  format!("{} ({})", parts.join(" / "), source_label(assoc.source))
}

pub fn note_line(resolved: &ResolvedNote) -> String {
  let note = &resolved.note;
  let placed = match resolved.resolution.primary() {
    Some(primary) if resolved.resolution.associations.len() > 1 => format!(
      "{} +{} more",
      position(primary),
      resolved.resolution.associations.len() - 1
    ),
    Some(primary) => position(primary),
    None => "unplaced".to_owned(),
  };
  format!(
    "{}  {:<8}  {}  [{}]",
    note.id,
    note.status.as_str(),
    note.title,
    placed
  )
}

pub fn note_detail(resolved: &ResolvedNote) -> String {
  let note: &Note = &resolved.note;
  let mut out = String::new();
  let _ = writeln!(out, "{}", note.title);
  let _ = writeln!(out, "  id:       {}", note.id);
  let _ = writeln!(out, "  status:   {}", note.status);
  let _ = writeln!(out, "  uploaded: {}", note.created_at.to_rfc3339());
  let _ = writeln!(out, "  updated:  {}", note.updated_at.to_rfc3339());
  if !note.description.is_empty() {
    let _ = writeln!(out, "  about:    {}", note.description);
  }
  if let Some(unit) = note.unit_number {
    let _ = writeln!(out, "  unit:     {unit}");
  }
  if let Some(kind) = &note.notes_type {
    let _ = writeln!(out, "  type:     {kind}");
  }
  let _ = writeln!(out, "  file:     {}", note.file_url);
  if resolved.resolution.is_unmatched() {
    let _ = writeln!(out, "  placed:   nowhere in the catalog");
  }
  for assoc in &resolved.resolution.associations {
    let _ = writeln!(out, "  placed:   {}", position(assoc));
  }
  out
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use studyshelf_core::{note::NoteStatus, resolver::Resolver};
  use uuid::Uuid;

  use super::*;

  fn note(title: &str) -> Note {
    let now = Utc::now();
    Note {
      id: Uuid::new_v4(),
      user_id: Uuid::new_v4(),
      course_id: None,
      title: title.into(),
      description: String::new(),
      file_url: "http://localhost:8080/files/u/1-a.pdf".into(),
      file_path: "u/1-a.pdf".into(),
      file_type: "application/pdf".into(),
      status: NoteStatus::Approved,
      created_at: now,
      updated_at: now,
      year_id: None,
      semester_id: None,
      subject_id: None,
      unit_number: None,
      is_important_questions: None,
      notes_type: None,
    }
  }

  #[test]
  fn fuzzy_find_ranks_closest_subject_first() {
    let catalog = Catalog::bundled().unwrap();
    let hits = find_subjects(&catalog, "operating sys");
    assert_eq!(hits.first().map(|p| p.subject.id.as_str()), Some("operating-systems"));

    let hits = find_subjects(&catalog, "CS204");
    assert_eq!(hits.first().map(|p| p.subject.id.as_str()), Some("operating-systems"));
  }

  #[test]
  fn note_line_shows_primary_position() {
    let catalog = Catalog::bundled().unwrap();
    let resolved = Resolver::default()
      .resolve_note(note("II Year - Semester II - Discrete Mathematics"), &catalog);
    let line = note_line(&resolved);
    assert!(line.contains("year-2 / year-2-sem-2 / discrete-mathematics (title)"), "{line}");
  }

  #[test]
  fn ambiguous_note_line_counts_extra_matches() {
    let catalog = Catalog::bundled().unwrap();
    let resolved = Resolver::default().resolve_note(note("Mathematics - II"), &catalog);
    assert!(note_line(&resolved).contains("+1 more"));
  }

  #[test]
  fn unmatched_note_is_unplaced() {
    let catalog = Catalog::bundled().unwrap();
    let resolved = Resolver::default().resolve_note(note("scribbles"), &catalog);
    assert!(note_line(&resolved).ends_with("[unplaced]"));
    assert!(note_detail(&resolved).contains("nowhere in the catalog"));
  }

  #[test]
  fn tree_lists_every_subject() {
    let catalog = Catalog::bundled().unwrap();
    let tree = catalog_tree(&catalog);
    assert_eq!(
      tree.lines().filter(|l| l.starts_with("    ")).count(),
      catalog.subjects().count()
    );
  }
}
