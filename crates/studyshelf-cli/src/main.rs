//! `studyshelf`: command-line client for a StudyShelf server.
//!
//! # Usage
//!
//! ```
//! studyshelf login alice@college.edu 'hunter2hunter2'
//! export STUDYSHELF_TOKEN=…
//! studyshelf catalog --find "operating"
//! studyshelf notes --subject-id operating-systems
//! studyshelf upload os-unit1.pdf --title "OS unit 1" --subject-id operating-systems
//! studyshelf --config ~/.config/studyshelf/config.toml pending
//! ```

mod client;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig, UploadMeta};
use serde::Deserialize;
use studyshelf_core::{
  note::NoteStatus,
  object::sanitize_file_name,
  resolver::CurriculumFilter,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "studyshelf", about = "Browse, upload and review StudyShelf notes")]
struct Args {
  /// Path to a TOML config file (url, token).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the StudyShelf server (default: http://localhost:8080).
  #[arg(long, env = "STUDYSHELF_URL")]
  url: Option<String>,

  /// Session token printed by `login`.
  #[arg(long, env = "STUDYSHELF_TOKEN", hide_env_values = true)]
  token: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create an account and print its session token.
  Signup {
    email:     String,
    password:  String,
    #[arg(long)]
    full_name: Option<String>,
  },
  /// Sign in and print a session token.
  Login { email: String, password: String },
  /// Revoke the current token.
  Logout,
  /// Show who the current token belongs to.
  Whoami,
  /// Print the curriculum tree, or fuzzy-find subjects.
  Catalog {
    #[arg(long)]
    find: Option<String>,
  },
  /// List courses.
  Courses,
  /// Browse approved notes.
  Notes {
    #[arg(long)]
    year_id:     Option<String>,
    #[arg(long)]
    semester_id: Option<String>,
    #[arg(long)]
    subject_id:  Option<String>,
    #[arg(long)]
    limit:       Option<usize>,
    #[arg(long)]
    offset:      Option<usize>,
  },
  /// Show one note.
  Show { id: Uuid },
  /// Upload a PDF for review.
  Upload {
    file:                   PathBuf,
    #[arg(long)]
    title:                  String,
    #[arg(long, default_value = "")]
    description:            String,
    #[arg(long)]
    course_id:              Option<Uuid>,
    #[arg(long)]
    year_id:                Option<String>,
    #[arg(long)]
    semester_id:            Option<String>,
    #[arg(long)]
    subject_id:             Option<String>,
    #[arg(long)]
    unit:                   Option<u8>,
    #[arg(long)]
    important_questions:    bool,
    #[arg(long)]
    notes_type:             Option<String>,
  },
  /// List your own uploads.
  Mine,
  /// Admin: list notes awaiting review (or another status).
  Pending {
    #[arg(long, default_value = "pending")]
    status: String,
  },
  /// Admin: approve a pending note.
  Approve { id: Uuid },
  /// Admin: reject a pending note.
  Reject { id: Uuid },
  /// Save a note's PDF locally.
  Download {
    id:  Uuid,
    #[arg(short, long)]
    out: Option<PathBuf>,
  },
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:   String,
  #[serde(default)]
  token: String,
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_owned()) }

/// CLI flags and environment override the config file, which overrides
/// defaults.
fn api_config(args: &Args, file: &ConfigFile) -> ApiConfig {
  ApiConfig {
    base_url: args
      .url
      .clone()
      .or_else(|| non_empty(&file.url))
      .unwrap_or_else(|| "http://localhost:8080".to_string()),
    token:    args
      .token
      .clone()
      .or_else(|| non_empty(&file.token))
      .unwrap_or_default(),
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let config = api_config(&args, &file_cfg);
  tracing::debug!(url = %config.base_url, signed_in = !config.token.is_empty(), "client configured");
  let client = ApiClient::new(config)?;

  run(&client, args.command).await
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Signup { email, password, full_name } => {
      let session = client.signup(&email, &password, full_name.as_deref()).await?;
      println!("signed up as {} ({:?})", session.identity.profile.email, session.identity.role);
      println!("token expires {}", session.expires_at.to_rfc3339());
      println!("export STUDYSHELF_TOKEN={}", session.token);
    }

    Command::Login { email, password } => {
      let session = client.login(&email, &password).await?;
      println!("signed in as {} ({:?})", session.identity.profile.email, session.identity.role);
      println!("token expires {}", session.expires_at.to_rfc3339());
      println!("export STUDYSHELF_TOKEN={}", session.token);
    }

    Command::Logout => {
      client.logout().await?;
      println!("signed out");
    }

    Command::Whoami => {
      let me = client.me().await?;
      let name = me.profile.full_name.as_deref().unwrap_or("-");
      println!("{} {} ({:?})", me.profile.email, name, me.role);
    }

    Command::Catalog { find } => {
      let catalog = client.catalog().await?;
      match find {
        None => print!("{}", render::catalog_tree(&catalog)),
        Some(query) => {
          let hits = render::find_subjects(&catalog, &query);
          if hits.is_empty() {
            println!("no subjects match {query:?}");
          }
          for path in hits {
            println!("{}", render::subject_line(&path));
          }
        }
      }
    }

    Command::Courses => {
      for course in client.courses().await? {
        let code = course.code.as_deref().unwrap_or("-");
        println!("{}  {:<8}  {}", course.id, code, course.name);
      }
    }

    Command::Notes { year_id, semester_id, subject_id, limit, offset } => {
      let filter = CurriculumFilter { year_id, semester_id, subject_id };
      let notes = client.browse(&filter, limit, offset).await?;
      if notes.is_empty() {
        println!("no notes");
      }
      for note in &notes {
        println!("{}", render::note_line(note));
      }
    }

    Command::Show { id } => {
      print!("{}", render::note_detail(&client.note(id).await?));
    }

    Command::Upload {
      file,
      title,
      description,
      course_id,
      year_id,
      semester_id,
      subject_id,
      unit,
      important_questions,
      notes_type,
    } => {
      let data = tokio::fs::read(&file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
      let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
      let meta = UploadMeta {
        title,
        description,
        course_id,
        year_id,
        semester_id,
        subject_id,
        unit_number: unit,
        is_important_questions: important_questions.then_some(true),
        notes_type,
      };
      let note = client.upload(&meta, &file_name, &data).await?;
      println!("uploaded {} ({}), awaiting review", note.id, note.status);
    }

    Command::Mine => {
      for note in &client.my_notes().await? {
        println!("{}", render::note_line(note));
      }
    }

    Command::Pending { status } => {
      let status: NoteStatus = status.parse()?;
      let notes = client.queue(status).await?;
      if notes.is_empty() {
        println!("nothing {status}");
      }
      for note in &notes {
        println!("{}", render::note_line(note));
      }
    }

    Command::Approve { id } => {
      let outcome = client.approve(id).await?;
      println!(
        "{}: {} → {}",
        outcome.note.id, outcome.review.from_status, outcome.review.to_status
      );
    }

    Command::Reject { id } => {
      let outcome = client.reject(id).await?;
      println!(
        "{}: {} → {}",
        outcome.note.id, outcome.review.from_status, outcome.review.to_status
      );
    }

    Command::Download { id, out } => {
      let resolved = client.note(id).await?;
      let out = out.unwrap_or_else(|| {
        let name = resolved
          .note
          .file_path
          .rsplit('/')
          .next()
          .unwrap_or_default();
        PathBuf::from(sanitize_file_name(name))
      });
      if out.exists() {
        bail!("{} already exists", out.display());
      }
      let data = client.download(&resolved.note.file_url).await?;
      tokio::fs::write(&out, &data)
        .await
        .with_context(|| format!("writing {}", out.display()))?;
      println!("saved {} bytes to {}", data.len(), out.display());
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(argv: &[&str]) -> Args {
    Args::try_parse_from(argv).unwrap()
  }

  #[test]
  fn flags_override_config_file() {
    let file = ConfigFile { url: "http://file:1".into(), token: "from-file".into() };

    let cfg = api_config(
      &args(&["studyshelf", "--url", "http://flag:2", "--token", "t", "whoami"]),
      &file,
    );
    assert_eq!(cfg.base_url, "http://flag:2");
    assert_eq!(cfg.token, "t");
  }

  #[test]
  fn config_file_fills_missing_flags() {
    let file: ConfigFile = toml::from_str("url = \"http://file:1\"\ntoken = \"abc\"\n").unwrap();
    let parsed = Args {
      config:  None,
      url:     None,
      token:   None,
      command: Command::Whoami,
    };
    let cfg = api_config(&parsed, &file);
    assert_eq!(cfg.base_url, "http://file:1");
    assert_eq!(cfg.token, "abc");

    let cfg = api_config(&parsed, &ConfigFile::default());
    assert_eq!(cfg.base_url, "http://localhost:8080");
    assert!(cfg.token.is_empty());
  }

  #[test]
  fn upload_arguments_parse() {
    let parsed = args(&[
      "studyshelf",
      "upload",
      "os.pdf",
      "--title",
      "OS unit 1",
      "--subject-id",
      "operating-systems",
      "--unit",
      "1",
      "--important-questions",
    ]);
    match parsed.command {
      Command::Upload { title, subject_id, unit, important_questions, .. } => {
        assert_eq!(title, "OS unit 1");
        assert_eq!(subject_id.as_deref(), Some("operating-systems"));
        assert_eq!(unit, Some(1));
        assert!(important_questions);
      }
      other => panic!("unexpected command {other:?}"),
    }
  }
}
