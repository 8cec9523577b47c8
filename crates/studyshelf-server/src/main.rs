//! StudyShelf server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `STUDYSHELF_*`
//! environment variables, opens the SQLite store and the files directory,
//! and serves the JSON API under `/api` and stored files under `/files`.
//!
//! ```
//! cargo run -p studyshelf-server --bin server -- --config config.toml
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use studyshelf_server::{ServerConfig, open_state, router};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "StudyShelf notes server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", env = "STUDYSHELF_CONFIG")]
  config: PathBuf,

  /// Validate the configuration and catalog, then exit.
  #[arg(long)]
  check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  if cli.check_config {
    let (catalog, _, roles) = cfg.validate()?;
    println!(
      "configuration ok: {} years, {} subjects, {} title aliases, admins configured: {}",
      catalog.years().len(),
      catalog.subjects().count(),
      cfg.title_aliases.len(),
      roles.has_admins(),
    );
    return Ok(());
  }

  let state = open_state(&cfg).await?;
  let app = router(state);
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
