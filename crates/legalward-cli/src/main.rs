//! `legalward`: terminal dashboard for the LegalWard legislative-monitoring
//! service.
//!
//! # Usage
//!
//! ```
//! legalward --url http://localhost:8000 --email ana@example.cl --password secret
//! legalward --config ~/.config/legalward/config.toml
//! legalward upload contrato.pdf
//! legalward recent
//! ```

mod app;
mod context;
mod refresh;
mod settings;
mod ui;

use std::{fs::OpenOptions, io, path::PathBuf, sync::Mutex, time::Duration};

use anyhow::{Context, Result};
use app::{App, Channels, Completion};
use clap::{Parser, Subcommand};
use crossterm::{
  event::{self, DisableFocusChange, EnableFocusChange, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use legalward_client::{ApiClient, ApiConfig};
use legalward_core::{
  recent::{LocalStorage, MemoryStorage, RecentlyViewed},
  service::DiscoveryService,
};
use legalward_store_sqlite::SqliteStorage;
use ratatui::{Terminal, backend::CrosstermBackend};
use refresh::{RefreshKind, RefreshSchedule};
use settings::{Overrides, Settings};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "legalward", version, about = "Terminal dashboard for LegalWard")]
struct Args {
  /// Path to a TOML config file (url, email, password, data_dir).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the LegalWard service (default: http://localhost:8000).
  #[arg(long, env = "LEGALWARD_URL")]
  url: Option<String>,

  /// Account email, used to sign in when no session is active.
  #[arg(long, env = "LEGALWARD_EMAIL")]
  email: Option<String>,

  /// Account password (plaintext).
  #[arg(long, env = "LEGALWARD_PASSWORD")]
  password: Option<String>,

  /// Directory for the local database and log file.
  #[arg(long, value_name = "DIR", env = "LEGALWARD_DATA_DIR")]
  data_dir: Option<PathBuf>,

  /// Keep recently viewed discoveries in memory only.
  #[arg(long)]
  ephemeral: bool,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Upload a document and report the discoveries found in it.
  Upload {
    /// The document to analyse.
    file: PathBuf,
  },
  /// Move every tracked bill forward one legislative stage (demo servers).
  AdvanceTime,
  /// Print the recently viewed discoveries kept in local storage.
  Recent,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let settings = Settings::load(
    args.config.as_deref(),
    Overrides {
      url:       args.url,
      email:     args.email,
      password:  args.password,
      data_dir:  args.data_dir,
      ephemeral: args.ephemeral,
    },
  )?;

  init_tracing(&settings)?;
  info!(url = %settings.url, "starting legalward");

  let client = ApiClient::new(ApiConfig {
    base_url: settings.url.clone(),
    ..ApiConfig::default()
  })
  .context("building HTTP client")?;

  if settings.ephemeral {
    run(args.command, &settings, client, MemoryStorage::default()).await
  } else {
    let path = settings.database_path();
    let storage = SqliteStorage::open(&path)
      .await
      .with_context(|| format!("opening local storage at {}", path.display()))?;
    run(args.command, &settings, client, storage).await
  }
}

/// Log to `legalward.log` in the data directory; the terminal belongs to
/// the UI.
fn init_tracing(settings: &Settings) -> Result<()> {
  std::fs::create_dir_all(&settings.data_dir)
    .with_context(|| format!("creating {}", settings.data_dir.display()))?;
  let log_path = settings.log_path();
  let file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(&log_path)
    .with_context(|| format!("opening log file {}", log_path.display()))?;

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_ansi(false)
    .with_writer(Mutex::new(file))
    .init();
  Ok(())
}

async fn run<R>(
  command: Option<Command>,
  settings: &Settings,
  client: ApiClient,
  storage: R,
) -> Result<()>
where
  R: LocalStorage + Clone + 'static,
{
  let recent = RecentlyViewed::new(storage);
  match command {
    None => run_tui(settings, client, recent).await,

    Some(Command::Upload { file }) => {
      sign_in(&client, settings).await?;
      let result = app::upload_file(&client, &file).await?;
      println!(
        "{} (document {}): {} discoveries, {} pending in total",
        result.document_name,
        result.document_id,
        result.discoveries.len(),
        result.pending_count
      );
      for d in &result.discoveries {
        println!("  {:<12} {:>3} impacts  {}", d.bill_id, d.impact_count, d.bill_title);
      }
      Ok(())
    }

    Some(Command::AdvanceTime) => {
      sign_in(&client, settings).await?;
      let result = client.advance_time().await.context("advancing time")?;
      println!("{} ({} bills advanced)", result.message, result.bills_advanced);
      Ok(())
    }

    Some(Command::Recent) => {
      let entries = recent.list_views().await;
      if entries.is_empty() {
        println!("No recently viewed discoveries.");
      }
      for e in entries {
        println!(
          "{}  {:<12} {:<6} {:<10} {}",
          e.viewed_at.format("%Y-%m-%d %H:%M"),
          e.bill_id,
          e.max_relevance.to_string(),
          e.state,
          e.bill_title
        );
      }
      Ok(())
    }
  }
}

/// Sign in with the configured credentials unless a session is active.
async fn sign_in(client: &ApiClient, settings: &Settings) -> Result<()> {
  if client.session().await.is_ok_and(|s| s.is_authenticated()) {
    return Ok(());
  }
  if let Some((email, password)) = settings.credentials() {
    client
      .login(&email, &password)
      .await
      .context("signing in")?;
  }
  Ok(())
}

// ─── TUI ──────────────────────────────────────────────────────────────────────

async fn run_tui<R>(
  settings: &Settings,
  client: ApiClient,
  recent: RecentlyViewed<R>,
) -> Result<()>
where
  R: LocalStorage + Clone + 'static,
{
  let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel();
  let (done_tx, mut done_rx) = mpsc::unbounded_channel();
  let mut app = App::new(
    client,
    recent,
    settings.credentials(),
    RefreshSchedule { pending_every: settings.refresh_every() },
    Channels { refresh: refresh_tx, done: done_tx },
  );

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen, EnableFocusChange)
    .context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  app.start().await;
  let run_result =
    run_event_loop(&mut terminal, &mut app, &mut refresh_rx, &mut done_rx).await;
  app.shutdown();

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop<R>(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App<R>,
  refresh_rx: &mut UnboundedReceiver<RefreshKind>,
  done_rx: &mut UnboundedReceiver<Completion>,
) -> Result<()>
where
  R: LocalStorage + Clone + 'static,
{
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    while let Ok(done) = done_rx.try_recv() {
      app.complete(done).await;
    }
    while let Ok(kind) = refresh_rx.try_recv() {
      app.on_refresh(kind).await;
    }

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    match maybe_event {
      Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
        if !app.handle_key(key).await? {
          break;
        }
      }
      Some(Event::FocusGained) => app.on_refresh(RefreshKind::RecentViews).await,
      // Resize: the terminal redraws on the next iteration.
      _ => {}
    }
  }

  Ok(())
}
