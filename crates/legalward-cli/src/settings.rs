//! Layered settings: defaults, then the TOML file, then `LEGALWARD_*`
//! environment variables, then command-line flags.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  pub url:          String,
  #[serde(default)]
  pub email:        Option<String>,
  #[serde(default)]
  pub password:     Option<String>,
  /// Directory holding the local database and the log file.
  pub data_dir:     PathBuf,
  /// Seconds between pending-count refreshes.
  pub refresh_secs: u64,
  /// Keep recently viewed discoveries in memory only.
  #[serde(default)]
  pub ephemeral:    bool,
}

/// Values given on the command line; `None` leaves lower layers in place.
#[derive(Debug, Default)]
pub struct Overrides {
  pub url:       Option<String>,
  pub email:     Option<String>,
  pub password:  Option<String>,
  pub data_dir:  Option<PathBuf>,
  pub ephemeral: bool,
}

impl Settings {
  pub fn load(file: Option<&Path>, overrides: Overrides) -> anyhow::Result<Self> {
    let mut builder = Config::builder()
      .set_default("url", DEFAULT_URL)?
      .set_default("data_dir", default_data_dir().to_string_lossy().into_owned())?
      .set_default("refresh_secs", 30_i64)?;
    if let Some(path) = file {
      builder = builder.add_source(File::from(path).required(true));
    }
    let settings: Settings = builder
      .add_source(Environment::with_prefix("LEGALWARD"))
      .set_override_option("url", overrides.url)?
      .set_override_option("email", overrides.email)?
      .set_override_option("password", overrides.password)?
      .set_override_option(
        "data_dir",
        overrides.data_dir.map(|p| p.to_string_lossy().into_owned()),
      )?
      .set_override_option("ephemeral", overrides.ephemeral.then_some(true))?
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("invalid configuration")?;

    Ok(Self { data_dir: expand_tilde(&settings.data_dir), ..settings })
  }

  /// Email and password, when both are configured.
  pub fn credentials(&self) -> Option<(String, String)> {
    Some((self.email.clone()?, self.password.clone()?))
  }

  pub fn refresh_every(&self) -> Duration { Duration::from_secs(self.refresh_secs.max(1)) }

  pub fn database_path(&self) -> PathBuf { self.data_dir.join("local.sqlite") }

  pub fn log_path(&self) -> PathBuf { self.data_dir.join("legalward.log") }
}

fn default_data_dir() -> PathBuf {
  match std::env::var_os("XDG_DATA_HOME") {
    Some(dir) if !dir.is_empty() => PathBuf::from(dir).join("legalward"),
    _ => PathBuf::from("~/.local/share/legalward"),
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
