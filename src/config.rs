use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub auth: AuthConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL every request path is joined onto (e.g. https://api.example.com/api/v1)
  pub base_url: String,
  /// Real-time notification server
  pub socket_url: Option<String>,
  /// HTTP client timeout; the client's default applies when unset
  pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
  /// Name of the cookie holding the bearer token
  #[serde(default = "default_token_cookie")]
  pub token_cookie: String,
}

impl Default for AuthConfig {
  fn default() -> Self {
    Self {
      token_cookie: default_token_cookie(),
    }
  }
}

fn default_token_cookie() -> String {
  "accessToken".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Minimum age before cached data is refetched on mount
  #[serde(default)]
  pub stale_time_secs: u64,
  /// How long an unobserved entry survives
  #[serde(default = "default_gc_time_secs")]
  pub gc_time_secs: u64,
  /// Write successful query results to the on-disk cache
  #[serde(default = "default_persist")]
  pub persist: bool,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_time_secs: 0,
      gc_time_secs: default_gc_time_secs(),
      persist: default_persist(),
    }
  }
}

impl CacheConfig {
  pub fn stale_time(&self) -> Duration {
    Duration::from_secs(self.stale_time_secs)
  }

  pub fn gc_time(&self) -> Duration {
    Duration::from_secs(self.gc_time_secs)
  }
}

fn default_gc_time_secs() -> u64 {
  5 * 60
}

fn default_persist() -> bool {
  true
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./mercato.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/mercato/config.yaml
  ///
  /// Without a file, `MERCATO_API_URL` alone is enough.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => match std::env::var("MERCATO_API_URL") {
        Ok(base_url) => Self::with_base_url(base_url),
        Err(_) => {
          return Err(eyre!(
            "No configuration file found. Create one at ~/.config/mercato/config.yaml\n\
                 or set MERCATO_API_URL."
          ))
        }
      },
    };

    Ok(config.apply_env())
  }

  /// Defaults for everything except the API location.
  pub fn with_base_url(base_url: impl Into<String>) -> Self {
    Self {
      api: ApiConfig {
        base_url: base_url.into(),
        socket_url: None,
        timeout_secs: None,
      },
      auth: AuthConfig::default(),
      cache: CacheConfig::default(),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("mercato.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("mercato").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    Ok(config)
  }

  fn apply_env(mut self) -> Self {
    if let Ok(url) = std::env::var("MERCATO_API_URL") {
      self.api.base_url = url;
    }
    if let Ok(url) = std::env::var("MERCATO_SOCKET_URL") {
      self.api.socket_url = Some(url);
    }
    self
  }

  /// Bearer token from the environment, if one was provided.
  ///
  /// Takes precedence over the stored cookie for the current process.
  pub fn env_token() -> Option<String> {
    std::env::var("MERCATO_TOKEN")
      .ok()
      .filter(|t| !t.trim().is_empty())
  }

  /// Directory for the cookie jar, cache database and logs.
  pub fn data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("mercato"))
  }
}
