//! Cookie jar holding the session's bearer token.

use color_eyre::{eyre::eyre, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// A small `name=value` cookie store, optionally backed by a file.
///
/// Request functions read the token cookie through this on every call,
/// so signing in or out takes effect for the next request.
#[derive(Clone, Default)]
pub struct CookieJar {
  cookies: Arc<RwLock<BTreeMap<String, String>>>,
  path: Option<PathBuf>,
}

impl CookieJar {
  /// An in-memory jar that is never written to disk.
  pub fn in_memory() -> Self {
    Self::default()
  }

  /// Open the jar at `path`, creating an empty one if it doesn't exist.
  pub fn open(path: &Path) -> Result<Self> {
    let mut cookies = BTreeMap::new();

    if path.exists() {
      let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre!("Failed to read cookie jar {}: {}", path.display(), e))?;
      for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
          continue;
        }
        if let Some((name, value)) = line.split_once('=') {
          cookies.insert(name.trim().to_string(), value.trim().to_string());
        }
      }
    }

    Ok(Self {
      cookies: Arc::new(RwLock::new(cookies)),
      path: Some(path.to_path_buf()),
    })
  }

  pub fn get(&self, name: &str) -> Option<String> {
    self
      .cookies
      .read()
      .ok()
      .and_then(|c| c.get(name).cloned())
      .filter(|v| !v.is_empty())
  }

  /// Set a cookie and write the jar back to disk.
  pub fn set(&self, name: &str, value: &str) -> Result<()> {
    self
      .cookies
      .write()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?
      .insert(name.to_string(), value.to_string());
    self.save()
  }

  /// Set a cookie for this process only.
  pub fn set_transient(&self, name: &str, value: &str) {
    if let Ok(mut cookies) = self.cookies.write() {
      cookies.insert(name.to_string(), value.to_string());
    }
  }

  pub fn remove(&self, name: &str) -> Result<()> {
    self
      .cookies
      .write()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?
      .remove(name);
    self.save()
  }

  fn save(&self) -> Result<()> {
    let Some(path) = &self.path else {
      return Ok(());
    };

    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create data directory: {}", e))?;
    }

    let contents: String = self
      .cookies
      .read()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?
      .iter()
      .map(|(name, value)| format!("{}={}\n", name, value))
      .collect();

    std::fs::write(path, contents)
      .map_err(|e| eyre!("Failed to write cookie jar {}: {}", path.display(), e))
  }
}

impl std::fmt::Debug for CookieJar {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    // Cookie values are credentials
    let names: Vec<String> = self
      .cookies
      .read()
      .map(|c| c.keys().cloned().collect())
      .unwrap_or_default();
    f.debug_struct("CookieJar")
      .field("cookies", &names)
      .field("path", &self.path)
      .finish()
  }
}
