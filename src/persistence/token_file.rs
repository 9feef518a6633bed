use crate::domain::session::driven_ports::TokenStore;
use anyhow::{Context, anyhow};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key the session token is stored under
pub const TOKEN_KEY: &str = "token";

/// Keeps the session token in a small JSON object on disk. Any other keys in the file
/// are left alone.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> FileTokenStore {
        FileTokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Map<String, Value>, anyhow::Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(io_err) if io_err.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(io_err) => {
                return Err(io_err)
                    .with_context(|| format!("reading {}", self.path.display()));
            }
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", self.path.display()))?
        {
            Value::Object(entries) => Ok(entries),
            _ => Err(anyhow!("{} does not hold a JSON object", self.path.display())),
        }
    }

    fn write_entries(&self, entries: Map<String, Value>) -> Result<(), anyhow::Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let serialized = serde_json::to_string_pretty(&Value::Object(entries))
            .context("serializing stored values")?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, anyhow::Error> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(TOKEN_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned))
    }

    fn save(&self, token: &str) -> Result<(), anyhow::Error> {
        let mut entries = self.read_entries()?;
        entries.insert(TOKEN_KEY.to_owned(), Value::String(token.to_owned()));

        debug!("Saving session token to {}", self.path.display());
        self.write_entries(entries)
    }

    fn remove(&self) -> Result<(), anyhow::Error> {
        let mut entries = self.read_entries()?;
        if entries.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }

        self.write_entries(entries)
    }
}
