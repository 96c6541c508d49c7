use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A `(role, text)` pair; stored on disk as a two-element JSON array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn(pub Role, pub String);

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Turn(Role::User, text.into())
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Turn(Role::Assistant, text.into())
    }

    pub fn role(&self) -> Role {
        self.0
    }

    pub fn text(&self) -> &str {
        &self.1
    }
}

/// The on-disk conversation record.
///
/// Single user only: reads and writes take no lock, so two processes sharing
/// one file overwrite each other and the last writer wins. Each save replaces
/// the file atomically, so a reader never sees a partial write.
#[derive(Clone, Debug)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty history; anything unreadable is an error.
    pub fn load(&self) -> Result<Vec<Turn>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn load_or_default(&self) -> Vec<Turn> {
        self.load().unwrap_or_else(|err| {
            warn!(path = %self.path.display(), %err, "history unreadable, starting empty");
            Vec::new()
        })
    }

    /// `load_or_default` on the blocking pool.
    pub async fn load_async(&self) -> Vec<Turn> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.load_or_default())
            .await
            .unwrap_or_else(|err| {
                warn!(%err, "history load task failed, starting empty");
                Vec::new()
            })
    }

    /// `save` on the blocking pool.
    pub async fn save_async(&self, turns: Vec<Turn>) -> Result<()> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.save(&turns))
            .await
            .map_err(|err| Error::Io(io::Error::other(err)))?
    }

    pub fn save(&self, turns: &[Turn]) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        turns.serialize(&mut ser)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&buf)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| Error::Persist {
            path: self.path.display().to_string(),
            source: e.error,
        })?;
        Ok(())
    }
}
