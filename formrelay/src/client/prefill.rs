//! Local storage of the visitor's name and address between submissions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Key the values are stored under, shared with the browser script's `localStorage` entry.
pub const STORAGE_KEY: &str = "contact_form";

/// Values restored into an empty form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefill {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PrefillError {
    #[error("prefill storage i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("prefill storage is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Where remembered form values live.
///
/// Callers treat every error as "nothing stored"; storage problems never block a submission.
pub trait PrefillStore: Send + Sync {
    fn load(&self) -> Result<Option<Prefill>, PrefillError>;
    fn save(&self, prefill: &Prefill) -> Result<(), PrefillError>;
}

/// A JSON object on disk holding the prefill under [`STORAGE_KEY`].
///
/// Other keys in the file are preserved on save.
#[derive(Debug, Clone)]
pub struct JsonFilePrefillStore {
    path: PathBuf,
}

impl JsonFilePrefillStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Option<Map<String, Value>>, PrefillError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(None),
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl PrefillStore for JsonFilePrefillStore {
    fn load(&self) -> Result<Option<Prefill>, PrefillError> {
        let Some(mut entries) = self.read_entries()? else {
            return Ok(None);
        };
        entries
            .remove(STORAGE_KEY)
            .map(serde_json::from_value)
            .transpose()
            .map_err(PrefillError::from)
    }

    fn save(&self, prefill: &Prefill) -> Result<(), PrefillError> {
        // A corrupt file is replaced rather than kept around
        let mut entries = self.read_entries().unwrap_or_default().unwrap_or_default();
        entries.insert(STORAGE_KEY.to_string(), serde_json::to_value(prefill)?);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(&entries)?)?;
        Ok(())
    }
}
