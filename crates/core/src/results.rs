//! Result documents: one JSON file per processed batch.
//!
//! `save` writes `results_<id>.json` under the results root and returns the
//! opaque id; `load` reads it back. A missing, corrupt or malformed document
//! all look the same to the caller: `None`.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::UrlDescriptor;

/// Length of a result id (simple-format UUID v4).
pub const RESULT_ID_LEN: usize = 32;

/// Failure to write a result document.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("failed to write result document {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to serialize result document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// On-disk shape of a result document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub image_data: Vec<UrlDescriptor>,
    #[serde(default)]
    pub product_name: String,
    /// RFC 3339 creation time.
    #[serde(default)]
    pub timestamp: String,
}

/// File-backed store of [`ResultRecord`]s.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Persist `records` with `label` and return the new id.
    ///
    /// The document is written to a temporary file in the same directory and
    /// renamed into place, so a reader never sees a half-written file.
    pub fn save(&self, records: &[UrlDescriptor], label: &str) -> Result<String, PersistenceError> {
        let id = Uuid::new_v4().simple().to_string();
        let record = ResultRecord {
            image_data: records.to_vec(),
            product_name: label.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let json = serde_json::to_vec_pretty(&record)?;

        let path = self.path_for(&id);
        let write_err = |source| PersistenceError::Write {
            path: path.display().to_string(),
            source,
        };
        fs::create_dir_all(&self.root).map_err(write_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root).map_err(write_err)?;
        tmp.write_all(&json).map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        tracing::info!(result_id = %id, records = records.len(), "Saved result document");
        Ok(id)
    }

    /// Load the document saved under `id`.
    pub fn load(&self, id: &str) -> Option<ResultRecord> {
        if !is_valid_id(id) {
            return None;
        }
        let path = self.path_for(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read result document");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt result document");
                None
            }
        }
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("results_{id}.json"))
    }
}

/// Ids are lowercase hex of a fixed length; anything else could escape the
/// results directory.
fn is_valid_id(id: &str) -> bool {
    id.len() == RESULT_ID_LEN && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
