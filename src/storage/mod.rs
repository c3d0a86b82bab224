//! Local-disk audio storage.
//!
//! Recordings are written once at upload time and read back by the worker
//! through an opaque locator (a relative path under the storage root). The
//! worker never deletes files; releasing audio bytes belongs to the
//! entry-deletion path upstream.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

#[derive(Clone)]
pub struct AudioStorage {
    root: PathBuf,
}

impl AudioStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store an uploaded audio buffer, returning its locator.
    ///
    /// The locator embeds a fresh UUID so colliding filenames never
    /// overwrite each other.
    pub async fn save(&self, entry_id: Uuid, filename: &str, bytes: &[u8]) -> Result<String> {
        let safe_name = sanitize_filename(filename);
        let locator = format!("{}/{}-{}", entry_id, Uuid::new_v4(), safe_name);
        let path = self.root.join(&locator);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create audio directory {}", parent.display()))?;
        }

        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write audio file {}", path.display()))?;

        info!("Stored audio file {} ({} bytes)", locator, bytes.len());
        Ok(locator)
    }

    /// Read the audio bytes behind a locator.
    pub async fn read(&self, locator: &str) -> Result<Vec<u8>> {
        let path = self.root.join(locator);
        fs::read(&path)
            .await
            .with_context(|| format!("Failed to read audio file {}", path.display()))
    }
}

/// Keep the original filename readable but strip path separators and other
/// characters that would escape the storage root.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "recording".to_string()
    } else {
        cleaned
    }
}
