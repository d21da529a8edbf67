use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::Collection;

/// Typed failure conditions for the canonical dataset file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("dataset not found at {0}")]
    NotFound(String),
    #[error("dataset at {0} is malformed: {1}")]
    Malformed(String, String),
    #[error("failed to read {0}: {1}")]
    Io(String, io::Error),
}

/// Load the collection from the canonical path.
pub fn load(path: &Path) -> Result<Collection, StoreError> {
    let text = fs::read_to_string(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(path.display().to_string())
        } else {
            StoreError::Io(path.display().to_string(), e)
        }
    })?;

    serde_json::from_str(&text)
        .map_err(|e| StoreError::Malformed(path.display().to_string(), e.to_string()))
}

/// Serialize the collection and write it to the canonical path, then
/// mirror the identical bytes to the published path.
///
/// Recomputes `meta.total` and refreshes `meta.generated_at` before
/// writing; `note` (when given) replaces the provenance note. The
/// canonical write is the success condition; a failed mirror write is
/// only a warning.
pub fn save(
    collection: &mut Collection,
    canonical: &Path,
    published: &Path,
    note: Option<&str>,
) -> Result<()> {
    collection.meta.total = collection.mof.len();
    collection.meta.generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if let Some(n) = note {
        collection.meta.note = Some(n.to_string());
    }

    // Pretty JSON; serde_json leaves non-ASCII characters verbatim,
    // which the downstream consumer expects.
    let mut json = serde_json::to_string_pretty(collection)
        .context("Failed to serialize collection")?;
    json.push('\n');

    if let Some(dir) = canonical.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    fs::write(canonical, &json)
        .with_context(|| format!("Failed to write {}", canonical.display()))?;
    info!("Saved {} records to {}", collection.mof.len(), canonical.display());

    let mirror = published
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .map(fs::create_dir_all)
        .unwrap_or(Ok(()))
        .and_then(|_| fs::write(published, &json));
    match mirror {
        Ok(()) => info!("Mirrored dataset to {}", published.display()),
        Err(e) => warn!("Could not mirror dataset to {}: {}", published.display(), e),
    }

    Ok(())
}

// ── Tests ──
