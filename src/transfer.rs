//! Backup files: export of the whole collection and import that replaces it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::confirm::Intent;
use crate::error::{Error, Result};
use crate::models::Variety;
use crate::sanitize::{sanitize_import, UntrustedJson};
use crate::store::RecordStore;

pub const IMPORT_PROMPT: &str =
    "This will replace your current data with the imported file. Are you sure?";

/// `rosarium_backup_<YYYY-MM-DD>.json`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("rosarium_backup_{}.json", date.format("%Y-%m-%d"))
}

/// Pretty-printed JSON array of every variety.
pub fn export_json(varieties: &[Variety]) -> Result<String> {
    Ok(serde_json::to_string_pretty(varieties)?)
}

/// Writes a dated backup into `dir` and returns its path.
pub fn export_to_dir(varieties: &[Variety], dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    let path = dir.join(backup_file_name(date));
    fs::write(&path, export_json(varieties)?)?;
    info!(path = %path.display(), count = varieties.len(), "exported backup");
    Ok(path)
}

/// A parsed backup waiting for confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingImport {
    varieties: Vec<Variety>,
}

impl PendingImport {
    pub fn varieties(&self) -> &[Variety] {
        &self.varieties
    }

    /// Replaces the whole store in one step.
    pub fn apply(self, store: &mut RecordStore) -> usize {
        let count = self.varieties.len();
        store.replace_all(self.varieties);
        info!(count, "imported backup");
        count
    }
}

/// Parses a backup. Anything other than a JSON array is rejected and leaves
/// the caller's state alone.
pub fn parse_import(text: &str) -> Result<Intent<PendingImport>> {
    let document = UntrustedJson::parse(text).map_err(Error::ImportParse)?;
    if !document.is_array() {
        return Err(Error::ImportNotAnArray);
    }
    Ok(Intent::new(
        IMPORT_PROMPT,
        PendingImport { varieties: sanitize_import(document) },
    ))
}

pub fn read_import(path: &Path) -> Result<Intent<PendingImport>> {
    parse_import(&fs::read_to_string(path)?)
}
