//! Sidecar metadata for GTAB tables.
//!
//! The table generator writes a `gtab.meta.json` document next to each table.
//! Readers consult it only to resolve a dataset identity and must tolerate a
//! missing or malformed document.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::Result;

pub const META_FILENAME: &str = "gtab.meta.json";

/// Fields emitted by the generator. All optional; readers must accept any
/// subset.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MetaFile {
    pub dataset_id: Option<String>,
    pub kernel: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub fields_mask: Option<u32>,
    pub version: Option<u32>,
    pub created_at: Option<String>,
}

pub fn sibling_meta_path(table_path: &Path) -> PathBuf {
    table_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(META_FILENAME)
}

/// Reads a metadata document, returning `None` on any failure. Absence and
/// malformed content are deliberately indistinguishable to callers.
pub fn read_meta(path: &Path) -> Option<MetaFile> {
    let data = std::fs::read(path).ok()?;
    match serde_json::from_slice(&data) {
        Ok(meta) => Some(meta),
        Err(err) => {
            debug!("ignoring malformed {}: {err}", path.display());
            None
        }
    }
}

/// Resolves the dataset identity recorded next to `table_path`, if any.
pub fn dataset_id_for(table_path: &Path) -> Option<String> {
    read_meta(&sibling_meta_path(table_path))?
        .dataset_id
        .filter(|id| !id.is_empty())
}

pub fn write_meta(path: &Path, meta: &MetaFile) -> Result<()> {
    let data = serde_json::to_vec_pretty(meta)?;
    let tmp_path = path.with_extension("json.tmp");
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&tmp_path)?;
    file.write_all(&data)?;
    file.sync_all()?;
    std::fs::rename(tmp_path, path)?;
    Ok(())
}
