//! JSON-file persistence for the document stores.
//!
//! Each collection is saved as a single JSON file in the data directory.
//! Writes go to a `.tmp` sibling first and are renamed into place to prevent
//! corruption. Persistence failures are logged and never propagated — the
//! in-memory collection remains authoritative for the running process.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Path of a collection file inside the data directory.
pub fn collection_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("{name}.json"))
}

/// Load a collection from disk.
///
/// Returns an empty map when the file does not exist. A corrupt file is
/// logged and treated as empty rather than aborting startup.
pub fn load_collection<T: DeserializeOwned>(data_dir: &Path, name: &str) -> HashMap<String, T> {
    let path = collection_path(data_dir, name);
    if !path.exists() {
        return HashMap::new();
    }

    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<HashMap<String, T>>(&contents) {
            Ok(entries) => {
                tracing::info!(
                    collection = name,
                    entries = entries.len(),
                    "Loaded collection from disk"
                );
                entries
            }
            Err(e) => {
                tracing::error!(collection = name, error = %e, "Corrupt collection file, starting empty");
                HashMap::new()
            }
        },
        Err(e) => {
            tracing::error!(collection = name, error = %e, "Failed to read collection file");
            HashMap::new()
        }
    }
}

/// Save a collection to disk atomically (write tmp, rename).
pub fn save_collection<T: Serialize>(data_dir: &Path, name: &str, entries: &HashMap<String, T>) {
    if let Err(e) = fs::create_dir_all(data_dir) {
        tracing::error!(error = %e, "Failed to create data directory");
        return;
    }

    let path = collection_path(data_dir, name);
    let tmp_path = path.with_extension("json.tmp");

    let json = match serde_json::to_string_pretty(entries) {
        Ok(j) => j,
        Err(e) => {
            tracing::error!(collection = name, error = %e, "Failed to serialize collection");
            return;
        }
    };

    if let Err(e) = fs::write(&tmp_path, json) {
        tracing::error!(collection = name, error = %e, "Failed to write collection tmp file");
        return;
    }

    if let Err(e) = fs::rename(&tmp_path, &path) {
        tracing::error!(collection = name, error = %e, "Failed to rename collection file");
    }
}
