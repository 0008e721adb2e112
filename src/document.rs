// Whole-document JSON file operations

use eyre::{Context, Result, eyre};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer, de::DeserializeOwned};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A collection document: `{ "<key>": [ records... ] }`
struct Keyed<'a, T> {
    key: &'a str,
    records: &'a [T],
}

impl<T: Serialize> Serialize for Keyed<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key, self.records)?;
        map.end()
    }
}

/// Read the array stored under `key` in a collection document
///
/// A missing file, malformed JSON, a missing key or a non-array value are all errors.
pub fn read_collection<T: DeserializeOwned>(path: &Path, key: &str) -> Result<Vec<T>> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read document {:?}", path))?;

    let mut doc: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("Failed to parse document {:?}", path))?;

    let array = doc
        .get_mut(key)
        .map(serde_json::Value::take)
        .ok_or_else(|| eyre!("Document {:?} has no \"{}\" array", path, key))?;

    if !array.is_array() {
        return Err(eyre!("Document {:?}: \"{}\" is not an array", path, key));
    }

    let records: Vec<T> =
        serde_json::from_value(array).with_context(|| format!("Failed to decode records in {:?}", path))?;

    info!(file = ?path, count = records.len(), "Loaded collection document");
    Ok(records)
}

/// Replace a collection document with `{ "<key>": records }`
pub fn write_collection<T: Serialize>(path: &Path, key: &str, records: &[T]) -> Result<()> {
    let json = serde_json::to_string_pretty(&Keyed { key, records }).context("Failed to serialize collection")?;
    write_atomic(path, json.as_bytes())?;
    debug!(file = ?path, count = records.len(), "Wrote collection document");
    Ok(())
}

/// Read a bare-array document
pub fn read_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read document {:?}", path))?;
    let records: Vec<T> = serde_json::from_str(&text).with_context(|| format!("Failed to parse document {:?}", path))?;
    info!(file = ?path, count = records.len(), "Loaded array document");
    Ok(records)
}

/// Write `bytes` to a sibling temp file, fsync it, then rename it over `path`
///
/// Readers see either the previous document or the new one, never a partial write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = temp_path(path);

    let result = write_temp(&tmp, bytes)
        .and_then(|()| fs::rename(&tmp, path).with_context(|| format!("Failed to replace document {:?}", path)));

    if result.is_err() {
        // Never leave a stale temp file next to the document
        if let Err(e) = fs::remove_file(&tmp) {
            debug!(file = ?tmp, error = %e, "Temp file not removed");
        }
    }
    result
}

fn write_temp(tmp: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = File::create(tmp).with_context(|| format!("Failed to create temp file {:?}", tmp))?;
    file.write_all(bytes)?;
    file.sync_all()?; // Ensure data is flushed to disk before the rename
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
