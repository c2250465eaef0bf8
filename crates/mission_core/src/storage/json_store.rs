use crate::error::AppError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const ACTIVITIES_FILE_NAME: &str = "activities.json";
pub const TASKS_FILE_NAME: &str = "tasks.json";
pub const DASHBOARD_FILE_NAME: &str = "dashboard.json";

pub fn activities_path(data_dir: &Path) -> PathBuf {
    data_dir.join(ACTIVITIES_FILE_NAME)
}

pub fn tasks_path(data_dir: &Path) -> PathBuf {
    data_dir.join(TASKS_FILE_NAME)
}

pub fn dashboard_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DASHBOARD_FILE_NAME)
}

/// Loads the JSON array stored at `path`, decoding each element on its own.
///
/// A missing, unreadable or corrupt file reads as an empty collection, and an
/// element that does not match `T` is skipped. Failures are logged and never
/// returned.
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    decode_records(path, load_raw_records(path))
}

/// The array elements as stored, without typing them. Write paths mutate
/// this so entries this build cannot decode survive the rewrite.
pub fn load_raw_records(path: &Path) -> Vec<Value> {
    load_document(path)
}

fn decode_records<T: DeserializeOwned>(path: &Path, raw: Vec<Value>) -> Vec<T> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(path = %path.display(), index, error = %err, "skipping malformed record");
                None
            }
        })
        .collect()
}

/// Loads a JSON document, falling back to `T::default()` on any failure.
pub fn load_document<T: DeserializeOwned + Default>(path: &Path) -> T {
    match try_load_document(path) {
        Ok(Some(document)) => document,
        Ok(None) => {
            tracing::debug!(path = %path.display(), "store file absent, using empty data");
            T::default()
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable store file");
            T::default()
        }
    }
}

/// Strict variant of [`load_document`]: `Ok(None)` when the file is absent.
pub fn try_load_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, AppError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let document = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    Ok(Some(document))
}

/// Overwrites `path` with the pretty-printed records, creating parent
/// directories first. Concurrent writers are not serialized.
pub fn save_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), AppError> {
    save_document(path, records)
}

pub fn save_document<T: Serialize + ?Sized>(path: &Path, document: &T) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    let content = serde_json::to_string_pretty(document)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    tracing::debug!(path = %path.display(), "store file written");
    Ok(())
}
