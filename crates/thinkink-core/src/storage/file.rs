//! One JSON file per key in a directory.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::document::Document;
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "json";

/// Directory-backed storage. Keys map to `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Io(format!("{} {}: {}", action, path.display(), err))
}

/// Keys may contain anything; file names keep only `[A-Za-z0-9_-]`.
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl FileStorage {
    /// Open storage in `dir`, creating the directory when missing.
    pub fn new(dir: PathBuf) -> StorageResult<Self> {
        fs::create_dir_all(&dir).map_err(|e| io_error("Cannot create", &dir, e))?;
        Ok(Self { dir })
    }

    /// Storage in the platform data directory, e.g. `~/.local/share/thinkink/`.
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("No data directory on this platform".to_string()))?;
        Self::new(base.join("thinkink"))
    }

    pub fn base_path(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(file_stem(key)).with_extension(EXTENSION)
    }
}

impl Storage for FileStorage {
    fn save(&self, id: &str, document: &Document) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.path_for(id);
        let json = document.to_json();

        Box::pin(async move {
            let json = json.map_err(|e| StorageError::Serialization(e.to_string()))?;
            // Write beside the target, then swap it in.
            let staging = path.with_extension("json.tmp");
            fs::write(&staging, json).map_err(|e| io_error("Cannot write", &staging, e))?;
            fs::rename(&staging, &path).map_err(|e| io_error("Cannot replace", &path, e))
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<Document>> {
        let path = self.path_for(id);
        let id = id.to_string();

        Box::pin(async move {
            let json = match fs::read_to_string(&path) {
                Ok(json) => json,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(StorageError::NotFound(id));
                }
                Err(e) => return Err(io_error("Cannot read", &path, e)),
            };
            Document::from_json(&json)
                .map_err(|e| StorageError::Serialization(format!("{}: {}", path.display(), e)))
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.path_for(id);

        Box::pin(async move {
            match fs::remove_file(&path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(io_error("Cannot delete", &path, e)),
                _ => Ok(()),
            }
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let dir = self.dir.clone();

        Box::pin(async move {
            let entries = fs::read_dir(&dir).map_err(|e| io_error("Cannot list", &dir, e))?;
            let mut keys: Vec<String> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == EXTENSION))
                .filter_map(|path| path.file_stem()?.to_str().map(str::to_owned))
                .collect();
            keys.sort();
            Ok(keys)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.path_for(id);
        Box::pin(async move { Ok(path.is_file()) })
    }
}
