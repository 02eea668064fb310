//! Whole-file JSON record store.
//!
//! Every record is one pretty-printed JSON file addressed by a path relative
//! to the store root. Reads of a missing file return `Ok(None)` rather than an
//! error; writes replace the whole file atomically (temp file + rename), so a
//! retried write is a deterministic overwrite.

use crate::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File-backed record store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct RecordStore {
    root: PathBuf,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a record.
    pub fn path(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    pub fn exists(&self, rel: &Path) -> bool {
        self.path(rel).is_file()
    }

    /// Read and decode a record. `Ok(None)` when the file does not exist.
    pub fn read<T: DeserializeOwned>(&self, rel: &Path) -> Result<Option<T>> {
        match fs::read_to_string(self.path(rel)) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Encode and write a record, creating parent directories as needed.
    ///
    /// Returns `false` when the file already held exactly these bytes.
    pub fn write<T: Serialize>(&self, rel: &Path, value: &T) -> Result<bool> {
        let mut content = serde_json::to_string_pretty(value)?;
        content.push('\n');

        let path = self.path(rel);
        if let Ok(existing) = fs::read_to_string(&path) {
            if existing == content {
                return Ok(false);
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        atomic_write(&path, &content)?;
        Ok(true)
    }

    /// Delete a record. Returns `false` if it was already gone.
    pub fn remove(&self, rel: &Path) -> Result<bool> {
        match fs::remove_file(self.path(rel)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Move a record to a new location, creating the target directory.
    pub fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let target = self.path(to);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(self.path(from), target)?;
        Ok(())
    }

    /// Relative paths of the `*.json` records directly inside `rel_dir`,
    /// sorted by file name. A missing directory yields an empty list.
    pub fn list(&self, rel_dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(self.path(rel_dir)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if entry.file_type()?.is_file() && name.ends_with(".json") {
                records.push(rel_dir.join(&*name));
            }
        }
        records.sort();
        Ok(records)
    }

    /// Names of the subdirectories directly inside `rel_dir`, sorted.
    pub fn list_dirs(&self, rel_dir: &Path) -> Result<Vec<String>> {
        let entries = match fs::read_dir(self.path(rel_dir)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                dirs.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}

/// Atomic write using temp file and rename.
fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    fn note(text: &str) -> Note {
        Note {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_missing_record_is_none() {
        let temp = TempDir::new().unwrap();
        let store = RecordStore::new(temp.path());
        let missing: Option<Note> = store.read(Path::new("nope.json")).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let store = RecordStore::new(temp.path());
        let rel = Path::new("nested/dir/note.json");

        assert!(store.write(rel, &note("hello")).unwrap());
        assert_eq!(store.read::<Note>(rel).unwrap(), Some(note("hello")));
        assert!(!temp.path().join("nested/dir/note.json.tmp").exists());
    }

    #[test]
    fn test_identical_write_reports_unchanged() {
        let temp = TempDir::new().unwrap();
        let store = RecordStore::new(temp.path());
        let rel = Path::new("note.json");

        assert!(store.write(rel, &note("same")).unwrap());
        assert!(!store.write(rel, &note("same")).unwrap());
        assert!(store.write(rel, &note("different")).unwrap());
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("bad.json"), "{not json").unwrap();
        let store = RecordStore::new(temp.path());
        assert!(store.read::<Note>(Path::new("bad.json")).is_err());
    }

    #[test]
    fn test_remove_and_rename() {
        let temp = TempDir::new().unwrap();
        let store = RecordStore::new(temp.path());
        store.write(Path::new("a/one.json"), &note("1")).unwrap();

        store
            .rename(Path::new("a/one.json"), Path::new("b/one.json"))
            .unwrap();
        assert!(!store.exists(Path::new("a/one.json")));
        assert!(store.exists(Path::new("b/one.json")));

        assert!(store.remove(Path::new("b/one.json")).unwrap());
        assert!(!store.remove(Path::new("b/one.json")).unwrap());
    }

    #[test]
    fn test_list_returns_sorted_json_files_only() {
        let temp = TempDir::new().unwrap();
        let store = RecordStore::new(temp.path());
        store.write(Path::new("dir/b.json"), &note("b")).unwrap();
        store.write(Path::new("dir/a.json"), &note("a")).unwrap();
        std::fs::write(temp.path().join("dir/readme.txt"), "x").unwrap();
        std::fs::create_dir_all(temp.path().join("dir/sub")).unwrap();

        let listed = store.list(Path::new("dir")).unwrap();
        assert_eq!(
            listed,
            vec![PathBuf::from("dir/a.json"), PathBuf::from("dir/b.json")]
        );
        assert_eq!(store.list_dirs(Path::new("dir")).unwrap(), vec!["sub"]);
        assert!(store.list(Path::new("missing")).unwrap().is_empty());
    }
}
