//! File-based storage with atomic writes

use crate::error::{StorageError, StorageOp};
use crate::fs::{FileSystem, OsFileSystem};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Length of the random token in temporary file names
pub const TEMP_TOKEN_LEN: usize = 10;

/// Outcome of a write-path operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WriteInfo {
    /// Whether the file on disk was modified
    pub changed: bool,
}

impl WriteInfo {
    /// The file was modified
    pub const CHANGED: Self = Self { changed: true };
    /// The file was left alone
    pub const UNCHANGED: Self = Self { changed: false };
}

/// Raw access to a single file with all-or-nothing replacement
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FileStorage {
    /// Create storage for `path` on the OS filesystem
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_file_system(path, Arc::new(OsFileSystem))
    }

    /// Create storage for `path` on a custom filesystem
    pub fn with_file_system(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    /// Path of the managed file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the file exists
    pub fn exists(&self) -> bool {
        self.fs.exists(&self.path)
    }

    /// Read file content as string
    pub fn read_to_string(&self) -> Result<String, StorageError> {
        debug!(path = ?self.path, "Reading file");

        self.fs
            .read_to_string(&self.path)
            .map_err(|e| StorageError::new(StorageOp::Read, &self.path, e))
    }

    /// Read file content as raw bytes
    pub fn read_bytes(&self) -> Result<Vec<u8>, StorageError> {
        self.fs
            .read(&self.path)
            .map_err(|e| StorageError::new(StorageOp::Read, &self.path, e))
    }

    /// Replace the file content atomically
    ///
    /// # Error Recovery
    ///
    /// Uses atomic write pattern:
    /// 1. Skip everything if the file already holds exactly the bytes of
    ///    `content`; existing content need not be UTF-8
    /// 2. Write to a uniquely named temporary sibling
    /// 3. Rename temp file to target
    /// 4. Original file is preserved if any step fails; a failed rename
    ///    also removes the temporary file
    pub fn write_atomic(&self, content: &str) -> Result<WriteInfo, StorageError> {
        if self.exists() && self.read_bytes()? == content.as_bytes() {
            debug!(path = ?self.path, "Content unchanged, skipping write");
            return Ok(WriteInfo::UNCHANGED);
        }

        let temp_path = self.temp_path();
        debug!(path = ?self.path, temp_path = ?temp_path, "Writing file atomically");

        if let Some(parent) = temp_path.parent() {
            self.fs
                .create_dir_all(parent)
                .map_err(|e| StorageError::new(StorageOp::CreateDir, parent, e))?;
        }

        self.fs
            .write(&temp_path, content.as_bytes())
            .map_err(|e| StorageError::new(StorageOp::WriteTemp, &temp_path, e))?;

        if let Err(rename_err) = self.fs.rename(&temp_path, &self.path) {
            if let Err(cleanup_err) = self.fs.remove_file(&temp_path) {
                warn!(
                    temp_path = ?temp_path,
                    error = %cleanup_err,
                    "Failed to remove temp file after rename failure"
                );
            }
            return Err(StorageError::new(StorageOp::Rename, &self.path, rename_err));
        }

        debug!(path = ?self.path, "File written successfully");
        Ok(WriteInfo::CHANGED)
    }

    /// Delete the file if present
    pub fn delete(&self) -> Result<WriteInfo, StorageError> {
        if !self.exists() {
            return Ok(WriteInfo::UNCHANGED);
        }

        self.fs
            .remove_file(&self.path)
            .map_err(|e| StorageError::new(StorageOp::Remove, &self.path, e))?;

        debug!(path = ?self.path, "File removed");
        Ok(WriteInfo::CHANGED)
    }

    /// Fresh temporary sibling path, `<path>.<token>.tmp`
    pub fn temp_path(&self) -> PathBuf {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TEMP_TOKEN_LEN)
            .map(char::from)
            .collect();

        let mut name = self.path.as_os_str().to_owned();
        name.push(".");
        name.push(token);
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IoFailureKind;
    use std::io;
    use tempfile::TempDir;

    fn must<T, E: std::fmt::Debug>(r: std::result::Result<T, E>) -> T {
        match r {
            Ok(v) => v,
            Err(e) => panic!("unexpected Err: {e:?}"),
        }
    }

    fn create_test_storage() -> (FileStorage, TempDir) {
        let temp_dir = must(TempDir::new());
        let storage = FileStorage::new(temp_dir.path().join("config.json"));
        (storage, temp_dir)
    }

    fn leftover_temp_files(dir: &Path) -> usize {
        must(std::fs::read_dir(dir))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    #[derive(Debug)]
    struct RenameFails;

    impl FileSystem for RenameFails {
        fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
            OsFileSystem.read(path)
        }

        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            OsFileSystem.read_to_string(path)
        }

        fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
            OsFileSystem.write(path, contents)
        }

        fn rename(&self, _from: &Path, _to: &Path) -> io::Result<()> {
            Err(io::Error::other("injected rename failure"))
        }

        fn remove_file(&self, path: &Path) -> io::Result<()> {
            OsFileSystem.remove_file(path)
        }

        fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            OsFileSystem.create_dir_all(path)
        }

        fn exists(&self, path: &Path) -> bool {
            OsFileSystem.exists(path)
        }
    }

    #[test]
    fn test_atomic_write() {
        let (storage, _temp_dir) = create_test_storage();

        let info = must(storage.write_atomic("{\"test\": \"data\"}\n"));
        assert!(info.changed);
        assert!(storage.exists());
        assert_eq!(must(storage.read_to_string()), "{\"test\": \"data\"}\n");
    }

    #[test]
    fn test_identical_write_is_suppressed() {
        let (storage, _temp_dir) = create_test_storage();

        assert_eq!(must(storage.write_atomic("{}\n")), WriteInfo::CHANGED);
        assert_eq!(must(storage.write_atomic("{}\n")), WriteInfo::UNCHANGED);
        // a trailing newline difference is a real change
        assert_eq!(must(storage.write_atomic("{}")), WriteInfo::CHANGED);
    }

    #[test]
    fn test_write_replaces_non_utf8_content() {
        let (storage, _temp_dir) = create_test_storage();
        must(std::fs::write(storage.path(), [0xff, 0xfe, 0x00]));

        assert_eq!(must(storage.write_atomic("{}\n")), WriteInfo::CHANGED);
        assert_eq!(must(storage.read_to_string()), "{}\n");
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let temp_dir = must(TempDir::new());
        let path = temp_dir.path().join("nested").join("deeper").join("config.json");
        let storage = FileStorage::new(&path);

        must(storage.write_atomic("{}\n"));
        assert!(path.exists());
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let (storage, temp_dir) = create_test_storage();

        must(storage.write_atomic("{\"a\": 1}\n"));
        must(storage.write_atomic("{\"a\": 2}\n"));
        assert_eq!(leftover_temp_files(temp_dir.path()), 0);
    }

    #[test]
    fn test_rename_failure_preserves_original() {
        let temp_dir = must(TempDir::new());
        let path = temp_dir.path().join("config.json");
        must(std::fs::write(&path, "{\"version\": 1}\n"));

        let storage = FileStorage::with_file_system(&path, Arc::new(RenameFails));
        let err = match storage.write_atomic("{\"version\": 2}\n") {
            Ok(info) => panic!("rename failure must surface, got {info:?}"),
            Err(e) => e,
        };

        assert_eq!(err.op, StorageOp::Rename);
        assert_eq!(err.kind, IoFailureKind::Other);
        assert_eq!(must(std::fs::read_to_string(&path)), "{\"version\": 1}\n");
        assert_eq!(leftover_temp_files(temp_dir.path()), 0);
    }

    #[test]
    fn test_rename_failure_preserves_absence() {
        let temp_dir = must(TempDir::new());
        let path = temp_dir.path().join("config.json");

        let storage = FileStorage::with_file_system(&path, Arc::new(RenameFails));
        assert!(storage.write_atomic("{}\n").is_err());
        assert!(!path.exists());
        assert_eq!(leftover_temp_files(temp_dir.path()), 0);
    }

    #[test]
    fn test_read_nonexistent_file() {
        let (storage, _temp_dir) = create_test_storage();

        let err = match storage.read_to_string() {
            Ok(content) => panic!("expected an error, read {content:?}"),
            Err(e) => e,
        };
        assert_eq!(err.op, StorageOp::Read);
        assert_eq!(err.kind, IoFailureKind::NotFound);
    }

    #[test]
    fn test_delete_file() {
        let (storage, _temp_dir) = create_test_storage();

        must(storage.write_atomic("{}\n"));
        assert_eq!(must(storage.delete()), WriteInfo::CHANGED);
        assert!(!storage.exists());
        assert_eq!(must(storage.delete()), WriteInfo::UNCHANGED);
    }

    #[test]
    fn test_temp_path_naming() {
        let storage = FileStorage::new("/var/lib/app/config.json");

        let first = storage.temp_path();
        let second = storage.temp_path();
        assert_ne!(first, second);

        let name = first.to_string_lossy().into_owned();
        let token = name
            .strip_prefix("/var/lib/app/config.json.")
            .and_then(|rest| rest.strip_suffix(".tmp"));
        match token {
            Some(token) => {
                assert_eq!(token.len(), TEMP_TOKEN_LEN);
                assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
            }
            None => panic!("unexpected temp path {name}"),
        }
        assert_eq!(first.parent(), Some(Path::new("/var/lib/app")));
    }
}
