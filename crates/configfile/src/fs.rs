//! Filesystem seam used by the storage layer
//!
//! Every filesystem call the store makes goes through [`FileSystem`]. The
//! production implementation, [`OsFileSystem`], forwards to `std::fs`; tests
//! substitute implementations that count calls or fail on demand.

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::Path;

/// Blocking filesystem primitives needed by the atomic write protocol.
///
/// Implementations must not hold handles across calls.
pub trait FileSystem: Debug + Send + Sync {
    /// Read a whole file as raw bytes.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Read a whole file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Create or truncate `path` and write `contents` fully.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Atomically replace `to` with `from`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Delete a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Create a directory and all missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Plain existence check; does not test readability.
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileSystem`] backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn must<T, E: std::fmt::Debug>(r: std::result::Result<T, E>) -> T {
        match r {
            Ok(v) => v,
            Err(e) => panic!("unexpected Err: {e:?}"),
        }
    }

    #[test]
    fn test_os_file_system_roundtrip() {
        let temp_dir = must(TempDir::new());
        let fs = OsFileSystem;
        let nested = temp_dir.path().join("a").join("b");
        let file = nested.join("data.json");

        must(fs.create_dir_all(&nested));
        assert!(!fs.exists(&file));

        must(fs.write(&file, b"{}\n"));
        assert!(fs.exists(&file));
        assert_eq!(must(fs.read_to_string(&file)), "{}\n");
        assert_eq!(must(fs.read(&file)), b"{}\n");

        let moved = nested.join("moved.json");
        must(fs.rename(&file, &moved));
        assert!(!fs.exists(&file));
        assert!(fs.exists(&moved));

        must(fs.remove_file(&moved));
        assert!(!fs.exists(&moved));
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let temp_dir = must(TempDir::new());
        let result = OsFileSystem.read_to_string(&temp_dir.path().join("missing.json"));
        match result {
            Err(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            Ok(content) => panic!("expected NotFound, read {content:?}"),
        }
    }
}
