//! Mock filesystem for store tests.
//!
//! [`MockFileSystem`] forwards to the real filesystem, records every call,
//! and can be told to fail a given kind of call with a chosen error kind.

use configfile::{FileSystem, OsFileSystem};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Kinds of [`FileSystem`] calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsCall {
    Read,
    ReadToString,
    Write,
    Rename,
    RemoveFile,
    CreateDirAll,
    Exists,
}

#[derive(Debug, Default)]
pub struct MockFileSystem {
    inner: OsFileSystem,
    failures: Mutex<HashMap<FsCall, io::ErrorKind>>,
    calls: Mutex<Vec<(FsCall, PathBuf)>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `call` with `kind` from now on.
    pub fn with_failure(self, call: FsCall, kind: io::ErrorKind) -> Self {
        self.fail(call, kind);
        self
    }

    pub fn fail(&self, call: FsCall, kind: io::ErrorKind) {
        self.failures.lock().insert(call, kind);
    }

    pub fn heal(&self, call: FsCall) {
        self.failures.lock().remove(&call);
    }

    pub fn calls(&self) -> Vec<(FsCall, PathBuf)> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: FsCall) -> usize {
        self.calls.lock().iter().filter(|(c, _)| *c == call).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: FsCall, path: &Path) -> io::Result<()> {
        self.calls.lock().push((call, path.to_path_buf()));
        match self.failures.lock().get(&call) {
            Some(kind) => Err(io::Error::new(*kind, format!("injected {call:?} failure"))),
            None => Ok(()),
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.record(FsCall::Read, path)?;
        self.inner.read(path)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.record(FsCall::ReadToString, path)?;
        self.inner.read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.record(FsCall::Write, path)?;
        self.inner.write(path, contents)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.record(FsCall::Rename, to)?;
        self.inner.rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.record(FsCall::RemoveFile, path)?;
        self.inner.remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.record(FsCall::CreateDirAll, path)?;
        self.inner.create_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.calls.lock().push((FsCall::Exists, path.to_path_buf()));
        self.inner.exists(path)
    }
}
