//! Test fixtures for store scenarios.
//!
//! The `{foo, baz?}` schema and [`FooConfig`] type are the smallest config
//! that exercises required properties, optional properties and type errors.

use crate::must::must;
use configfile::SchemaValidator;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooConfig {
    pub foo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baz: Option<String>,
}

impl FooConfig {
    pub fn new(foo: impl Into<String>) -> Self {
        Self {
            foo: foo.into(),
            baz: None,
        }
    }

    pub fn with_baz(mut self, baz: impl Into<String>) -> Self {
        self.baz = Some(baz.into());
        self
    }
}

/// `{ foo: string, baz?: string }`
pub fn foo_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "foo": { "type": "string" },
            "baz": { "type": "string" }
        },
        "required": ["foo"]
    })
}

pub fn foo_validator() -> SchemaValidator<FooConfig> {
    must(SchemaValidator::new(&foo_schema()))
}

/// A temporary directory holding one config file path.
#[derive(Debug)]
pub struct TempStoreFixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl TempStoreFixture {
    pub fn new() -> Self {
        Self::with_file_name("config.json")
    }

    pub fn with_file_name(name: &str) -> Self {
        let dir = must(TempDir::new());
        let path = dir.path().join(name);
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the config file directly, bypassing the store.
    pub fn write_file(&self, content: &str) {
        must(fs::write(&self.path, content));
    }

    /// Read the config file directly, bypassing the store.
    pub fn read_file(&self) -> String {
        must(fs::read_to_string(&self.path))
    }

    /// Leftover `*.tmp` siblings in the fixture directory.
    pub fn temp_files(&self) -> Vec<PathBuf> {
        must(fs::read_dir(self.dir.path()))
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "tmp"))
            .collect()
    }
}

impl Default for TempStoreFixture {
    fn default() -> Self {
        Self::new()
    }
}
