//! Config store core implementation

use crate::document;
use crate::error::{
    ConfigStoreError, IoFailureKind, NOT_FOUND_CODE, PARSE_ERROR_CODE, PERMISSION_DENIED_CODE,
    StorageError, StorageOp,
};
use crate::fs::{FileSystem, OsFileSystem};
use crate::options::{ErrorOverride, StoreOptions};
use crate::storage::{FileStorage, WriteInfo};
use crate::validation::Validator;
use crate::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a validated write, with the exact text that is on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedWriteInfo {
    /// Whether the file on disk was modified
    pub changed: bool,
    /// Canonical serialization of the written value
    pub serialized: String,
}

impl From<SerializedWriteInfo> for WriteInfo {
    fn from(info: SerializedWriteInfo) -> Self {
        Self {
            changed: info.changed,
        }
    }
}

/// Builder for [`ConfigStore`]
pub struct ConfigStoreBuilder<T, V> {
    path: PathBuf,
    validator: V,
    initial_value: Option<T>,
    options: StoreOptions,
    fs: Arc<dyn FileSystem>,
}

impl<T, V> ConfigStoreBuilder<T, V>
where
    T: Serialize + DeserializeOwned,
    V: Validator<T>,
{
    /// Value used by `initialize` and as the `update` fallback
    pub fn initial_value(mut self, value: T) -> Self {
        self.initial_value = Some(value);
        self
    }

    /// Replace all error remapping options
    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Remap missing-file errors
    pub fn on_not_found(mut self, remap: ErrorOverride) -> Self {
        self.options.not_found = Some(remap);
        self
    }

    /// Remap refused-access errors
    pub fn on_permission_denied(mut self, remap: ErrorOverride) -> Self {
        self.options.permission_denied = Some(remap);
        self
    }

    /// Remap malformed-JSON errors
    pub fn on_parse_error(mut self, remap: ErrorOverride) -> Self {
        self.options.parse_error = Some(remap);
        self
    }

    /// Route filesystem calls through `fs`
    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Resolve the path and create the store
    ///
    /// # Errors
    ///
    /// Fails with [`ConfigStoreError::Io`] if the path cannot be made
    /// absolute, and with [`ConfigStoreError::ValidationFailed`] if the
    /// initial value does not satisfy the validator.
    pub fn build(self) -> Result<ConfigStore<T, V>> {
        let path = std::path::absolute(&self.path)
            .map_err(|e| ConfigStoreError::io(self.path.clone(), e))?;

        let store = ConfigStore {
            storage: FileStorage::with_file_system(&path, self.fs),
            path,
            validator: self.validator,
            initial_value: self.initial_value,
            options: self.options,
        };

        if let Some(initial) = &store.initial_value {
            store.check(initial)?;
        }

        debug!(path = ?store.path, "Config store created");
        Ok(store)
    }
}

/// Validated, crash-safe store for one JSON config file
///
/// The store keeps no cached copy of the document; each call reads from or
/// writes to disk. It performs no locking, so concurrent read-modify-write
/// cycles from several writers race and the last rename wins. Readers never
/// see a partial file.
pub struct ConfigStore<T, V> {
    path: PathBuf,
    validator: V,
    initial_value: Option<T>,
    options: StoreOptions,
    storage: FileStorage,
}

impl<T, V> fmt::Debug for ConfigStore<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("path", &self.path)
            .field("has_initial_value", &self.initial_value.is_some())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<T, V> ConfigStore<T, V>
where
    T: Serialize + DeserializeOwned,
    V: Validator<T>,
{
    /// Start building a store for `path`
    pub fn builder(path: impl AsRef<Path>, validator: V) -> ConfigStoreBuilder<T, V> {
        ConfigStoreBuilder {
            path: path.as_ref().to_path_buf(),
            validator,
            initial_value: None,
            options: StoreOptions::default(),
            fs: Arc::new(OsFileSystem),
        }
    }

    /// Create a store without initial value or error remapping
    ///
    /// # Errors
    ///
    /// Fails if the path cannot be made absolute.
    pub fn new(path: impl AsRef<Path>, validator: V) -> Result<Self> {
        Self::builder(path, validator).build()
    }

    /// Absolute path of the config file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured initial value, if any
    pub fn initial_value(&self) -> Option<&T> {
        self.initial_value.as_ref()
    }

    /// Error remapping options
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Whether the config file exists; readability is not checked
    pub fn exists(&self) -> bool {
        self.storage.exists()
    }

    /// Read the config file as text
    ///
    /// # Errors
    ///
    /// [`ConfigStoreError::NotFound`], [`ConfigStoreError::PermissionDenied`]
    /// or [`ConfigStoreError::Io`].
    pub fn read_raw(&self) -> Result<String> {
        self.storage
            .read_to_string()
            .map_err(|e| self.classify(e))
    }

    /// Read and parse the config file without validating it
    ///
    /// # Errors
    ///
    /// Everything [`Self::read_raw`] returns, plus
    /// [`ConfigStoreError::Parse`] for malformed JSON.
    pub fn read_parsed(&self) -> Result<Value> {
        let serialized = self.read_raw()?;
        document::parse(&serialized).map_err(|e| self.parse_error(e))
    }

    /// Run the validator over a document
    ///
    /// # Errors
    ///
    /// [`ConfigStoreError::ValidationFailed`] with every reported issue.
    pub fn validate(&self, document: &Value) -> Result<T> {
        self.validator
            .validate(document)
            .map_err(|errors| ConfigStoreError::validation_failed(&self.path, errors))
    }

    /// Read, parse and validate the config file
    ///
    /// # Errors
    ///
    /// Everything [`Self::read_parsed`] returns, plus
    /// [`ConfigStoreError::ValidationFailed`].
    pub fn read(&self) -> Result<T> {
        let parsed = self.read_parsed()?;
        let config = self.validate(&parsed)?;
        debug!(path = ?self.path, "Config loaded");
        Ok(config)
    }

    /// Read the config file if it exists
    ///
    /// # Errors
    ///
    /// Same as [`Self::read`] for a file that exists.
    pub fn read_if_exists(&self) -> Result<Option<T>> {
        if self.exists() {
            self.read().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Validate, serialize and atomically write `config`
    ///
    /// # Errors
    ///
    /// [`ConfigStoreError::ValidationFailed`] if `config` is rejected, plus
    /// everything [`Self::write_raw`] returns.
    pub fn write(&self, config: &T) -> Result<SerializedWriteInfo> {
        let document = self.check(config)?;
        let serialized = document::serialize(&document).map_err(|e| self.serialize_error(e))?;
        let info = self.write_raw(&serialized)?;
        Ok(SerializedWriteInfo {
            changed: info.changed,
            serialized,
        })
    }

    /// Atomically write text to the config file without validating it
    ///
    /// # Errors
    ///
    /// [`ConfigStoreError::PermissionDenied`] if the temp file cannot be
    /// created, [`ConfigStoreError::Io`] for other failures including the
    /// final rename.
    pub fn write_raw(&self, serialized: &str) -> Result<WriteInfo> {
        let info = self
            .storage
            .write_atomic(serialized)
            .map_err(|e| self.classify(e))?;

        if info.changed {
            info!(path = ?self.path, "Config saved");
        } else {
            debug!(path = ?self.path, "Config unchanged, write skipped");
        }
        Ok(info)
    }

    /// Delete the config file if present
    ///
    /// # Errors
    ///
    /// [`ConfigStoreError::Io`] if the file exists but cannot be removed.
    pub fn remove(&self) -> Result<WriteInfo> {
        let info = self.storage.delete().map_err(|e| self.classify(e))?;
        if info.changed {
            info!(path = ?self.path, "Config removed");
        }
        Ok(info)
    }

    /// Write the initial value unless the file already exists
    ///
    /// # Errors
    ///
    /// [`ConfigStoreError::MissingInitialValue`] if the store has none,
    /// otherwise everything [`Self::write`] returns.
    pub fn initialize(&self) -> Result<WriteInfo> {
        let Some(initial) = &self.initial_value else {
            return Err(ConfigStoreError::MissingInitialValue {
                path: self.path.clone(),
            });
        };

        if self.exists() {
            debug!(path = ?self.path, "Config already present, initialize skipped");
            return Ok(WriteInfo::UNCHANGED);
        }

        let info = self.write(initial)?;
        info!(path = ?self.path, "Config initialized");
        Ok(info.into())
    }

    /// Read-modify-write with a function from the current config to the new one
    ///
    /// The current config is the file content, or the initial value when the
    /// file is missing and one is configured.
    ///
    /// # Errors
    ///
    /// [`ConfigStoreError::NotFound`] if the file is missing and there is no
    /// initial value, otherwise everything [`Self::read`] and
    /// [`Self::write`] return.
    pub fn update<F>(&self, updater: F) -> Result<SerializedWriteInfo>
    where
        T: Clone,
        F: FnOnce(T) -> T,
    {
        let config = self.current()?;
        self.write(&updater(config))
    }

    /// Read-modify-write with an in-place mutator
    ///
    /// # Errors
    ///
    /// Same as [`Self::update`].
    pub fn modify<F>(&self, mutator: F) -> Result<SerializedWriteInfo>
    where
        T: Clone,
        F: FnOnce(&mut T),
    {
        let mut config = self.current()?;
        mutator(&mut config);
        self.write(&config)
    }

    /// Read-modify-write with a mutator that may give up
    ///
    /// A mutator error aborts the transaction before anything is written.
    ///
    /// # Errors
    ///
    /// [`ConfigStoreError::UpdateAborted`] wrapping the mutator error, plus
    /// everything [`Self::update`] returns.
    pub fn try_update<F, E>(&self, updater: F) -> Result<SerializedWriteInfo>
    where
        T: Clone,
        F: FnOnce(T) -> std::result::Result<T, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let config = self.current()?;
        let updated = updater(config).map_err(|e| ConfigStoreError::UpdateAborted {
            path: self.path.clone(),
            source: e.into(),
        })?;
        self.write(&updated)
    }

    fn current(&self) -> Result<T>
    where
        T: Clone,
    {
        match &self.initial_value {
            Some(initial) => Ok(self
                .read_if_exists()?
                .unwrap_or_else(|| initial.clone())),
            None => self.read(),
        }
    }

    /// Convert to a document and run it through the validator
    fn check(&self, config: &T) -> Result<Value> {
        let document = document::to_document(config).map_err(|e| self.serialize_error(e))?;
        self.validate(&document)?;
        Ok(document)
    }

    fn classify(&self, err: StorageError) -> ConfigStoreError {
        match (err.op, err.kind) {
            (StorageOp::Read, IoFailureKind::NotFound) => self.not_found(err.source),
            (
                StorageOp::Read | StorageOp::CreateDir | StorageOp::WriteTemp,
                IoFailureKind::PermissionDenied,
            ) => self.permission_denied(err.source),
            _ => ConfigStoreError::io(err.path, err.source),
        }
    }

    fn not_found(&self, source: io::Error) -> ConfigStoreError {
        let remap = self.options.not_found.as_ref();
        ConfigStoreError::NotFound {
            path: self.path.clone(),
            code: remap.map_or_else(
                || NOT_FOUND_CODE.to_string(),
                |o| o.resolve_code(NOT_FOUND_CODE),
            ),
            message: self.os_message(remap, &source),
            source,
        }
    }

    fn permission_denied(&self, source: io::Error) -> ConfigStoreError {
        let remap = self.options.permission_denied.as_ref();
        ConfigStoreError::PermissionDenied {
            path: self.path.clone(),
            code: remap.map_or_else(
                || PERMISSION_DENIED_CODE.to_string(),
                |o| o.resolve_code(PERMISSION_DENIED_CODE),
            ),
            message: self.os_message(remap, &source),
            source,
        }
    }

    fn os_message(&self, remap: Option<&ErrorOverride>, source: &io::Error) -> String {
        match remap.and_then(|o| o.message.clone()) {
            Some(message) => message,
            None => format!("{source}: {}", self.path.display()),
        }
    }

    fn parse_error(&self, source: serde_json::Error) -> ConfigStoreError {
        let remap = self.options.parse_error.as_ref();
        let message = match remap.and_then(|o| o.message.as_deref()) {
            Some(message) => format!("{message}\n{source}"),
            None => format!(
                "Contents of {} could not be parsed. Please ensure file is in a valid format.\n{source}",
                self.path.display()
            ),
        };
        ConfigStoreError::Parse {
            path: self.path.clone(),
            code: remap.map_or_else(
                || PARSE_ERROR_CODE.to_string(),
                |o| o.resolve_code(PARSE_ERROR_CODE),
            ),
            message,
            source,
        }
    }

    fn serialize_error(&self, source: serde_json::Error) -> ConfigStoreError {
        ConfigStoreError::Serialize {
            path: self.path.clone(),
            source,
        }
    }
}

impl<T, V> fmt::Debug for ConfigStoreBuilder<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStoreBuilder")
            .field("path", &self.path)
            .field("has_initial_value", &self.initial_value.is_some())
            .finish_non_exhaustive()
    }
}
