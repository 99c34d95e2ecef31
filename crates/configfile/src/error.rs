//! Error types for config store operations

use crate::validation::ValidationErrors;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default code attached to [`ConfigStoreError::NotFound`]
pub const NOT_FOUND_CODE: &str = "ENOENT";

/// Default code attached to [`ConfigStoreError::PermissionDenied`]
pub const PERMISSION_DENIED_CODE: &str = "EACCES";

/// Default code attached to [`ConfigStoreError::Parse`]
pub const PARSE_ERROR_CODE: &str = "parseError";

/// Errors that can occur during config store operations
#[derive(Error, Debug)]
pub enum ConfigStoreError {
    /// The config file does not exist
    #[error("{message}")]
    NotFound {
        /// Path of the config file
        path: PathBuf,
        /// Machine-readable code, `ENOENT` unless overridden
        code: String,
        /// Human-readable message
        message: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// The OS refused access to the config file or its temp sibling
    #[error("{message}")]
    PermissionDenied {
        /// Path of the config file
        path: PathBuf,
        /// Machine-readable code, `EACCES` unless overridden
        code: String,
        /// Human-readable message
        message: String,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// The file content is not valid JSON
    #[error("{message}")]
    Parse {
        /// Path of the config file
        path: PathBuf,
        /// Machine-readable code, `parseError` unless overridden
        code: String,
        /// Human-readable message with the parser diagnostic appended
        message: String,
        /// Underlying parser error
        #[source]
        source: serde_json::Error,
    },

    /// A parsed document or a value about to be written was rejected
    #[error("Validation of {path} failed: {errors}")]
    ValidationFailed {
        /// Path of the config file
        path: PathBuf,
        /// Every issue reported by the validator
        errors: ValidationErrors,
    },

    /// `initialize` was called on a store without an initial value
    #[error("\"initialize\" can only be called if an initial value is provided ({path})")]
    MissingInitialValue {
        /// Path of the config file
        path: PathBuf,
    },

    /// The mutator passed to `try_update` gave up
    #[error("Update of {path} aborted: {source}")]
    UpdateAborted {
        /// Path of the config file
        path: PathBuf,
        /// Error returned by the mutator
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The value could not be represented as a JSON document
    #[error("Failed to serialize config for {path}: {source}")]
    Serialize {
        /// Path of the config file
        path: PathBuf,
        /// Underlying serializer error
        #[source]
        source: serde_json::Error,
    },

    /// Any other filesystem failure, propagated unchanged
    #[error("IO error on {path}: {source}")]
    Io {
        /// Path the failing call touched
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },
}

impl ConfigStoreError {
    /// Flat classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            Self::MissingInitialValue { .. } => ErrorKind::MissingInitialValue,
            Self::UpdateAborted { .. } => ErrorKind::UpdateAborted,
            Self::Serialize { .. } => ErrorKind::Serialize,
            Self::Io { .. } => ErrorKind::Other,
        }
    }

    /// Machine-readable code of the remappable kinds
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::NotFound { code, .. }
            | Self::PermissionDenied { code, .. }
            | Self::Parse { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Issues attached to a [`ConfigStoreError::ValidationFailed`]
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::ValidationFailed { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// Path of the config file the failing operation targeted
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path, .. }
            | Self::PermissionDenied { path, .. }
            | Self::Parse { path, .. }
            | Self::ValidationFailed { path, .. }
            | Self::MissingInitialValue { path }
            | Self::UpdateAborted { path, .. }
            | Self::Serialize { path, .. }
            | Self::Io { path, .. } => path,
        }
    }

    /// Check if this error is recoverable
    ///
    /// Environment failures may go away on a later attempt; malformed data
    /// and contract violations will not. The store itself never retries.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::PermissionDenied { .. } => true,
            Self::Parse { .. } => false,
            Self::ValidationFailed { .. } => false,
            Self::MissingInitialValue { .. } => false,
            Self::UpdateAborted { .. } => true,
            Self::Serialize { .. } => false,
            Self::Io { .. } => true,
        }
    }

    /// Create a validation error
    pub fn validation_failed(path: impl Into<PathBuf>, errors: ValidationErrors) -> Self {
        Self::ValidationFailed {
            path: path.into(),
            errors,
        }
    }

    /// Create an unclassified IO error
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Classification of [`ConfigStoreError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Target file absent on read
    NotFound,
    /// OS denied read or write access
    PermissionDenied,
    /// Malformed JSON text
    Parse,
    /// Document or value rejected by the validator
    ValidationFailed,
    /// `initialize` without a configured default
    MissingInitialValue,
    /// `try_update` mutator returned an error
    UpdateAborted,
    /// Value not representable as JSON
    Serialize,
    /// Unclassified OS failure
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "NotFound"),
            ErrorKind::PermissionDenied => write!(f, "PermissionDenied"),
            ErrorKind::Parse => write!(f, "ParseError"),
            ErrorKind::ValidationFailed => write!(f, "ValidationFailed"),
            ErrorKind::MissingInitialValue => write!(f, "MissingInitialValue"),
            ErrorKind::UpdateAborted => write!(f, "UpdateAborted"),
            ErrorKind::Serialize => write!(f, "Serialize"),
            ErrorKind::Other => write!(f, "Other"),
        }
    }
}

/// OS failure kinds the storage layer distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IoFailureKind {
    /// No such file or directory
    NotFound,
    /// Access refused by the OS
    PermissionDenied,
    /// Everything else
    Other,
}

impl IoFailureKind {
    /// Classify a raw OS error
    pub fn of(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            _ => Self::Other,
        }
    }
}

/// Step of the storage protocol a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageOp {
    /// Reading the target file
    Read,
    /// Creating the parent directory tree
    CreateDir,
    /// Writing the temporary sibling
    WriteTemp,
    /// Renaming the temporary sibling onto the target
    Rename,
    /// Deleting the target file
    Remove,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageOp::Read => write!(f, "read"),
            StorageOp::CreateDir => write!(f, "create directory"),
            StorageOp::WriteTemp => write!(f, "write temp file"),
            StorageOp::Rename => write!(f, "rename"),
            StorageOp::Remove => write!(f, "remove"),
        }
    }
}

/// Storage-specific error produced by the raw I/O layer
#[derive(Error, Debug)]
#[error("Failed to {op} {path}: {source}")]
pub struct StorageError {
    /// Protocol step that failed
    pub op: StorageOp,
    /// Classified OS failure
    pub kind: IoFailureKind,
    /// Path the failing call touched
    pub path: PathBuf,
    /// Underlying OS error
    #[source]
    pub source: io::Error,
}

impl StorageError {
    /// Wrap an OS error raised during `op` on `path`
    pub fn new(op: StorageOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            op,
            kind: IoFailureKind::of(&source),
            path: path.into(),
            source,
        }
    }
}
