//! Validated, crash-safe single-file JSON configuration store
//!
//! This crate persists one JSON document per store with:
//! - Atomic replacement (write to a random temp sibling, then rename)
//! - Write suppression when the canonical serialization is unchanged
//! - A pluggable [`Validator`] applied on both read and write
//! - Typed failure classification over raw filesystem errors, with
//!   caller-supplied codes and messages
//!
//! # Architecture
//!
//! Each layer only depends on the one below it:
//!
//! - [`fs`]: `FileSystem` seam over `std::fs`
//! - [`storage`]: raw reads, atomic writes, removal
//! - [`document`]: canonical JSON parse/serialize
//! - [`validation`]: validator trait, JSON Schema and serde validators
//! - [`store`]: `ConfigStore` transactions (`read`, `write`, `update`, ...)
//! - [`error`]: error types and classification
//! - [`options`]: per-kind error remapping
//!
//! # Concurrency
//!
//! All operations block. Readers never observe a partially written file,
//! but the store does no locking: two processes running `update` at the same
//! time race, and the last rename wins.
//!
//! # Example
//!
//! ```no_run
//! use configfile::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Clone, Serialize, Deserialize)]
//! struct AppConfig {
//!     endpoint: String,
//! }
//!
//! # fn example() -> configfile::Result<()> {
//! let store = ConfigStore::builder("/etc/app/config.json", SerdeValidator::new())
//!     .initial_value(AppConfig { endpoint: "localhost".into() })
//!     .on_not_found(ErrorOverride::new("NO_CONFIG", "run `app init` first"))
//!     .build()?;
//!
//! store.initialize()?;
//! store.update(|mut config: AppConfig| {
//!     config.endpoint = "example.com".into();
//!     config
//! })?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod document;
pub mod error;
pub mod fs;
pub mod options;
pub mod prelude;
pub mod storage;
pub mod store;
pub mod validation;

pub use error::{ConfigStoreError, ErrorKind, IoFailureKind, StorageError, StorageOp};
pub use fs::{FileSystem, OsFileSystem};
pub use options::{ErrorOverride, StoreOptions};
pub use storage::{FileStorage, WriteInfo};
pub use store::{ConfigStore, ConfigStoreBuilder, SerializedWriteInfo};
pub use validation::{
    SchemaError, SchemaValidator, SerdeValidator, ValidationErrors, ValidationIssue, Validator,
};

/// Result type for config store operations
pub type Result<T> = std::result::Result<T, ConfigStoreError>;
