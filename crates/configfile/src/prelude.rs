//! Convenience re-exports for common types

pub use crate::error::{ConfigStoreError, ErrorKind};
pub use crate::fs::FileSystem;
pub use crate::options::{ErrorOverride, StoreOptions};
pub use crate::storage::WriteInfo;
pub use crate::store::{ConfigStore, SerializedWriteInfo};
pub use crate::validation::{
    SchemaValidator, SerdeValidator, ValidationErrors, ValidationIssue, Validator,
};
