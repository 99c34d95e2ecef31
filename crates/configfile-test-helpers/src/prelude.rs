//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use configfile_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_err, must_some};
pub use crate::{assert_changed, assert_error_kind, assert_unchanged};

#[cfg(feature = "fixtures")]
pub use crate::fixtures::{FooConfig, TempStoreFixture, foo_schema, foo_validator};

#[cfg(feature = "mock")]
pub use crate::mock::{FsCall, MockFileSystem};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
