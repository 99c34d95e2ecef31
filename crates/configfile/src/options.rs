//! Per-store error remapping options

use serde::{Deserialize, Serialize};

/// Replacement code and message for one error kind
///
/// Either half may be left unset; the store then falls back to the
/// underlying error's message and the kind's default code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorOverride {
    /// Machine-readable code substituted into the error
    pub code: Option<String>,
    /// Human-readable message substituted into the error
    pub message: Option<String>,
}

impl ErrorOverride {
    /// Override both code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: Some(message.into()),
        }
    }

    /// Override the code only
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: None,
        }
    }

    /// Override the message only
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: Some(message.into()),
        }
    }

    pub(crate) fn resolve_code(&self, default: &str) -> String {
        self.code.clone().unwrap_or_else(|| default.to_string())
    }
}

/// Config store error handling options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Remapping for a missing file
    pub not_found: Option<ErrorOverride>,
    /// Remapping for refused access
    pub permission_denied: Option<ErrorOverride>,
    /// Remapping for malformed JSON
    pub parse_error: Option<ErrorOverride>,
}

impl StoreOptions {
    /// Create options with no remapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the missing-file override
    pub fn with_not_found(mut self, remap: ErrorOverride) -> Self {
        self.not_found = Some(remap);
        self
    }

    /// Set the refused-access override
    pub fn with_permission_denied(mut self, remap: ErrorOverride) -> Self {
        self.permission_denied = Some(remap);
        self
    }

    /// Set the malformed-JSON override
    pub fn with_parse_error(mut self, remap: ErrorOverride) -> Self {
        self.parse_error = Some(remap);
        self
    }
}
