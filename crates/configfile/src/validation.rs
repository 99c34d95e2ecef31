//! Validation boundary between parsed documents and typed configs
//!
//! A [`Validator`] turns an untyped [`Value`] into a `T` or reports every
//! problem it found as [`ValidationErrors`]. The store runs the same
//! validator on both the read and the write path.

use jsonschema::error::ValidationErrorKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// A single problem found in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// JSON pointer to the offending value, empty for the document root
    pub instance_path: String,
    /// Machine-readable reason code, e.g. `required` or `type`
    pub keyword: String,
    /// Human-readable description
    pub message: String,
    /// Reason-specific parameters
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ValidationIssue {
    /// Create an issue without parameters
    pub fn new(
        instance_path: impl Into<String>,
        keyword: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            instance_path: instance_path.into(),
            keyword: keyword.into(),
            message: message.into(),
            params: Map::new(),
        }
    }

    /// Attach a reason-specific parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "root: {}", self.message)
        } else {
            write!(f, "{}: {}", self.instance_path, self.message)
        }
    }
}

/// Ordered set of issues from one validation attempt
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationIssue>);

impl ValidationErrors {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding one issue
    pub fn single(issue: ValidationIssue) -> Self {
        Self(vec![issue])
    }

    /// Append an issue
    pub fn push(&mut self, issue: ValidationIssue) {
        self.0.push(issue);
    }

    /// Number of issues
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no issue was recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the issues in report order
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationIssue> {
        self.0.iter()
    }

    /// Issues as a slice
    pub fn as_slice(&self) -> &[ValidationIssue] {
        &self.0
    }
}

impl From<Vec<ValidationIssue>> for ValidationErrors {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        Self(issues)
    }
}

impl FromIterator<ValidationIssue> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ValidationIssue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationIssue;
    type IntoIter = std::vec::IntoIter<ValidationIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationIssue;
    type IntoIter = std::slice::Iter<'a, ValidationIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ValidationIssue::to_string).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Checks a parsed document and produces the typed config
pub trait Validator<T> {
    /// Validate `document`, returning the typed value or every issue found
    fn validate(&self, document: &Value) -> Result<T, ValidationErrors>;
}

impl<T, F> Validator<T> for F
where
    F: Fn(&Value) -> Result<T, ValidationErrors>,
{
    fn validate(&self, document: &Value) -> Result<T, ValidationErrors> {
        self(document)
    }
}

/// Schema loading errors
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema text is not JSON
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The schema is JSON but not a usable JSON Schema
    #[error("Schema compilation error: {0}")]
    SchemaCompilationError(String),
}

fn deserialize<T: DeserializeOwned>(document: &Value) -> Result<T, ValidationErrors> {
    serde_json::from_value(document.clone()).map_err(|e| {
        ValidationErrors::single(ValidationIssue::new("", "deserialize", e.to_string()))
    })
}

/// Validator that relies on the shape of `T` alone
///
/// Whatever serde accepts is valid; `#[serde(deny_unknown_fields)]` and
/// friends on `T` tighten the rules.
pub struct SerdeValidator<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> SerdeValidator<T> {
    /// Create a new serde validator
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SerdeValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SerdeValidator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeValidator").finish()
    }
}

impl<T: DeserializeOwned> Validator<T> for SerdeValidator<T> {
    fn validate(&self, document: &Value) -> Result<T, ValidationErrors> {
        deserialize(document)
    }
}

/// Validator with JSON Schema support
///
/// The document is checked against the compiled schema first; only a
/// conforming document is deserialized into `T`.
pub struct SchemaValidator<T> {
    schema: jsonschema::Validator,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SchemaValidator<T> {
    /// Compile a schema given as a JSON value
    pub fn new(schema: &Value) -> Result<Self, SchemaError> {
        let schema = jsonschema::Validator::new(schema)
            .map_err(|e| SchemaError::SchemaCompilationError(e.to_string()))?;

        Ok(Self {
            schema,
            _marker: PhantomData,
        })
    }

    /// Compile a schema given as JSON text
    pub fn from_json(schema_json: &str) -> Result<Self, SchemaError> {
        let schema_value: Value = serde_json::from_str(schema_json)?;
        Self::new(&schema_value)
    }

    fn schema_issues(&self, document: &Value) -> ValidationErrors {
        self.schema
            .iter_errors(document)
            .map(|error| {
                let schema_path = error.schema_path().to_string();
                let keyword = schema_path
                    .rsplit('/')
                    .next()
                    .filter(|segment| !segment.is_empty())
                    .unwrap_or("schema")
                    .to_string();

                let mut issue = ValidationIssue::new(
                    error.instance_path().to_string(),
                    keyword,
                    error.to_string(),
                );
                match error.kind() {
                    ValidationErrorKind::Required { property } => {
                        issue = issue.with_param("missingProperty", property.clone());
                    }
                    ValidationErrorKind::AdditionalProperties { unexpected } => {
                        issue = issue.with_param("unexpected", unexpected.clone());
                    }
                    _ => {}
                }
                issue.with_param("schemaPath", format!("#{schema_path}"))
            })
            .collect()
    }
}

impl<T> fmt::Debug for SchemaValidator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator").finish_non_exhaustive()
    }
}

impl<T: DeserializeOwned> Validator<T> for SchemaValidator<T> {
    fn validate(&self, document: &Value) -> Result<T, ValidationErrors> {
        let issues = self.schema_issues(document);
        if !issues.is_empty() {
            return Err(issues);
        }
        deserialize(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct TestConfig {
        foo: String,
        baz: Option<String>,
    }

    fn must<T, E: std::fmt::Debug>(r: std::result::Result<T, E>) -> T {
        match r {
            Ok(v) => v,
            Err(e) => panic!("unexpected Err: {e:?}"),
        }
    }

    fn test_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "foo": { "type": "string" },
                "baz": { "type": "string" }
            },
            "required": ["foo"],
            "additionalProperties": false
        })
    }

    fn first_issue(errors: &ValidationErrors) -> &ValidationIssue {
        match errors.as_slice().first() {
            Some(issue) => issue,
            None => panic!("expected at least one issue"),
        }
    }

    #[test]
    fn test_schema_validator_accepts_valid_document() {
        let validator: SchemaValidator<TestConfig> = must(SchemaValidator::new(&test_schema()));
        let config = must(validator.validate(&json!({ "foo": "bar" })));
        assert_eq!(
            config,
            TestConfig {
                foo: "bar".to_string(),
                baz: None
            }
        );
    }

    #[test]
    fn test_schema_validator_reports_missing_property() {
        let validator: SchemaValidator<TestConfig> = must(SchemaValidator::new(&test_schema()));
        let errors = match validator.validate(&Value::Null) {
            Ok(_) => panic!("null document must be rejected"),
            Err(errors) => errors,
        };
        assert_eq!(first_issue(&errors).keyword, "type");

        // additionalProperties reports `bar` separately
        let errors = match validator.validate(&json!({ "bar": "bar" })) {
            Ok(_) => panic!("document without foo must be rejected"),
            Err(errors) => errors,
        };
        let required: Vec<&ValidationIssue> =
            errors.iter().filter(|i| i.keyword == "required").collect();
        assert_eq!(required.len(), 1);
        let issue = required[0];
        assert_eq!(issue.instance_path, "");
        assert_eq!(issue.params.get("missingProperty"), Some(&json!("foo")));
    }

    #[test]
    fn test_schema_validator_reports_wrong_type_with_path() {
        let validator: SchemaValidator<TestConfig> = must(SchemaValidator::new(&test_schema()));
        let errors = match validator.validate(&json!({ "foo": 42 })) {
            Ok(_) => panic!("numeric foo must be rejected"),
            Err(errors) => errors,
        };
        assert_eq!(errors.len(), 1);
        let issue = first_issue(&errors);
        assert_eq!(issue.instance_path, "/foo");
        assert_eq!(issue.keyword, "type");
        assert!(errors.to_string().starts_with("/foo: "));
    }

    #[test]
    fn test_schema_compilation_error() {
        let result = SchemaValidator::<Value>::new(&json!({ "type": "not-a-type" }));
        assert!(matches!(result, Err(SchemaError::SchemaCompilationError(_))));

        let result = SchemaValidator::<Value>::from_json("{ not json");
        assert!(matches!(result, Err(SchemaError::JsonError(_))));
    }

    #[test]
    fn test_serde_validator() {
        let validator = SerdeValidator::<TestConfig>::new();
        assert!(validator.validate(&json!({ "foo": "bar" })).is_ok());

        let errors = match validator.validate(&json!({ "baz": "x" })) {
            Ok(_) => panic!("missing foo must be rejected"),
            Err(errors) => errors,
        };
        let issue = first_issue(&errors);
        assert_eq!(issue.keyword, "deserialize");
        assert!(issue.message.contains("foo"));
    }

    #[test]
    fn test_closure_validator() {
        let validator = |document: &Value| -> Result<u64, ValidationErrors> {
            document.as_u64().ok_or_else(|| {
                ValidationErrors::single(ValidationIssue::new("", "type", "must be an integer"))
            })
        };
        assert_eq!(must(validator.validate(&json!(7))), 7);
        assert!(validator.validate(&json!("7")).is_err());
    }

    #[test]
    fn test_issue_serializes_camel_case() {
        let issue = ValidationIssue::new("", "required", "missing foo")
            .with_param("missingProperty", "foo");
        let value = must(serde_json::to_value(&issue));
        assert_eq!(
            value,
            json!({
                "instancePath": "",
                "keyword": "required",
                "message": "missing foo",
                "params": { "missingProperty": "foo" }
            })
        );
    }
}
