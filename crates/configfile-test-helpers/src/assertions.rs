//! Assertion macros for store results.

/// Assert that a result failed with the given [`configfile::ErrorKind`].
///
/// # Example
///
/// ```rust
/// use configfile::{ConfigStoreError, ErrorKind};
/// use configfile_test_helpers::assert_error_kind;
///
/// let result: Result<(), ConfigStoreError> = Err(ConfigStoreError::io(
///     "/tmp/config.json",
///     std::io::Error::other("boom"),
/// ));
/// assert_error_kind!(result, ErrorKind::Other);
/// ```
#[macro_export]
macro_rules! assert_error_kind {
    ($result:expr, $kind:expr $(,)?) => {
        match $result {
            Ok(value) => panic!(
                "assertion failed: expected {:?} error, got Ok({:?})",
                $kind, value
            ),
            Err(err) => {
                if err.kind() != $kind {
                    panic!(
                        "assertion failed: expected {:?} error, got {:?}: {}",
                        $kind,
                        err.kind(),
                        err
                    );
                }
            }
        }
    };
}

/// Assert that a write-path result reports `changed: true`.
#[macro_export]
macro_rules! assert_changed {
    ($result:expr $(,)?) => {
        match $result {
            Ok(info) => {
                if !info.changed {
                    panic!("assertion failed: expected the file to change");
                }
            }
            Err(err) => panic!("assertion failed: write failed: {}", err),
        }
    };
}

/// Assert that a write-path result reports `changed: false`.
#[macro_export]
macro_rules! assert_unchanged {
    ($result:expr $(,)?) => {
        match $result {
            Ok(info) => {
                if info.changed {
                    panic!("assertion failed: expected the file to stay unchanged");
                }
            }
            Err(err) => panic!("assertion failed: write failed: {}", err),
        }
    };
}
