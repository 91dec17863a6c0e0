//! Assertion macros for registry, binding and invocation results.
//!
//! - [`crate::assert_result_ok!`] - Assert Result is Ok and extract value
//! - [`crate::assert_result_err!`] - Assert Result is Err and extract error
//! - [`crate::assert_contains_error!`] - Assert error message contains pattern
//! - [`crate::assert_error_kind!`] - Assert a `ReflectError` has a given kind
//!
//! # Example
//!
//! ```rust
//! use shapebind::{assert_error_kind, assert_result_ok, ErrorKind, Executable, Registry};
//!
//! struct Hidden;
//! let registry = Registry::with_builtins();
//! let target = Executable::method("peek", |_: &Hidden| 1_u8).private();
//! assert_error_kind!(registry.bind_structural(&target), ErrorKind::AccessDenied);
//!
//! let shown = Executable::method("peek", |_: &Hidden| 1_u8);
//! let bound = assert_result_ok!(registry.bind_structural(&shown));
//! assert_eq!(bound.shape().method_name(), "get");
//! ```

/// Assert that a Result is Ok and extract the value.
///
/// If the Result is Err, panics with a message showing the error.
#[macro_export]
macro_rules! assert_result_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!(
                "Expected Ok, got Err: {:?}\n  at {}:{}:{}",
                e,
                file!(),
                line!(),
                column!()
            ),
        }
    };
    ($result:expr, $($msg:tt)+) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!(
                "{}: Expected Ok, got Err: {:?}\n  at {}:{}:{}",
                format!($($msg)+),
                e,
                file!(),
                line!(),
                column!()
            ),
        }
    };
}

/// Assert that a Result is Err and extract the error.
///
/// If the Result is Ok, panics with a message showing the value.
#[macro_export]
macro_rules! assert_result_err {
    ($result:expr) => {
        match $result {
            Ok(value) => panic!(
                "Expected Err, got Ok: {:?}\n  at {}:{}:{}",
                value,
                file!(),
                line!(),
                column!()
            ),
            Err(e) => e,
        }
    };
    ($result:expr, $($msg:tt)+) => {
        match $result {
            Ok(value) => panic!(
                "{}: Expected Err, got Ok: {:?}\n  at {}:{}:{}",
                format!($($msg)+),
                value,
                file!(),
                line!(),
                column!()
            ),
            Err(e) => e,
        }
    };
}

/// Assert that an error message contains a specific pattern.
///
/// This macro first asserts the Result is Err, then checks if the
/// error's Display representation contains the pattern.
#[macro_export]
macro_rules! assert_contains_error {
    ($result:expr, $pattern:expr) => {{
        let err = $crate::assert_result_err!($result);
        let err_str = err.to_string();
        assert!(
            err_str.contains($pattern),
            "Error '{}' does not contain '{}'\n  at {}:{}:{}",
            err_str,
            $pattern,
            file!(),
            line!(),
            column!()
        );
        err
    }};
}

/// Assert that a `Result<_, ReflectError>` failed with the given
/// [`ErrorKind`](crate::ErrorKind). Returns the error.
#[macro_export]
macro_rules! assert_error_kind {
    ($result:expr, $kind:expr) => {{
        let err = $crate::assert_result_err!($result);
        assert_eq!(
            err.kind(),
            $kind,
            "Unexpected error kind for '{}'\n  at {}:{}:{}",
            err,
            file!(),
            line!(),
            column!()
        );
        err
    }};
}
