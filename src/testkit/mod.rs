//! Testing infrastructure for shapebind.
//!
//! - **Assertion macros**: `Result` and [`ReflectError`](crate::ReflectError)
//!   kind assertions, exported at the crate root via `#[macro_export]`
//! - **Fixtures**: a sample [`Account`] type with a full
//!   [`TypeDescriptor`](crate::TypeDescriptor) and two small wrapper
//!   interfaces, shared by unit tests, integration tests and benches
//!
//! # Quick Start
//!
//! ```rust
//! use shapebind::testkit::{account_descriptor, Account};
//! use shapebind::{assert_result_ok, BindMode, Registry, TypeToken, Value};
//!
//! let registry = Registry::with_builtins();
//! let bound = assert_result_ok!(registry.bind_method(
//!     &account_descriptor(),
//!     "rename",
//!     &[TypeToken::of::<String>()],
//!     BindMode::Structural,
//! ));
//! let account = Value::new(Account::new("ada", 0));
//! bound.invoke(Some(&account), &[Value::new("bo".to_string())]).unwrap();
//! assert_eq!(account.downcast_ref::<Account>().unwrap().owner(), "bo");
//! ```

pub mod assertions;
pub mod fixtures;

pub use fixtures::{account_descriptor, Account, Measure, Pipe};
