// Test utility module for shapebind integration tests
#![allow(dead_code)]

use shapebind::{Executable, Registry, TypeToken};

/// Initialise logging once per test binary. Honours `RUST_LOG`.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Registry with built-in shapes and logging initialised.
pub fn registry() -> Registry {
    init_logging();
    Registry::with_builtins()
}

/// Find a method of the sample `Account` type by name and parameter types.
pub fn account_method(name: &str, params: &[TypeToken]) -> Executable {
    let descriptor = shapebind::testkit::account_descriptor();
    match descriptor.find_method(name, params) {
        Ok(found) => (*found).clone(),
        Err(e) => panic!("fixture method missing: {e}"),
    }
}
