//! The built-in wrapper interface.

use crate::value::TypeToken;

use super::{InterfaceDecl, ShapeDecl, WrapperInterface};

/// Untyped wrapper shapes installed by default.
///
/// | shape | caller | params | returns |
/// |-------|--------|--------|---------|
/// | `construct` | no | 0 | value |
/// | `run` | no | 0 | void |
/// | `action` | yes | 0 | void |
/// | `get` | yes | 0 | value |
/// | `set` | yes | 1 | void |
/// | `accept` | yes | 2..=7 | void |
/// | `apply` | yes | 1..=6 | value |
#[derive(Debug, Clone, Copy, Default)]
pub struct LambdaWrapper;

pub const MIN_CONSUMER_ARGS: usize = 2;
pub const MAX_CONSUMER_ARGS: usize = 7;
pub const MIN_FUNCTION_ARGS: usize = 1;
pub const MAX_FUNCTION_ARGS: usize = 6;

impl LambdaWrapper {
    #[must_use]
    pub fn token() -> TypeToken {
        TypeToken::of::<Self>()
    }
}

impl WrapperInterface for LambdaWrapper {
    fn declare() -> InterfaceDecl {
        let fixed = [
            ShapeDecl::generic("construct").returns_value(),
            ShapeDecl::generic("run"),
            ShapeDecl::generic("action").caller(),
            ShapeDecl::generic("get").caller().returns_value(),
            ShapeDecl::generic("set").caller().erased_params(1),
        ];
        let consumers = (MIN_CONSUMER_ARGS..=MAX_CONSUMER_ARGS)
            .map(|n| ShapeDecl::generic("accept").caller().erased_params(n));
        let functions = (MIN_FUNCTION_ARGS..=MAX_FUNCTION_ARGS)
            .map(|n| ShapeDecl::generic("apply").caller().erased_params(n).returns_value());

        fixed
            .into_iter()
            .chain(consumers)
            .chain(functions)
            .fold(InterfaceDecl::new::<Self>(), InterfaceDecl::shape)
    }
}
