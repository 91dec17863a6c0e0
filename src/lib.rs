//! Wrapper registry and dynamic binding.
//!
//! `shapebind` lets a caller invoke arbitrary methods, associated functions and
//! constructors through a small set of declared wrapper shapes (getter,
//! setter, n-ary consumer, n-ary function). A target is matched to a shape
//! once, by structural or exact signature; the resulting [`BoundCallable`]
//! then forwards every call without repeating the lookup.
//!
//! ```rust
//! use shapebind::{Executable, Registry, Value};
//!
//! struct Greeter;
//!
//! let registry = Registry::with_builtins();
//! let len = Executable::method("len", |_: &Greeter, text: String| text.len());
//! let bound = registry.bind_structural(&len).unwrap();
//!
//! let args = [Value::new(Greeter), Value::new("Hi".to_string())];
//! let out = registry.apply(&bound, &len, &args).unwrap().unwrap();
//! assert_eq!(out.extract::<usize>(), Some(2));
//! ```

// Export modules for library usage
pub mod binder;
pub mod config;
pub mod errors;
pub mod executable;
pub mod filter;
pub mod matcher;
pub mod registry;
pub mod shape;
pub mod signature;
pub mod testkit;
pub mod value;

// Re-export commonly used types
pub use crate::binder::{BoundCallable, LambdaView};
pub use crate::config::{load_config, RegistryConfig};
pub use crate::errors::{ErrorCode, ErrorKind, ReflectError, Result};
pub use crate::executable::{
    ExactFn, Executable, ExecutableKind, FunctionFn, MethodFn, TypeDescriptor, Visibility,
};
pub use crate::filter::{AnyExecutable, FilterKind, FilterPolicy, PublicOnly};
pub use crate::matcher::{ArgumentMatcher, MatcherRegistry};
pub use crate::registry::{global, install_global, BoundMethod, Registry};
pub use crate::shape::{
    InterfaceDecl, InvokerTag, LambdaWrapper, ShapeCatalog, ShapeDecl, ShapeMetadata,
    WrapperInterface,
};
pub use crate::signature::{BindMode, ExactSignature, MatcherKey, Signature, StructuralSignature};
pub use crate::value::{arg_types, ReturnKind, ReturnType, TypeKind, TypeToken, Value};
