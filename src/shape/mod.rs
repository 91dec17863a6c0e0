//! Wrapper shape declarations and their catalogued metadata.
//!
//! A wrapper interface is a marker type that declares a set of generic call
//! shapes (getter, setter, n-ary consumer, ...). Declarations are plain data:
//! the invoker tags are supplied by whoever builds the declaration, and the
//! catalog only checks that each shape carries exactly one.
//!
//! The first declared parameter of every shape is the caller slot. A shape
//! declared with no parameters at all has no caller slot.

pub mod builtin;
pub mod catalog;

use std::fmt;
use std::sync::Arc;

use crate::errors::{ReflectError, Result};
use crate::signature::{ExactSignature, StructuralSignature};
use crate::value::{ReturnType, TypeKind, TypeToken, Value};

pub use builtin::LambdaWrapper;
pub use catalog::ShapeCatalog;

/// Capability marker deciding which catalog a shape lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokerTag {
    /// Registered under its structural signature.
    Generic,
    /// Registered under its exact signature.
    Exact,
}

/// Declaration of one wrapper method.
#[derive(Debug, Clone)]
pub struct ShapeDecl {
    name: String,
    tags: Vec<InvokerTag>,
    returns: ReturnType,
    params: Vec<TypeToken>,
    varargs: bool,
    declared_on: Option<TypeToken>,
    misplaced_caller: bool,
}

impl ShapeDecl {
    /// Shape with no tag at all. Registering it fails.
    #[must_use]
    pub fn untagged(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            returns: ReturnType::Void,
            params: Vec::new(),
            varargs: false,
            declared_on: None,
            misplaced_caller: false,
        }
    }

    #[must_use]
    pub fn generic(name: impl Into<String>) -> Self {
        Self::untagged(name).tag(InvokerTag::Generic)
    }

    #[must_use]
    pub fn exact(name: impl Into<String>) -> Self {
        Self::untagged(name).tag(InvokerTag::Exact)
    }

    #[must_use]
    pub fn tag(mut self, tag: InvokerTag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Declare the caller slot. Must come before any other parameter;
    /// registering a shape that declares it later fails.
    #[must_use]
    pub fn caller(mut self) -> Self {
        self.misplaced_caller |= !self.params.is_empty();
        self.params.push(TypeToken::of::<Value>());
        self
    }

    #[must_use]
    pub fn param<T: 'static>(mut self) -> Self {
        self.params.push(TypeToken::of::<T>());
        self
    }

    /// Append `count` untyped parameters.
    #[must_use]
    pub fn erased_params(mut self, count: usize) -> Self {
        self.params
            .extend(std::iter::repeat(TypeToken::of::<Value>()).take(count));
        self
    }

    /// Return type `R`; `()` declares a void shape.
    #[must_use]
    pub fn returns<R: 'static>(mut self) -> Self {
        self.returns = ReturnType::of::<R>();
        self
    }

    /// Untyped, non-void return.
    #[must_use]
    pub fn returns_value(self) -> Self {
        self.returns::<Value>()
    }

    /// The trailing parameter is variable-length.
    #[must_use]
    pub fn varargs(mut self) -> Self {
        self.varargs = true;
        self
    }

    #[must_use]
    pub fn declared_on(mut self, interface: TypeToken) -> Self {
        self.declared_on = Some(interface);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn tags(&self) -> &[InvokerTag] {
        &self.tags
    }

    #[must_use]
    pub fn declaring_interface(&self) -> Option<TypeToken> {
        self.declared_on
    }
}

/// Declaration of a wrapper interface and its shapes.
#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    token: TypeToken,
    kind: TypeKind,
    shapes: Vec<ShapeDecl>,
}

impl InterfaceDecl {
    #[must_use]
    pub fn new<W: 'static>() -> Self {
        Self::of(TypeToken::of::<W>())
    }

    #[must_use]
    pub fn of(token: TypeToken) -> Self {
        Self {
            token,
            kind: TypeKind::Interface,
            shapes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: TypeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Add a shape; it is declared on this interface.
    #[must_use]
    pub fn shape(mut self, shape: ShapeDecl) -> Self {
        self.shapes.push(shape.declared_on(self.token));
        self
    }

    #[must_use]
    pub fn token(&self) -> TypeToken {
        self.token
    }

    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[must_use]
    pub fn shapes(&self) -> &[ShapeDecl] {
        &self.shapes
    }

    pub(crate) fn into_shapes(self) -> Vec<ShapeDecl> {
        self.shapes
    }
}

/// Implemented by marker types that declare a wrapper interface.
///
/// ```rust
/// use shapebind::{InterfaceDecl, ShapeDecl, WrapperInterface};
///
/// struct Parser;
///
/// impl WrapperInterface for Parser {
///     fn declare() -> InterfaceDecl {
///         InterfaceDecl::new::<Self>()
///             .shape(ShapeDecl::exact("parse").caller().param::<String>().returns::<i64>())
///     }
/// }
/// assert_eq!(Parser::declare().shapes().len(), 1);
/// ```
pub trait WrapperInterface: 'static {
    fn declare() -> InterfaceDecl;
}

/// Immutable description of one catalogued wrapper shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMetadata {
    interface: TypeToken,
    method: Arc<str>,
    tag: InvokerTag,
    returns: ReturnType,
    params: Vec<TypeToken>,
    varargs: bool,
}

impl ShapeMetadata {
    /// Validate a declaration and freeze it.
    pub fn from_decl(decl: &ShapeDecl) -> Result<Self> {
        let interface = decl.declared_on.ok_or_else(|| {
            ReflectError::declaration("<none>", decl.name.as_str(), "shape is not declared on an interface")
        })?;
        let tag = match decl.tags.as_slice() {
            [tag] => *tag,
            other => {
                return Err(ReflectError::untagged(
                    interface.to_string(),
                    decl.name.as_str(),
                    other.len(),
                ))
            }
        };
        if decl.misplaced_caller {
            return Err(ReflectError::declaration(
                interface.to_string(),
                decl.name.as_str(),
                "caller slot must be the first parameter",
            ));
        }
        if decl.varargs && decl.params.len() < 2 {
            return Err(ReflectError::declaration(
                interface.to_string(),
                decl.name.as_str(),
                "varargs shape needs a trailing parameter after the caller",
            ));
        }
        Ok(Self {
            interface,
            method: Arc::from(decl.name.as_str()),
            tag,
            returns: decl.returns,
            params: decl.params.clone(),
            varargs: decl.varargs,
        })
    }

    #[must_use]
    pub fn interface(&self) -> TypeToken {
        self.interface
    }

    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn tag(&self) -> InvokerTag {
        self.tag
    }

    #[must_use]
    pub fn returns(&self) -> ReturnType {
        self.returns
    }

    /// Declared parameters, caller slot included.
    #[must_use]
    pub fn declared_params(&self) -> &[TypeToken] {
        &self.params
    }

    /// Parameters after the caller slot.
    #[must_use]
    pub fn params(&self) -> &[TypeToken] {
        self.params.get(1..).unwrap_or_default()
    }

    #[must_use]
    pub fn has_caller(&self) -> bool {
        !self.params.is_empty()
    }

    /// Parameter count, caller excluded.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len().saturating_sub(1)
    }

    #[must_use]
    pub fn is_varargs(&self) -> bool {
        self.varargs
    }

    #[must_use]
    pub fn structural(&self) -> StructuralSignature {
        StructuralSignature::from_declared(self.returns.kind(), self.params.len())
    }

    #[must_use]
    pub fn exact(&self) -> ExactSignature {
        ExactSignature::from_declared(self.interface, self.returns, &self.params)
    }
}

impl fmt::Display for ShapeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}/{}", self.interface, self.method, self.arity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorCode, ErrorKind};
    use crate::value::ReturnKind;

    struct Codec;

    #[test]
    fn test_interface_decl_scopes_shapes() {
        let decl = InterfaceDecl::new::<Codec>()
            .shape(ShapeDecl::generic("get").caller().returns_value())
            .shape(ShapeDecl::exact("parse").caller().param::<String>().returns::<i64>());
        assert_eq!(decl.shapes().len(), 2);
        assert!(decl
            .shapes()
            .iter()
            .all(|s| s.declaring_interface() == Some(TypeToken::of::<Codec>())));
    }

    #[test]
    fn test_metadata_excludes_caller_from_arity() {
        let decl = ShapeDecl::generic("set")
            .caller()
            .erased_params(1)
            .declared_on(TypeToken::of::<Codec>());
        let meta = ShapeMetadata::from_decl(&decl).unwrap();
        assert!(meta.has_caller());
        assert_eq!(meta.arity(), 1);
        assert_eq!(meta.structural(), StructuralSignature::new(ReturnKind::Void, 1));
        assert_eq!(meta.to_string(), "Codec::set/1");
    }

    #[test]
    fn test_shape_without_params_has_no_caller() {
        let decl = ShapeDecl::generic("construct")
            .returns_value()
            .declared_on(TypeToken::of::<Codec>());
        let meta = ShapeMetadata::from_decl(&decl).unwrap();
        assert!(!meta.has_caller());
        assert!(meta.params().is_empty());
        assert_eq!(
            meta.structural(),
            StructuralSignature::without_caller(ReturnKind::Value)
        );
    }

    #[test]
    fn test_double_tag_is_rejected() {
        let decl = ShapeDecl::generic("both")
            .tag(InvokerTag::Exact)
            .caller()
            .declared_on(TypeToken::of::<Codec>());
        let err = ShapeMetadata::from_decl(&decl).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShapeDeclaration);
        assert_eq!(err.code(), ErrorCode::DECL_TAG);
        assert!(err.to_string().ends_with("found 2"));
    }

    #[test]
    fn test_undeclared_shape_is_rejected() {
        let err = ShapeMetadata::from_decl(&ShapeDecl::generic("loose").caller()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DECL_GENERIC);
    }

    #[test]
    fn test_caller_after_params_is_rejected() {
        let decl = ShapeDecl::generic("late")
            .param::<String>()
            .caller()
            .declared_on(TypeToken::of::<Codec>());
        let err = ShapeMetadata::from_decl(&decl).unwrap_err();
        assert_eq!(err.code(), ErrorCode::DECL_GENERIC);
        assert!(err.to_string().contains("caller slot must be the first parameter"));

        let twice = ShapeDecl::generic("twice")
            .caller()
            .caller()
            .declared_on(TypeToken::of::<Codec>());
        assert!(ShapeMetadata::from_decl(&twice).is_err());
    }
}
