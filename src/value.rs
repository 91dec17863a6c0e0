//! Runtime type identity and dynamically typed values.
//!
//! [`TypeToken`] identifies a concrete Rust type and is the unit of comparison
//! for exact signatures. [`Value`] is the dynamically typed handle passed
//! through generic call surfaces: receivers, untyped arguments and results.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a concrete type.
///
/// Equality and hashing use the [`TypeId`] only; the name is carried for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeToken {
    id: TypeId,
    name: &'static str,
}

impl TypeToken {
    /// Token for `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Last path segment of the type name, generics included. Names that do
    /// not start with a path (tuples, slices, references) are returned whole.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let starts_with_path = self
            .name
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_');
        if !starts_with_path {
            return self.name;
        }
        let head = self.name.split('<').next().unwrap_or(self.name);
        match head.rfind("::") {
            Some(idx) => &self.name[idx + 2..],
            None => self.name,
        }
    }

    /// True for the token of [`Value`], the erased "any object" type.
    #[must_use]
    pub fn is_erased(&self) -> bool {
        self.id == TypeId::of::<Value>()
    }
}

impl PartialEq for TypeToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeToken {}

impl Hash for TypeToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeToken({})", self.name)
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Whether a callable produces a value. Used by structural signatures, where
/// every non-void return is interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    Void,
    Value,
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(f, "void"),
            Self::Value => write!(f, "value"),
        }
    }
}

/// Exact return type of a callable. A Rust return type of `()` is void.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Void,
    Type(TypeToken),
}

impl ReturnType {
    /// Return type for a Rust function returning `R`.
    #[must_use]
    pub fn of<R: 'static>() -> Self {
        if TypeId::of::<R>() == TypeId::of::<()>() {
            Self::Void
        } else {
            Self::Type(TypeToken::of::<R>())
        }
    }

    #[must_use]
    pub fn kind(&self) -> ReturnKind {
        match self {
            Self::Void => ReturnKind::Void,
            Self::Type(_) => ReturnKind::Value,
        }
    }

    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }
}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(f, "()"),
            Self::Type(token) => write!(f, "{}", token),
        }
    }
}

/// Kind of a described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A wrapper interface: declares shapes, has no behaviour of its own.
    Interface,
    /// A concrete type with executables.
    Class,
}

/// Shared, dynamically typed value.
///
/// Cloning is cheap and aliases the same object, so a receiver passed as
/// `&Value` observes mutations made through interior mutability.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    token: TypeToken,
}

impl Value {
    /// Wrap `value`. Wrapping a `Value` returns it unchanged.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        let boxed: Box<dyn Any + Send + Sync> = Box::new(value);
        match boxed.downcast::<Value>() {
            Ok(already) => *already,
            Err(boxed) => Self {
                inner: Arc::from(boxed),
                token: TypeToken::of::<T>(),
            },
        }
    }

    /// Runtime type of the wrapped object.
    #[must_use]
    pub fn type_token(&self) -> TypeToken {
        self.token
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.token.name()
    }

    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the wrapped object as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        if let Some(same) = (self as &dyn Any).downcast_ref::<T>() {
            return Some(same);
        }
        self.inner.downcast_ref::<T>()
    }

    /// Clone the wrapped object out as `T`. Asking for `Value` yields the
    /// handle itself.
    #[must_use]
    pub fn extract<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// True when both handles alias the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether this value can be passed where `token` is expected.
    #[must_use]
    pub fn conforms_to(&self, token: &TypeToken) -> bool {
        token.is_erased() || self.token == *token
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value<{}>", self.token)
    }
}

/// Runtime types of `args`, in order.
#[must_use]
pub fn arg_types(args: &[Value]) -> Vec<TypeToken> {
    args.iter().map(Value::type_token).collect()
}
