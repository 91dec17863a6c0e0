//! Executables: described methods, associated functions and constructors.
//!
//! An [`Executable`] is the binding target. It records the metadata the
//! registry matches on (declaring type, kind, visibility, return and parameter
//! types, varargs) together with an erased invoker and, when it was built from
//! a typed closure, a typed entry point for exact bindings.
//!
//! [`Executable::invoke`] is the slow reflective path: every call re-validates
//! argument count, argument types and receiver before forwarding.

pub mod descriptor;
pub mod typed;

use std::fmt;
use std::sync::Arc;

use crate::errors::{ReflectError, Result};
use crate::value::{ReturnType, TypeToken, Value};

pub use descriptor::TypeDescriptor;
pub use typed::{DynInvoker, ExactEntry, ExactFn, FunctionFn, MethodFn};

/// What kind of callable an executable is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutableKind {
    /// Takes a receiver of the declaring type.
    Method,
    /// Associated function without a receiver.
    Function,
    /// Produces a new value of the declaring type.
    Constructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Crate,
    Private,
}

/// A callable target with the metadata needed to match it to wrapper shapes.
#[derive(Clone)]
pub struct Executable {
    name: Arc<str>,
    qualified: Arc<str>,
    declaring: TypeToken,
    kind: ExecutableKind,
    visibility: Visibility,
    returns: ReturnType,
    params: Arc<[TypeToken]>,
    varargs: bool,
    invoker: DynInvoker,
    exact: Option<ExactEntry>,
}

impl Executable {
    /// Method of `C` built from a closure or fn item taking `&C` first.
    ///
    /// ```rust
    /// use shapebind::{Executable, Value};
    ///
    /// struct Greeter;
    /// let len = Executable::method("len", |_: &Greeter, text: String| text.len());
    /// let out = len.invoke(Some(&Value::new(Greeter)), &[Value::new("Hi".to_string())]);
    /// assert_eq!(out.unwrap().unwrap().extract::<usize>(), Some(2));
    /// ```
    pub fn method<C, A, R, F>(name: impl Into<String>, f: F) -> Self
    where
        F: MethodFn<C, A, R>,
        C: 'static,
        R: 'static,
    {
        let declaring = TypeToken::of::<C>();
        let name: Arc<str> = name.into().into();
        let qualified: Arc<str> = format!("{declaring}::{name}").into();
        let (invoker, exact) = f.into_invokers(Arc::clone(&qualified));
        Self {
            name,
            qualified,
            declaring,
            kind: ExecutableKind::Method,
            visibility: Visibility::Public,
            returns: ReturnType::of::<R>(),
            params: F::param_types().into(),
            varargs: false,
            invoker,
            exact: Some(exact),
        }
    }

    /// Associated function of `declaring`; it takes no receiver.
    pub fn function<A, R, F>(declaring: TypeToken, name: impl Into<String>, f: F) -> Self
    where
        F: FunctionFn<A, R>,
        R: 'static,
    {
        let name: Arc<str> = name.into().into();
        let qualified: Arc<str> = format!("{declaring}::{name}").into();
        let (invoker, exact) = f.into_invokers(Arc::clone(&qualified));
        Self {
            name,
            qualified,
            declaring,
            kind: ExecutableKind::Function,
            visibility: Visibility::Public,
            returns: ReturnType::of::<R>(),
            params: F::param_types().into(),
            varargs: false,
            invoker,
            exact: Some(exact),
        }
    }

    /// Constructor of `T`. Its return type is `T` itself.
    pub fn constructor<T, A, F>(f: F) -> Self
    where
        F: FunctionFn<A, T>,
        T: 'static,
    {
        let declaring = TypeToken::of::<T>();
        let qualified: Arc<str> = format!("{declaring}::new").into();
        let (invoker, exact) = f.into_invokers(Arc::clone(&qualified));
        Self {
            name: Arc::from("new"),
            qualified,
            declaring,
            kind: ExecutableKind::Constructor,
            visibility: Visibility::Public,
            returns: ReturnType::Type(declaring),
            params: F::param_types().into(),
            varargs: false,
            invoker,
            exact: Some(exact),
        }
    }

    /// Untyped executable around a raw invoker. It has no typed entry point,
    /// so it can only be bound structurally.
    pub fn dynamic<F>(
        declaring: TypeToken,
        name: impl Into<String>,
        kind: ExecutableKind,
        returns: ReturnType,
        params: Vec<TypeToken>,
        invoker: F,
    ) -> Self
    where
        F: Fn(Option<&Value>, &[Value]) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        let name: Arc<str> = name.into().into();
        let qualified: Arc<str> = format!("{declaring}::{name}").into();
        let returns = match kind {
            ExecutableKind::Constructor => ReturnType::Type(declaring),
            _ => returns,
        };
        Self {
            name,
            qualified,
            declaring,
            kind,
            visibility: Visibility::Public,
            returns,
            params: params.into(),
            varargs: false,
            invoker: Arc::new(invoker),
            exact: None,
        }
    }

    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    /// Mark the trailing parameter as variable-length. It stays a single
    /// array-typed parameter (`Vec<Value>`) for matching purposes.
    #[must_use]
    pub fn varargs(mut self) -> Self {
        self.varargs = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Declaring::name`, used in diagnostics.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified
    }

    #[must_use]
    pub fn declaring_type(&self) -> TypeToken {
        self.declaring
    }

    #[must_use]
    pub fn kind(&self) -> ExecutableKind {
        self.kind
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    #[must_use]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    #[must_use]
    pub fn return_type(&self) -> ReturnType {
        self.returns
    }

    #[must_use]
    pub fn param_types(&self) -> &[TypeToken] {
        &self.params
    }

    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_varargs(&self) -> bool {
        self.varargs
    }

    /// Only methods take a receiver.
    #[must_use]
    pub fn has_receiver(&self) -> bool {
        self.kind == ExecutableKind::Method
    }

    #[must_use]
    pub fn has_typed_entry(&self) -> bool {
        self.exact.is_some()
    }

    /// Reflective call. Validates argument count, argument types and the
    /// receiver on every call, then forwards to the target.
    pub fn invoke(&self, caller: Option<&Value>, args: &[Value]) -> Result<Option<Value>> {
        log::trace!("reflective invoke of {} with {} args", self.qualified, args.len());
        if args.len() != self.params.len() {
            return Err(ReflectError::invocation(
                self.qualified_name(),
                format!("expected {} arguments, got {}", self.params.len(), args.len()),
            ));
        }
        let mismatch = args
            .iter()
            .zip(self.params.iter())
            .enumerate()
            .find(|(_, (arg, param))| !arg.conforms_to(param));
        if let Some((index, (arg, param))) = mismatch {
            return Err(ReflectError::invocation(
                self.qualified_name(),
                format!("argument {index} is {}, expected {param}", arg.type_token()),
            ));
        }
        if self.has_receiver() {
            match caller {
                None => {
                    return Err(ReflectError::invocation(
                        self.qualified_name(),
                        "missing caller for receiver",
                    ))
                }
                Some(c) if !c.conforms_to(&self.declaring) => {
                    return Err(ReflectError::invocation(
                        self.qualified_name(),
                        format!("caller is {}, expected {}", c.type_token(), self.declaring),
                    ))
                }
                Some(_) => {}
            }
        }
        (self.invoker)(caller, args)
    }

    pub(crate) fn invoker(&self) -> &DynInvoker {
        &self.invoker
    }

    pub(crate) fn exact_entry(&self) -> Option<&ExactEntry> {
        self.exact.as_ref()
    }
}

impl fmt::Debug for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executable")
            .field("name", &self.qualified)
            .field("kind", &self.kind)
            .field("visibility", &self.visibility)
            .field("returns", &self.returns)
            .field("params", &self.params)
            .field("varargs", &self.varargs)
            .field("typed", &self.exact.is_some())
            .finish()
    }
}

impl fmt::Display for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}({params}) -> {}", self.qualified, self.returns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Account {
        owner: Mutex<String>,
    }

    impl Account {
        fn rename(&self, owner: String) {
            *self.owner.lock().unwrap() = owner;
        }
    }

    #[test]
    fn test_method_metadata() {
        let exec = Executable::method("rename", Account::rename);
        assert_eq!(exec.name(), "rename");
        assert_eq!(exec.qualified_name(), "Account::rename");
        assert_eq!(exec.kind(), ExecutableKind::Method);
        assert!(exec.has_receiver());
        assert!(exec.return_type().is_void());
        assert_eq!(exec.param_types(), &[TypeToken::of::<String>()]);
        assert!(exec.has_typed_entry());
        assert_eq!(exec.to_string(), "Account::rename(String) -> ()");
    }

    #[test]
    fn test_reflective_invoke_mutates_shared_receiver() {
        let exec = Executable::method("rename", Account::rename);
        let account = Value::new(Account::default());
        let out = exec
            .invoke(Some(&account), &[Value::new(String::from("ada"))])
            .unwrap();
        assert!(out.is_none());
        let owner = account.downcast_ref::<Account>().unwrap().owner.lock().unwrap().clone();
        assert_eq!(owner, "ada");
    }

    #[test]
    fn test_reflective_invoke_rejects_wrong_receiver() {
        let exec = Executable::method("rename", Account::rename);
        let err = exec
            .invoke(Some(&Value::new(5_u8)), &[Value::new(String::new())])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invocation of Account::rename failed: caller is u8, expected Account"
        );
    }

    #[test]
    fn test_reflective_invoke_rejects_wrong_argument_type() {
        let exec = Executable::method("rename", Account::rename);
        let err = exec
            .invoke(Some(&Value::new(Account::default())), &[Value::new(1_i32)])
            .unwrap_err();
        assert!(err.to_string().contains("argument 0 is i32, expected String"));
    }

    #[test]
    fn test_constructor_returns_declaring_type() {
        let exec = Executable::constructor(Account::default);
        assert_eq!(exec.kind(), ExecutableKind::Constructor);
        assert_eq!(exec.return_type(), ReturnType::Type(TypeToken::of::<Account>()));
        assert!(!exec.has_receiver());
        let made = exec.invoke(None, &[]).unwrap().unwrap();
        assert!(made.is::<Account>());
    }

    #[test]
    fn test_dynamic_executable_has_no_typed_entry() {
        let exec = Executable::dynamic(
            TypeToken::of::<Account>(),
            "ping",
            ExecutableKind::Function,
            ReturnType::of::<u32>(),
            vec![],
            |_, _| Ok(Some(Value::new(7_u32))),
        )
        .private();
        assert!(!exec.has_typed_entry());
        assert!(!exec.is_public());
        let out = exec.invoke(None, &[]).unwrap().unwrap();
        assert_eq!(out.extract::<u32>(), Some(7));
    }

    #[test]
    fn test_reflective_invoke_accepts_any_receiver_for_erased_method() {
        let type_of = Executable::method("type_of", |v: &Value| v.type_name().to_string());
        assert!(type_of.declaring_type().is_erased());
        let out = type_of
            .invoke(Some(&Value::new(7_u32)), &[])
            .unwrap()
            .unwrap();
        assert_eq!(out.extract::<String>(), Some("u32".to_string()));
    }
}
