//! Binding targets to wrapper shapes.
//!
//! [`bind`] runs the filter check, resolves the shape and verifies the link
//! once. The resulting [`BoundCallable`] forwards straight to the target's
//! invoker; nothing about the signature or the catalog is recomputed per call.

pub mod lambda;

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use tracing::debug_span;

use crate::errors::{ReflectError, Result};
use crate::executable::{DynInvoker, ExactFn, Executable};
use crate::filter::{self, FilterPolicy};
use crate::shape::{LambdaWrapper, ShapeCatalog, ShapeMetadata};
use crate::signature::BindMode;
use crate::value::{TypeToken, Value};

pub use lambda::LambdaView;

/// Immutable forwarding closure linking a target to a wrapper shape.
///
/// Cloning is cheap; clones share the same link.
#[derive(Clone)]
pub struct BoundCallable {
    inner: Arc<Link>,
}

struct Link {
    target: Executable,
    shape: Arc<ShapeMetadata>,
    mode: BindMode,
    forward: DynInvoker,
}

impl BoundCallable {
    #[must_use]
    pub fn target(&self) -> &Executable {
        &self.inner.target
    }

    #[must_use]
    pub fn shape(&self) -> &Arc<ShapeMetadata> {
        &self.inner.shape
    }

    /// Wrapper interface the chosen shape is declared on.
    #[must_use]
    pub fn interface(&self) -> TypeToken {
        self.inner.shape.interface()
    }

    #[must_use]
    pub fn mode(&self) -> BindMode {
        self.inner.mode
    }

    /// Forward to the target. `caller` is ignored by targets without a
    /// receiver; a `None` result means the target returns nothing.
    pub fn invoke(&self, caller: Option<&Value>, args: &[Value]) -> Result<Option<Value>> {
        (self.inner.forward)(caller, args)
    }

    /// View implementing the built-in [`LambdaWrapper`] interface.
    pub fn lambda(&self) -> Result<LambdaView<'_>> {
        if self.interface() == LambdaWrapper::token() {
            Ok(LambdaView::new(self))
        } else {
            Err(ReflectError::binding(
                self.inner.target.qualified_name(),
                self.inner.shape.to_string(),
                "bound shape is not declared on LambdaWrapper",
            ))
        }
    }

    /// Typed entry point of an exactly bound target.
    ///
    /// ```rust
    /// use shapebind::{Executable, InterfaceDecl, Registry, ShapeDecl, Value};
    ///
    /// struct Text;
    /// struct Measure;
    ///
    /// let registry = Registry::new();
    /// registry
    ///     .add_interface(InterfaceDecl::new::<Measure>().shape(
    ///         ShapeDecl::exact("measure").caller().param::<String>().returns::<usize>(),
    ///     ))
    ///     .unwrap();
    /// let len = Executable::method("len", |_: &Text, s: String| s.len());
    /// let bound = registry.bind_exact(&len).unwrap();
    /// let typed = bound.exact::<(String,), usize>().unwrap();
    /// assert_eq!(typed.call(&Value::new(Text), ("four".into(),)).unwrap(), 4);
    /// ```
    pub fn exact<A: 'static, R: 'static>(&self) -> Result<ExactFn<A, R>> {
        let link = &self.inner;
        if link.mode != BindMode::Exact {
            return Err(ReflectError::binding(
                link.target.qualified_name(),
                link.shape.to_string(),
                "typed entry points need an exact binding",
            ));
        }
        link.target
            .exact_entry()
            .and_then(|entry| entry.downcast_ref::<ExactFn<A, R>>())
            .cloned()
            .ok_or_else(|| {
                ReflectError::binding(
                    link.target.qualified_name(),
                    link.shape.to_string(),
                    format!(
                        "typed entry point does not take {} and return {}",
                        type_name::<A>(),
                        type_name::<R>()
                    ),
                )
            })
    }
}

impl fmt::Debug for BoundCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundCallable")
            .field("target", &self.inner.target.qualified_name())
            .field("shape", &self.inner.shape.to_string())
            .field("mode", &self.inner.mode)
            .finish()
    }
}

/// Resolve and link `target`. See the module docs for the steps.
pub fn bind(
    catalog: &ShapeCatalog,
    policy: &dyn FilterPolicy,
    target: &Executable,
    mode: BindMode,
    scope: Option<TypeToken>,
) -> Result<BoundCallable> {
    let _span = debug_span!("bind", target = %target.qualified_name(), %mode).entered();
    let shape = resolve(catalog, policy, target, mode, scope)?;
    let bound = link(target, shape, mode);
    log::debug!(
        "bound {} to {} ({mode})",
        target.qualified_name(),
        bound.shape()
    );
    Ok(bound)
}

/// Filter check, catalog lookup and link verification, without linking.
pub fn resolve(
    catalog: &ShapeCatalog,
    policy: &dyn FilterPolicy,
    target: &Executable,
    mode: BindMode,
    scope: Option<TypeToken>,
) -> Result<Arc<ShapeMetadata>> {
    filter::check(policy, target)?;
    let shape = catalog.lookup(target, mode, scope)?;
    verify(target, &shape, mode)?;
    Ok(shape)
}

/// Check once that `target` can be forwarded through `shape`.
pub fn verify(target: &Executable, shape: &ShapeMetadata, mode: BindMode) -> Result<()> {
    let fail = |reason: String| {
        Err(ReflectError::binding(
            target.qualified_name(),
            shape.to_string(),
            reason,
        ))
    };

    if target.has_receiver() && !shape.has_caller() {
        return fail("shape has no caller slot for the receiver".into());
    }
    if target.return_type().kind() != shape.returns().kind() {
        return fail(format!(
            "target returns {}, shape returns {}",
            target.return_type(),
            shape.returns()
        ));
    }
    if target.param_count() != shape.arity() {
        return fail(format!(
            "target takes {} parameters, shape takes {}",
            target.param_count(),
            shape.arity()
        ));
    }
    if target.is_varargs() {
        let array = TypeToken::of::<Vec<Value>>();
        match target.param_types().last() {
            Some(last) if *last == array => {}
            Some(last) => {
                return fail(format!(
                    "variable-length parameter must be {array}, found {last}"
                ))
            }
            None => return fail("variable-length target declares no parameters".into()),
        }
    }
    if mode == BindMode::Exact {
        if shape.is_varargs() != target.is_varargs() {
            return fail("varargs shape and target disagree".into());
        }
        if !target.has_typed_entry() {
            return fail("target has no typed entry point".into());
        }
    }
    Ok(())
}

fn link(target: &Executable, shape: Arc<ShapeMetadata>, mode: BindMode) -> BoundCallable {
    let invoker = Arc::clone(target.invoker());
    let forward: DynInvoker = if target.has_receiver() {
        invoker
    } else {
        Arc::new(move |_caller: Option<&Value>, args: &[Value]| invoker(None, args))
    };
    BoundCallable {
        inner: Arc::new(Link {
            target: target.clone(),
            shape,
            mode,
            forward,
        }),
    }
}
