//! Typed construction of executables from Rust closures and fn items.
//!
//! [`MethodFn`] covers callables taking a receiver (`Fn(&C, A0, ..) -> R`),
//! [`FunctionFn`] covers associated functions and constructors
//! (`Fn(A0, ..) -> R`). Both are implemented for arities 0..=7 and produce two
//! entry points from one callable:
//!
//! - an erased invoker taking `&[Value]`, used by the generic call surfaces;
//! - an [`ExactFn`] taking the argument tuple by value, recovered by exact
//!   bindings without any per-argument downcast.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::errors::{ReflectError, Result};
use crate::value::{TypeToken, Value};

/// Erased invoker: optional receiver plus positional arguments.
pub type DynInvoker =
    Arc<dyn Fn(Option<&Value>, &[Value]) -> Result<Option<Value>> + Send + Sync>;

/// Type-erased [`ExactFn`], downcast back at bind time.
pub type ExactEntry = Arc<dyn Any + Send + Sync>;

/// Typed entry point of an executable taking `A` (a tuple) and returning `R`.
pub struct ExactFn<A, R> {
    inner: Arc<dyn Fn(Option<&Value>, A) -> Result<R> + Send + Sync>,
    _marker: PhantomData<fn(A) -> R>,
}

impl<A, R> ExactFn<A, R> {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>, A) -> Result<R> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(f),
            _marker: PhantomData,
        }
    }

    /// Call with `caller` as receiver. Targets without a receiver ignore it.
    pub fn call(&self, caller: &Value, args: A) -> Result<R> {
        (self.inner)(Some(caller), args)
    }

    /// Call without a receiver; for constructors and associated functions.
    pub fn call_static(&self, args: A) -> Result<R> {
        (self.inner)(None, args)
    }
}

impl<A, R> Clone for ExactFn<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _marker: PhantomData,
        }
    }
}

impl<A, R> fmt::Debug for ExactFn<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExactFn<{}, {}>",
            std::any::type_name::<A>(),
            std::any::type_name::<R>()
        )
    }
}

/// Callable taking a receiver `&C` and the argument tuple `A`.
pub trait MethodFn<C, A, R>: Send + Sync + Sized + 'static {
    /// Parameter types, receiver excluded.
    fn param_types() -> Vec<TypeToken>;

    #[doc(hidden)]
    fn into_invokers(self, target: Arc<str>) -> (DynInvoker, ExactEntry);
}

/// Callable without a receiver taking the argument tuple `A`.
pub trait FunctionFn<A, R>: Send + Sync + Sized + 'static {
    fn param_types() -> Vec<TypeToken>;

    #[doc(hidden)]
    fn into_invokers(self, target: Arc<str>) -> (DynInvoker, ExactEntry);
}

pub(crate) fn check_arity(target: &str, args: &[Value], expected: usize) -> Result<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ReflectError::invocation(
            target,
            format!("expected {expected} arguments, got {}", args.len()),
        ))
    }
}

pub(crate) fn receiver<'a, C: Any>(target: &str, caller: Option<&'a Value>) -> Result<&'a C> {
    let caller =
        caller.ok_or_else(|| ReflectError::invocation(target, "missing caller for receiver"))?;
    caller.downcast_ref::<C>().ok_or_else(|| {
        ReflectError::invocation(
            target,
            format!(
                "caller is {}, expected {}",
                caller.type_token(),
                TypeToken::of::<C>()
            ),
        )
    })
}

pub(crate) fn argument<A: Any + Clone>(target: &str, args: &[Value], index: usize) -> Result<A> {
    let arg = args
        .get(index)
        .ok_or_else(|| ReflectError::invocation(target, format!("missing argument {index}")))?;
    arg.extract::<A>().ok_or_else(|| {
        ReflectError::invocation(
            target,
            format!(
                "argument {index} is {}, expected {}",
                arg.type_token(),
                TypeToken::of::<A>()
            ),
        )
    })
}

pub(crate) fn into_result<R: Any + Send + Sync>(result: R) -> Option<Value> {
    if TypeId::of::<R>() == TypeId::of::<()>() {
        None
    } else {
        Some(Value::new(result))
    }
}

macro_rules! impl_method_fn {
    ($count:expr $(, $arg:ident $val:ident $idx:tt)*) => {
        impl<F, C, R $(, $arg)*> MethodFn<C, ($($arg,)*), R> for F
        where
            F: Fn(&C $(, $arg)*) -> R + Send + Sync + 'static,
            C: Any + Send + Sync,
            R: Any + Send + Sync,
            $($arg: Any + Clone + Send + Sync,)*
        {
            fn param_types() -> Vec<TypeToken> {
                vec![$(TypeToken::of::<$arg>()),*]
            }

            #[allow(unused_variables)]
            fn into_invokers(self, target: Arc<str>) -> (DynInvoker, ExactEntry) {
                let f = Arc::new(self);
                let erased_f = Arc::clone(&f);
                let erased_target = Arc::clone(&target);
                let dynamic: DynInvoker = Arc::new(move |caller: Option<&Value>, args: &[Value]| {
                    check_arity(&erased_target, args, $count)?;
                    let recv = receiver::<C>(&erased_target, caller)?;
                    Ok(into_result((*erased_f)(
                        recv $(, argument::<$arg>(&erased_target, args, $idx)?)*
                    )))
                });
                let exact = ExactFn::<($($arg,)*), R>::new(
                    move |caller: Option<&Value>, ($($val,)*): ($($arg,)*)| {
                        let recv = receiver::<C>(&target, caller)?;
                        Ok((*f)(recv $(, $val)*))
                    },
                );
                (dynamic, Arc::new(exact))
            }
        }
    };
}

macro_rules! impl_function_fn {
    ($count:expr $(, $arg:ident $val:ident $idx:tt)*) => {
        impl<F, R $(, $arg)*> FunctionFn<($($arg,)*), R> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: Any + Send + Sync,
            $($arg: Any + Clone + Send + Sync,)*
        {
            fn param_types() -> Vec<TypeToken> {
                vec![$(TypeToken::of::<$arg>()),*]
            }

            #[allow(unused_variables)]
            fn into_invokers(self, target: Arc<str>) -> (DynInvoker, ExactEntry) {
                let f = Arc::new(self);
                let erased_f = Arc::clone(&f);
                let dynamic: DynInvoker = Arc::new(move |_caller: Option<&Value>, args: &[Value]| {
                    check_arity(&target, args, $count)?;
                    Ok(into_result((*erased_f)(
                        $(argument::<$arg>(&target, args, $idx)?),*
                    )))
                });
                let exact = ExactFn::<($($arg,)*), R>::new(
                    move |_caller: Option<&Value>, ($($val,)*): ($($arg,)*)| Ok((*f)($($val),*)),
                );
                (dynamic, Arc::new(exact))
            }
        }
    };
}

impl_method_fn!(0);
impl_method_fn!(1, A0 a0 0);
impl_method_fn!(2, A0 a0 0, A1 a1 1);
impl_method_fn!(3, A0 a0 0, A1 a1 1, A2 a2 2);
impl_method_fn!(4, A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3);
impl_method_fn!(5, A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4);
impl_method_fn!(6, A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4, A5 a5 5);
impl_method_fn!(7, A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4, A5 a5 5, A6 a6 6);

impl_function_fn!(0);
impl_function_fn!(1, A0 a0 0);
impl_function_fn!(2, A0 a0 0, A1 a1 1);
impl_function_fn!(3, A0 a0 0, A1 a1 1, A2 a2 2);
impl_function_fn!(4, A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3);
impl_function_fn!(5, A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4);
impl_function_fn!(6, A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4, A5 a5 5);
impl_function_fn!(7, A0 a0 0, A1 a1 1, A2 a2 2, A3 a3 3, A4 a4 4, A5 a5 5, A6 a6 6);
