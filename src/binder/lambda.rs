//! Direct call surface of callables bound to [`LambdaWrapper`] shapes.
//!
//! Each method corresponds to one built-in shape. Calling a method that does
//! not match the shape chosen at bind time fails with an invocation error
//! instead of reaching the target.
//!
//! [`LambdaWrapper`]: crate::shape::LambdaWrapper

use crate::errors::{ReflectError, Result};
use crate::shape::builtin::{
    MAX_CONSUMER_ARGS, MAX_FUNCTION_ARGS, MIN_CONSUMER_ARGS, MIN_FUNCTION_ARGS,
};
use crate::value::Value;

use super::BoundCallable;

/// Borrowed view of a [`BoundCallable`] bound to a `LambdaWrapper` shape.
#[derive(Debug, Clone, Copy)]
pub struct LambdaView<'a> {
    bound: &'a BoundCallable,
}

impl<'a> LambdaView<'a> {
    pub(super) fn new(bound: &'a BoundCallable) -> Self {
        Self { bound }
    }

    /// Zero-argument factory.
    pub fn construct(&self) -> Result<Value> {
        self.expect("construct", false, 0)?;
        self.produce("construct", None, &[])
    }

    pub fn run(&self) -> Result<()> {
        self.expect("run", false, 0)?;
        self.bound.invoke(None, &[]).map(drop)
    }

    pub fn action(&self, caller: &Value) -> Result<()> {
        self.expect("action", true, 0)?;
        self.bound.invoke(Some(caller), &[]).map(drop)
    }

    pub fn get(&self, caller: &Value) -> Result<Value> {
        self.expect("get", true, 0)?;
        self.produce("get", Some(caller), &[])
    }

    pub fn set(&self, caller: &Value, value: Value) -> Result<()> {
        self.expect("set", true, 1)?;
        self.bound.invoke(Some(caller), &[value]).map(drop)
    }

    /// `N`-ary consumer, `N` in 2..=7.
    pub fn accept<const N: usize>(&self, caller: &Value, args: [Value; N]) -> Result<()> {
        self.expect_range("accept", N, MIN_CONSUMER_ARGS, MAX_CONSUMER_ARGS)?;
        self.expect("accept", true, N)?;
        self.bound.invoke(Some(caller), &args).map(drop)
    }

    /// `N`-ary function, `N` in 1..=6.
    pub fn apply<const N: usize>(&self, caller: &Value, args: [Value; N]) -> Result<Value> {
        self.expect_range("apply", N, MIN_FUNCTION_ARGS, MAX_FUNCTION_ARGS)?;
        self.expect("apply", true, N)?;
        self.produce("apply", Some(caller), &args)
    }

    fn produce(&self, method: &str, caller: Option<&Value>, args: &[Value]) -> Result<Value> {
        self.bound.invoke(caller, args)?.ok_or_else(|| {
            self.mismatch(format!("{method} produced no value"))
        })
    }

    fn expect(&self, method: &str, caller: bool, arity: usize) -> Result<()> {
        let shape = self.bound.shape();
        if shape.method_name() == method && shape.has_caller() == caller && shape.arity() == arity
        {
            Ok(())
        } else {
            Err(self.mismatch(format!(
                "called {method}/{arity}, but the target is bound to {shape}"
            )))
        }
    }

    fn expect_range(&self, method: &str, n: usize, min: usize, max: usize) -> Result<()> {
        if (min..=max).contains(&n) {
            Ok(())
        } else {
            Err(self.mismatch(format!(
                "{method} takes {min} to {max} arguments, got {n}"
            )))
        }
    }

    fn mismatch(&self, reason: String) -> ReflectError {
        ReflectError::invocation(self.bound.target().qualified_name(), reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind;
    use crate::errors::ErrorKind;
    use crate::executable::Executable;
    use crate::filter::PublicOnly;
    use crate::shape::{LambdaWrapper, ShapeCatalog, WrapperInterface};
    use crate::signature::BindMode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Tally {
        total: AtomicUsize,
    }

    fn bound(target: &Executable) -> BoundCallable {
        let catalog = ShapeCatalog::new();
        catalog.add_interface(LambdaWrapper::declare()).unwrap();
        bind(&catalog, &PublicOnly, target, BindMode::Structural, None).unwrap()
    }

    #[test]
    fn test_accept_forwards_all_arguments() {
        let add = Executable::method("add", |t: &Tally, a: usize, b: usize| {
            t.total.fetch_add(a + b, Ordering::SeqCst);
        });
        let bound = bound(&add);
        let tally = Value::new(Tally::default());
        bound
            .lambda()
            .unwrap()
            .accept(&tally, [Value::new(2_usize), Value::new(3_usize)])
            .unwrap();
        let total = tally.downcast_ref::<Tally>().unwrap().total.load(Ordering::SeqCst);
        assert_eq!(total, 5);
    }

    #[test]
    fn test_get_and_set() {
        let read = Executable::method("read", |t: &Tally| t.total.load(Ordering::SeqCst));
        let write = Executable::method("write", |t: &Tally, v: usize| {
            t.total.store(v, Ordering::SeqCst);
        });
        let tally = Value::new(Tally::default());
        bound(&write)
            .lambda()
            .unwrap()
            .set(&tally, Value::new(9_usize))
            .unwrap();
        let got = bound(&read).lambda().unwrap().get(&tally).unwrap();
        assert_eq!(got.extract::<usize>(), Some(9));
    }

    #[test]
    fn test_wrong_method_does_not_reach_target() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let read = Executable::method("read", move |t: &Tally| {
            seen.fetch_add(1, Ordering::SeqCst);
            t.total.load(Ordering::SeqCst)
        });
        let bound = bound(&read);
        let err = bound
            .lambda()
            .unwrap()
            .apply(&Value::new(Tally::default()), [Value::new(1_usize)])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invocation);
        assert!(err.to_string().contains("LambdaWrapper::get/0"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_construct_and_run() {
        let ctor = Executable::constructor(Tally::default);
        let made = bound(&ctor).lambda().unwrap().construct().unwrap();
        assert!(made.is::<Tally>());

        let ping = Executable::function(crate::value::TypeToken::of::<Tally>(), "ping", || ());
        bound(&ping).lambda().unwrap().run().unwrap();
    }
}
