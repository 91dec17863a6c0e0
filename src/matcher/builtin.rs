//! Matchers for the shapes of [`LambdaWrapper`](crate::shape::LambdaWrapper).

use std::sync::Arc;

use crate::binder::BoundCallable;
use crate::errors::{ReflectError, Result};
use crate::executable::Executable;
use crate::signature::StructuralSignature;
use crate::value::{ReturnKind, Value};

use super::ArgumentMatcher;

fn matcher<F>(f: F) -> ArgumentMatcher
where
    F: Fn(&BoundCallable, &Executable, &[Value]) -> Result<Option<Value>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Split `args` into the caller and exactly `N` positional arguments.
fn caller_and<'a, const N: usize>(
    original: &Executable,
    args: &'a [Value],
) -> Result<(&'a Value, [Value; N])> {
    let mismatch = || {
        ReflectError::invocation(
            original.qualified_name(),
            format!("expected caller and {N} arguments, got {} values", args.len()),
        )
    };
    let (caller, rest) = args.split_first().ok_or_else(mismatch)?;
    let rest = <&[Value; N]>::try_from(rest).map_err(|_| mismatch())?;
    Ok((caller, rest.clone()))
}

macro_rules! consumers {
    ($($n:literal),*) => {
        vec![$(
            (
                StructuralSignature::new(ReturnKind::Void, $n),
                matcher(|bound, original, args| {
                    let (caller, rest) = caller_and::<$n>(original, args)?;
                    bound.lambda()?.accept::<$n>(caller, rest)?;
                    Ok(None)
                }),
            )
        ),*]
    };
}

macro_rules! functions {
    ($($n:literal),*) => {
        vec![$(
            (
                StructuralSignature::new(ReturnKind::Value, $n),
                matcher(|bound, original, args| {
                    let (caller, rest) = caller_and::<$n>(original, args)?;
                    bound.lambda()?.apply::<$n>(caller, rest).map(Some)
                }),
            )
        ),*]
    };
}

/// All built-in matchers with their structural signatures.
pub(crate) fn matchers() -> Vec<(StructuralSignature, ArgumentMatcher)> {
    let mut all = vec![
        (
            StructuralSignature::without_caller(ReturnKind::Value),
            matcher(|bound, _, _| bound.lambda()?.construct().map(Some)),
        ),
        (
            StructuralSignature::without_caller(ReturnKind::Void),
            matcher(|bound, _, _| bound.lambda()?.run().map(|()| None)),
        ),
        (
            StructuralSignature::new(ReturnKind::Void, 0),
            matcher(|bound, original, args| {
                let (caller, []) = caller_and::<0>(original, args)?;
                bound.lambda()?.action(caller).map(|()| None)
            }),
        ),
        (
            StructuralSignature::new(ReturnKind::Value, 0),
            matcher(|bound, original, args| {
                let (caller, []) = caller_and::<0>(original, args)?;
                bound.lambda()?.get(caller).map(Some)
            }),
        ),
        (
            StructuralSignature::new(ReturnKind::Void, 1),
            matcher(|bound, original, args| {
                let (caller, [value]) = caller_and::<1>(original, args)?;
                bound.lambda()?.set(caller, value).map(|()| None)
            }),
        ),
    ];
    all.extend(consumers!(2, 3, 4, 5, 6, 7));
    all.extend(functions!(1, 2, 3, 4, 5, 6));
    all
}
