//! Property-based tests for signature keys and bound invocation.
//!
//! These tests verify invariants that should hold for all inputs:
//! - Exact signature equality and hashing ignore the declaring type
//! - Declared shapes reserve exactly one caller slot
//! - Invoking through a matcher equals invoking the target reflectively
//! - Two bindings of the same target behave the same

mod common;

use proptest::prelude::*;
use shapebind::testkit::Account;
use shapebind::{
    BindMode, ExactSignature, Executable, Registry, ReturnKind, ReturnType, StructuralSignature,
    TypeToken, Value,
};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn token(idx: usize) -> TypeToken {
    match idx % 4 {
        0 => TypeToken::of::<i32>(),
        1 => TypeToken::of::<String>(),
        2 => TypeToken::of::<Value>(),
        _ => TypeToken::of::<Vec<Value>>(),
    }
}

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn return_kind() -> impl Strategy<Value = ReturnKind> {
    prop_oneof![Just(ReturnKind::Void), Just(ReturnKind::Value)]
}

proptest! {
    /// Property: the declaring type scopes collisions but never changes the key
    #[test]
    fn prop_exact_key_ignores_declaring(params in prop::collection::vec(0usize..4, 0..6)) {
        let types: Vec<TypeToken> = params.iter().copied().map(token).collect();
        let plain = ExactSignature::new(ReturnType::of::<i32>(), types.clone());
        let scoped = ExactSignature::new(ReturnType::of::<i32>(), types)
            .with_declaring(TypeToken::of::<Account>());
        prop_assert_eq!(&plain, &scoped);
        prop_assert_eq!(hash_of(&plain), hash_of(&scoped));
        prop_assert_eq!(plain.erase(), scoped.erase());
    }

    /// Property: any declared parameter list with at least one entry
    /// reserves exactly one caller slot
    #[test]
    fn prop_declared_shapes_reserve_caller(kind in return_kind(), declared in 1usize..9) {
        let signature = StructuralSignature::from_declared(kind, declared);
        prop_assert!(signature.has_caller());
        prop_assert_eq!(signature.params(), declared - 1);
        prop_assert_eq!(signature, StructuralSignature::new(kind, declared - 1));
        prop_assert_ne!(signature, StructuralSignature::without_caller(kind));
    }

    /// Property: matcher invocation equals reflective invocation
    #[test]
    fn prop_matcher_round_trip(
        balance in -10_000i64..10_000,
        rate in 0i64..20,
        years in 0i64..10,
        bonus in -100i64..100,
    ) {
        let registry = Registry::with_builtins();
        let target = Executable::method("projected", Account::projected);
        let bound = registry.bind(&target, BindMode::Structural, None).unwrap();

        let caller = Value::new(Account::new("prop", balance));
        let params = [Value::new(rate), Value::new(years), Value::new(bonus)];
        let mut args = vec![caller.clone()];
        args.extend(params.iter().cloned());

        let via_matcher = registry.apply(&bound, &target, &args).unwrap().unwrap();
        let direct = target.invoke(Some(&caller), &params).unwrap().unwrap();
        prop_assert_eq!(via_matcher.extract::<i64>(), direct.extract::<i64>());
    }

    /// Property: binding twice yields behaviourally equivalent callables
    #[test]
    fn prop_rebinding_is_equivalent(text in "[a-z]{0,24}") {
        let registry = Registry::with_builtins();
        let target = Executable::method("length_of", Account::length_of);
        let first = registry.bind_structural(&target).unwrap();
        let second = registry.bind_structural(&target).unwrap();
        prop_assert!(std::sync::Arc::ptr_eq(first.shape(), second.shape()));

        let caller = Value::new(Account::default());
        let arg = [Value::new(text.clone())];
        let a = first.invoke(Some(&caller), &arg).unwrap().unwrap();
        let b = second.invoke(Some(&caller), &arg).unwrap().unwrap();
        prop_assert_eq!(a.extract::<i32>(), b.extract::<i32>());
        prop_assert_eq!(a.extract::<i32>(), Some(text.len() as i32));
    }
}
