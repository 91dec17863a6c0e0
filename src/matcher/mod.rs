//! Argument matchers: a generic call surface over heterogeneous shapes.
//!
//! A matcher is keyed by wrapper interface and structural signature. It takes
//! the bound callable, the original target and an untyped argument list whose
//! first element is the caller (for shapes with a caller slot), and performs
//! the call the bound shape expects. Void results come back as `None`.

pub mod builtin;

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::binder::BoundCallable;
use crate::errors::{ReflectError, Result};
use crate::executable::Executable;
use crate::shape::LambdaWrapper;
use crate::signature::{MatcherKey, StructuralSignature};
use crate::value::{TypeToken, Value};

/// Adapter from an untyped argument list to a bound wrapper call.
pub type ArgumentMatcher =
    Arc<dyn Fn(&BoundCallable, &Executable, &[Value]) -> Result<Option<Value>> + Send + Sync>;

/// Concurrent registry of argument matchers.
#[derive(Default)]
pub struct MatcherRegistry {
    matchers: DashMap<MatcherKey, ArgumentMatcher>,
}

impl MatcherRegistry {
    /// Registry without any matcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the `LambdaWrapper` matchers.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.install_builtins();
        registry
    }

    pub(crate) fn install_builtins(&self) {
        for (signature, matcher) in builtin::matchers() {
            self.matchers
                .insert(MatcherKey::new(LambdaWrapper::token(), signature), matcher);
        }
        log::debug!("installed {} built-in argument matchers", self.matchers.len());
    }

    /// Register `matcher` for `(interface, signature)`.
    ///
    /// Keys of the built-in interface cannot be replaced; any other key is
    /// overwritten by the latest registration.
    pub fn add_matcher<F>(
        &self,
        interface: TypeToken,
        signature: StructuralSignature,
        matcher: F,
    ) -> Result<()>
    where
        F: Fn(&BoundCallable, &Executable, &[Value]) -> Result<Option<Value>>
            + Send
            + Sync
            + 'static,
    {
        let key = MatcherKey::new(interface, signature);
        match self.matchers.entry(key) {
            Entry::Occupied(_) if interface == LambdaWrapper::token() => {
                Err(ReflectError::MatcherConflict {
                    interface,
                    signature,
                })
            }
            Entry::Occupied(mut entry) => {
                log::warn!("argument matcher for {key} replaced");
                entry.insert(Arc::new(matcher));
                Ok(())
            }
            Entry::Vacant(entry) => {
                log::debug!("registered argument matcher for {key}");
                entry.insert(Arc::new(matcher));
                Ok(())
            }
        }
    }

    #[must_use]
    pub fn has_matcher(&self, key: &MatcherKey) -> bool {
        self.matchers.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Matcher key for calling `original` through `bound`.
    ///
    /// The signature is recomputed from `original`; for targets without a
    /// receiver the candidate matching the bound shape is used.
    #[must_use]
    pub fn key_for(bound: &BoundCallable, original: &Executable) -> MatcherKey {
        let shape_signature = bound.shape().structural();
        let signature = StructuralSignature::candidates(original)
            .find(|candidate| *candidate == shape_signature)
            .unwrap_or_else(|| StructuralSignature::of_target(original));
        MatcherKey::new(bound.interface(), signature)
    }

    /// Look up the matcher for `bound` and `original` once.
    pub fn matcher_for(&self, bound: &BoundCallable, original: &Executable) -> Result<ArgumentMatcher> {
        let key = Self::key_for(bound, original);
        self.matchers
            .get(&key)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ReflectError::NoMatcherFound {
                target: original.qualified_name().to_string(),
                interface: key.interface,
                signature: key.signature,
            })
    }

    /// Invoke `bound` with untyped `args` through the registered matcher.
    pub fn apply(
        &self,
        bound: &BoundCallable,
        original: &Executable,
        args: &[Value],
    ) -> Result<Option<Value>> {
        let matcher = self.matcher_for(bound, original)?;
        log::trace!(
            "applying matcher for {} with {} args",
            original.qualified_name(),
            args.len()
        );
        matcher(bound, original, args)
    }
}

impl std::fmt::Debug for MatcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatcherRegistry")
            .field("matchers", &self.matchers.len())
            .finish()
    }
}
