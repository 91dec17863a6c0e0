//! The registry facade: shape catalog, filter policy and argument matchers
//! owned by one long-lived instance.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::binder::{self, BoundCallable};
use crate::config::{self, RegistryConfig};
use crate::errors::{ReflectError, Result};
use crate::executable::{Executable, TypeDescriptor};
use crate::filter::{FilterPolicy, PublicOnly};
use crate::matcher::{ArgumentMatcher, MatcherRegistry};
use crate::shape::{InterfaceDecl, LambdaWrapper, ShapeCatalog, ShapeDecl, ShapeMetadata, WrapperInterface};
use crate::signature::{BindMode, StructuralSignature};
use crate::value::{TypeToken, Value};

static GLOBAL: OnceCell<Arc<Registry>> = OnceCell::new();

/// Process-wide registry, created from the discovered configuration on first
/// use unless [`install_global`] ran before.
pub fn global() -> Arc<Registry> {
    Arc::clone(GLOBAL.get_or_init(|| {
        let config = config::load_config();
        log::debug!("initialising global registry with {config:?}");
        Arc::new(Registry::from_config(&config))
    }))
}

/// Install `registry` as the process-wide registry. Fails once one exists.
pub fn install_global(registry: Registry) -> Result<Arc<Registry>> {
    let registry = Arc::new(registry);
    GLOBAL
        .set(Arc::clone(&registry))
        .map_err(|_| ReflectError::config("global registry is already initialised"))?;
    Ok(registry)
}

/// Shape catalog, active filter policy and argument matchers.
pub struct Registry {
    catalog: ShapeCatalog,
    matchers: MatcherRegistry,
    filter: RwLock<Arc<dyn FilterPolicy>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Registry {
    /// Empty registry with the public-only policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: ShapeCatalog::new(),
            matchers: MatcherRegistry::new(),
            filter: RwLock::new(Arc::new(PublicOnly)),
        }
    }

    /// Registry with the [`LambdaWrapper`] shapes and matchers installed.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.install_builtins();
        registry
    }

    #[must_use]
    pub fn from_config(config: &RegistryConfig) -> Self {
        let registry = Self::new();
        registry.set_filter(config.filter.policy());
        if config.builtin_shapes {
            registry.install_builtins();
        }
        registry
    }

    fn install_builtins(&self) {
        if let Err(e) = self.catalog.add_interface(LambdaWrapper::declare()) {
            log::warn!("built-in wrapper shapes rejected: {e}");
            return;
        }
        self.matchers.install_builtins();
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register the shapes declared by `W`.
    pub fn add<W: WrapperInterface>(&self) -> Result<usize> {
        self.add_interface(W::declare())
    }

    pub fn add_interface(&self, decl: InterfaceDecl) -> Result<usize> {
        self.catalog.add_interface(decl)
    }

    /// Register individual shapes; each must name its declaring interface.
    pub fn add_methods<I>(&self, shapes: I) -> Result<usize>
    where
        I: IntoIterator<Item = ShapeDecl>,
    {
        self.catalog.add_methods(shapes)
    }

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
        self.matchers.add_matcher(interface, signature, matcher)
    }

    /// Swap the active filter policy. Not synchronised with in-flight binds.
    pub fn set_filter_policy<P: FilterPolicy + 'static>(&self, policy: P) {
        self.set_filter(Arc::new(policy));
    }

    pub fn set_filter(&self, policy: Arc<dyn FilterPolicy>) {
        log::debug!("filter policy set to {}", policy.name());
        *self.filter.write() = policy;
    }

    #[must_use]
    pub fn filter_policy(&self) -> Arc<dyn FilterPolicy> {
        Arc::clone(&self.filter.read())
    }

    #[must_use]
    pub fn catalog(&self) -> &ShapeCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn matchers(&self) -> &MatcherRegistry {
        &self.matchers
    }

    // ==========================================================================
    // Lookup and binding
    // ==========================================================================

    pub fn lookup(
        &self,
        target: &Executable,
        mode: BindMode,
        scope: Option<TypeToken>,
    ) -> Result<Arc<ShapeMetadata>> {
        self.catalog.lookup(target, mode, scope)
    }

    pub fn bind(
        &self,
        target: &Executable,
        mode: BindMode,
        scope: Option<TypeToken>,
    ) -> Result<BoundCallable> {
        let policy = self.filter_policy();
        binder::bind(&self.catalog, policy.as_ref(), target, mode, scope)
    }

    pub fn bind_structural(&self, target: &Executable) -> Result<BoundCallable> {
        self.bind(target, BindMode::Structural, None)
    }

    pub fn bind_exact(&self, target: &Executable) -> Result<BoundCallable> {
        self.bind(target, BindMode::Exact, None)
    }

    /// Find `name(params)` on `descriptor` and bind it.
    pub fn bind_method(
        &self,
        descriptor: &TypeDescriptor,
        name: &str,
        params: &[TypeToken],
        mode: BindMode,
    ) -> Result<BoundCallable> {
        let target = descriptor.find_method(name, params)?;
        self.bind(&target, mode, None)
    }

    /// Bind `target` and resolve its argument matcher up front.
    pub fn bind_safe(&self, target: &Executable, mode: BindMode) -> Result<BoundMethod> {
        let bound = self.bind(target, mode, None)?;
        let matcher = self.matchers.matcher_for(&bound, target)?;
        Ok(BoundMethod { bound, matcher })
    }

    /// Whether a structural bind of `target` would succeed right now.
    #[must_use]
    pub fn can_bind(&self, target: &Executable) -> bool {
        let policy = self.filter_policy();
        binder::resolve(&self.catalog, policy.as_ref(), target, BindMode::Structural, None)
            .is_ok()
    }

    /// Shapes `target` could bind to. The listing is lazy and starts over
    /// on every call.
    pub fn list_shapes_for(
        &self,
        target: &Executable,
    ) -> impl Iterator<Item = Arc<ShapeMetadata>> + '_ {
        self.catalog.shapes_for(target)
    }

    /// Invoke `bound` generically through the matcher registry.
    pub fn apply(
        &self,
        bound: &BoundCallable,
        original: &Executable,
        args: &[Value],
    ) -> Result<Option<Value>> {
        self.matchers.apply(bound, original, args)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("shapes", &self.catalog.len())
            .field("matchers", &self.matchers.len())
            .field("filter", &self.filter_policy().name())
            .finish()
    }
}

/// A bound callable paired with its argument matcher.
#[derive(Clone)]
pub struct BoundMethod {
    bound: BoundCallable,
    matcher: ArgumentMatcher,
}

impl BoundMethod {
    #[must_use]
    pub fn bound(&self) -> &BoundCallable {
        &self.bound
    }

    /// Call with `caller` in the caller slot. Callers of shapes without a
    /// caller slot pass `None`.
    pub fn invoke(&self, caller: Option<&Value>, args: &[Value]) -> Result<Option<Value>> {
        self.invoke_with(caller, &self.matcher, args)
    }

    /// Call through an explicit matcher instead of the resolved one.
    pub fn invoke_with(
        &self,
        caller: Option<&Value>,
        matcher: &ArgumentMatcher,
        args: &[Value],
    ) -> Result<Option<Value>> {
        let full: Vec<Value> = caller.cloned().into_iter().chain(args.iter().cloned()).collect();
        matcher(&self.bound, self.bound.target(), &full)
    }
}

impl fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMethod").field("bound", &self.bound).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::filter::AnyExecutable;
    use crate::filter::FilterKind;
    use crate::value::ReturnKind;

    #[derive(Debug, Default)]
    struct Widget;

    impl Widget {
        fn label(&self, prefix: String) -> String {
            format!("{prefix}widget")
        }
    }

    #[test]
    fn test_from_config_without_builtins() {
        let config = RegistryConfig {
            filter: FilterKind::Any,
            builtin_shapes: false,
        };
        let registry = Registry::from_config(&config);
        assert!(registry.catalog().is_empty());
        assert!(registry.matchers().is_empty());
        assert_eq!(registry.filter_policy().name(), "any");
    }

    #[test]
    fn test_bind_safe_resolves_matcher_once() {
        let registry = Registry::with_builtins();
        let target = Executable::method("label", Widget::label);
        let method = registry.bind_safe(&target, BindMode::Structural).unwrap();
        let out = method
            .invoke(Some(&Value::new(Widget)), &[Value::new(String::from("big "))])
            .unwrap()
            .unwrap();
        assert_eq!(out.extract::<String>().unwrap(), "big widget");
    }

    #[test]
    fn test_bind_safe_fails_without_matcher() {
        struct Custom;
        let registry = Registry::with_builtins();
        registry
            .add_interface(
                InterfaceDecl::new::<Custom>()
                    .shape(ShapeDecl::generic("call").caller().erased_params(1).returns_value()),
            )
            .unwrap();
        let target = Executable::method("label", Widget::label);
        let err = registry.bind_safe(&target, BindMode::Structural).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoMatcherFound);

        registry
            .add_matcher(
                TypeToken::of::<Custom>(),
                StructuralSignature::new(ReturnKind::Value, 1),
                |bound, _, args| bound.invoke(args.first(), args.get(1..).unwrap_or_default()),
            )
            .unwrap();
        assert!(registry.bind_safe(&target, BindMode::Structural).is_ok());
    }

    #[test]
    fn test_can_bind_follows_policy() {
        let registry = Registry::with_builtins();
        let hidden = Executable::method("label", Widget::label).private();
        assert!(!registry.can_bind(&hidden));
        registry.set_filter_policy(AnyExecutable);
        assert!(registry.can_bind(&hidden));
    }

    #[test]
    fn test_bind_method_by_name() {
        let registry = Registry::with_builtins();
        let descriptor =
            TypeDescriptor::of::<Widget>().with(Executable::method("label", Widget::label));
        let bound = registry
            .bind_method(&descriptor, "label", &[TypeToken::of::<String>()], BindMode::Structural)
            .unwrap();
        assert_eq!(bound.shape().method_name(), "apply");

        let err = registry
            .bind_method(&descriptor, "missing", &[], BindMode::Structural)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoSuchMethod);
    }
}
