//! Described concrete types and name/parameter-type lookup of their
//! executables.

use std::sync::Arc;

use crate::errors::{ReflectError, Result};
use crate::value::{TypeKind, TypeToken};

use super::{Executable, ExecutableKind};

/// A concrete type together with the executables it exposes.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    token: TypeToken,
    kind: TypeKind,
    executables: Vec<Arc<Executable>>,
}

impl TypeDescriptor {
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self::new(TypeToken::of::<T>())
    }

    #[must_use]
    pub fn new(token: TypeToken) -> Self {
        Self {
            token,
            kind: TypeKind::Class,
            executables: Vec::new(),
        }
    }

    /// Builder form of [`Self::add`].
    #[must_use]
    pub fn with(mut self, executable: Executable) -> Self {
        self.add(executable);
        self
    }

    pub fn add(&mut self, executable: Executable) {
        if executable.declaring_type() != self.token {
            log::warn!(
                "{} added to descriptor of {}",
                executable.qualified_name(),
                self.token
            );
        }
        self.executables.push(Arc::new(executable));
    }

    #[must_use]
    pub fn token(&self) -> TypeToken {
        self.token
    }

    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn executables(&self) -> impl Iterator<Item = &Arc<Executable>> {
        self.executables.iter()
    }

    /// Methods and associated functions, constructors excluded.
    pub fn methods(&self) -> impl Iterator<Item = &Arc<Executable>> {
        self.executables
            .iter()
            .filter(|e| e.kind() != ExecutableKind::Constructor)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &Arc<Executable>> {
        self.executables
            .iter()
            .filter(|e| e.kind() == ExecutableKind::Constructor)
    }

    /// Method or associated function named `name` with exactly `params`.
    pub fn find_method(&self, name: &str, params: &[TypeToken]) -> Result<Arc<Executable>> {
        log::trace!("looking up {}::{name} with {} params", self.token, params.len());
        self.methods()
            .find(|e| e.name() == name && e.param_types() == params)
            .cloned()
            .ok_or_else(|| self.no_such(name, params.to_vec()))
    }

    /// Method named `name` taking `count` parameters, all of type `param`.
    pub fn find_method_repeated(
        &self,
        name: &str,
        param: TypeToken,
        count: usize,
    ) -> Result<Arc<Executable>> {
        self.find_method(name, &vec![param; count])
    }

    pub fn find_constructor(&self, params: &[TypeToken]) -> Result<Arc<Executable>> {
        self.constructors()
            .find(|e| e.param_types() == params)
            .cloned()
            .ok_or_else(|| self.no_such("new", params.to_vec()))
    }

    fn no_such(&self, name: &str, params: Vec<TypeToken>) -> ReflectError {
        ReflectError::NoSuchMethod {
            declaring: self.token,
            name: name.to_string(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{arg_types, Value};

    #[derive(Debug, Clone, Default)]
    struct Pair {
        left: i32,
        right: i32,
    }

    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Pair>()
            .with(Executable::constructor(Pair::default))
            .with(Executable::constructor(|left: i32, right: i32| Pair { left, right }))
            .with(Executable::method("sum", |p: &Pair| p.left + p.right))
            .with(Executable::method("scale", |p: &Pair, k: i32| p.left * k))
            .with(Executable::method("add3", |_: &Pair, a: i32, b: i32, c: i32| a + b + c))
    }

    #[test]
    fn test_find_method_by_name_and_types() {
        let found = descriptor()
            .find_method("scale", &[TypeToken::of::<i32>()])
            .unwrap();
        assert_eq!(found.qualified_name(), "Pair::scale");
    }

    #[test]
    fn test_find_method_from_argument_types() {
        let args = [Value::new(3_i32)];
        let found = descriptor().find_method("scale", &arg_types(&args)).unwrap();
        let out = found
            .invoke(Some(&Value::new(Pair { left: 2, right: 0 })), &args)
            .unwrap()
            .unwrap();
        assert_eq!(out.extract::<i32>(), Some(6));
    }

    #[test]
    fn test_find_method_repeated() {
        let found = descriptor()
            .find_method_repeated("add3", TypeToken::of::<i32>(), 3)
            .unwrap();
        assert_eq!(found.param_count(), 3);
    }

    #[test]
    fn test_find_constructor() {
        let desc = descriptor();
        assert_eq!(desc.constructors().count(), 2);
        let two = desc
            .find_constructor(&[TypeToken::of::<i32>(), TypeToken::of::<i32>()])
            .unwrap();
        assert_eq!(two.kind(), ExecutableKind::Constructor);
    }

    #[test]
    fn test_missing_method_reports_signature() {
        let err = descriptor()
            .find_method("scale", &[TypeToken::of::<String>()])
            .unwrap_err();
        assert_eq!(err.to_string(), "no executable Pair::scale(String) found");
    }
}
