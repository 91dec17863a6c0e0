//! Signature model: the keys under which wrapper shapes are catalogued.
//!
//! Two granularities exist:
//!
//! - [`StructuralSignature`]: return kind (void or value) plus parameter
//!   count. Any non-void return and any parameter type are interchangeable.
//! - [`ExactSignature`]: exact return type plus exact parameter types.
//!
//! Both exclude the caller argument from the parameter list but record
//! whether a caller slot exists. Wrapper shapes declared with no parameters
//! at all have no caller slot; every other shape reserves its first parameter
//! for the caller.
//!
//! Targets without a receiver (constructors, associated functions) produce
//! two candidate keys: their own caller-less key first, then the same key
//! with a caller slot, whose caller argument they ignore.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::executable::Executable;
use crate::value::{ReturnKind, ReturnType, TypeToken};

/// Matching mode requested at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindMode {
    /// Match on return kind and parameter count.
    Structural,
    /// Match on exact return and parameter types.
    Exact,
}

impl fmt::Display for BindMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural => write!(f, "structural"),
            Self::Exact => write!(f, "exact"),
        }
    }
}

/// Structural signature: return kind, parameter count and caller slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructuralSignature {
    returns: ReturnKind,
    params: usize,
    caller: bool,
}

impl StructuralSignature {
    /// Signature with a caller slot and `params` further parameters.
    #[must_use]
    pub const fn new(returns: ReturnKind, params: usize) -> Self {
        Self {
            returns,
            params,
            caller: true,
        }
    }

    /// Signature of a shape with no caller slot and no parameters.
    #[must_use]
    pub const fn without_caller(returns: ReturnKind) -> Self {
        Self {
            returns,
            params: 0,
            caller: false,
        }
    }

    /// Signature of a wrapper method declared with `declared_params`
    /// parameters, the first of which is the caller.
    #[must_use]
    pub const fn from_declared(returns: ReturnKind, declared_params: usize) -> Self {
        Self {
            returns,
            params: declared_params.saturating_sub(1),
            caller: declared_params > 0,
        }
    }

    /// Primary signature of a target.
    #[must_use]
    pub fn of_target(target: &Executable) -> Self {
        Self {
            returns: target.return_type().kind(),
            params: target.param_count(),
            caller: target.has_receiver(),
        }
    }

    /// Keys to try for `target`, in order of preference.
    pub fn candidates(target: &Executable) -> impl Iterator<Item = Self> {
        let primary = Self::of_target(target);
        let fallback = (!primary.caller).then_some(Self {
            caller: true,
            ..primary
        });
        std::iter::once(primary).chain(fallback)
    }

    #[must_use]
    pub fn returns(&self) -> ReturnKind {
        self.returns
    }

    /// Parameter count, caller excluded.
    #[must_use]
    pub fn params(&self) -> usize {
        self.params
    }

    #[must_use]
    pub fn has_caller(&self) -> bool {
        self.caller
    }
}

impl fmt::Display for StructuralSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let caller = if self.caller { "caller" } else { "no caller" };
        write!(f, "({caller}, {} params) -> {}", self.params, self.returns)
    }
}

/// Exact signature: exact return type and parameter types.
///
/// The declaring type scopes collisions inside a catalog slot and is not part
/// of equality or hashing.
#[derive(Debug, Clone)]
pub struct ExactSignature {
    declaring: Option<TypeToken>,
    returns: ReturnType,
    params: Vec<TypeToken>,
    caller: bool,
}

impl ExactSignature {
    #[must_use]
    pub fn new(returns: ReturnType, params: Vec<TypeToken>) -> Self {
        Self {
            declaring: None,
            returns,
            params,
            caller: true,
        }
    }

    /// Signature of a wrapper method whose declared parameter list starts
    /// with the caller slot.
    #[must_use]
    pub fn from_declared(interface: TypeToken, returns: ReturnType, declared: &[TypeToken]) -> Self {
        Self {
            declaring: Some(interface),
            returns,
            params: declared.iter().skip(1).copied().collect(),
            caller: !declared.is_empty(),
        }
    }

    #[must_use]
    pub fn of_target(target: &Executable) -> Self {
        Self {
            declaring: Some(target.declaring_type()),
            returns: target.return_type(),
            params: target.param_types().to_vec(),
            caller: target.has_receiver(),
        }
    }

    /// Keys to try for `target`, in order of preference.
    pub fn candidates(target: &Executable) -> impl Iterator<Item = Self> {
        let primary = Self::of_target(target);
        let fallback = (!primary.caller).then(|| Self {
            caller: true,
            ..primary.clone()
        });
        std::iter::once(primary).chain(fallback)
    }

    #[must_use]
    pub fn with_declaring(mut self, declaring: TypeToken) -> Self {
        self.declaring = Some(declaring);
        self
    }

    #[must_use]
    pub fn declaring(&self) -> Option<TypeToken> {
        self.declaring
    }

    #[must_use]
    pub fn returns(&self) -> ReturnType {
        self.returns
    }

    #[must_use]
    pub fn params(&self) -> &[TypeToken] {
        &self.params
    }

    #[must_use]
    pub fn has_caller(&self) -> bool {
        self.caller
    }

    /// The structural signature this exact one collapses to.
    #[must_use]
    pub fn erase(&self) -> StructuralSignature {
        StructuralSignature {
            returns: self.returns.kind(),
            params: self.params.len(),
            caller: self.caller,
        }
    }
}

impl PartialEq for ExactSignature {
    fn eq(&self, other: &Self) -> bool {
        self.returns == other.returns && self.params == other.params && self.caller == other.caller
    }
}

impl Eq for ExactSignature {}

impl Hash for ExactSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.returns.hash(state);
        self.params.hash(state);
        self.caller.hash(state);
    }
}

impl fmt::Display for ExactSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        if self.caller {
            write!(f, "fn(caller, {params}) -> {}", self.returns)
        } else {
            write!(f, "fn({params}) -> {}", self.returns)
        }
    }
}

/// Either kind of signature, tagged with its matching granularity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Signature {
    Structural(StructuralSignature),
    Exact(ExactSignature),
}

impl Signature {
    /// Primary signature of `target` under `mode`.
    #[must_use]
    pub fn of_target(target: &Executable, mode: BindMode) -> Self {
        match mode {
            BindMode::Structural => Self::Structural(StructuralSignature::of_target(target)),
            BindMode::Exact => Self::Exact(ExactSignature::of_target(target)),
        }
    }

    #[must_use]
    pub fn mode(&self) -> BindMode {
        match self {
            Self::Structural(_) => BindMode::Structural,
            Self::Exact(_) => BindMode::Exact,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural(sig) => write!(f, "structural {sig}"),
            Self::Exact(sig) => write!(f, "exact {sig}"),
        }
    }
}

/// Key of the argument matcher registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatcherKey {
    pub interface: TypeToken,
    pub signature: StructuralSignature,
}

impl MatcherKey {
    #[must_use]
    pub fn new(interface: TypeToken, signature: StructuralSignature) -> Self {
        Self {
            interface,
            signature,
        }
    }
}

impl fmt::Display for MatcherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.interface, self.signature)
    }
}
