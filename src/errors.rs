//! Error types for registry, binding and invocation operations.
//!
//! Every registry operation is fallible and surfaces its failure immediately.
//! Callers branch on [`ReflectError::kind`]; a typical consumer falls back to
//! the slow reflective path ([`crate::Executable::invoke`]) when
//! [`ReflectError::is_fallback_candidate`] is true.
//!
//! # Error Codes
//!
//! - E100-E199: wrapper shape declaration errors
//! - E200-E299: lookup, filtering and binding errors
//! - E300-E399: argument matcher errors
//! - E400-E499: invocation errors
//! - E500-E599: configuration errors

use std::path::PathBuf;

use thiserror::Error;

use crate::signature::{Signature, StructuralSignature};
use crate::value::TypeToken;

/// Structured error code for documentation and programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(&'static str);

impl ErrorCode {
    /// Declared wrapper type is not an interface
    pub const DECL_NOT_INTERFACE: ErrorCode = ErrorCode("E100");
    /// Wrapper method carries no invoker tag, or both
    pub const DECL_TAG: ErrorCode = ErrorCode("E101");
    /// Wrapper method is otherwise malformed
    pub const DECL_GENERIC: ErrorCode = ErrorCode("E199");

    /// No catalog entry for the computed signature
    pub const NO_SHAPE: ErrorCode = ErrorCode("E200");
    /// Entry exists, but not on the requested interface
    pub const SHAPE_MISMATCH: ErrorCode = ErrorCode("E201");
    /// Filter policy rejected the target
    pub const ACCESS_DENIED: ErrorCode = ErrorCode("E202");
    /// Target cannot be linked to the chosen shape
    pub const BINDING: ErrorCode = ErrorCode("E203");
    /// Name/parameter lookup found nothing
    pub const NO_SUCH_METHOD: ErrorCode = ErrorCode("E204");

    /// No matcher for (interface, signature)
    pub const NO_MATCHER: ErrorCode = ErrorCode("E300");
    /// Matcher would replace a built-in one
    pub const MATCHER_CONFLICT: ErrorCode = ErrorCode("E301");

    /// Call-time argument, receiver or result mismatch
    pub const INVOCATION: ErrorCode = ErrorCode("E400");

    /// Configuration could not be parsed or applied
    pub const CONFIG: ErrorCode = ErrorCode("E500");

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminant of [`ReflectError`], for branching without matching fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ShapeDeclaration,
    NoShapeFound,
    ShapeMismatch,
    AccessDenied,
    Binding,
    NoSuchMethod,
    NoMatcherFound,
    MatcherConflict,
    Invocation,
    Config,
}

/// Error raised by registry, binder, matcher and invocation operations.
#[derive(Debug, Clone, Error)]
pub enum ReflectError {
    /// Malformed wrapper declaration: not an interface, or a method without
    /// exactly one invoker tag.
    #[error("invalid wrapper declaration {interface}{}: {reason}", .method.as_ref().map(|m| format!("::{m}")).unwrap_or_default())]
    ShapeDeclaration {
        code: ErrorCode,
        interface: String,
        method: Option<String>,
        reason: String,
    },

    /// No catalog entry for the signature computed from the target.
    #[error("no wrapper shape found for {target} with signature {signature}")]
    NoShapeFound { target: String, signature: Signature },

    /// A shape exists for the signature, but not on the requested interface.
    #[error("wrapper interface {scope} declares no shape for {target} ({signature}), although another interface does")]
    ShapeMismatch {
        target: String,
        scope: TypeToken,
        signature: Signature,
    },

    /// The active filter policy rejected the target.
    #[error("binding {target} denied by {policy} policy: {reason}")]
    AccessDenied {
        target: String,
        policy: String,
        reason: String,
    },

    /// The target cannot be linked to the chosen shape.
    #[error("cannot link {target} to {shape}: {reason}")]
    Binding {
        target: String,
        shape: String,
        reason: String,
    },

    /// Name and parameter-type lookup found no executable.
    #[error("no executable {declaring}::{name}({}) found", .params.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    NoSuchMethod {
        declaring: TypeToken,
        name: String,
        params: Vec<TypeToken>,
    },

    /// No argument matcher is registered for the pair.
    #[error("no argument matcher for {target} on {interface} with signature {signature}; register one with MatcherRegistry::add_matcher")]
    NoMatcherFound {
        target: String,
        interface: TypeToken,
        signature: StructuralSignature,
    },

    /// A built-in matcher already owns the key.
    #[error("argument matcher for {interface} {signature} is built in and cannot be replaced")]
    MatcherConflict {
        interface: TypeToken,
        signature: StructuralSignature,
    },

    /// Call-time failure: wrong argument count or type, missing receiver,
    /// or a wrapper method that does not match the bound shape.
    #[error("invocation of {target} failed: {reason}")]
    Invocation { target: String, reason: String },

    /// Configuration could not be parsed or applied.
    #[error("configuration error{}: {message}", .path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    Config {
        message: String,
        path: Option<PathBuf>,
    },
}

impl ReflectError {
    // ==========================================================================
    // Constructor Methods
    // ==========================================================================

    /// Declared type is not an interface.
    #[must_use]
    pub fn not_interface(interface: &TypeToken) -> Self {
        Self::ShapeDeclaration {
            code: ErrorCode::DECL_NOT_INTERFACE,
            interface: interface.to_string(),
            method: None,
            reason: "only interfaces can declare wrapper shapes".into(),
        }
    }

    /// Wrapper method has no invoker tag, or more than one.
    #[must_use]
    pub fn untagged(interface: impl Into<String>, method: impl Into<String>, found: usize) -> Self {
        Self::ShapeDeclaration {
            code: ErrorCode::DECL_TAG,
            interface: interface.into(),
            method: Some(method.into()),
            reason: format!("expected exactly one invoker tag, found {found}"),
        }
    }

    /// Any other malformed declaration.
    #[must_use]
    pub fn declaration(
        interface: impl Into<String>,
        method: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ShapeDeclaration {
            code: ErrorCode::DECL_GENERIC,
            interface: interface.into(),
            method: Some(method.into()),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn binding(
        target: impl Into<String>,
        shape: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Binding {
            target: target.into(),
            shape: shape.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn invocation(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invocation {
            target: target.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    #[must_use]
    pub fn config_with_path(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    // ==========================================================================
    // Accessor Methods
    // ==========================================================================

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ShapeDeclaration { .. } => ErrorKind::ShapeDeclaration,
            Self::NoShapeFound { .. } => ErrorKind::NoShapeFound,
            Self::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::Binding { .. } => ErrorKind::Binding,
            Self::NoSuchMethod { .. } => ErrorKind::NoSuchMethod,
            Self::NoMatcherFound { .. } => ErrorKind::NoMatcherFound,
            Self::MatcherConflict { .. } => ErrorKind::MatcherConflict,
            Self::Invocation { .. } => ErrorKind::Invocation,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ShapeDeclaration { code, .. } => *code,
            Self::NoShapeFound { .. } => ErrorCode::NO_SHAPE,
            Self::ShapeMismatch { .. } => ErrorCode::SHAPE_MISMATCH,
            Self::AccessDenied { .. } => ErrorCode::ACCESS_DENIED,
            Self::Binding { .. } => ErrorCode::BINDING,
            Self::NoSuchMethod { .. } => ErrorCode::NO_SUCH_METHOD,
            Self::NoMatcherFound { .. } => ErrorCode::NO_MATCHER,
            Self::MatcherConflict { .. } => ErrorCode::MATCHER_CONFLICT,
            Self::Invocation { .. } => ErrorCode::INVOCATION,
            Self::Config { .. } => ErrorCode::CONFIG,
        }
    }

    /// Error category name.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self.kind() {
            ErrorKind::ShapeDeclaration => "Declaration",
            ErrorKind::NoShapeFound
            | ErrorKind::ShapeMismatch
            | ErrorKind::AccessDenied
            | ErrorKind::Binding
            | ErrorKind::NoSuchMethod => "Binding",
            ErrorKind::NoMatcherFound | ErrorKind::MatcherConflict => "Matcher",
            ErrorKind::Invocation => "Invocation",
            ErrorKind::Config => "Config",
        }
    }

    // ==========================================================================
    // Classification Methods
    // ==========================================================================

    /// True when the fast path is unavailable for this target but a slow
    /// reflective call would still work.
    #[must_use]
    pub fn is_fallback_candidate(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NoShapeFound | ErrorKind::ShapeMismatch | ErrorKind::NoMatcherFound
        )
    }
}

/// Result type alias using [`ReflectError`].
pub type Result<T> = std::result::Result<T, ReflectError>;
