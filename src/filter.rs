//! Filter policies gating which executables may be bound.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{ReflectError, Result};
use crate::executable::{Executable, Visibility};

/// Stateless predicate over binding targets.
pub trait FilterPolicy: Send + Sync + fmt::Debug {
    /// Name used in diagnostics and configuration.
    fn name(&self) -> &str;

    fn permits(&self, target: &Executable) -> bool;

    /// Why `target` was rejected.
    fn rejection(&self, target: &Executable) -> String;
}

/// Only public executables.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicOnly;

impl FilterPolicy for PublicOnly {
    fn name(&self) -> &str {
        "public_only"
    }

    fn permits(&self, target: &Executable) -> bool {
        target.is_public()
    }

    fn rejection(&self, target: &Executable) -> String {
        let visibility = match target.visibility() {
            Visibility::Public => "public",
            Visibility::Crate => "crate-visible",
            Visibility::Private => "private",
        };
        format!("{} is {visibility}, only public executables can be bound", target.name())
    }
}

/// No restriction.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyExecutable;

impl FilterPolicy for AnyExecutable {
    fn name(&self) -> &str {
        "any"
    }

    fn permits(&self, _target: &Executable) -> bool {
        true
    }

    fn rejection(&self, _target: &Executable) -> String {
        String::new()
    }
}

/// Built-in policy selector used by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    #[default]
    PublicOnly,
    Any,
}

impl FilterKind {
    #[must_use]
    pub fn policy(self) -> Arc<dyn FilterPolicy> {
        match self {
            Self::PublicOnly => Arc::new(PublicOnly),
            Self::Any => Arc::new(AnyExecutable),
        }
    }
}

impl FromStr for FilterKind {
    type Err = ReflectError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public_only" | "public" => Ok(Self::PublicOnly),
            "any" => Ok(Self::Any),
            other => Err(ReflectError::config(format!(
                "unknown filter policy '{other}', expected 'public_only' or 'any'"
            ))),
        }
    }
}

/// Fail with `AccessDenied` unless `policy` permits `target`.
pub fn check(policy: &dyn FilterPolicy, target: &Executable) -> Result<()> {
    if policy.permits(target) {
        Ok(())
    } else {
        Err(ReflectError::AccessDenied {
            target: target.qualified_name().to_string(),
            policy: policy.name().to_string(),
            reason: policy.rejection(target),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    struct Vault;

    fn secret() -> Executable {
        Executable::method("secret", |_: &Vault| 42_u64).private()
    }

    #[test]
    fn test_public_only_rejects_private() {
        let err = check(&PublicOnly, &secret()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
        assert_eq!(
            err.to_string(),
            "binding Vault::secret denied by public_only policy: secret is private, only public executables can be bound"
        );
    }

    #[test]
    fn test_any_permits_private() {
        assert!(check(&AnyExecutable, &secret()).is_ok());
    }

    #[test]
    fn test_filter_kind_parsing() {
        assert_eq!("ANY".parse::<FilterKind>().unwrap(), FilterKind::Any);
        assert_eq!(" public_only ".parse::<FilterKind>().unwrap(), FilterKind::PublicOnly);
        assert!("everything".parse::<FilterKind>().is_err());
        assert_eq!(FilterKind::default().policy().name(), "public_only");
    }
}
