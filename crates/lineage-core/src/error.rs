//! Error taxonomy for instance creation and guarded method calls

use std::fmt;

use thiserror::Error;

use crate::hint::PrimitiveKind;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, LineageError>;

/// Which enforcement plugin raised a violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardOrigin {
    /// Declared through `implements`
    Interface,
    /// Declared through `contract`
    Contract,
}

impl fmt::Display for GuardOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardOrigin::Interface => write!(f, "Implemented interface"),
            GuardOrigin::Contract => write!(f, "Contract"),
        }
    }
}

/// Why a declared method could not be guarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// The instance has no member of that name
    MissingMethod,
    /// The member exists but is not callable
    NotCallable,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::MissingMethod => write!(f, "requires method"),
            ViolationKind::NotCallable => write!(f, "requires a callable member for"),
        }
    }
}

/// Shape a value was expected to have
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requirement {
    /// A primitive kind tag (`string`, `number`, ...)
    Kind(PrimitiveKind),
    /// Membership in the delegation chain of the named blueprint
    Lineage(String),
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Kind(kind) => write!(f, "is required to be a '{}'", kind),
            Requirement::Lineage(name) => write!(f, "is required to be an instance of '{}'", name),
        }
    }
}

/// Errors raised by the factory, the hook pipeline and guarded methods
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LineageError {
    /// Malformed factory call or declaration shape
    #[error("Argument error: {0}")]
    Argument(String),

    /// Type hint outside the recognized set
    #[error("Invalid type hint '{hint}'. Type hint can be 'string', 'number', 'boolean', 'function', 'array' or a blueprint")]
    InvalidHint {
        /// The offending hint as written
        hint: String,
    },

    /// A method declared by an interface or contract is unusable
    #[error("{origin} {kind} '{method}'")]
    ContractViolation {
        /// Missing or not callable
        kind: ViolationKind,
        /// Declared method name
        method: String,
        /// Declaring plugin
        origin: GuardOrigin,
    },

    /// An argument failed its entry hint
    #[error("Argument #{position} of method '{method}' {requirement}")]
    TypeMismatch {
        /// Guarded method name
        method: String,
        /// 1-based argument position
        position: usize,
        /// Expected shape
        requirement: Requirement,
        /// Declaring plugin
        origin: GuardOrigin,
    },

    /// An argument was rejected by a custom validator
    #[error("Argument #{position} of method '{method}' is outside of its valid range")]
    RangeViolation {
        /// Guarded method name
        method: String,
        /// 1-based argument position
        position: usize,
    },

    /// The return value failed the exit hint
    #[error("Method '{method}' return value {requirement}")]
    ReturnTypeMismatch {
        /// Guarded method name
        method: String,
        /// Expected shape
        requirement: Requirement,
    },

    /// Attempted to call a member that is absent or not a function
    #[error("Member '{member}' is not callable")]
    NotCallable {
        /// Member name
        member: String,
    },

    /// A deferred parent led back to a blueprint already on the chain
    #[error("Cyclic delegation chain: {}", .chain.join(" -> "))]
    CyclicDelegation {
        /// Blueprint names from the most-derived to the repeated one
        chain: Vec<String>,
    },

    /// The delegation chain exceeded the configured depth
    #[error("Delegation chain of '{blueprint}' exceeds the maximum depth of {limit}")]
    ChainTooDeep {
        /// Most-derived blueprint
        blueprint: String,
        /// Configured limit
        limit: usize,
    },

    /// Error raised by a host method body or constructor hook
    #[error("{0}")]
    Raised(String),
}

impl LineageError {
    /// Convenience constructor for [`LineageError::Argument`]
    pub fn argument(message: impl Into<String>) -> Self {
        LineageError::Argument(message.into())
    }

    /// Convenience constructor for [`LineageError::Raised`]
    pub fn raised(message: impl Into<String>) -> Self {
        LineageError::Raised(message.into())
    }

    /// True for argument and return-value type mismatches
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            LineageError::TypeMismatch { .. } | LineageError::ReturnTypeMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message() {
        let err = LineageError::TypeMismatch {
            method: "save".to_string(),
            position: 2,
            requirement: Requirement::Kind(PrimitiveKind::String),
            origin: GuardOrigin::Contract,
        };
        assert_eq!(err.to_string(), "Argument #2 of method 'save' is required to be a 'string'");
        assert!(err.is_type_error());
    }

    #[test]
    fn test_lineage_requirement_message() {
        let err = LineageError::ReturnTypeMismatch {
            method: "load".to_string(),
            requirement: Requirement::Lineage("Record".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Method 'load' return value is required to be an instance of 'Record'"
        );
    }

    #[test]
    fn test_missing_method_message() {
        let err = LineageError::ContractViolation {
            kind: ViolationKind::MissingMethod,
            method: "render".to_string(),
            origin: GuardOrigin::Interface,
        };
        assert_eq!(err.to_string(), "Implemented interface requires method 'render'");
        assert!(!err.is_type_error());
    }

    #[test]
    fn test_cycle_message() {
        let err = LineageError::CyclicDelegation {
            chain: vec!["A".to_string(), "B".to_string(), "A".to_string()],
        };
        assert_eq!(err.to_string(), "Cyclic delegation chain: A -> B -> A");
    }
}
