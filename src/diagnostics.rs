//! Error handling and diagnostics for the Polydust type checker.
//!
//! All recoverable failures are values of a single [`Error`] enum and are
//! surfaced through the crate-wide [`Result`] alias. Internal invariant
//! violations (non-idempotent substitutions, malformed arrow extraction) are
//! bugs, not user errors, and panic instead of being represented here.

use crate::ast::TermVar;
use crate::types::{Type, TypeCon};
use std::fmt;

/// Result type used throughout the Polydust implementation.
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// Error types for the Polydust type checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A term variable was referenced but never bound.
    UndefinedVariable {
        name: TermVar,
    },

    /// A user-supplied name was bound while already in scope.
    DuplicateVariable {
        name: TermVar,
    },

    /// Two types could not be unified.
    TypeMismatch {
        left: Type,
        right: Type,
    },

    /// A type constructor was applied to the wrong number of arguments.
    ArityMismatch {
        constructor: TypeCon,
        expected: usize,
        actual: usize,
    },

    /// A type annotation mentioned a constructor that is not in scope.
    UnknownConstructor {
        constructor: TypeCon,
    },

    /// Subsumption failed because a rigid type escaped its scope.
    ///
    /// The general type is not polymorphic enough to be used at the
    /// expected type.
    SkolemEscape {
        general: Type,
        expected: Type,
    },

    /// A lambda parameter without an annotation was inferred to have a
    /// polymorphic type. First-class polymorphism at a binder requires an
    /// explicit annotation.
    PolymorphicParameter {
        name: TermVar,
        inferred: Type,
    },

    /// An elaborated term failed the explicit-language typing rules.
    ///
    /// Produced only by the explicit-term verifier, never by inference.
    IllTypedTerm {
        message: String,
    },
}

impl Error {
    /// Creates an undefined-variable error.
    pub fn undefined_variable(name: TermVar) -> Self {
        Self::UndefinedVariable { name }
    }

    /// Creates a duplicate-variable error.
    pub fn duplicate_variable(name: TermVar) -> Self {
        Self::DuplicateVariable { name }
    }

    /// Creates a type-mismatch error carrying both offending types.
    pub fn type_mismatch(left: Type, right: Type) -> Self {
        Self::TypeMismatch { left, right }
    }

    /// Creates a constructor-arity error.
    pub fn arity_mismatch(constructor: TypeCon, expected: usize, actual: usize) -> Self {
        Self::ArityMismatch {
            constructor,
            expected,
            actual,
        }
    }

    /// Creates an unknown-constructor error.
    pub fn unknown_constructor(constructor: TypeCon) -> Self {
        Self::UnknownConstructor { constructor }
    }

    /// Creates a Skolem-escape subsumption error.
    pub fn skolem_escape(general: Type, expected: Type) -> Self {
        Self::SkolemEscape { general, expected }
    }

    /// Creates a polymorphic-parameter error.
    pub fn polymorphic_parameter(name: TermVar, inferred: Type) -> Self {
        Self::PolymorphicParameter { name, inferred }
    }

    /// Creates an ill-typed-term error for the explicit-term verifier.
    pub fn ill_typed(message: impl Into<String>) -> Self {
        Self::IllTypedTerm {
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UndefinedVariable { name } => {
                write!(f, "Undefined variable: {name}")
            }
            Error::DuplicateVariable { name } => {
                write!(f, "Variable is already defined: {name}")
            }
            Error::TypeMismatch { left, right } => {
                write!(f, "Type mismatch: {left} vs {right}")
            }
            Error::ArityMismatch {
                constructor,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Constructor {constructor} expects {expected} argument(s), got {actual}"
                )
            }
            Error::UnknownConstructor { constructor } => {
                write!(f, "Unknown type constructor: {constructor}")
            }
            Error::SkolemEscape { general, expected } => {
                write!(
                    f,
                    "Type {general} is not polymorphic enough to be used at type {expected}"
                )
            }
            Error::PolymorphicParameter { name, inferred } => {
                write!(
                    f,
                    "Parameter {name} was inferred the polymorphic type {inferred}; \
                     annotate the binder to use first-class polymorphism"
                )
            }
            Error::IllTypedTerm { message } => {
                write!(f, "Ill-typed term: {message}")
            }
        }
    }
}

impl std::error::Error for Error {}
