use serde::{Deserialize, Serialize};
use std::fmt;

/// A type-constructor name.
///
/// The primitives (`Bool`, `Int`, `List`, `Arrow`) are user-visible named
/// constructors. Generated constructors are the rigid Skolem constants
/// allocated while unifying or subsuming under quantifiers; they are nullary
/// and must never survive into an elaborated result.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypeCon {
    /// A user-visible named constructor.
    Named(String),
    /// A generated (rigid) constructor.
    Gen(u64),
}

impl TypeCon {
    /// Creates a named constructor.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// The boolean constructor.
    pub fn bool() -> Self {
        Self::named("Bool")
    }

    /// The integer constructor.
    pub fn int() -> Self {
        Self::named("Int")
    }

    /// The list constructor.
    pub fn list() -> Self {
        Self::named("List")
    }

    /// The function-arrow constructor.
    pub fn arrow() -> Self {
        Self::named("Arrow")
    }

    /// Returns true for generated (rigid) constructors.
    pub fn is_rigid(&self) -> bool {
        matches!(self, Self::Gen(_))
    }
}

impl fmt::Display for TypeCon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeCon::Named(name) => write!(f, "{name}"),
            TypeCon::Gen(id) => write!(f, "c{id}"),
        }
    }
}
