use serde::{Deserialize, Serialize};
use std::fmt;

/// A type-variable name.
///
/// Names are either user-supplied (from annotations) or generated from the
/// fresh-name counter of an inference run. Generated names never collide
/// with each other or with user names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypeVar {
    /// A user-supplied name.
    Named(String),
    /// A generated name.
    Gen(u64),
}

impl TypeVar {
    /// Creates a user-supplied name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl fmt::Display for TypeVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeVar::Named(name) => write!(f, "{name}"),
            TypeVar::Gen(id) => write!(f, "t{id}"),
        }
    }
}
