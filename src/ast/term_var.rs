use serde::{Deserialize, Serialize};
use std::fmt;

/// A term-variable name.
///
/// Names are either user-supplied strings or generated from the fresh-name
/// counter of an inference run. The two origins are disjoint: `Named("x0")`
/// and `Gen(0)` are different names, and generated names never collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TermVar {
    /// A user-supplied name.
    Named(String),
    /// A generated name.
    Gen(u64),
}

impl TermVar {
    /// Creates a user-supplied name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Returns true if this name came from the user.
    pub fn is_named(&self) -> bool {
        matches!(self, Self::Named(_))
    }
}

impl fmt::Display for TermVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermVar::Named(name) => write!(f, "{name}"),
            TermVar::Gen(id) => write!(f, "x{id}"),
        }
    }
}
