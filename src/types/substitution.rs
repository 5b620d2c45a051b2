//! Type-variable substitutions.
//!
//! A substitution is a finite mapping from type variables to types kept in
//! idempotent form: its domain and the free variables of its codomain are
//! disjoint, so applying it twice equals applying it once. Every constructor
//! of a non-empty substitution asserts this invariant; a violation is a bug
//! in the engine, not a recoverable error.

use super::{Type, TypeCon, TypeVar};
use crate::ast::FTerm;
use std::collections::HashMap;
use std::fmt;

/// An idempotent mapping from type variables to types.
///
/// Substitutions are composed during unification to solve type equations.
/// Composition is associative but not commutative.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Substitution {
    mapping: HashMap<TypeVar, Type>,
}

impl Substitution {
    /// Creates the empty (identity) substitution.
    pub fn empty() -> Self {
        Self {
            mapping: HashMap::new(),
        }
    }

    /// Creates a substitution with a single binding.
    ///
    /// The variable must not occur free in the type; callers establish this
    /// with the occurs check before binding.
    pub fn single(var: TypeVar, ty: Type) -> Self {
        assert!(
            !ty.contains_var(&var),
            "internal error: binding {var} to {ty} would not be idempotent"
        );
        let mut mapping = HashMap::new();
        mapping.insert(var, ty);
        Self { mapping }
    }

    /// Creates a substitution from a list of bindings.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (TypeVar, Type)>) -> Self {
        let subst = Self {
            mapping: pairs.into_iter().collect(),
        };
        subst.assert_idempotent();
        subst
    }

    /// Returns true if this is the identity substitution.
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Gets the binding for a variable, if any.
    pub fn get(&self, var: &TypeVar) -> Option<&Type> {
        self.mapping.get(var)
    }

    /// Gets the domain of this substitution.
    pub fn domain(&self) -> Vec<TypeVar> {
        let mut vars: Vec<_> = self.mapping.keys().cloned().collect();
        vars.sort();
        vars
    }

    /// Returns true if the given constructor occurs in the codomain.
    pub fn mentions_con(&self, con: &TypeCon) -> bool {
        self.mapping.values().any(|ty| ty.mentions_con(con))
    }

    /// Applies this substitution to a type.
    pub fn apply_to_type(&self, ty: &Type) -> Type {
        // Idempotence makes the bindings independent, so a sequence of
        // capture-avoiding single substitutions in any fixed order computes
        // the simultaneous substitution.
        let mut result = ty.clone();
        for (var, replacement) in self.sorted_pairs() {
            result = result.substitute(var, replacement);
        }
        result
    }

    /// Applies this substitution to every type embedded in an explicit term.
    ///
    /// Implicit terms are deliberately not substitutable: type variables in
    /// their annotations are implicitly existentially bound, not free.
    pub fn apply_to_fterm(&self, term: &FTerm) -> FTerm {
        term.map_types(&mut |ty, bound| {
            if bound.iter().any(|v| self.mapping.contains_key(v)) {
                self.removing(bound).apply_to_type(ty)
            } else {
                self.apply_to_type(ty)
            }
        })
    }

    /// Diagrammatic composition: the substitution that behaves like `self`
    /// followed by `other`.
    ///
    /// The domain is the union of both domains; on overlap `other`'s
    /// bindings win.
    pub fn then(&self, other: &Substitution) -> Substitution {
        let mut mapping = HashMap::new();
        for (var, ty) in &self.mapping {
            mapping.insert(var.clone(), other.apply_to_type(ty));
        }
        for (var, ty) in &other.mapping {
            mapping.insert(var.clone(), ty.clone());
        }
        let composed = Substitution { mapping };
        composed.assert_idempotent();
        composed
    }

    /// Restricts this substitution to the complement of the given variables.
    pub fn removing(&self, vars: &[TypeVar]) -> Substitution {
        let mapping = self
            .mapping
            .iter()
            .filter(|(var, _)| !vars.contains(var))
            .map(|(var, ty)| (var.clone(), ty.clone()))
            .collect();
        Substitution { mapping }
    }

    /// Checks the idempotence invariant: the domain must be disjoint from
    /// the free variables of the codomain.
    pub fn is_idempotent(&self) -> bool {
        self.mapping
            .values()
            .all(|ty| ty.free_vars().iter().all(|v| !self.mapping.contains_key(v)))
    }

    fn assert_idempotent(&self) {
        assert!(
            self.is_idempotent(),
            "internal error: non-idempotent substitution {self}"
        );
    }

    fn sorted_pairs(&self) -> Vec<(&TypeVar, &Type)> {
        let mut pairs: Vec<_> = self.mapping.iter().collect();
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
        pairs
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mapping.is_empty() {
            return write!(f, "∅");
        }
        write!(f, "[")?;
        for (i, (var, ty)) in self.sorted_pairs().into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{var} ↦ {ty}")?;
        }
        write!(f, "]")
    }
}

/// Extension trait for applying substitutions to various structures.
pub trait Substitutable {
    /// Applies a substitution to this value.
    fn apply_substitution(&self, subst: &Substitution) -> Self;
}

impl Substitutable for Type {
    fn apply_substitution(&self, subst: &Substitution) -> Self {
        subst.apply_to_type(self)
    }
}

impl Substitutable for FTerm {
    fn apply_substitution(&self, subst: &Substitution) -> Self {
        subst.apply_to_fterm(self)
    }
}

impl<T: Substitutable> Substitutable for Vec<T> {
    fn apply_substitution(&self, subst: &Substitution) -> Self {
        self.iter().map(|x| x.apply_substitution(subst)).collect()
    }
}

impl<T: Substitutable> Substitutable for Option<T> {
    fn apply_substitution(&self, subst: &Substitution) -> Self {
        self.as_ref().map(|x| x.apply_substitution(subst))
    }
}
