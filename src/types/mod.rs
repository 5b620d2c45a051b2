//! The type model and inference engine for Polydust.
//!
//! Types form a small inductive family: variables, saturated constructor
//! applications, and universal quantification. The function arrow is the
//! binary `Arrow` constructor, so every compound type is uniformly a
//! constructor applied to its arguments. Quantifiers may appear anywhere,
//! which is what makes the calculus higher rank.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod inference;
pub mod substitution;
pub mod subsumption;
pub mod type_checker;
pub mod type_constructor;
pub mod type_var;
pub mod unification;

pub use inference::*;
pub use substitution::*;
pub use type_checker::*;
pub use type_constructor::*;
pub use type_var::*;

/// A type in the Polydust type system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// A type variable.
    Var(TypeVar),
    /// A type constructor applied to exactly as many arguments as its
    /// declared arity.
    Con(TypeCon, Vec<Type>),
    /// Universal quantification binding a variable in the body.
    ForAll(TypeVar, Box<Type>),
}

impl Type {
    /// The boolean type.
    pub fn bool() -> Self {
        Type::Con(TypeCon::bool(), Vec::new())
    }

    /// The integer type.
    pub fn int() -> Self {
        Type::Con(TypeCon::int(), Vec::new())
    }

    /// A list type.
    pub fn list(element: Type) -> Self {
        Type::Con(TypeCon::list(), vec![element])
    }

    /// A function type.
    pub fn arrow(domain: Type, codomain: Type) -> Self {
        Type::Con(TypeCon::arrow(), vec![domain, codomain])
    }

    /// A universal quantification.
    pub fn forall(var: TypeVar, body: Type) -> Self {
        Type::ForAll(var, Box::new(body))
    }

    /// A named type variable.
    pub fn named_var(name: impl Into<String>) -> Self {
        Type::Var(TypeVar::named(name))
    }

    /// Returns true if this type is a universal quantification.
    pub fn is_polymorphic(&self) -> bool {
        matches!(self, Type::ForAll(_, _))
    }

    /// Splits a function type into domain and codomain.
    pub fn split_arrow(&self) -> Option<(&Type, &Type)> {
        match self {
            Type::Con(con, args) if *con == TypeCon::arrow() && args.len() == 2 => {
                Some((&args[0], &args[1]))
            }
            _ => None,
        }
    }

    /// Returns true if this type contains the given variable free.
    pub fn contains_var(&self, var: &TypeVar) -> bool {
        match self {
            Type::Var(v) => v == var,
            Type::Con(_, args) => args.iter().any(|arg| arg.contains_var(var)),
            Type::ForAll(v, body) => v != var && body.contains_var(var),
        }
    }

    /// Gets the free type variables of this type, deduplicated in order of
    /// first occurrence.
    pub fn free_vars(&self) -> Vec<TypeVar> {
        let mut vars = Vec::new();
        self.collect_free_vars(&mut vars, &mut Vec::new());
        vars
    }

    pub(crate) fn collect_free_vars(&self, vars: &mut Vec<TypeVar>, bound: &mut Vec<TypeVar>) {
        match self {
            Type::Var(v) => {
                if !bound.contains(v) && !vars.contains(v) {
                    vars.push(v.clone());
                }
            }
            Type::Con(_, args) => {
                for arg in args {
                    arg.collect_free_vars(vars, bound);
                }
            }
            Type::ForAll(v, body) => {
                bound.push(v.clone());
                body.collect_free_vars(vars, bound);
                bound.pop();
            }
        }
    }

    /// Returns true if the given constructor occurs anywhere in this type.
    pub fn mentions_con(&self, con: &TypeCon) -> bool {
        match self {
            Type::Var(_) => false,
            Type::Con(c, args) => c == con || args.iter().any(|arg| arg.mentions_con(con)),
            Type::ForAll(_, body) => body.mentions_con(con),
        }
    }

    /// Returns true if any generated (rigid) constructor occurs in this
    /// type. Rigid constructors are internal to unification and subsumption
    /// and must never appear in a result.
    pub fn mentions_rigid_con(&self) -> bool {
        match self {
            Type::Var(_) => false,
            Type::Con(con, args) => {
                con.is_rigid() || args.iter().any(Type::mentions_rigid_con)
            }
            Type::ForAll(_, body) => body.mentions_rigid_con(),
        }
    }

    /// Replaces every occurrence of a nullary constructor with a type.
    pub fn replace_con(&self, con: &TypeCon, replacement: &Type) -> Type {
        match self {
            Type::Var(_) => self.clone(),
            Type::Con(c, args) if c == con && args.is_empty() => replacement.clone(),
            Type::Con(c, args) => Type::Con(
                c.clone(),
                args.iter()
                    .map(|arg| arg.replace_con(con, replacement))
                    .collect(),
            ),
            Type::ForAll(v, body) => {
                Type::forall(v.clone(), body.replace_con(con, replacement))
            }
        }
    }

    /// Capture-avoiding substitution of a type for a free type variable.
    pub fn substitute(&self, var: &TypeVar, replacement: &Type) -> Type {
        let mut supply = self.max_gen_id().max(replacement.max_gen_id()) + 1;
        self.substitute_inner(var, replacement, &mut supply)
    }

    fn substitute_inner(&self, var: &TypeVar, replacement: &Type, supply: &mut u64) -> Type {
        match self {
            Type::Var(v) => {
                if v == var {
                    replacement.clone()
                } else {
                    self.clone()
                }
            }
            Type::Con(c, args) => Type::Con(
                c.clone(),
                args.iter()
                    .map(|arg| arg.substitute_inner(var, replacement, supply))
                    .collect(),
            ),
            Type::ForAll(v, body) => {
                if v == var {
                    return self.clone();
                }
                if replacement.contains_var(v) {
                    let fresh = TypeVar::Gen(*supply);
                    *supply += 1;
                    let renamed = body.substitute_inner(v, &Type::Var(fresh.clone()), supply);
                    Type::forall(fresh, renamed.substitute_inner(var, replacement, supply))
                } else {
                    Type::forall(v.clone(), body.substitute_inner(var, replacement, supply))
                }
            }
        }
    }

    /// Strips the outer quantifiers, returning the binders outermost first
    /// and the quantifier-free body.
    pub fn peel_foralls(&self) -> (Vec<TypeVar>, Type) {
        let mut vars = Vec::new();
        let mut body = self;
        while let Type::ForAll(v, inner) = body {
            vars.push(v.clone());
            body = inner.as_ref();
        }
        (vars, body.clone())
    }

    /// Compares two types up to renaming of quantified variables.
    pub fn alpha_eq(&self, other: &Type) -> bool {
        fn go(left: &Type, right: &Type, binders: &mut Vec<(TypeVar, TypeVar)>) -> bool {
            match (left, right) {
                (Type::Var(a), Type::Var(b)) => {
                    for (l, r) in binders.iter().rev() {
                        match (l == a, r == b) {
                            (true, true) => return true,
                            (false, false) => continue,
                            _ => return false,
                        }
                    }
                    a == b
                }
                (Type::Con(c1, args1), Type::Con(c2, args2)) => {
                    c1 == c2
                        && args1.len() == args2.len()
                        && args1
                            .iter()
                            .zip(args2.iter())
                            .all(|(a, b)| go(a, b, binders))
                }
                (Type::ForAll(a, body1), Type::ForAll(b, body2)) => {
                    binders.push((a.clone(), b.clone()));
                    let eq = go(body1, body2, binders);
                    binders.pop();
                    eq
                }
                _ => false,
            }
        }
        go(self, other, &mut Vec::new())
    }

    fn max_gen_id(&self) -> u64 {
        match self {
            Type::Var(TypeVar::Gen(id)) => id + 1,
            Type::Var(TypeVar::Named(_)) => 0,
            Type::Con(_, args) => args.iter().map(Type::max_gen_id).max().unwrap_or(0),
            Type::ForAll(v, body) => {
                let bound = match v {
                    TypeVar::Gen(id) => id + 1,
                    TypeVar::Named(_) => 0,
                };
                bound.max(body.max_gen_id())
            }
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, prec: u8) -> fmt::Result {
        let level = self.prec_level();
        if level < prec {
            write!(f, "(")?;
        }
        match self {
            Type::Var(v) => write!(f, "{v}")?,
            Type::Con(con, args) => {
                if let Some((domain, codomain)) = self.split_arrow() {
                    domain.fmt_prec(f, 2)?;
                    write!(f, " -> ")?;
                    codomain.fmt_prec(f, 1)?;
                } else {
                    write!(f, "{con}")?;
                    for arg in args {
                        write!(f, " ")?;
                        arg.fmt_prec(f, 3)?;
                    }
                }
            }
            Type::ForAll(v, body) => {
                write!(f, "∀{v}. ")?;
                body.fmt_prec(f, 0)?;
            }
        }
        if level < prec {
            write!(f, ")")?;
        }
        Ok(())
    }

    fn prec_level(&self) -> u8 {
        match self {
            Type::ForAll(_, _) => 0,
            Type::Con(_, args) => {
                if self.split_arrow().is_some() {
                    1
                } else if args.is_empty() {
                    3
                } else {
                    2
                }
            }
            Type::Var(_) => 3,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}
