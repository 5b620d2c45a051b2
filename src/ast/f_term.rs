//! The explicit target language produced by elaboration.
//!
//! Explicit terms carry a mandatory type on every lambda parameter and make
//! polymorphism syntactic through type abstraction ([`FTerm::TyAbs`]) and
//! type application ([`FTerm::TyApp`]).

use super::{ArithOp, TermVar};
use crate::types::{Type, TypeCon, TypeVar};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A term of the explicit target language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FTerm {
    /// A term variable.
    Var(TermVar),

    /// A lambda abstraction; the argument type is mandatory.
    Lambda {
        param: TermVar,
        param_type: Type,
        body: Box<FTerm>,
    },

    /// Function application.
    Apply {
        function: Box<FTerm>,
        argument: Box<FTerm>,
    },

    /// A let binding.
    Let {
        name: TermVar,
        value: Box<FTerm>,
        body: Box<FTerm>,
    },

    /// A type-ascribed term.
    Annot {
        term: Box<FTerm>,
        annotation: Type,
    },

    /// Type abstraction, binding a type variable in the body.
    TyAbs {
        param: TypeVar,
        body: Box<FTerm>,
    },

    /// Type application.
    TyApp {
        term: Box<FTerm>,
        argument: Type,
    },

    /// A boolean literal.
    Bool(bool),

    /// A conditional.
    If {
        condition: Box<FTerm>,
        then_branch: Box<FTerm>,
        else_branch: Box<FTerm>,
    },

    /// An integer literal.
    Int(i64),

    /// Integer arithmetic.
    Arith {
        op: ArithOp,
        lhs: Box<FTerm>,
        rhs: Box<FTerm>,
    },

    /// A list literal; element order is significant.
    List(Vec<FTerm>),

    /// List concatenation.
    Concat {
        lhs: Box<FTerm>,
        rhs: Box<FTerm>,
    },
}

impl FTerm {
    /// Creates a lambda abstraction.
    pub fn lambda(param: TermVar, param_type: Type, body: FTerm) -> Self {
        FTerm::Lambda {
            param,
            param_type,
            body: Box::new(body),
        }
    }

    /// Creates an application.
    pub fn apply(function: FTerm, argument: FTerm) -> Self {
        FTerm::Apply {
            function: Box::new(function),
            argument: Box::new(argument),
        }
    }

    /// Creates a type abstraction.
    pub fn ty_abs(param: TypeVar, body: FTerm) -> Self {
        FTerm::TyAbs {
            param,
            body: Box::new(body),
        }
    }

    /// Creates a type application.
    pub fn ty_app(term: FTerm, argument: Type) -> Self {
        FTerm::TyApp {
            term: Box::new(term),
            argument,
        }
    }

    /// Gets all free term variables in this term.
    pub fn free_vars(&self) -> HashSet<TermVar> {
        let mut vars = HashSet::new();
        self.collect_free_vars(&mut vars, &mut Vec::new());
        vars
    }

    fn collect_free_vars(&self, vars: &mut HashSet<TermVar>, bound: &mut Vec<TermVar>) {
        match self {
            FTerm::Var(v) => {
                if !bound.contains(v) {
                    vars.insert(v.clone());
                }
            }
            FTerm::Lambda { param, body, .. } => {
                bound.push(param.clone());
                body.collect_free_vars(vars, bound);
                bound.pop();
            }
            FTerm::Apply { function, argument } => {
                function.collect_free_vars(vars, bound);
                argument.collect_free_vars(vars, bound);
            }
            FTerm::Let { name, value, body } => {
                value.collect_free_vars(vars, bound);
                bound.push(name.clone());
                body.collect_free_vars(vars, bound);
                bound.pop();
            }
            FTerm::Annot { term, .. } => term.collect_free_vars(vars, bound),
            FTerm::TyAbs { body, .. } => body.collect_free_vars(vars, bound),
            FTerm::TyApp { term, .. } => term.collect_free_vars(vars, bound),
            FTerm::Bool(_) | FTerm::Int(_) => {}
            FTerm::If {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.collect_free_vars(vars, bound);
                then_branch.collect_free_vars(vars, bound);
                else_branch.collect_free_vars(vars, bound);
            }
            FTerm::Arith { lhs, rhs, .. } | FTerm::Concat { lhs, rhs } => {
                lhs.collect_free_vars(vars, bound);
                rhs.collect_free_vars(vars, bound);
            }
            FTerm::List(items) => {
                for item in items {
                    item.collect_free_vars(vars, bound);
                }
            }
        }
    }

    /// Gets the free type variables of this term, deduplicated in order of
    /// first occurrence.
    pub fn free_type_vars(&self) -> Vec<TypeVar> {
        let mut vars = Vec::new();
        self.collect_free_type_vars(&mut vars, &mut Vec::new());
        vars
    }

    fn collect_free_type_vars(&self, vars: &mut Vec<TypeVar>, bound: &mut Vec<TypeVar>) {
        match self {
            FTerm::Var(_) | FTerm::Bool(_) | FTerm::Int(_) => {}
            FTerm::Lambda {
                param_type, body, ..
            } => {
                param_type.collect_free_vars(vars, bound);
                body.collect_free_type_vars(vars, bound);
            }
            FTerm::Apply { function, argument } => {
                function.collect_free_type_vars(vars, bound);
                argument.collect_free_type_vars(vars, bound);
            }
            FTerm::Let { value, body, .. } => {
                value.collect_free_type_vars(vars, bound);
                body.collect_free_type_vars(vars, bound);
            }
            FTerm::Annot { term, annotation } => {
                term.collect_free_type_vars(vars, bound);
                annotation.collect_free_vars(vars, bound);
            }
            FTerm::TyAbs { param, body } => {
                bound.push(param.clone());
                body.collect_free_type_vars(vars, bound);
                bound.pop();
            }
            FTerm::TyApp { term, argument } => {
                term.collect_free_type_vars(vars, bound);
                argument.collect_free_vars(vars, bound);
            }
            FTerm::If {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.collect_free_type_vars(vars, bound);
                then_branch.collect_free_type_vars(vars, bound);
                else_branch.collect_free_type_vars(vars, bound);
            }
            FTerm::Arith { lhs, rhs, .. } | FTerm::Concat { lhs, rhs } => {
                lhs.collect_free_type_vars(vars, bound);
                rhs.collect_free_type_vars(vars, bound);
            }
            FTerm::List(items) => {
                for item in items {
                    item.collect_free_type_vars(vars, bound);
                }
            }
        }
    }

    /// Returns true if the given constructor occurs in any embedded type.
    pub fn mentions_con(&self, con: &TypeCon) -> bool {
        self.any_type(&mut |ty| ty.mentions_con(con))
    }

    /// Returns true if any embedded type mentions a generated (rigid)
    /// constructor.
    pub fn mentions_rigid_con(&self) -> bool {
        self.any_type(&mut |ty| ty.mentions_rigid_con())
    }

    fn any_type(&self, pred: &mut impl FnMut(&Type) -> bool) -> bool {
        match self {
            FTerm::Var(_) | FTerm::Bool(_) | FTerm::Int(_) => false,
            FTerm::Lambda {
                param_type, body, ..
            } => pred(param_type) || body.any_type(pred),
            FTerm::Apply { function, argument } => {
                function.any_type(pred) || argument.any_type(pred)
            }
            FTerm::Let { value, body, .. } => value.any_type(pred) || body.any_type(pred),
            FTerm::Annot { term, annotation } => pred(annotation) || term.any_type(pred),
            FTerm::TyAbs { body, .. } => body.any_type(pred),
            FTerm::TyApp { term, argument } => pred(argument) || term.any_type(pred),
            FTerm::If {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.any_type(pred)
                    || then_branch.any_type(pred)
                    || else_branch.any_type(pred)
            }
            FTerm::Arith { lhs, rhs, .. } | FTerm::Concat { lhs, rhs } => {
                lhs.any_type(pred) || rhs.any_type(pred)
            }
            FTerm::List(items) => items.iter().any(|item| item.any_type(pred)),
        }
    }

    /// Rewrites every embedded type with the given function.
    ///
    /// The function is responsible for its own binder hygiene; it receives
    /// the list of type variables bound by enclosing type abstractions.
    pub(crate) fn map_types(&self, f: &mut impl FnMut(&Type, &[TypeVar]) -> Type) -> FTerm {
        self.map_types_under(f, &mut Vec::new())
    }

    fn map_types_under(
        &self,
        f: &mut impl FnMut(&Type, &[TypeVar]) -> Type,
        bound: &mut Vec<TypeVar>,
    ) -> FTerm {
        match self {
            FTerm::Var(v) => FTerm::Var(v.clone()),
            FTerm::Lambda {
                param,
                param_type,
                body,
            } => FTerm::Lambda {
                param: param.clone(),
                param_type: f(param_type, bound),
                body: Box::new(body.map_types_under(f, bound)),
            },
            FTerm::Apply { function, argument } => FTerm::Apply {
                function: Box::new(function.map_types_under(f, bound)),
                argument: Box::new(argument.map_types_under(f, bound)),
            },
            FTerm::Let { name, value, body } => FTerm::Let {
                name: name.clone(),
                value: Box::new(value.map_types_under(f, bound)),
                body: Box::new(body.map_types_under(f, bound)),
            },
            FTerm::Annot { term, annotation } => FTerm::Annot {
                term: Box::new(term.map_types_under(f, bound)),
                annotation: f(annotation, bound),
            },
            FTerm::TyAbs { param, body } => {
                bound.push(param.clone());
                let body = body.map_types_under(f, bound);
                bound.pop();
                FTerm::TyAbs {
                    param: param.clone(),
                    body: Box::new(body),
                }
            }
            FTerm::TyApp { term, argument } => FTerm::TyApp {
                term: Box::new(term.map_types_under(f, bound)),
                argument: f(argument, bound),
            },
            FTerm::Bool(b) => FTerm::Bool(*b),
            FTerm::If {
                condition,
                then_branch,
                else_branch,
            } => FTerm::If {
                condition: Box::new(condition.map_types_under(f, bound)),
                then_branch: Box::new(then_branch.map_types_under(f, bound)),
                else_branch: Box::new(else_branch.map_types_under(f, bound)),
            },
            FTerm::Int(n) => FTerm::Int(*n),
            FTerm::Arith { op, lhs, rhs } => FTerm::Arith {
                op: *op,
                lhs: Box::new(lhs.map_types_under(f, bound)),
                rhs: Box::new(rhs.map_types_under(f, bound)),
            },
            FTerm::List(items) => FTerm::List(
                items
                    .iter()
                    .map(|item| item.map_types_under(f, bound))
                    .collect(),
            ),
            FTerm::Concat { lhs, rhs } => FTerm::Concat {
                lhs: Box::new(lhs.map_types_under(f, bound)),
                rhs: Box::new(rhs.map_types_under(f, bound)),
            },
        }
    }

    /// Substitutes a type for a type variable in every embedded type,
    /// avoiding capture by enclosing type abstractions.
    pub fn substitute_type_var(&self, var: &TypeVar, replacement: &Type) -> FTerm {
        self.map_types(&mut |ty, bound| {
            if bound.contains(var) {
                ty.clone()
            } else {
                ty.substitute(var, replacement)
            }
        })
    }

    /// Replaces every occurrence of a nullary constructor in embedded types.
    pub fn replace_con(&self, con: &TypeCon, replacement: &Type) -> FTerm {
        self.map_types(&mut |ty, _| ty.replace_con(con, replacement))
    }

    /// Capture-avoiding substitution of a term for a term variable.
    pub fn substitute(&self, var: &TermVar, replacement: &FTerm) -> FTerm {
        let mut supply = self.max_gen_id().max(replacement.max_gen_id()) + 1;
        self.substitute_inner(var, replacement, &mut supply)
    }

    fn substitute_inner(&self, var: &TermVar, replacement: &FTerm, supply: &mut u64) -> FTerm {
        match self {
            FTerm::Var(v) => {
                if v == var {
                    replacement.clone()
                } else {
                    self.clone()
                }
            }
            FTerm::Lambda {
                param,
                param_type,
                body,
            } => {
                if param == var {
                    return self.clone();
                }
                let (param, body) = rename_if_captured(param, body, replacement, supply);
                FTerm::Lambda {
                    param,
                    param_type: param_type.clone(),
                    body: Box::new(body.substitute_inner(var, replacement, supply)),
                }
            }
            FTerm::Apply { function, argument } => FTerm::Apply {
                function: Box::new(function.substitute_inner(var, replacement, supply)),
                argument: Box::new(argument.substitute_inner(var, replacement, supply)),
            },
            FTerm::Let { name, value, body } => {
                let value = value.substitute_inner(var, replacement, supply);
                if name == var {
                    return FTerm::Let {
                        name: name.clone(),
                        value: Box::new(value),
                        body: body.clone(),
                    };
                }
                let (name, body) = rename_if_captured(name, body, replacement, supply);
                FTerm::Let {
                    name,
                    value: Box::new(value),
                    body: Box::new(body.substitute_inner(var, replacement, supply)),
                }
            }
            FTerm::Annot { term, annotation } => FTerm::Annot {
                term: Box::new(term.substitute_inner(var, replacement, supply)),
                annotation: annotation.clone(),
            },
            FTerm::TyAbs { param, body } => FTerm::TyAbs {
                param: param.clone(),
                body: Box::new(body.substitute_inner(var, replacement, supply)),
            },
            FTerm::TyApp { term, argument } => FTerm::TyApp {
                term: Box::new(term.substitute_inner(var, replacement, supply)),
                argument: argument.clone(),
            },
            FTerm::Bool(_) | FTerm::Int(_) => self.clone(),
            FTerm::If {
                condition,
                then_branch,
                else_branch,
            } => FTerm::If {
                condition: Box::new(condition.substitute_inner(var, replacement, supply)),
                then_branch: Box::new(then_branch.substitute_inner(var, replacement, supply)),
                else_branch: Box::new(else_branch.substitute_inner(var, replacement, supply)),
            },
            FTerm::Arith { op, lhs, rhs } => FTerm::Arith {
                op: *op,
                lhs: Box::new(lhs.substitute_inner(var, replacement, supply)),
                rhs: Box::new(rhs.substitute_inner(var, replacement, supply)),
            },
            FTerm::List(items) => FTerm::List(
                items
                    .iter()
                    .map(|item| item.substitute_inner(var, replacement, supply))
                    .collect(),
            ),
            FTerm::Concat { lhs, rhs } => FTerm::Concat {
                lhs: Box::new(lhs.substitute_inner(var, replacement, supply)),
                rhs: Box::new(rhs.substitute_inner(var, replacement, supply)),
            },
        }
    }

    fn max_gen_id(&self) -> u64 {
        let mut max = 0;
        self.visit_term_vars(&mut |v| {
            if let TermVar::Gen(id) = v {
                max = max.max(id + 1);
            }
        });
        max
    }

    fn visit_term_vars(&self, f: &mut impl FnMut(&TermVar)) {
        match self {
            FTerm::Var(v) => f(v),
            FTerm::Lambda { param, body, .. } => {
                f(param);
                body.visit_term_vars(f);
            }
            FTerm::Let { name, value, body } => {
                f(name);
                value.visit_term_vars(f);
                body.visit_term_vars(f);
            }
            FTerm::Apply { function, argument } => {
                function.visit_term_vars(f);
                argument.visit_term_vars(f);
            }
            FTerm::Annot { term, .. }
            | FTerm::TyAbs { body: term, .. }
            | FTerm::TyApp { term, .. } => term.visit_term_vars(f),
            FTerm::If {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.visit_term_vars(f);
                then_branch.visit_term_vars(f);
                else_branch.visit_term_vars(f);
            }
            FTerm::Arith { lhs, rhs, .. } | FTerm::Concat { lhs, rhs } => {
                lhs.visit_term_vars(f);
                rhs.visit_term_vars(f);
            }
            FTerm::List(items) => {
                for item in items {
                    item.visit_term_vars(f);
                }
            }
            FTerm::Bool(_) | FTerm::Int(_) => {}
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, prec: u8) -> fmt::Result {
        let level = self.prec_level();
        if level < prec {
            write!(f, "(")?;
        }
        match self {
            FTerm::Var(v) => write!(f, "{v}")?,
            FTerm::Lambda {
                param,
                param_type,
                body,
            } => {
                write!(f, "λ({param} : {param_type}). ")?;
                body.fmt_prec(f, 0)?;
            }
            FTerm::Apply { function, argument } => {
                function.fmt_prec(f, 5)?;
                write!(f, " ")?;
                argument.fmt_prec(f, 6)?;
            }
            FTerm::Let { name, value, body } => {
                write!(f, "let {name} = ")?;
                value.fmt_prec(f, 1)?;
                write!(f, " in ")?;
                body.fmt_prec(f, 0)?;
            }
            FTerm::Annot { term, annotation } => {
                term.fmt_prec(f, 2)?;
                write!(f, " : {annotation}")?;
            }
            FTerm::TyAbs { param, body } => {
                write!(f, "Λ{param}. ")?;
                body.fmt_prec(f, 0)?;
            }
            FTerm::TyApp { term, argument } => {
                term.fmt_prec(f, 5)?;
                write!(f, " [{argument}]")?;
            }
            FTerm::Bool(b) => write!(f, "{b}")?,
            FTerm::If {
                condition,
                then_branch,
                else_branch,
            } => {
                write!(f, "if ")?;
                condition.fmt_prec(f, 1)?;
                write!(f, " then ")?;
                then_branch.fmt_prec(f, 1)?;
                write!(f, " else ")?;
                else_branch.fmt_prec(f, 0)?;
            }
            FTerm::Int(n) => write!(f, "{n}")?,
            FTerm::Arith { op, lhs, rhs } => {
                let (left, right) = match op {
                    ArithOp::Add | ArithOp::Sub => (3, 4),
                    ArithOp::Mul | ArithOp::Div => (4, 5),
                };
                lhs.fmt_prec(f, left)?;
                write!(f, " {op} ")?;
                rhs.fmt_prec(f, right)?;
            }
            FTerm::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_prec(f, 0)?;
                }
                write!(f, "]")?;
            }
            FTerm::Concat { lhs, rhs } => {
                lhs.fmt_prec(f, 3)?;
                write!(f, " ++ ")?;
                rhs.fmt_prec(f, 2)?;
            }
        }
        if level < prec {
            write!(f, ")")?;
        }
        Ok(())
    }

    fn prec_level(&self) -> u8 {
        match self {
            FTerm::Lambda { .. } | FTerm::Let { .. } | FTerm::If { .. } | FTerm::TyAbs { .. } => 0,
            FTerm::Annot { .. } => 1,
            FTerm::Concat { .. } => 2,
            FTerm::Arith { op, .. } => match op {
                ArithOp::Add | ArithOp::Sub => 3,
                ArithOp::Mul | ArithOp::Div => 4,
            },
            FTerm::Apply { .. } | FTerm::TyApp { .. } => 5,
            FTerm::Var(_) | FTerm::Bool(_) | FTerm::Int(_) | FTerm::List(_) => 6,
        }
    }
}

fn rename_if_captured(
    binder: &TermVar,
    body: &FTerm,
    replacement: &FTerm,
    supply: &mut u64,
) -> (TermVar, FTerm) {
    if replacement.free_vars().contains(binder) {
        let fresh = TermVar::Gen(*supply);
        *supply += 1;
        let renamed = body.substitute_inner(binder, &FTerm::Var(fresh.clone()), supply);
        (fresh, renamed)
    } else {
        (binder.clone(), body.clone())
    }
}

impl fmt::Display for FTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}
