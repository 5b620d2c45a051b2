//! Abstract syntax for the Polydust languages.
//!
//! Two term languages share this module: the implicit source language
//! ([`Term`]), in which binders may omit their types, and the explicit target
//! language ([`FTerm`]), in which every lambda carries its argument type and
//! type abstraction and application are first-class term formers. Inference
//! consumes the former and elaborates into the latter.

use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub mod f_term;
pub mod term_var;

pub use f_term::*;
pub use term_var::*;

/// An integer arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithOp::Add => write!(f, "+"),
            ArithOp::Sub => write!(f, "-"),
            ArithOp::Mul => write!(f, "*"),
            ArithOp::Div => write!(f, "/"),
        }
    }
}

/// A term of the implicit source language.
///
/// Implicit terms are immutable inputs to inference; type annotations on
/// binders and ascriptions are optional polymorphic hints, never
/// requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Term {
    /// A term variable.
    Var(TermVar),

    /// A lambda abstraction with an optional annotation on the bound
    /// variable.
    Lambda {
        param: TermVar,
        annotation: Option<Type>,
        body: Box<Term>,
    },

    /// Function application.
    Apply {
        function: Box<Term>,
        argument: Box<Term>,
    },

    /// A let binding.
    Let {
        name: TermVar,
        value: Box<Term>,
        body: Box<Term>,
    },

    /// A type-ascribed term.
    Annot {
        term: Box<Term>,
        annotation: Type,
    },

    /// A boolean literal.
    Bool(bool),

    /// A conditional.
    If {
        condition: Box<Term>,
        then_branch: Box<Term>,
        else_branch: Box<Term>,
    },

    /// An integer literal.
    Int(i64),

    /// Integer arithmetic.
    Arith {
        op: ArithOp,
        lhs: Box<Term>,
        rhs: Box<Term>,
    },

    /// A list literal; element order is significant.
    List(Vec<Term>),

    /// List concatenation.
    Concat {
        lhs: Box<Term>,
        rhs: Box<Term>,
    },
}

impl Term {
    /// Creates a variable term from a user-supplied name.
    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(TermVar::named(name))
    }

    /// Creates an unannotated lambda.
    pub fn lambda(param: impl Into<String>, body: Term) -> Self {
        Term::Lambda {
            param: TermVar::named(param),
            annotation: None,
            body: Box::new(body),
        }
    }

    /// Creates a lambda with an annotated parameter.
    pub fn lambda_annotated(param: impl Into<String>, annotation: Type, body: Term) -> Self {
        Term::Lambda {
            param: TermVar::named(param),
            annotation: Some(annotation),
            body: Box::new(body),
        }
    }

    /// Creates an application.
    pub fn apply(function: Term, argument: Term) -> Self {
        Term::Apply {
            function: Box::new(function),
            argument: Box::new(argument),
        }
    }

    /// Creates a let binding.
    pub fn let_in(name: impl Into<String>, value: Term, body: Term) -> Self {
        Term::Let {
            name: TermVar::named(name),
            value: Box::new(value),
            body: Box::new(body),
        }
    }

    /// Creates a type ascription.
    pub fn annot(term: Term, annotation: Type) -> Self {
        Term::Annot {
            term: Box::new(term),
            annotation,
        }
    }

    /// Creates a conditional.
    pub fn if_then_else(condition: Term, then_branch: Term, else_branch: Term) -> Self {
        Term::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    /// Creates an arithmetic operation.
    pub fn arith(op: ArithOp, lhs: Term, rhs: Term) -> Self {
        Term::Arith {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Creates a list concatenation.
    pub fn concat(lhs: Term, rhs: Term) -> Self {
        Term::Concat {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
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
            Term::Var(v) => {
                if !bound.contains(v) {
                    vars.insert(v.clone());
                }
            }
            Term::Lambda { param, body, .. } => {
                bound.push(param.clone());
                body.collect_free_vars(vars, bound);
                bound.pop();
            }
            Term::Apply { function, argument } => {
                function.collect_free_vars(vars, bound);
                argument.collect_free_vars(vars, bound);
            }
            Term::Let { name, value, body } => {
                value.collect_free_vars(vars, bound);
                bound.push(name.clone());
                body.collect_free_vars(vars, bound);
                bound.pop();
            }
            Term::Annot { term, .. } => term.collect_free_vars(vars, bound),
            Term::Bool(_) | Term::Int(_) => {}
            Term::If {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.collect_free_vars(vars, bound);
                then_branch.collect_free_vars(vars, bound);
                else_branch.collect_free_vars(vars, bound);
            }
            Term::Arith { lhs, rhs, .. } | Term::Concat { lhs, rhs } => {
                lhs.collect_free_vars(vars, bound);
                rhs.collect_free_vars(vars, bound);
            }
            Term::List(items) => {
                for item in items {
                    item.collect_free_vars(vars, bound);
                }
            }
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, prec: u8) -> fmt::Result {
        let level = self.prec_level();
        if level < prec {
            write!(f, "(")?;
        }
        match self {
            Term::Var(v) => write!(f, "{v}")?,
            Term::Lambda {
                param,
                annotation,
                body,
            } => {
                match annotation {
                    Some(ty) => write!(f, "λ({param} : {ty}). ")?,
                    None => write!(f, "λ{param}. ")?,
                }
                body.fmt_prec(f, 0)?;
            }
            Term::Apply { function, argument } => {
                function.fmt_prec(f, 5)?;
                write!(f, " ")?;
                argument.fmt_prec(f, 6)?;
            }
            Term::Let { name, value, body } => {
                write!(f, "let {name} = ")?;
                value.fmt_prec(f, 1)?;
                write!(f, " in ")?;
                body.fmt_prec(f, 0)?;
            }
            Term::Annot { term, annotation } => {
                term.fmt_prec(f, 2)?;
                write!(f, " : {annotation}")?;
            }
            Term::Bool(b) => write!(f, "{b}")?,
            Term::If {
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
            Term::Int(n) => write!(f, "{n}")?,
            Term::Arith { op, lhs, rhs } => {
                let (left, right) = match op {
                    ArithOp::Add | ArithOp::Sub => (3, 4),
                    ArithOp::Mul | ArithOp::Div => (4, 5),
                };
                lhs.fmt_prec(f, left)?;
                write!(f, " {op} ")?;
                rhs.fmt_prec(f, right)?;
            }
            Term::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_prec(f, 0)?;
                }
                write!(f, "]")?;
            }
            Term::Concat { lhs, rhs } => {
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
            Term::Lambda { .. } | Term::Let { .. } | Term::If { .. } => 0,
            Term::Annot { .. } => 1,
            Term::Concat { .. } => 2,
            Term::Arith { op, .. } => match op {
                ArithOp::Add | ArithOp::Sub => 3,
                ArithOp::Mul | ArithOp::Div => 4,
            },
            Term::Apply { .. } => 5,
            Term::Var(_) | Term::Bool(_) | Term::Int(_) | Term::List(_) => 6,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_vars_respect_binders() {
        // \x. x y
        let term = Term::lambda("x", Term::apply(Term::var("x"), Term::var("y")));
        let free = term.free_vars();
        assert!(free.contains(&TermVar::named("y")));
        assert!(!free.contains(&TermVar::named("x")));
    }

    #[test]
    fn test_let_value_not_in_binder_scope() {
        // let x = x in x : the value occurrence is free
        let term = Term::let_in("x", Term::var("x"), Term::var("x"));
        let free = term.free_vars();
        assert!(free.contains(&TermVar::named("x")));
    }

    #[test]
    fn test_display_lambda() {
        let term = Term::lambda("x", Term::var("x"));
        assert_eq!(term.to_string(), "λx. x");
    }

    #[test]
    fn test_display_application_parenthesizes() {
        let term = Term::apply(Term::lambda("x", Term::var("x")), Term::Int(42));
        assert_eq!(term.to_string(), "(λx. x) 42");
    }

    #[test]
    fn test_display_arithmetic_precedence() {
        let term = Term::arith(
            ArithOp::Mul,
            Term::arith(ArithOp::Add, Term::Int(1), Term::Int(2)),
            Term::Int(3),
        );
        assert_eq!(term.to_string(), "(1 + 2) * 3");
    }
}
