//! A type-preserving simplifier for elaborated terms.
//!
//! Elaboration is deliberately naive: every subsumption instantiates and
//! re-abstracts, and every let becomes an immediate application of a
//! lambda. The simplifier contracts the redexes this leaves behind:
//!
//! - `Λa. e [a]` becomes `e` when `a` is not free in `e`;
//! - `(Λa. e) [t]` becomes `e` with `t` substituted for `a`;
//! - `(λ(x : t). e) v` becomes `e` with `v` substituted for `x`.
//!
//! Every contraction re-simplifies its result, so a single bottom-up pass
//! reaches a normal form and running the simplifier twice changes nothing.

use crate::ast::FTerm;
use crate::types::Type;

/// Simplifies an elaborated term in one bottom-up pass.
pub fn simplify(term: &FTerm) -> FTerm {
    let term = simplify_children(term);
    contract(term)
}

/// Iterates the simplifier to a fixed point.
///
/// One pass suffices for terms produced by inference; the fixed-point loop
/// is the conservative option for arbitrary input.
pub fn simplify_to_fixpoint(term: &FTerm) -> FTerm {
    let mut current = term.clone();
    loop {
        let next = simplify(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn contract(term: FTerm) -> FTerm {
    match term {
        FTerm::TyApp { term, argument } => match *term {
            FTerm::TyAbs { param, body } => simplify(&body.substitute_type_var(&param, &argument)),
            other => FTerm::TyApp {
                term: Box::new(other),
                argument,
            },
        },
        FTerm::TyAbs { param, body } => match *body {
            FTerm::TyApp { term, argument }
                if argument == Type::Var(param.clone())
                    && !term.free_type_vars().contains(&param) =>
            {
                *term
            }
            other => FTerm::TyAbs {
                param,
                body: Box::new(other),
            },
        },
        FTerm::Apply { function, argument } => match *function {
            FTerm::Lambda { param, body, .. } => simplify(&body.substitute(&param, &argument)),
            other => FTerm::Apply {
                function: Box::new(other),
                argument,
            },
        },
        other => other,
    }
}

fn simplify_children(term: &FTerm) -> FTerm {
    match term {
        FTerm::Var(_) | FTerm::Bool(_) | FTerm::Int(_) => term.clone(),
        FTerm::Lambda {
            param,
            param_type,
            body,
        } => FTerm::Lambda {
            param: param.clone(),
            param_type: param_type.clone(),
            body: Box::new(simplify(body)),
        },
        FTerm::Apply { function, argument } => FTerm::Apply {
            function: Box::new(simplify(function)),
            argument: Box::new(simplify(argument)),
        },
        FTerm::Let { name, value, body } => FTerm::Let {
            name: name.clone(),
            value: Box::new(simplify(value)),
            body: Box::new(simplify(body)),
        },
        FTerm::Annot { term, annotation } => FTerm::Annot {
            term: Box::new(simplify(term)),
            annotation: annotation.clone(),
        },
        FTerm::TyAbs { param, body } => FTerm::TyAbs {
            param: param.clone(),
            body: Box::new(simplify(body)),
        },
        FTerm::TyApp { term, argument } => FTerm::TyApp {
            term: Box::new(simplify(term)),
            argument: argument.clone(),
        },
        FTerm::If {
            condition,
            then_branch,
            else_branch,
        } => FTerm::If {
            condition: Box::new(simplify(condition)),
            then_branch: Box::new(simplify(then_branch)),
            else_branch: Box::new(simplify(else_branch)),
        },
        FTerm::Arith { op, lhs, rhs } => FTerm::Arith {
            op: *op,
            lhs: Box::new(simplify(lhs)),
            rhs: Box::new(simplify(rhs)),
        },
        FTerm::List(items) => FTerm::List(items.iter().map(simplify).collect()),
        FTerm::Concat { lhs, rhs } => FTerm::Concat {
            lhs: Box::new(simplify(lhs)),
            rhs: Box::new(simplify(rhs)),
        },
    }
}
