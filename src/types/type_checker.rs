//! Type checking for the explicit target language.
//!
//! Elaborated terms carry enough annotations to be checked without
//! inference, so this checker is a direct reading of the explicit typing
//! rules: it checks against an expected type where one is available and
//! synthesizes everywhere else. Comparison is up to alpha-equivalence.
//!
//! The one indeterminate form is a bare empty list literal, whose element
//! type is unconstrained; synthesis gives it an element hole that is
//! resolved by matching against the surrounding expectations.

use super::{Type, TypeCon, TypeVar};
use crate::ast::{FTerm, TermVar};
use crate::diagnostics::{Error, Result};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Checks an elaborated term against an expected type.
pub fn verify(term: &FTerm, expected: &Type) -> Result<()> {
    let supply = max_type_gen_id(term).max(type_gen_bound(expected));
    TypeChecker::new(supply).check(term, expected)
}

/// Synthesizes the type of an elaborated term.
pub fn type_of(term: &FTerm) -> Result<Type> {
    let mut checker = TypeChecker::new(max_type_gen_id(term));
    let ty = checker.synth(term)?;
    Ok(checker.resolve(&ty))
}

struct TypeChecker {
    context: IndexMap<TermVar, Type>,
    /// Element holes for empty list literals: `None` until matched.
    holes: HashMap<TypeVar, Option<Type>>,
    supply: u64,
}

impl TypeChecker {
    fn new(supply: u64) -> Self {
        Self {
            context: IndexMap::new(),
            holes: HashMap::new(),
            supply,
        }
    }

    fn fresh_hole(&mut self) -> TypeVar {
        let var = TypeVar::Gen(self.supply);
        self.supply += 1;
        self.holes.insert(var.clone(), None);
        var
    }

    fn is_unbound_hole(&self, var: &TypeVar) -> bool {
        matches!(self.holes.get(var), Some(None))
    }

    /// Replaces bound holes by their solutions.
    fn resolve(&self, ty: &Type) -> Type {
        match ty {
            Type::Var(var) => match self.holes.get(var) {
                Some(Some(solution)) => self.resolve(solution),
                _ => ty.clone(),
            },
            Type::Con(con, args) => Type::Con(
                con.clone(),
                args.iter().map(|arg| self.resolve(arg)).collect(),
            ),
            Type::ForAll(var, body) => Type::forall(var.clone(), self.resolve(body)),
        }
    }

    fn bind(&mut self, name: &TermVar, ty: Type) -> Option<Type> {
        self.context.insert(name.clone(), ty)
    }

    fn unbind(&mut self, name: &TermVar, previous: Option<Type>) {
        match previous {
            Some(ty) => {
                self.context.insert(name.clone(), ty);
            }
            None => {
                self.context.shift_remove(name);
            }
        }
    }

    fn context_mentions(&self, var: &TypeVar) -> bool {
        self.context.values().any(|ty| ty.contains_var(var))
    }

    fn check(&mut self, term: &FTerm, expected: &Type) -> Result<()> {
        let expected = self.resolve(expected);
        if let Type::Var(var) = &expected {
            if self.is_unbound_hole(var) {
                let actual = self.synth(term)?;
                return self.expect_match(&expected, &actual);
            }
        }
        match term {
            FTerm::List(items) => match &expected {
                Type::Con(con, args) if *con == TypeCon::list() && args.len() == 1 => {
                    for item in items {
                        self.check(item, &args[0])?;
                    }
                    Ok(())
                }
                _ => {
                    let actual = self.synth(term)?;
                    self.expect_match(&expected, &actual)
                }
            },

            FTerm::Concat { lhs, rhs } => match &expected {
                Type::Con(con, _) if *con == TypeCon::list() => {
                    self.check(lhs, &expected)?;
                    self.check(rhs, &expected)
                }
                _ => {
                    let actual = self.synth(term)?;
                    self.expect_match(&expected, &actual)
                }
            },

            FTerm::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check(condition, &Type::bool())?;
                self.check(then_branch, &expected)?;
                self.check(else_branch, &expected)
            }

            FTerm::Lambda {
                param,
                param_type,
                body,
            } => match expected.split_arrow() {
                Some((domain, codomain)) => {
                    let codomain = codomain.clone();
                    self.expect_match(domain, param_type)?;
                    let previous = self.bind(param, param_type.clone());
                    let result = self.check(body, &codomain);
                    self.unbind(param, previous);
                    result
                }
                None => Err(Box::new(Error::ill_typed(format!(
                    "a lambda cannot have type {expected}"
                )))),
            },

            FTerm::TyAbs { param, body } => match &expected {
                Type::ForAll(var, expected_body) => {
                    if self.context_mentions(param) {
                        return Err(Box::new(Error::ill_typed(format!(
                            "type variable {param} is free in the context"
                        ))));
                    }
                    if var != param && expected_body.contains_var(param) {
                        return Err(Box::new(Error::ill_typed(format!(
                            "type variable {param} already occurs in {expected}"
                        ))));
                    }
                    let expected_body = expected_body.substitute(var, &Type::Var(param.clone()));
                    self.check(body, &expected_body)
                }
                _ => Err(Box::new(Error::ill_typed(format!(
                    "a type abstraction cannot have type {expected}"
                )))),
            },

            FTerm::Let { name, value, body } => {
                let value_type = self.synth(value)?;
                let previous = self.bind(name, value_type);
                let result = self.check(body, &expected);
                self.unbind(name, previous);
                result
            }

            FTerm::Annot { term, annotation } => {
                self.check(term, annotation)?;
                self.expect_match(&expected, annotation)
            }

            _ => {
                let actual = self.synth(term)?;
                self.expect_match(&expected, &actual)
            }
        }
    }

    fn synth(&mut self, term: &FTerm) -> Result<Type> {
        match term {
            FTerm::Var(name) => self.context.get(name).cloned().ok_or_else(|| {
                Box::new(Error::ill_typed(format!("unbound variable {name}")))
            }),

            FTerm::Lambda {
                param,
                param_type,
                body,
            } => {
                let previous = self.bind(param, param_type.clone());
                let body_type = self.synth(body);
                self.unbind(param, previous);
                Ok(Type::arrow(param_type.clone(), body_type?))
            }

            FTerm::Apply { function, argument } => {
                let fun_type = self.synth(function)?;
                let fun_type = self.resolve(&fun_type);
                match fun_type.split_arrow() {
                    Some((domain, codomain)) => {
                        let domain = domain.clone();
                        let codomain = codomain.clone();
                        self.check(argument, &domain)?;
                        Ok(codomain)
                    }
                    None => Err(Box::new(Error::ill_typed(format!(
                        "applying a term of non-function type {fun_type}"
                    )))),
                }
            }

            FTerm::Let { name, value, body } => {
                let value_type = self.synth(value)?;
                let previous = self.bind(name, value_type);
                let body_type = self.synth(body);
                self.unbind(name, previous);
                body_type
            }

            FTerm::Annot { term, annotation } => {
                self.check(term, annotation)?;
                Ok(annotation.clone())
            }

            FTerm::TyAbs { param, body } => {
                if self.context_mentions(param) {
                    return Err(Box::new(Error::ill_typed(format!(
                        "type variable {param} is free in the context"
                    ))));
                }
                let body_type = self.synth(body)?;
                Ok(Type::forall(param.clone(), body_type))
            }

            FTerm::TyApp { term, argument } => {
                let term_type = self.synth(term)?;
                let term_type = self.resolve(&term_type);
                match term_type {
                    Type::ForAll(var, body) => Ok(body.substitute(&var, argument)),
                    other => Err(Box::new(Error::ill_typed(format!(
                        "type application of a term of non-polymorphic type {other}"
                    )))),
                }
            }

            FTerm::Bool(_) => Ok(Type::bool()),
            FTerm::Int(_) => Ok(Type::int()),

            FTerm::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check(condition, &Type::bool())?;
                let ty = self.synth(then_branch)?;
                self.check(else_branch, &ty)?;
                Ok(self.resolve(&ty))
            }

            FTerm::Arith { lhs, rhs, .. } => {
                self.check(lhs, &Type::int())?;
                self.check(rhs, &Type::int())?;
                Ok(Type::int())
            }

            FTerm::List(items) => match items.split_first() {
                None => {
                    let hole = self.fresh_hole();
                    Ok(Type::list(Type::Var(hole)))
                }
                Some((first, rest)) => {
                    let element = self.synth(first)?;
                    for item in rest {
                        self.check(item, &element)?;
                    }
                    Ok(self.resolve(&Type::list(element)))
                }
            },

            FTerm::Concat { lhs, rhs } => {
                let lhs_type = self.synth(lhs)?;
                let lhs_type = self.resolve(&lhs_type);
                match &lhs_type {
                    Type::Con(con, _) if *con == TypeCon::list() => {
                        self.check(rhs, &lhs_type)?;
                        Ok(self.resolve(&lhs_type))
                    }
                    other => Err(Box::new(Error::ill_typed(format!(
                        "concatenating a term of non-list type {other}"
                    )))),
                }
            }
        }
    }

    fn expect_match(&mut self, expected: &Type, actual: &Type) -> Result<()> {
        if self.match_types(expected, actual, &mut Vec::new()) {
            Ok(())
        } else {
            Err(Box::new(Error::ill_typed(format!(
                "expected type {}, found {}",
                self.resolve(expected),
                self.resolve(actual)
            ))))
        }
    }

    /// Alpha-aware matching that solves element holes on either side.
    fn match_types(
        &mut self,
        left: &Type,
        right: &Type,
        binders: &mut Vec<(TypeVar, TypeVar)>,
    ) -> bool {
        let left = self.resolve(left);
        let right = self.resolve(right);
        if let Type::Var(var) = &left {
            if self.is_unbound_hole(var) {
                return self.solve_hole(var.clone(), &right, binders);
            }
        }
        if let Type::Var(var) = &right {
            if self.is_unbound_hole(var) {
                return self.solve_hole(var.clone(), &left, binders);
            }
        }
        match (&left, &right) {
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
                        .all(|(a, b)| self.match_types(a, b, binders))
            }
            (Type::ForAll(a, body1), Type::ForAll(b, body2)) => {
                binders.push((a.clone(), b.clone()));
                let matched = self.match_types(body1, body2, binders);
                binders.pop();
                matched
            }
            _ => false,
        }
    }

    fn solve_hole(
        &mut self,
        hole: TypeVar,
        solution: &Type,
        binders: &[(TypeVar, TypeVar)],
    ) -> bool {
        if solution == &Type::Var(hole.clone()) {
            return true;
        }
        // A hole may not capture a variable quantified within the
        // comparison, and may not be solved by a type containing itself.
        let free = solution.free_vars();
        if free.contains(&hole) {
            return false;
        }
        if binders
            .iter()
            .any(|(l, r)| free.contains(l) || free.contains(r))
        {
            return false;
        }
        self.holes.insert(hole, Some(solution.clone()));
        true
    }
}

fn max_type_gen_id(term: &FTerm) -> u64 {
    let mut max = 0;
    let _ = term.map_types(&mut |ty, bound| {
        max = max.max(type_gen_bound(ty));
        for var in bound {
            if let TypeVar::Gen(id) = var {
                max = max.max(id + 1);
            }
        }
        ty.clone()
    });
    max
}

fn type_gen_bound(ty: &Type) -> u64 {
    ty.max_gen_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tv(name: &str) -> TypeVar {
        TypeVar::named(name)
    }

    fn identity_fterm() -> FTerm {
        FTerm::ty_abs(
            tv("A"),
            FTerm::lambda(
                TermVar::named("x"),
                Type::named_var("A"),
                FTerm::Var(TermVar::named("x")),
            ),
        )
    }

    fn identity_type() -> Type {
        Type::forall(tv("A"), Type::arrow(Type::named_var("A"), Type::named_var("A")))
    }

    #[test]
    fn test_verify_identity() {
        verify(&identity_fterm(), &identity_type()).unwrap();
    }

    #[test]
    fn test_verify_accepts_alpha_variant() {
        let expected = Type::forall(
            tv("B"),
            Type::arrow(Type::named_var("B"), Type::named_var("B")),
        );
        verify(&identity_fterm(), &expected).unwrap();
    }

    #[test]
    fn test_verify_rejects_wrong_type() {
        let expected = Type::arrow(Type::int(), Type::int());
        assert!(verify(&identity_fterm(), &expected).is_err());
    }

    #[test]
    fn test_type_of_type_application() {
        let term = FTerm::ty_app(
            FTerm::Annot {
                term: Box::new(identity_fterm()),
                annotation: identity_type(),
            },
            Type::int(),
        );
        let ty = type_of(&term).unwrap();
        assert!(ty.alpha_eq(&Type::arrow(Type::int(), Type::int())));
    }

    #[test]
    fn test_empty_list_checks_against_any_list() {
        verify(&FTerm::List(Vec::new()), &Type::list(Type::int())).unwrap();
        verify(
            &FTerm::List(Vec::new()),
            &Type::list(Type::list(Type::bool())),
        )
        .unwrap();
    }

    #[test]
    fn test_empty_list_hole_solved_by_other_branch() {
        // if true then [] else [1] : List Int
        let term = FTerm::If {
            condition: Box::new(FTerm::Bool(true)),
            then_branch: Box::new(FTerm::List(Vec::new())),
            else_branch: Box::new(FTerm::List(vec![FTerm::Int(1)])),
        };
        let ty = type_of(&term).unwrap();
        assert!(ty.alpha_eq(&Type::list(Type::int())), "got {ty}");
    }

    #[test]
    fn test_let_checks_against_expected_type() {
        use crate::ast::ArithOp;
        // let n = 1 in n + 2 : Int
        let n = TermVar::named("n");
        let term = FTerm::Let {
            name: n.clone(),
            value: Box::new(FTerm::Int(1)),
            body: Box::new(FTerm::Arith {
                op: ArithOp::Add,
                lhs: Box::new(FTerm::Var(n)),
                rhs: Box::new(FTerm::Int(2)),
            }),
        };
        verify(&term, &Type::int()).unwrap();
        assert!(verify(&term, &Type::bool()).is_err());
    }

    #[test]
    fn test_let_synthesizes_polymorphic_binding() {
        // let id = ΛA. λ(x : A). x in id [Int] 5 : Int
        let id = TermVar::named("id");
        let term = FTerm::Let {
            name: id.clone(),
            value: Box::new(identity_fterm()),
            body: Box::new(FTerm::apply(
                FTerm::ty_app(FTerm::Var(id), Type::int()),
                FTerm::Int(5),
            )),
        };
        let ty = type_of(&term).unwrap();
        assert_eq!(ty, Type::int());
    }

    #[test]
    fn test_ill_typed_application_rejected() {
        // (λ(x : Int). x) true
        let term = FTerm::apply(
            FTerm::lambda(
                TermVar::named("x"),
                Type::int(),
                FTerm::Var(TermVar::named("x")),
            ),
            FTerm::Bool(true),
        );
        assert!(type_of(&term).is_err());
    }

    #[test]
    fn test_branch_type_disagreement_rejected() {
        let term = FTerm::If {
            condition: Box::new(FTerm::Bool(true)),
            then_branch: Box::new(FTerm::Int(1)),
            else_branch: Box::new(FTerm::Bool(false)),
        };
        assert!(type_of(&term).is_err());
    }
}
