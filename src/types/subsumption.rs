//! Subsumption: using a term of one type where another type is expected.
//!
//! A term of a general type can stand at an expected type when every
//! instance of the expected type is an instance of the general one. The
//! check instantiates the general type's quantifiers with flexible
//! unification variables and the expected type's quantifiers with rigid
//! constants, then unifies. The elaboration records the instantiation as
//! type applications and rebuilds the expected quantifiers as type
//! abstractions, so the result has exactly the expected type.

use super::{Substitution, Type, TypeInference};
use crate::ast::FTerm;
use crate::diagnostics::{Error, Result};
use log::trace;

impl TypeInference {
    /// Checks that a term of type `general` can be used at type `expected`,
    /// producing the elaborated term together with the residual substitution
    /// restricted to variables that were not introduced locally.
    pub fn subsume(
        &mut self,
        term: FTerm,
        general: &Type,
        expected: &Type,
    ) -> Result<(FTerm, Substitution)> {
        trace!("subsuming {general} ≤ {expected}");
        let (general_vars, general_body) = general.peel_foralls();
        let (expected_vars, expected_body) = expected.peel_foralls();

        let inst_vars: Vec<_> = general_vars
            .iter()
            .map(|_| self.fresh_type_var())
            .collect();
        let skolems: Vec<_> = expected_vars
            .iter()
            .map(|_| self.fresh_type_con())
            .collect();

        let mut general_body = general_body;
        for (var, inst) in general_vars.iter().zip(&inst_vars) {
            general_body = general_body.substitute(var, &Type::Var(inst.clone()));
        }
        let mut expected_body = expected_body;
        for (var, skolem) in expected_vars.iter().zip(&skolems) {
            expected_body =
                expected_body.substitute(var, &Type::Con(skolem.clone(), Vec::new()));
        }

        let unifier = self.unify(&general_body, &expected_body)?;
        let residual = unifier.removing(&inst_vars);
        if skolems.iter().any(|skolem| residual.mentions_con(skolem)) {
            return Err(Box::new(Error::skolem_escape(
                general.clone(),
                expected.clone(),
            )));
        }

        let mut elaborated = term;
        for inst in &inst_vars {
            elaborated = FTerm::ty_app(elaborated, Type::Var(inst.clone()));
        }
        let mut elaborated = unifier.apply_to_fterm(&elaborated);
        for skolem in skolems.iter().rev() {
            let binder = self.fresh_type_var();
            elaborated = FTerm::ty_abs(
                binder.clone(),
                elaborated.replace_con(skolem, &Type::Var(binder)),
            );
        }
        Ok((elaborated, residual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TermVar;
    use crate::types::TypeVar;

    fn identity_type(name: &str) -> Type {
        Type::forall(
            TypeVar::named(name),
            Type::arrow(Type::named_var(name), Type::named_var(name)),
        )
    }

    #[test]
    fn test_subsume_instantiates_general_type() {
        let mut engine = TypeInference::new();
        let expected = Type::arrow(Type::int(), Type::int());
        let (elaborated, residual) = engine
            .subsume(FTerm::Var(TermVar::named("id")), &identity_type("a"), &expected)
            .unwrap();
        // The instantiation shows up as a type application at Int.
        match elaborated {
            FTerm::TyApp { argument, .. } => assert_eq!(argument, Type::int()),
            other => panic!("expected a type application, got {other}"),
        }
        assert!(residual.is_empty());
    }

    #[test]
    fn test_subsume_rebuilds_expected_quantifier() {
        let mut engine = TypeInference::new();
        let (elaborated, residual) = engine
            .subsume(
                FTerm::Var(TermVar::named("id")),
                &identity_type("a"),
                &identity_type("b"),
            )
            .unwrap();
        assert!(residual.is_empty());
        assert!(matches!(elaborated, FTerm::TyAbs { .. }));
        // The rigid stand-in must not survive in the elaboration.
        assert!(elaborated.free_type_vars().is_empty());
    }

    #[test]
    fn test_subsume_mono_into_poly_fails() {
        let mut engine = TypeInference::new();
        let a = engine.fresh_type_var();
        let err = engine
            .subsume(
                FTerm::Var(TermVar::named("f")),
                &Type::Var(a),
                &identity_type("b"),
            )
            .unwrap_err();
        assert!(matches!(*err, Error::SkolemEscape { .. }));
    }

    #[test]
    fn test_subsume_poly_into_less_poly() {
        // ∀a. a -> a  ≤  ∀b. List b -> List b
        let mut engine = TypeInference::new();
        let expected = Type::forall(
            TypeVar::named("b"),
            Type::arrow(
                Type::list(Type::named_var("b")),
                Type::list(Type::named_var("b")),
            ),
        );
        let (elaborated, residual) = engine
            .subsume(FTerm::Var(TermVar::named("id")), &identity_type("a"), &expected)
            .unwrap();
        assert!(residual.is_empty());
        assert!(matches!(elaborated, FTerm::TyAbs { .. }));
    }

    #[test]
    fn test_subsume_unrelated_types_fails() {
        let mut engine = TypeInference::new();
        let err = engine
            .subsume(FTerm::Bool(true), &Type::bool(), &Type::int())
            .unwrap_err();
        assert!(matches!(*err, Error::TypeMismatch { .. }));
    }
}
