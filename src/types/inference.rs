//! Type inference and elaboration.
//!
//! The engine is a substitution-based variant of Algorithm W extended with
//! first-class polymorphism. Inference walks an implicit term and produces
//! an explicit term, its type, and the residual substitution it applied to
//! the typing context. Polymorphic types are never guessed for binders:
//! a quantifier reaches a lambda parameter only through an annotation.
//!
//! All effectful state of a run lives in one [`TypeInference`] value: the
//! fresh-name counter, the term-variable typing context, the set of in-scope
//! unification variables, and the constructor-arity table. Two concurrent
//! runs use independent values; nothing is global.

use super::{Substitution, Type, TypeCon, TypeVar};
use crate::ast::{FTerm, Term, TermVar};
use crate::diagnostics::{Error, Result};
use indexmap::IndexMap;
use log::trace;
use std::collections::{HashMap, HashSet};

/// The type inference engine.
#[derive(Debug)]
pub struct TypeInference {
    /// Supply of fresh names, shared by type variables and rigid
    /// constructors.
    var_supply: u64,
    /// The term-variable typing context.
    context: IndexMap<TermVar, Type>,
    /// Unification variables in scope for this run. The set only grows;
    /// variables are either solved by substitution or generalized away.
    unification_vars: HashSet<TypeVar>,
    /// Declared arity of every type constructor in scope, primitives plus
    /// the rigid constants allocated during this run.
    constructor_arities: IndexMap<TypeCon, usize>,
}

impl TypeInference {
    /// Creates an engine with an empty context and the primitive
    /// constructors.
    pub fn new() -> Self {
        let mut constructor_arities = IndexMap::new();
        constructor_arities.insert(TypeCon::bool(), 0);
        constructor_arities.insert(TypeCon::int(), 0);
        constructor_arities.insert(TypeCon::list(), 1);
        constructor_arities.insert(TypeCon::arrow(), 2);
        Self {
            var_supply: 0,
            context: IndexMap::new(),
            unification_vars: HashSet::new(),
            constructor_arities,
        }
    }

    /// Allocates a fresh unification variable.
    pub fn fresh_type_var(&mut self) -> TypeVar {
        let var = TypeVar::Gen(self.var_supply);
        self.var_supply += 1;
        self.unification_vars.insert(var.clone());
        var
    }

    /// Allocates a fresh rigid nullary constructor (a Skolem constant).
    pub fn fresh_type_con(&mut self) -> TypeCon {
        let con = TypeCon::Gen(self.var_supply);
        self.var_supply += 1;
        self.constructor_arities.insert(con.clone(), 0);
        con
    }

    /// Gets the declared arity of a constructor, if it is in scope.
    pub fn arity_of(&self, con: &TypeCon) -> Option<usize> {
        self.constructor_arities.get(con).copied()
    }

    /// Looks up a term variable in the context.
    pub fn lookup(&self, name: &TermVar) -> Option<&Type> {
        self.context.get(name)
    }

    /// Extends the context. Rebinding an already-bound user name is an
    /// error; generated names never collide.
    fn bind(&mut self, name: TermVar, ty: Type) -> Result<()> {
        if name.is_named() && self.context.contains_key(&name) {
            return Err(Box::new(Error::duplicate_variable(name)));
        }
        self.context.insert(name, ty);
        Ok(())
    }

    /// Removes a binder from the context on scope exit.
    fn unbind(&mut self, name: &TermVar) {
        self.context.shift_remove(name);
    }

    /// Propagates a solved binding through the typing context in place.
    pub(super) fn apply_to_context(&mut self, subst: &Substitution) {
        for ty in self.context.values_mut() {
            *ty = subst.apply_to_type(ty);
        }
    }

    fn env_free_vars(&self) -> HashSet<TypeVar> {
        let mut vars = HashSet::new();
        for ty in self.context.values() {
            vars.extend(ty.free_vars());
        }
        vars
    }

    /// Strips the outer quantifiers of a type, replacing each bound variable
    /// with a fresh unification variable and recording the corresponding
    /// type application on the term.
    pub fn open(&mut self, term: FTerm, ty: Type) -> (FTerm, Type) {
        let mut term = term;
        let mut ty = ty;
        while let Type::ForAll(var, body) = ty {
            let fresh = Type::Var(self.fresh_type_var());
            ty = body.substitute(&var, &fresh);
            term = FTerm::ty_app(term, fresh);
        }
        (term, ty)
    }

    /// Closes a term and its type over the type variables that are not free
    /// in the context, deduplicated in order of first occurrence in the term
    /// and then the type. The first variable ends up outermost.
    pub fn generalize(&self, term: FTerm, ty: Type) -> (FTerm, Type) {
        let env_vars = self.env_free_vars();
        let mut candidates = term.free_type_vars();
        for var in ty.free_vars() {
            if !candidates.contains(&var) {
                candidates.push(var);
            }
        }
        candidates.retain(|var| !env_vars.contains(var));
        debug_assert!(
            candidates
                .iter()
                .all(|var| self.unification_vars.contains(var)),
            "generalizing a variable that is not in scope"
        );

        let mut term = term;
        let mut ty = ty;
        for var in candidates.iter().rev() {
            trace!("generalizing over {var}");
            term = FTerm::ty_abs(var.clone(), term);
            ty = Type::forall(var.clone(), ty);
        }
        (term, ty)
    }

    /// Sanitizes a user annotation.
    ///
    /// Free variables in annotations are implicitly existentially bound:
    /// each distinct free variable becomes one fresh unification variable
    /// for this occurrence of the annotation. Bound variables are renamed
    /// fresh so that later substitution cannot capture them. Constructor
    /// arities are validated along the way.
    pub fn sanitize_annotation(&mut self, ty: &Type) -> Result<Type> {
        let mut free_map = HashMap::new();
        self.sanitize_type(ty, &mut free_map, &mut Vec::new())
    }

    fn sanitize_type(
        &mut self,
        ty: &Type,
        free_map: &mut HashMap<TypeVar, TypeVar>,
        bound: &mut Vec<(TypeVar, TypeVar)>,
    ) -> Result<Type> {
        match ty {
            Type::Var(var) => {
                for (original, renamed) in bound.iter().rev() {
                    if original == var {
                        return Ok(Type::Var(renamed.clone()));
                    }
                }
                let fresh = match free_map.get(var) {
                    Some(existing) => existing.clone(),
                    None => {
                        let fresh = self.fresh_type_var();
                        free_map.insert(var.clone(), fresh.clone());
                        fresh
                    }
                };
                Ok(Type::Var(fresh))
            }
            Type::Con(con, args) => {
                let arity = self
                    .arity_of(con)
                    .ok_or_else(|| Box::new(Error::unknown_constructor(con.clone())))?;
                if args.len() != arity {
                    return Err(Box::new(Error::arity_mismatch(
                        con.clone(),
                        arity,
                        args.len(),
                    )));
                }
                let mut sanitized = Vec::with_capacity(args.len());
                for arg in args {
                    sanitized.push(self.sanitize_type(arg, free_map, bound)?);
                }
                Ok(Type::Con(con.clone(), sanitized))
            }
            Type::ForAll(var, body) => {
                let fresh = self.fresh_type_var();
                bound.push((var.clone(), fresh.clone()));
                let body = self.sanitize_type(body, free_map, bound);
                bound.pop();
                Ok(Type::forall(fresh, body?))
            }
        }
    }

    /// Checks a term against an expected type: inference followed by
    /// subsumption.
    pub fn check(&mut self, term: &Term, expected: &Type) -> Result<(FTerm, Substitution)> {
        let (elaborated, inferred, subst) = self.infer(term)?;
        let expected = subst.apply_to_type(expected);
        let (elaborated, residual) = self.subsume(elaborated, &inferred, &expected)?;
        Ok((elaborated, subst.then(&residual)))
    }

    /// Infers the type of an implicit term, producing the elaborated
    /// explicit term, its type, and the substitution applied to the
    /// context.
    pub fn infer(&mut self, term: &Term) -> Result<(FTerm, Type, Substitution)> {
        match term {
            Term::Var(name) => {
                let ty = self
                    .lookup(name)
                    .cloned()
                    .ok_or_else(|| Box::new(Error::undefined_variable(name.clone())))?;
                Ok((FTerm::Var(name.clone()), ty, Substitution::empty()))
            }

            Term::Lambda {
                param,
                annotation,
                body,
            } => {
                let param_type = match annotation {
                    Some(ann) => self.sanitize_annotation(ann)?,
                    None => Type::Var(self.fresh_type_var()),
                };
                self.bind(param.clone(), param_type.clone())?;
                let inferred = self.infer(body);
                self.unbind(param);
                let (body_term, body_type, subst) = inferred?;
                let (body_term, body_type) = self.open(body_term, body_type);
                let param_type = subst.apply_to_type(&param_type);
                if annotation.is_none() && param_type.is_polymorphic() {
                    return Err(Box::new(Error::polymorphic_parameter(
                        param.clone(),
                        param_type,
                    )));
                }
                let term = FTerm::lambda(param.clone(), param_type.clone(), body_term);
                let ty = Type::arrow(param_type, body_type);
                let (term, ty) = self.generalize(term, ty);
                Ok((term, ty, subst))
            }

            Term::Apply { function, argument } => {
                let domain_var = Type::Var(self.fresh_type_var());
                let codomain_var = Type::Var(self.fresh_type_var());
                let expected = Type::arrow(domain_var, codomain_var);
                let (fun_term, fun_subst) = self.check(function, &expected)?;
                let fun_type = fun_subst.apply_to_type(&expected);
                let (domain, codomain) = match fun_type.split_arrow() {
                    Some((domain, codomain)) => (domain.clone(), codomain.clone()),
                    None => panic!(
                        "internal error: checking against an arrow produced {fun_type}"
                    ),
                };
                let (arg_term, arg_subst) = self.check(argument, &domain)?;
                let fun_term = arg_subst.apply_to_fterm(&fun_term);
                let codomain = arg_subst.apply_to_type(&codomain);
                let (term, ty) = self.generalize(FTerm::apply(fun_term, arg_term), codomain);
                Ok((term, ty, fun_subst.then(&arg_subst)))
            }

            Term::Let { name, value, body } => {
                let (value_term, value_type, value_subst) = self.infer(value)?;
                self.bind(name.clone(), value_type.clone())?;
                let body_result = self.infer(body);
                self.unbind(name);
                let (body_term, body_type, body_subst) = body_result?;
                // The let elaborates as an immediate application of a lambda.
                let value_type = body_subst.apply_to_type(&value_type);
                let value_term = body_subst.apply_to_fterm(&value_term);
                let term = FTerm::apply(
                    FTerm::lambda(name.clone(), value_type, body_term),
                    value_term,
                );
                Ok((term, body_type, value_subst.then(&body_subst)))
            }

            Term::Annot { term, annotation } => {
                let expected = self.sanitize_annotation(annotation)?;
                let (elaborated, subst) = self.check(term, &expected)?;
                let ty = subst.apply_to_type(&expected);
                let (elaborated, ty) = self.generalize(elaborated, ty);
                Ok((elaborated, ty, subst))
            }

            Term::Bool(value) => Ok((FTerm::Bool(*value), Type::bool(), Substitution::empty())),

            Term::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let (cond_term, cond_subst) = self.check(condition, &Type::bool())?;
                let result_type = Type::Var(self.fresh_type_var());
                let (then_term, then_subst) = self.check(then_branch, &result_type)?;
                let result_type = then_subst.apply_to_type(&result_type);
                let (else_term, else_subst) = self.check(else_branch, &result_type)?;
                let result_type = else_subst.apply_to_type(&result_type);

                let cond_term =
                    else_subst.apply_to_fterm(&then_subst.apply_to_fterm(&cond_term));
                let then_term = else_subst.apply_to_fterm(&then_term);
                let term = FTerm::If {
                    condition: Box::new(cond_term),
                    then_branch: Box::new(then_term),
                    else_branch: Box::new(else_term),
                };
                let (term, ty) = self.generalize(term, result_type);
                Ok((term, ty, cond_subst.then(&then_subst).then(&else_subst)))
            }

            Term::Int(value) => Ok((FTerm::Int(*value), Type::int(), Substitution::empty())),

            Term::Arith { op, lhs, rhs } => {
                let (lhs_term, lhs_subst) = self.check(lhs, &Type::int())?;
                let (rhs_term, rhs_subst) = self.check(rhs, &Type::int())?;
                let lhs_term = rhs_subst.apply_to_fterm(&lhs_term);
                let term = FTerm::Arith {
                    op: *op,
                    lhs: Box::new(lhs_term),
                    rhs: Box::new(rhs_term),
                };
                let (term, ty) = self.generalize(term, Type::int());
                Ok((term, ty, lhs_subst.then(&rhs_subst)))
            }

            Term::List(items) => {
                let mut element_type = Type::Var(self.fresh_type_var());
                let mut subst = Substitution::empty();
                let mut elaborated: Vec<FTerm> = Vec::new();
                for item in items {
                    let (item_term, item_subst) = self.check(item, &element_type)?;
                    element_type = item_subst.apply_to_type(&element_type);
                    for prev in &mut elaborated {
                        *prev = item_subst.apply_to_fterm(prev);
                    }
                    elaborated.push(item_term);
                    subst = subst.then(&item_subst);
                }
                let (term, ty) =
                    self.generalize(FTerm::List(elaborated), Type::list(element_type));
                Ok((term, ty, subst))
            }

            Term::Concat { lhs, rhs } => {
                let element_type = Type::Var(self.fresh_type_var());
                let list_type = Type::list(element_type);
                let (lhs_term, lhs_subst) = self.check(lhs, &list_type)?;
                let list_type = lhs_subst.apply_to_type(&list_type);
                let (rhs_term, rhs_subst) = self.check(rhs, &list_type)?;
                let list_type = rhs_subst.apply_to_type(&list_type);
                let lhs_term = rhs_subst.apply_to_fterm(&lhs_term);
                let term = FTerm::Concat {
                    lhs: Box::new(lhs_term),
                    rhs: Box::new(rhs_term),
                };
                let (term, ty) = self.generalize(term, list_type);
                Ok((term, ty, lhs_subst.then(&rhs_subst)))
            }
        }
    }
}

impl Default for TypeInference {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn infer_type(term: &Term) -> Type {
        let mut engine = TypeInference::new();
        let (_, ty, _) = engine.infer(term).unwrap();
        ty
    }

    #[test]
    fn test_infer_literals() {
        assert_eq!(infer_type(&Term::Bool(true)), Type::bool());
        assert_eq!(infer_type(&Term::Int(42)), Type::int());
    }

    #[test]
    fn test_infer_identity_is_generalized() {
        let ty = infer_type(&Term::lambda("x", Term::var("x")));
        let expected = Type::forall(
            TypeVar::named("A"),
            Type::arrow(Type::named_var("A"), Type::named_var("A")),
        );
        assert!(ty.alpha_eq(&expected), "got {ty}");
    }

    #[test]
    fn test_infer_undefined_variable() {
        let mut engine = TypeInference::new();
        let err = engine.infer(&Term::var("ghost")).unwrap_err();
        assert!(matches!(*err, Error::UndefinedVariable { .. }));
    }

    #[test]
    fn test_binder_removed_after_failure() {
        let mut engine = TypeInference::new();
        // The body fails; the binder must not leak into the context.
        let term = Term::lambda("x", Term::var("ghost"));
        assert!(engine.infer(&term).is_err());
        assert!(engine.lookup(&TermVar::named("x")).is_none());
    }

    #[test]
    fn test_duplicate_binder_rejected() {
        let mut engine = TypeInference::new();
        let term = Term::lambda("x", Term::lambda("x", Term::var("x")));
        let err = engine.infer(&term).unwrap_err();
        assert!(matches!(*err, Error::DuplicateVariable { .. }));
    }

    #[test]
    fn test_parameter_used_at_polymorphic_type_rejected() {
        // λf. (f : ∀a. a -> a) asks an unannotated parameter to be
        // polymorphic; the flexible variable cannot match the rigid body.
        let poly = Type::forall(
            TypeVar::named("a"),
            Type::arrow(Type::named_var("a"), Type::named_var("a")),
        );
        let term = Term::lambda("f", Term::annot(Term::var("f"), poly));
        let mut engine = TypeInference::new();
        let err = engine.infer(&term).unwrap_err();
        assert!(matches!(*err, Error::SkolemEscape { .. }), "got {err}");
    }

    #[test]
    fn test_sanitize_renames_free_and_bound() {
        let mut engine = TypeInference::new();
        // a -> ∀b. b : both variables must be replaced with generated names
        let ann = Type::arrow(
            Type::named_var("a"),
            Type::forall(TypeVar::named("b"), Type::named_var("b")),
        );
        let sanitized = engine.sanitize_annotation(&ann).unwrap();
        assert!(sanitized.alpha_eq(&Type::arrow(
            Type::Var(TypeVar::Gen(0)),
            Type::forall(TypeVar::Gen(1), Type::Var(TypeVar::Gen(1))),
        )));
        for var in sanitized.free_vars() {
            assert!(matches!(var, TypeVar::Gen(_)));
        }
    }

    #[test]
    fn test_sanitize_shares_repeated_free_variable() {
        let mut engine = TypeInference::new();
        let ann = Type::arrow(Type::named_var("a"), Type::named_var("a"));
        let sanitized = engine.sanitize_annotation(&ann).unwrap();
        let (domain, codomain) = sanitized.split_arrow().unwrap();
        assert_eq!(domain, codomain);
    }

    #[test]
    fn test_sanitize_checks_arity() {
        let mut engine = TypeInference::new();
        let bad = Type::Con(TypeCon::list(), vec![Type::int(), Type::int()]);
        let err = engine.sanitize_annotation(&bad).unwrap_err();
        assert!(matches!(*err, Error::ArityMismatch { .. }));

        let unknown = Type::Con(TypeCon::named("Maybe"), vec![Type::int()]);
        let err = engine.sanitize_annotation(&unknown).unwrap_err();
        assert!(matches!(*err, Error::UnknownConstructor { .. }));
    }

    #[test]
    fn test_open_strips_quantifiers() {
        let mut engine = TypeInference::new();
        let a = TypeVar::named("a");
        let ty = Type::forall(a.clone(), Type::arrow(Type::Var(a.clone()), Type::Var(a)));
        let term = FTerm::Var(TermVar::named("f"));
        let (opened_term, opened_ty) = engine.open(term, ty);
        assert!(!opened_ty.is_polymorphic());
        assert!(matches!(opened_term, FTerm::TyApp { .. }));
    }

    #[test]
    fn test_generalize_skips_context_variables() {
        let mut engine = TypeInference::new();
        let pinned = engine.fresh_type_var();
        let free = engine.fresh_type_var();
        engine
            .bind(TermVar::named("x"), Type::Var(pinned.clone()))
            .unwrap();
        let ty = Type::arrow(Type::Var(pinned.clone()), Type::Var(free));
        let (_, generalized) = engine.generalize(FTerm::Var(TermVar::named("x")), ty);
        // Only the unpinned variable is closed over.
        match generalized {
            Type::ForAll(var, body) => {
                assert_ne!(var, pinned);
                assert!(body.contains_var(&pinned));
            }
            other => panic!("expected a quantifier, got {other}"),
        }
    }

    #[test]
    fn test_let_elaborates_to_application() {
        let mut engine = TypeInference::new();
        let term = Term::let_in("n", Term::Int(1), Term::var("n"));
        let (elaborated, ty, _) = engine.infer(&term).unwrap();
        assert_eq!(ty, Type::int());
        assert!(matches!(elaborated, FTerm::Apply { .. }));
    }
}
