//! Most-general unification.
//!
//! Unification finds the most general substitution making two types equal.
//! Quantified types unify by replacing both bound variables with one fresh
//! rigid constructor and unifying the bodies; the constructor standing in
//! for the binders must not leak into the solution, otherwise the two
//! quantifiers bind at different positions and the types are not equal.
//!
//! Solving a variable also rewrites the typing context in place, in the
//! same logical step as returning the substitution.

use super::{Substitution, Type, TypeInference};
use crate::diagnostics::{Error, Result};
use log::trace;

impl TypeInference {
    /// Unifies two types, returning the most general unifier.
    ///
    /// The returned substitution has already been applied to the typing
    /// context.
    pub fn unify(&mut self, left: &Type, right: &Type) -> Result<Substitution> {
        match (left, right) {
            (Type::Var(a), Type::Var(b)) if a == b => Ok(Substitution::empty()),

            (Type::Var(var), ty) | (ty, Type::Var(var)) if !ty.contains_var(var) => {
                trace!("solving {var} ↦ {ty}");
                let subst = Substitution::single(var.clone(), ty.clone());
                self.apply_to_context(&subst);
                Ok(subst)
            }

            (Type::Con(left_con, left_args), Type::Con(right_con, right_args))
                if left_con == right_con =>
            {
                if left_args.len() != right_args.len() {
                    return Err(Box::new(Error::arity_mismatch(
                        left_con.clone(),
                        left_args.len(),
                        right_args.len(),
                    )));
                }
                self.unify_args(left_args, right_args)
            }

            (Type::ForAll(left_var, left_body), Type::ForAll(right_var, right_body)) => {
                let rigid = self.fresh_type_con();
                let skolem = Type::Con(rigid.clone(), Vec::new());
                let left_body = left_body.substitute(left_var, &skolem);
                let right_body = right_body.substitute(right_var, &skolem);
                let subst = self.unify(&left_body, &right_body)?;
                if subst.mentions_con(&rigid) {
                    return Err(Box::new(Error::type_mismatch(left.clone(), right.clone())));
                }
                Ok(subst)
            }

            // Everything else, including a variable equation that fails the
            // occurs check, is a shape mismatch.
            _ => Err(Box::new(Error::type_mismatch(left.clone(), right.clone()))),
        }
    }

    /// Unifies constructor arguments left to right, threading the composed
    /// substitution through each remaining pair.
    fn unify_args(&mut self, left: &[Type], right: &[Type]) -> Result<Substitution> {
        let mut subst = Substitution::empty();
        for (left_arg, right_arg) in left.iter().zip(right.iter()) {
            let left_arg = subst.apply_to_type(left_arg);
            let right_arg = subst.apply_to_type(right_arg);
            let step = self.unify(&left_arg, &right_arg)?;
            subst = subst.then(&step);
        }
        Ok(subst)
    }
}
