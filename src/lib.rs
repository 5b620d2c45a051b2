//! # Polydust
//!
//! Polydust is a type-inference and elaboration engine for a small
//! higher-rank polymorphic lambda calculus in the HMF tradition. It accepts
//! terms of an implicit source language, in which binders and lets may carry
//! no annotations at all, and produces terms of an explicit target language
//! enriched with type abstractions and type applications, together with the
//! inferred type.
//!
//! Quantifiers may appear anywhere in a type, but they are never guessed:
//! a binder gets a polymorphic type only through an explicit annotation,
//! and types are never implicitly instantiated with polymorphic arguments.
//!
//! ## Pipeline
//!
//! 1. A parser (elsewhere) delivers an implicit [`Term`].
//! 2. [`type_check`] runs inference, producing an explicit [`FTerm`] and a
//!    [`Type`].
//! 3. A simplifier pass prunes the instantiation/abstraction redexes the
//!    algorithm leaves behind.
//!
//! ## Example
//!
//! ```
//! use polydust::{type_check, Term};
//!
//! let (elaborated, ty) = type_check(&Term::lambda("x", Term::var("x"))).unwrap();
//! assert_eq!(ty.to_string(), "∀t0. t0 -> t0");
//! assert_eq!(elaborated.to_string(), "Λt0. λ(x : t0). x");
//! ```

#![warn(missing_docs, rust_2018_idioms)]

/// Abstract syntax for the implicit source and explicit target languages.
pub mod ast;
/// Error handling and diagnostics.
pub mod diagnostics;
/// The post-elaboration simplifier.
pub mod simplify;
/// The type model, substitutions, unification, subsumption, and inference.
pub mod types;

pub use ast::{ArithOp, FTerm, Term, TermVar};
pub use diagnostics::{Error, Result};
pub use simplify::{simplify, simplify_to_fixpoint};
pub use types::{Substitution, Type, TypeCon, TypeInference, TypeVar};

/// Options controlling a [`type_check_with`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeCheckOptions {
    /// Run the simplifier over the elaboration. On by default.
    pub simplify: bool,
    /// Iterate the simplifier to a fixed point instead of the single pass
    /// that suffices for terms produced by inference.
    pub iterate_simplifier: bool,
}

impl Default for TypeCheckOptions {
    fn default() -> Self {
        Self {
            simplify: true,
            iterate_simplifier: false,
        }
    }
}

/// Type checks an implicit term, returning the simplified elaboration and
/// its type.
pub fn type_check(term: &Term) -> Result<(FTerm, Type)> {
    type_check_with(term, &TypeCheckOptions::default())
}

/// Type checks an implicit term with explicit options.
pub fn type_check_with(term: &Term, options: &TypeCheckOptions) -> Result<(FTerm, Type)> {
    log::debug!("type checking {term}");
    let mut engine = TypeInference::new();
    let (elaborated, ty, _subst) = engine.infer(term)?;
    let elaborated = if options.simplify {
        if options.iterate_simplifier {
            simplify_to_fixpoint(&elaborated)
        } else {
            simplify(&elaborated)
        }
    } else {
        elaborated
    };
    log::debug!("elaborated to {elaborated} : {ty}");
    Ok((elaborated, ty))
}
