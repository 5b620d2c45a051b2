//! End-to-end tests for the type checker.
//!
//! These tests run the complete pipeline (inference, elaboration,
//! simplification) over concrete programs and check the resulting types,
//! elaborations, and diagnostics. Every accepted elaboration is re-checked
//! against the explicit-language typing rules.

use polydust::types::type_checker;
use polydust::{type_check, ArithOp, Error, FTerm, Term, Type, TypeVar};

/// Helper to type check a program and expect success.
fn check_expect_ok(term: &Term) -> (FTerm, Type) {
    match type_check(term) {
        Ok(result) => result,
        Err(e) => panic!("expected '{term}' to type check, got error: {e}"),
    }
}

/// Helper to type check a program and expect failure.
fn check_expect_err(term: &Term) -> Error {
    match type_check(term) {
        Ok((elaborated, ty)) => {
            panic!("expected '{term}' to be rejected, got {elaborated} : {ty}")
        }
        Err(e) => *e,
    }
}

/// Helper asserting the inferred type up to renaming of quantifiers, and
/// that the elaboration is well typed and free of rigid constants.
fn assert_checks_at(term: &Term, expected: &Type) -> FTerm {
    let (elaborated, ty) = check_expect_ok(term);
    assert!(
        ty.alpha_eq(expected),
        "'{term}' : expected type {expected}, inferred {ty}"
    );
    type_checker::verify(&elaborated, &ty)
        .unwrap_or_else(|e| panic!("elaboration {elaborated} is ill typed: {e}"));
    assert!(
        !elaborated.mentions_rigid_con() && !ty.mentions_rigid_con(),
        "rigid constant escaped into {elaborated} : {ty}"
    );
    elaborated
}

fn poly_identity_type() -> Type {
    Type::forall(
        TypeVar::named("A"),
        Type::arrow(Type::named_var("A"), Type::named_var("A")),
    )
}

#[test]
fn test_boolean_literal() {
    let elaborated = assert_checks_at(&Term::Bool(true), &Type::bool());
    assert_eq!(elaborated, FTerm::Bool(true));
}

#[test]
fn test_identity_function() {
    let elaborated = assert_checks_at(&Term::lambda("x", Term::var("x")), &poly_identity_type());
    assert_eq!(elaborated.to_string(), "Λt0. λ(x : t0). x");
}

#[test]
fn test_identity_applied_to_literal() {
    let term = Term::apply(Term::lambda("x", Term::var("x")), Term::Int(42));
    let elaborated = assert_checks_at(&term, &Type::int());
    // Both the type redex and the term redex reduce away.
    assert_eq!(elaborated, FTerm::Int(42));
}

#[test]
fn test_annotated_polymorphic_parameter() {
    // λ(f : ∀A. A -> A). f 42
    let term = Term::lambda_annotated(
        "f",
        poly_identity_type(),
        Term::apply(Term::var("f"), Term::Int(42)),
    );
    let expected = Type::arrow(poly_identity_type(), Type::int());
    let elaborated = assert_checks_at(&term, &expected);
    // The call site instantiates f at Int.
    assert_eq!(elaborated.to_string(), "λ(f : ∀t0. t0 -> t0). f [Int] 42");
}

#[test]
fn test_let_polymorphism_self_application() {
    // let id = λx. x in id id
    let term = Term::let_in(
        "id",
        Term::lambda("x", Term::var("x")),
        Term::apply(Term::var("id"), Term::var("id")),
    );
    assert_checks_at(&term, &poly_identity_type());
}

#[test]
fn test_arithmetic_body_stays_monomorphic() {
    let term = Term::lambda("x", Term::arith(ArithOp::Add, Term::var("x"), Term::Int(1)));
    let elaborated = assert_checks_at(&term, &Type::arrow(Type::int(), Type::int()));
    // The body elaborates with no type abstraction.
    match elaborated {
        FTerm::Lambda { body, .. } => assert!(matches!(*body, FTerm::Arith { .. })),
        other => panic!("expected a lambda, got {other}"),
    }
}

#[test]
fn test_conditional_with_empty_list() {
    let term = Term::if_then_else(
        Term::Bool(true),
        Term::List(vec![Term::Int(1), Term::Int(2)]),
        Term::List(Vec::new()),
    );
    assert_checks_at(&term, &Type::list(Type::int()));
}

#[test]
fn test_self_application_rejected() {
    // λx. x x has no finite type; the recursive equation surfaces as a
    // shape mismatch.
    let term = Term::lambda("x", Term::apply(Term::var("x"), Term::var("x")));
    let err = check_expect_err(&term);
    assert!(matches!(err, Error::TypeMismatch { .. }), "got {err}");
}

#[test]
fn test_empty_list_is_fully_polymorphic() {
    let expected = Type::forall(TypeVar::named("A"), Type::list(Type::named_var("A")));
    assert_checks_at(&Term::List(Vec::new()), &expected);
}

#[test]
fn test_list_concatenation() {
    let term = Term::concat(
        Term::List(vec![Term::Int(1)]),
        Term::List(vec![Term::Int(2), Term::Int(3)]),
    );
    assert_checks_at(&term, &Type::list(Type::int()));
}

#[test]
fn test_concat_of_empty_lists_generalizes() {
    let term = Term::concat(Term::List(Vec::new()), Term::List(Vec::new()));
    let expected = Type::forall(TypeVar::named("A"), Type::list(Type::named_var("A")));
    assert_checks_at(&term, &expected);
}

#[test]
fn test_nested_lets() {
    let term = Term::let_in(
        "one",
        Term::Int(1),
        Term::let_in(
            "two",
            Term::arith(ArithOp::Add, Term::var("one"), Term::var("one")),
            Term::arith(ArithOp::Mul, Term::var("two"), Term::var("two")),
        ),
    );
    assert_checks_at(&term, &Type::int());
}

#[test]
fn test_ascription_at_polymorphic_type() {
    // (λx. x) : ∀A. A -> A
    let term = Term::annot(Term::lambda("x", Term::var("x")), poly_identity_type());
    assert_checks_at(&term, &poly_identity_type());
}

#[test]
fn test_ascription_at_instance_type() {
    // (λx. x) : Int -> Int
    let term = Term::annot(
        Term::lambda("x", Term::var("x")),
        Type::arrow(Type::int(), Type::int()),
    );
    assert_checks_at(&term, &Type::arrow(Type::int(), Type::int()));
}

#[test]
fn test_annotation_free_variables_are_flexible() {
    // (λx. x + 1) : a -> a is accepted by solving a to Int.
    let term = Term::annot(
        Term::lambda("x", Term::arith(ArithOp::Add, Term::var("x"), Term::Int(1))),
        Type::arrow(Type::named_var("a"), Type::named_var("a")),
    );
    assert_checks_at(&term, &Type::arrow(Type::int(), Type::int()));
}

#[test]
fn test_higher_rank_argument_used_at_two_types() {
    // λ(f : ∀A. A -> A). if f true then f 1 else f 2
    let term = Term::lambda_annotated(
        "f",
        poly_identity_type(),
        Term::if_then_else(
            Term::apply(Term::var("f"), Term::Bool(true)),
            Term::apply(Term::var("f"), Term::Int(1)),
            Term::apply(Term::var("f"), Term::Int(2)),
        ),
    );
    let expected = Type::arrow(poly_identity_type(), Type::int());
    assert_checks_at(&term, &expected);
}

#[test]
fn test_undefined_variable() {
    let err = check_expect_err(&Term::var("ghost"));
    assert!(matches!(err, Error::UndefinedVariable { .. }));
    assert_eq!(err.to_string(), "Undefined variable: ghost");
}

#[test]
fn test_shadowing_rejected() {
    let term = Term::let_in(
        "x",
        Term::Int(1),
        Term::lambda("x", Term::var("x")),
    );
    let err = check_expect_err(&term);
    assert!(matches!(err, Error::DuplicateVariable { .. }));
}

#[test]
fn test_condition_must_be_boolean() {
    let term = Term::if_then_else(Term::Int(1), Term::Int(2), Term::Int(3));
    let err = check_expect_err(&term);
    assert!(matches!(err, Error::TypeMismatch { .. }));
}

#[test]
fn test_branches_must_agree() {
    let term = Term::if_then_else(Term::Bool(true), Term::Int(1), Term::Bool(false));
    assert!(matches!(check_expect_err(&term), Error::TypeMismatch { .. }));
}

#[test]
fn test_arithmetic_requires_integers() {
    let term = Term::arith(ArithOp::Add, Term::Bool(true), Term::Int(1));
    assert!(matches!(check_expect_err(&term), Error::TypeMismatch { .. }));
}

#[test]
fn test_heterogeneous_list_rejected() {
    let term = Term::List(vec![Term::Int(1), Term::Bool(true)]);
    assert!(matches!(check_expect_err(&term), Error::TypeMismatch { .. }));
}

#[test]
fn test_parameter_needs_annotation_for_polymorphic_use() {
    // λf. (f : ∀A. A -> A) : without an annotation on the binder the
    // parameter is not polymorphic enough.
    let term = Term::lambda("f", Term::annot(Term::var("f"), poly_identity_type()));
    let err = check_expect_err(&term);
    assert!(matches!(err, Error::SkolemEscape { .. }), "got {err}");
    assert!(err.to_string().contains("not polymorphic enough"));
}

#[test]
fn test_annotation_arity_is_validated() {
    let bad = Type::Con(polydust::TypeCon::list(), vec![Type::int(), Type::int()]);
    let term = Term::annot(Term::List(Vec::new()), bad);
    assert!(matches!(
        check_expect_err(&term),
        Error::ArityMismatch { .. }
    ));
}

#[test]
fn test_unknown_constructor_in_annotation() {
    let bad = Type::Con(polydust::TypeCon::named("Maybe"), vec![Type::int()]);
    let term = Term::annot(Term::List(Vec::new()), bad);
    assert!(matches!(
        check_expect_err(&term),
        Error::UnknownConstructor { .. }
    ));
}

#[test]
fn test_round_trip_elaboration_is_deterministic() {
    let program = Term::let_in(
        "id",
        Term::lambda("x", Term::var("x")),
        Term::apply(Term::var("id"), Term::apply(Term::var("id"), Term::Int(7))),
    );
    let first = check_expect_ok(&program);
    let second = check_expect_ok(&program);
    assert_eq!(first, second);
}

#[test]
fn test_simplifier_skippable_and_idempotent() {
    use polydust::{simplify, type_check_with, TypeCheckOptions};

    let program = Term::apply(Term::lambda("x", Term::var("x")), Term::Int(42));
    let raw = type_check_with(
        &program,
        &TypeCheckOptions {
            simplify: false,
            iterate_simplifier: false,
        },
    )
    .unwrap();
    // Unsimplified output keeps the instantiation redex.
    assert!(matches!(raw.0, FTerm::Apply { .. }));
    // Simplifying it by hand reaches the default pipeline's output, and
    // simplification is idempotent on it.
    let simplified = simplify(&raw.0);
    assert_eq!(simplified, FTerm::Int(42));
    assert_eq!(simplify(&simplified), simplified);
    // The simplifier preserves the type.
    type_checker::verify(&simplified, &raw.1).unwrap();
}

#[test]
fn test_syntax_round_trips_through_serde() {
    let program = Term::let_in(
        "xs",
        Term::List(vec![Term::Int(1), Term::Int(2)]),
        Term::concat(Term::var("xs"), Term::List(Vec::new())),
    );
    let encoded = serde_json::to_string(&program).unwrap();
    let decoded: Term = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, program);

    let (elaborated, ty) = check_expect_ok(&program);
    let encoded = serde_json::to_string(&(elaborated.clone(), ty.clone())).unwrap();
    let decoded: (FTerm, Type) = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, (elaborated, ty));
}
