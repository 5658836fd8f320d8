//! Literal end-to-end scenarios against the public pipeline entry point.

use pretty_assertions::assert_eq;

use coc_kernel::syntax::core::CtxElem;
use coc_kernel::{check, DiagnosticKind, Phase};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn identity_function_is_accepted_with_a_single_global() {
    init_logging();
    let globals = check("def id (A : Prop) (x : A) : A := x;").unwrap();
    assert_eq!(globals.len(), 1);
    assert!(globals.lookup("id").is_some());
}

#[test]
fn church_nat_zero_is_accepted() {
    init_logging();
    let src = "def Nat : Prop := forall A : Prop, (A -> A) -> A -> A;\n\
               def zero : Nat := fun (A : Prop) (f : A -> A) (x : A) => x;";
    let globals = check(src).unwrap();
    assert!(globals.lookup("Nat").is_some());
    assert!(globals.lookup("zero").is_some());
}

/// A primitive-recursion-by-iteration encoding exercising Σ projections
/// (`.1`/`.2`), a definitional `let`-binder, and the anonymous product `&`
/// together in one declaration.
#[test]
fn church_nat_iteration_uses_sigma_projections_and_anonymous_products() {
    init_logging();
    let src = "def Nat : Prop := forall A : Prop, (A -> A) -> A -> A;\n\
               def zero : Nat := fun (A : Prop) (f : A -> A) (x : A) => x;\n\
               def succ (n : Nat) : Nat := fun (A : Prop) (f : A -> A) (x : A) => f (n A f x);\n\
               def rec (A : Prop) (n : Nat) (s : A -> A) (a : A) : A :=\n\
                 let step (p : Nat & A) := <succ p.1, s p.2> in\n\
                 (n (Nat & A) step <zero, a>).2;";
    let globals = check(src).unwrap();
    assert!(globals.lookup("rec").is_some());
}

#[test]
fn type_as_a_definition_is_rejected_with_type_has_no_type() {
    init_logging();
    let err = check("def bad : Prop := Type;").unwrap_err();
    assert_eq!(err.phase, Phase::Typecheck);
    match err.kind {
        DiagnosticKind::Typecheck(wf) => {
            assert_eq!(wf.error, coc_kernel::semantics::TypeError::TypeHasNoType);
        }
        other => panic!("expected a typecheck diagnostic, found {other:?}"),
    }
}

#[test]
fn self_application_is_rejected_with_expected_pi() {
    init_logging();
    let err = check("def f : Prop -> Prop := fun x : Prop => x x;").unwrap_err();
    assert_eq!(err.phase, Phase::Typecheck);
    match err.kind {
        DiagnosticKind::Typecheck(wf) => {
            assert!(matches!(
                wf.error,
                coc_kernel::semantics::TypeError::ExpectedPi { .. }
            ));
        }
        other => panic!("expected a typecheck diagnostic, found {other:?}"),
    }
}

#[test]
fn mutually_referencing_globals_are_rejected_with_cycle() {
    init_logging();
    let err = check("def a : Prop := b; def b : Prop := a;").unwrap_err();
    assert_eq!(err.phase, Phase::Context);
    match err.kind {
        DiagnosticKind::Scope(coc_kernel::scope::CtxError::Cycle { .. }) => {}
        other => panic!("expected a Cycle diagnostic, found {other:?}"),
    }
}

#[test]
fn diagnostic_does_not_leak_context_elements_it_was_not_given() {
    init_logging();
    // The offending context element attached to a `Diagnostic` must be the
    // one actually being checked, not some other global.
    let src = "def ok : Prop := Prop; def bad : Prop := Type;";
    let err = check(src).unwrap_err();
    match err.kind {
        DiagnosticKind::Typecheck(wf) => match wf.at {
            CtxElem::Def { name, .. } => assert_eq!(name, "bad"),
            CtxElem::Var { name, .. } => panic!("expected a Def element, found Var {name}"),
        },
        other => panic!("expected a typecheck diagnostic, found {other:?}"),
    }
}

#[test]
fn diagnostic_is_debug_printable() {
    init_logging();
    let err = check("def a : Prop := b; def b : Prop := a;").unwrap_err();
    let rendered = format!("{:?}", err);
    assert!(!rendered.is_empty());
}
