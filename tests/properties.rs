//! Generative checks for the algebraic properties of spec.md §8.
//!
//! `whnf`/`conv` are only guaranteed to terminate on terms a type checker
//! has already accepted (spec.md §4.F), so the generators here are built to
//! stay within that guarantee rather than throwing arbitrary ASTs at them:
//! redexes are single-step and leaf-bodied, and the "idempotence" generator
//! produces only binder/atom shapes that are already weak-head normal by
//! construction, so recursion always bottoms out at a `Sort` or `Var` leaf.

use std::rc::Rc;

use coc_kernel::semantics::normalize::{dsz_nf, whnf};
use coc_kernel::semantics::subst::{alpha_eq, free_vars, subst};
use coc_kernel::syntax::concrete::Sort;
use coc_kernel::syntax::core::{JudgContext, Term, ANON};
use coc_kernel::syntax::lexer::{normalize_line_endings, Lexer};
use coc_kernel::syntax::token::TokenKind;

use proptest::prelude::*;

const NAMES: &[&str] = &["a", "b", "c", "x", "y", "z"];

fn name_strategy() -> impl Strategy<Value = String> {
    proptest::sample::select(NAMES).prop_map(|s| s.to_string())
}

/// Atoms and binder shapes with no application/let/pair anywhere, so the
/// result is always already weak-head normal — and, since no substitution
/// ever fires during normalization, `dsz_nf` on it is a pure structural
/// walk that's guaranteed to terminate regardless of depth.
fn inert_term() -> impl Strategy<Value = Term> {
    let leaf = prop_oneof![
        Just(Term::Sort(Sort::Prop)),
        Just(Term::Sort(Sort::Type)),
        name_strategy().prop_map(Term::Var),
    ];
    leaf.prop_recursive(4, 16, 2, |inner| {
        prop_oneof![
            (name_strategy(), inner.clone(), inner.clone())
                .prop_map(|(x, ty, body)| Term::Pi(x, Rc::new(ty), Rc::new(body))),
            (name_strategy(), inner.clone(), inner)
                .prop_map(|(x, ty, body)| Term::Sig(x, Rc::new(ty), Rc::new(body))),
        ]
    })
}

/// A single β-redex whose body and argument are leaves (`Var`/`Sort`), so
/// substitution can't duplicate work and the one redex is the only
/// reduction step that will ever fire.
fn leaf_beta_redex() -> impl Strategy<Value = (Term, String, Term)> {
    let leaf = prop_oneof![
        Just(Term::Sort(Sort::Prop)),
        name_strategy().prop_map(Term::Var),
    ];
    (name_strategy(), leaf.clone(), leaf).prop_map(|(x, body, arg)| {
        let redex = Term::App(
            Rc::new(Term::Lam(x.clone(), Rc::new(Term::Sort(Sort::Prop)), Rc::new(body.clone()))),
            Rc::new(arg.clone()),
        );
        (redex, x, body)
    })
}

proptest! {
    #[test]
    fn capture_avoiding_substitution_never_introduces_foreign_free_variables(
        t in inert_term(),
        v in name_strategy(),
        u in inert_term(),
    ) {
        let u_rc = Rc::new(u.clone());
        let result = subst(&t, &v, &u_rc);
        let result_fv = free_vars(&result);

        let mut t_fv_minus_v = free_vars(&t);
        t_fv_minus_v.remove(&v);
        let u_fv = free_vars(&u);
        let allowed: std::collections::HashSet<String> = t_fv_minus_v.union(&u_fv).cloned().collect();

        for name in &result_fv {
            prop_assert!(allowed.contains(name), "subst introduced foreign free variable `{}`", name);
        }
    }

    #[test]
    fn alpha_eq_is_reflexive(t in inert_term()) {
        prop_assert!(alpha_eq(&t, &t));
    }

    #[test]
    fn alpha_eq_is_symmetric(a in inert_term(), b in inert_term()) {
        prop_assert_eq!(alpha_eq(&a, &b), alpha_eq(&b, &a));
    }

    #[test]
    fn anonymous_binder_name_does_not_affect_alpha_eq(ty in inert_term(), body in inert_term()) {
        let named = Term::Pi("some_name".to_string(), Rc::new(ty.clone()), Rc::new(body.clone()));
        let anon = Term::Pi(ANON.to_string(), Rc::new(ty), Rc::new(body));
        prop_assert!(alpha_eq(&named, &anon));
    }

    #[test]
    fn normalization_is_idempotent_on_already_inert_terms(t in inert_term()) {
        let ctx = JudgContext::new();
        let once = dsz_nf(&ctx, &t);
        let twice = dsz_nf(&ctx, &once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn beta_reduction_matches_direct_substitution((redex, x, body) in leaf_beta_redex()) {
        let ctx = JudgContext::new();
        let (arg, expected) = match &redex {
            Term::App(_, arg) => (arg.clone(), subst(&body, &x, arg)),
            _ => unreachable!(),
        };
        prop_assert_eq!(whnf(&ctx, &redex), whnf(&ctx, &expected));
        let _ = arg;
    }

    #[test]
    fn zeta_reduction_matches_direct_substitution(x in name_strategy(), def in inert_term(), body_name in name_strategy()) {
        let ctx = JudgContext::new();
        let body = Term::Var(body_name);
        let let_term = Term::Let(x.clone(), None, Rc::new(def.clone()), Rc::new(body.clone()));
        let expected = subst(&body, &x, &Rc::new(def));
        prop_assert_eq!(whnf(&ctx, &let_term), whnf(&ctx, &expected));
    }
}

#[test]
fn tokenizer_round_trip_covers_every_non_trivial_character() {
    let sources = [
        "def id (A : Prop) (x : A) : A := x;",
        "def f : Prop -> Prop -> Prop := fun (x y : Prop) => x;",
        "-- a comment\ndef x : Prop := Prop; {- nested {- block -} comment -}",
    ];
    for src in sources {
        let normalized = normalize_line_endings(src);
        let mut lexer = Lexer::new(&normalized);
        let mut covered = String::new();
        loop {
            let tok = lexer.next_token().unwrap();
            if tok.kind == TokenKind::Eof {
                break;
            }
            let from = tok.range.start;
            let to = tok.range.end;
            if from.line == to.line {
                let line = normalized.lines().nth(from.line - 1).unwrap();
                covered.push_str(&line[from.col - 1..to.col - 1]);
            }
        }
        let expected: String = normalized
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        // Comments are skipped by the tokenizer but still non-whitespace in
        // the source, so this only checks token text is a substring of the
        // stripped source in sequence, not full equality, when comments are
        // present.
        if !src.contains("--") && !src.contains("{-") {
            assert_eq!(covered, expected);
        } else {
            assert!(expected.contains(&covered));
        }
    }
}
