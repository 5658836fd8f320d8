//! Weak-head reduction, full definitional normal forms, and convertibility
//! (spec.md §4.F).
//!
//! Three judgments live here:
//!
//! * [`whnf`] reduces a term just far enough to see its head constructor —
//!   β at an application, ζ at a `let`, δ at a variable bound to a
//!   definition, and projection of an already-paired `Fst`/`Snd`.
//! * [`dsz_nf`] additionally expands δ and ζ underneath every binder and
//!   application, giving a full normal form. It's comparatively expensive
//!   and is only used where `conv` can't decide an equality from structure
//!   and one-sided η alone.
//! * [`conv`] is definitional equality: it normalizes both sides with
//!   `dszNF` (itself already weak-head normal, `whnf` on top is a no-op),
//!   η-expands the non-`Lam` side if exactly one side came out a `Lam`,
//!   and otherwise compares the normal forms by α-equivalence.

use std::rc::Rc;

use crate::syntax::core::{CtxElem, JudgContext, Term};

use super::subst::{alpha_eq, subst};

/// Reduce `t` to weak head normal form under `ctx`.
pub fn whnf(ctx: &JudgContext, t: &Term) -> Term {
    match t {
        Term::Var(x) => match ctx.lookup(x) {
            Some(CtxElem::Def { def, .. }) => whnf(ctx, def),
            _ => Term::Var(x.clone()),
        },
        Term::App(f, arg) => match whnf(ctx, f) {
            Term::Lam(x, _, body) => whnf(ctx, &subst(&body, &x, arg)),
            other => Term::App(Rc::new(other), arg.clone()),
        },
        Term::Let(x, _, def, body) => whnf(ctx, &subst(body, x, def)),
        Term::Fst(p) => match whnf(ctx, p) {
            Term::Pair(a, _, _) => whnf(ctx, &a),
            other => Term::Fst(Rc::new(other)),
        },
        Term::Snd(p) => match whnf(ctx, p) {
            Term::Pair(_, b, _) => whnf(ctx, &b),
            other => Term::Snd(Rc::new(other)),
        },
        other => other.clone(),
    }
}

/// Reduce `t` to its full δ/ζ-expanding normal form: every definition and
/// every `let` is unfolded, everywhere in the term, not just at the head.
pub fn dsz_nf(ctx: &JudgContext, t: &Term) -> Term {
    match whnf(ctx, t) {
        Term::Sort(s) => Term::Sort(s),
        Term::Var(x) => Term::Var(x),
        Term::Lam(x, ty, body) => {
            Term::Lam(x, Rc::new(dsz_nf(ctx, &ty)), Rc::new(dsz_nf(ctx, &body)))
        }
        Term::Pi(x, ty, body) => {
            Term::Pi(x, Rc::new(dsz_nf(ctx, &ty)), Rc::new(dsz_nf(ctx, &body)))
        }
        Term::Sig(x, ty, body) => {
            Term::Sig(x, Rc::new(dsz_nf(ctx, &ty)), Rc::new(dsz_nf(ctx, &body)))
        }
        Term::Pair(a, b, ty) => Term::Pair(
            Rc::new(dsz_nf(ctx, &a)),
            Rc::new(dsz_nf(ctx, &b)),
            ty.map(|t| Rc::new(dsz_nf(ctx, &t))),
        ),
        Term::Fst(p) => Term::Fst(Rc::new(dsz_nf(ctx, &p))),
        Term::Snd(p) => Term::Snd(Rc::new(dsz_nf(ctx, &p))),
        Term::App(f, a) => Term::App(Rc::new(dsz_nf(ctx, &f)), Rc::new(dsz_nf(ctx, &a))),
        Term::Let(..) => unreachable!("whnf always eliminates a head-position Let"),
    }
}

/// Definitional equality of `a` and `b` under `ctx`: compute `whnf ∘ dszNF`
/// on both sides, η-expand the non-`Lam` side if exactly one side is a
/// `Lam`, and otherwise fall back to α-equivalence of the normalized forms.
pub fn conv(ctx: &JudgContext, a: &Term, b: &Term) -> bool {
    let wa = whnf(ctx, &dsz_nf(ctx, a));
    let wb = whnf(ctx, &dsz_nf(ctx, b));
    match (&wa, &wb) {
        (Term::Lam(x, ty, body), other) if !matches!(other, Term::Lam(..)) => {
            conv_eta(ctx, x, ty, body, other, true)
        }
        (other, Term::Lam(x, ty, body)) if !matches!(other, Term::Lam(..)) => {
            conv_eta(ctx, x, ty, body, other, false)
        }
        _ => alpha_eq(&wa, &wb),
    }
}

/// η for functions: compare `Lam x:ty. body` against an arbitrary `other`
/// by extending the context with `x : ty` and comparing `body` against
/// `other x`.
fn conv_eta(
    ctx: &JudgContext,
    x: &str,
    ty: &Rc<Term>,
    body: &Rc<Term>,
    other: &Term,
    lam_on_left: bool,
) -> bool {
    let extended = ctx.extend_local(CtxElem::Var {
        name: x.to_string(),
        ty: ty.clone(),
    });
    let applied = Term::App(Rc::new(other.clone()), Rc::new(Term::Var(x.to_string())));
    if lam_on_left {
        conv(&extended, body, &applied)
    } else {
        conv(&extended, &applied, body)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::syntax::concrete::Sort;
    use crate::syntax::core::ANON;

    fn prop() -> Rc<Term> {
        Rc::new(Term::Sort(Sort::Prop))
    }

    fn var(x: &str) -> Rc<Term> {
        Rc::new(Term::Var(x.to_string()))
    }

    #[test]
    fn whnf_reduces_beta_redex() {
        let ctx = JudgContext::new();
        let id = Term::Lam(ANON.to_string(), prop(), var(ANON));
        let app = Term::App(Rc::new(id), var("a"));
        assert_eq!(whnf(&ctx, &app), Term::Var("a".to_string()));
    }

    #[test]
    fn whnf_reduces_let_via_zeta() {
        let ctx = JudgContext::new();
        let t = Term::Let("x".to_string(), None, var("a"), var("x"));
        assert_eq!(whnf(&ctx, &t), Term::Var("a".to_string()));
    }

    #[test]
    fn whnf_unfolds_global_definitions() {
        let ctx = JudgContext::new().extend_global(CtxElem::Def {
            name: "two".to_string(),
            ty: prop(),
            def: var("a"),
        });
        assert_eq!(whnf(&ctx, &Term::Var("two".to_string())), Term::Var("a".to_string()));
    }

    #[test]
    fn whnf_leaves_opaque_variables_alone() {
        let ctx = JudgContext::new().extend_global(CtxElem::Var {
            name: "x".to_string(),
            ty: prop(),
        });
        assert_eq!(whnf(&ctx, &Term::Var("x".to_string())), Term::Var("x".to_string()));
    }

    #[test]
    fn conv_is_reflexive() {
        let ctx = JudgContext::new();
        assert!(conv(&ctx, &Term::Sort(Sort::Prop), &Term::Sort(Sort::Prop)));
    }

    #[test]
    fn conv_rejects_different_sorts() {
        let ctx = JudgContext::new();
        assert!(!conv(&ctx, &Term::Sort(Sort::Prop), &Term::Sort(Sort::Type)));
    }

    #[test]
    fn conv_sees_through_beta_and_delta() {
        let ctx = JudgContext::new().extend_global(CtxElem::Def {
            name: "f".to_string(),
            ty: prop(),
            def: Rc::new(Term::Lam(ANON.to_string(), prop(), var(ANON))),
        });
        let lhs = Term::App(var("f"), var("a"));
        assert!(conv(&ctx, &lhs, &Term::Var("a".to_string())));
    }

    #[test]
    fn conv_eta_expands_function_side() {
        let ctx = JudgContext::new().extend_global(CtxElem::Var {
            name: "f".to_string(),
            ty: Rc::new(Term::Pi(ANON.to_string(), prop(), prop())),
        });
        let eta = Term::Lam(
            "x".to_string(),
            prop(),
            Rc::new(Term::App(var("f"), var("x"))),
        );
        assert!(conv(&ctx, &eta, &Term::Var("f".to_string())));
    }

    #[test]
    fn conv_congruence_on_pi_codomain() {
        let ctx = JudgContext::new();
        let a = Term::Pi(ANON.to_string(), prop(), prop());
        let b = Term::Pi("x".to_string(), prop(), prop());
        assert!(conv(&ctx, &a, &b));
    }

    #[test]
    fn conv_rejects_structurally_different_pairs() {
        let ctx = JudgContext::new();
        let a = Term::Pair(var("a"), var("b"), None);
        let b = Term::Pair(var("a"), var("c"), None);
        assert!(!conv(&ctx, &a, &b));
    }
}
