//! The bidirectional type checker (spec.md §4.G).
//!
//! Two mutually recursive judgments drive everything here:
//!
//!   infer(Γ, t) ⇒ T            "t synthesizes type T"
//!   check(Γ, t, T) ⇒ ok         "t checks against T"
//!
//! `infer` is total on the core language — every shape has a rule — while
//! `check` only special-cases `Pair` against a `Sig` and otherwise defers to
//! `infer` plus a `conv` comparison. Both run under a [`JudgContext`]; the
//! whole-program entry point is [`check_program`], which folds
//! [`infer`]/[`check`] over a declaration list one element at a time,
//! extending the context only after each element has been accepted.


pub mod errors;
pub mod normalize;
pub mod subst;

pub use errors::{TypeError, WFError};

use std::rc::Rc;

use log::{debug, trace};

use crate::syntax::concrete::Sort;
use crate::syntax::core::{CtxElem, GlobalContext, JudgContext, Term, ANON};

use self::normalize::{conv, whnf};
use self::subst::subst;

/// `infer(ctx, t) ⇒ type`.
pub fn infer(ctx: &JudgContext, t: &Term) -> Result<Term, TypeError> {
    trace!("infer {}", t);
    match t {
        // Sort(Prop) : Sort(Type).
        Term::Sort(Sort::Prop) => Ok(Term::Sort(Sort::Type)),
        // Sort(Type) has no type: Type : Type is not a rule of this system.
        Term::Sort(Sort::Type) => Err(TypeError::TypeHasNoType),

        Term::Var(x) => ctx
            .lookup(x)
            .map(|elem| (**elem.ty()).clone())
            .ok_or_else(|| TypeError::UnboundVariable { name: x.clone() }),

        // 1. Γ, x:T ⊢ b ⇒ B
        // 2. Γ ⊢ (Π x:T. B) ⇒ s        (verifies the formed Pi is itself well-sorted)
        // ───────────────────────────── (INFER/LAM)
        // Γ ⊢ (λ x:T. b) ⇒ Π x:T. B
        Term::Lam(x, ty, body) => {
            let extended = ctx.extend_local(CtxElem::Var {
                name: x.clone(),
                ty: ty.clone(),
            });
            let body_ty = infer(&extended, body)?;
            let pi = Term::Pi(x.clone(), ty.clone(), Rc::new(body_ty));
            infer(ctx, &pi)?;
            Ok(pi)
        }

        // 1. Γ ⊢ T ⇒ s₀
        // 2. Γ, x:T ⊢ B ⇒ s₁
        // ───────────────────────────── (INFER/PI)
        // Γ ⊢ (Π x:T. B) ⇒ s₁
        Term::Pi(x, ty, body) => {
            expect_sort(ctx, ty)?;
            let extended = ctx.extend_local(CtxElem::Var {
                name: x.clone(),
                ty: ty.clone(),
            });
            let s1 = expect_sort(&extended, body)?;
            Ok(Term::Sort(s1))
        }

        // Same premises as Pi, but the resulting sort depends on the
        // combination: (Prop,Prop) stays impredicative, anything else with
        // a Type component lands in Type, everything else is rejected.
        Term::Sig(x, ty, body) => {
            let s0 = expect_sort(ctx, ty)?;
            let extended = ctx.extend_local(CtxElem::Var {
                name: x.clone(),
                ty: ty.clone(),
            });
            let s1 = expect_sort(&extended, body)?;
            match (s0, s1) {
                (Sort::Prop, Sort::Prop) => Ok(Term::Sort(Sort::Prop)),
                (_, Sort::Type) => Ok(Term::Sort(Sort::Type)),
                _ => Err(TypeError::ImpossibleCombination { s0, s1 }),
            }
        }

        Term::Pair(_, _, Some(ascription)) => {
            check(ctx, t, ascription)?;
            Ok((**ascription).clone())
        }
        Term::Pair(a, b, None) => {
            let a_ty = infer(ctx, a)?;
            let b_ty = infer(ctx, b)?;
            Ok(Term::Sig(ANON.to_string(), Rc::new(a_ty), Rc::new(b_ty)))
        }

        // Γ ⊢ p ⇒ Sig(x,T,B)
        // ───────────────────── (INFER/FST)
        // Γ ⊢ p.1 ⇒ T
        Term::Fst(p) => match whnf(ctx, &infer(ctx, p)?) {
            Term::Sig(_, ty, _) => Ok((*ty).clone()),
            actual_ty => Err(TypeError::ExpectedSigma {
                pair: (**p).clone(),
                actual_ty,
            }),
        },

        // Γ ⊢ p ⇒ Sig(x,T,B)
        // ───────────────────── (INFER/SND)
        // Γ ⊢ p.2 ⇒ subst(B, x, p.1)
        Term::Snd(p) => match whnf(ctx, &infer(ctx, p)?) {
            Term::Sig(x, _, body) => Ok(subst(&body, &x, &Rc::new(Term::Fst(p.clone())))),
            actual_ty => Err(TypeError::ExpectedSigma {
                pair: (**p).clone(),
                actual_ty,
            }),
        },

        Term::Let(x, ty, def, body) => {
            let def_ty = match ty {
                Some(ty) => {
                    check(ctx, def, ty)?;
                    (**ty).clone()
                }
                None => infer(ctx, def)?,
            };
            let extended = ctx.extend_local(CtxElem::Def {
                name: x.clone(),
                ty: Rc::new(def_ty),
                def: def.clone(),
            });
            let body_ty = infer(&extended, body)?;
            Ok(subst(&body_ty, x, def))
        }

        // Γ ⊢ f ⇒ Pi(x,T,B)     Γ ⊢ a ⇐ T
        // ──────────────────────────────── (INFER/APP)
        // Γ ⊢ (f a) ⇒ subst(B, x, a)
        Term::App(f, a) => match whnf(ctx, &infer(ctx, f)?) {
            Term::Pi(x, ty, body) => {
                check(ctx, a, &ty)?;
                Ok(subst(&body, &x, a))
            }
            actual_ty => Err(TypeError::ExpectedPi {
                func: (**f).clone(),
                actual_ty,
            }),
        },
    }
}

/// `check(ctx, t, expected) ⇒ ok`.
pub fn check(ctx: &JudgContext, t: &Term, expected: &Term) -> Result<(), TypeError> {
    trace!("check {} against {}", t, expected);
    if let Term::Pair(a, b, _) = t {
        if let Term::Sig(x, ty, body) = whnf(ctx, expected) {
            check(ctx, a, &ty)?;
            let body_inst = subst(&body, &x, a);
            check(ctx, b, &body_inst)?;
            expect_sort(ctx, &body_inst)?;
            return Ok(());
        }
    }
    let actual = infer(ctx, t)?;
    if conv(ctx, &actual, expected) {
        Ok(())
    } else {
        Err(TypeError::TypeMismatch {
            expected: expected.clone(),
            actual,
        })
    }
}

/// Infer `t`'s type and require that it whnf-normalizes to a `Sort`,
/// returning that sort. Used everywhere a binder's type, or a Pi/Sig part,
/// must itself be well-sorted.
fn expect_sort(ctx: &JudgContext, t: &Term) -> Result<Sort, TypeError> {
    match whnf(ctx, &infer(ctx, t)?) {
        Term::Sort(s) => Ok(s),
        actual => Err(TypeError::ExpectedSort { actual }),
    }
}

/// Check the well-formedness of a whole global declaration list and fold it
/// into a [`GlobalContext`] (spec.md §4.G): for a `Var(x,T)`, `T` must infer
/// a sort; for a `Def(x,T,d)`, `d` must check against `T`. The first failure
/// aborts the whole run and is reported with the offending element
/// attached — there is no partial success.
pub fn check_program(elems: &[CtxElem]) -> Result<GlobalContext, WFError> {
    let mut ctx = JudgContext::new();
    for elem in elems {
        debug!("checking global `{}`", elem.name());
        match elem {
            CtxElem::Var { ty, .. } => {
                expect_sort(&ctx, ty).map_err(|error| WFError {
                    error,
                    at: elem.clone(),
                })?;
            }
            CtxElem::Def { ty, def, .. } => {
                check(&ctx, def, ty).map_err(|error| WFError {
                    error,
                    at: elem.clone(),
                })?;
            }
        }
        ctx = ctx.extend_global(elem.clone());
    }
    Ok(GlobalContext(ctx.globals))
}
