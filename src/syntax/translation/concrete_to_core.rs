//! Desugaring the surface AST into the core term language (spec.md §4.D).
//!
//! This is a pure mapping with no failure mode of its own — anything that
//! could go wrong (unbound names, cycles) was already ruled out by the
//! scope checker (`crate::scope`) before elaboration ever runs.

use std::rc::Rc;

use crate::syntax::concrete::{Binder, Decl, PTerm, Program};
use crate::syntax::core::{CtxElem, Term, ANON};

/// Translate something in the surface syntax to the corresponding core
/// representation.
pub trait ToCore<T> {
    fn to_core(&self) -> T;
}

impl ToCore<Term> for PTerm {
    fn to_core(&self) -> Term {
        match self {
            PTerm::Sort { sort, .. } => Term::Sort(*sort),
            PTerm::Variable { name, .. } => Term::Var(name.clone()),
            PTerm::Lambda { binders, body, .. } => fold_lam(binders, body.to_core()),
            PTerm::Pi { binders, body, .. } => fold_pi(binders, body.to_core()),
            PTerm::Sigma { binders, body, .. } => fold_sig(binders, body.to_core()),
            PTerm::Arrow { input, output, .. } => Term::Pi(
                ANON.to_string(),
                Rc::new(input.to_core()),
                Rc::new(output.to_core()),
            ),
            PTerm::Prod { first, second, .. } => Term::Sig(
                ANON.to_string(),
                Rc::new(first.to_core()),
                Rc::new(second.to_core()),
            ),
            PTerm::Pair {
                first, second, ty, ..
            } => Term::Pair(
                Rc::new(first.to_core()),
                Rc::new(second.to_core()),
                ty.as_ref().map(|t| Rc::new(t.to_core())),
            ),
            PTerm::First { term, .. } => Term::Fst(Rc::new(term.to_core())),
            PTerm::Second { term, .. } => Term::Snd(Rc::new(term.to_core())),
            PTerm::Let {
                name,
                params,
                ty,
                def,
                body,
                ..
            } => {
                // The let-binding's own parameter binders apply to both the
                // declared type (via Pi) and the definition (via Lam), so
                // `let f (x:A) : B := body in ...` desugars to
                // `let f : Pi x:A. B := Lam x:A. body in ...`.
                let def_core = fold_lam(params, def.to_core());
                let ty_core = ty.as_ref().map(|t| fold_pi(params, t.to_core()));
                Term::Let(
                    name.clone(),
                    ty_core.map(Rc::new),
                    Rc::new(def_core),
                    Rc::new(body.to_core()),
                )
            }
            PTerm::Apply { terms, .. } => {
                let mut iter = terms.iter();
                let head = iter
                    .next()
                    .expect("Apply always carries >= 2 terms")
                    .to_core();
                iter.fold(head, |acc, arg| {
                    Term::App(Rc::new(acc), Rc::new(arg.to_core()))
                })
            }
        }
    }
}

/// Expand a binder list into nested `Pi`/`Lam`/`Sig` wrappers around
/// `body`, right-fold so the first binder ends up outermost.
fn fold_binders(
    binders: &[Binder],
    body: Term,
    wrap: impl Fn(&str, Term, Term) -> Term + Copy,
) -> Term {
    let mut term = body;
    for binder in binders.iter().rev() {
        term = match binder {
            Binder::Var { names, ty, .. } => {
                let ty_core = ty.to_core();
                let mut inner = term;
                for (name, _) in names.iter().rev() {
                    inner = wrap(name, ty_core.clone(), inner);
                }
                inner
            }
            Binder::Def { name, ty, def, .. } => Term::Let(
                name.clone(),
                ty.as_ref().map(|t| Rc::new(t.to_core())),
                Rc::new(def.to_core()),
                Rc::new(term),
            ),
        };
    }
    term
}

fn fold_pi(binders: &[Binder], body: Term) -> Term {
    fold_binders(binders, body, |name, ty, inner| {
        Term::Pi(name.to_string(), Rc::new(ty), Rc::new(inner))
    })
}

fn fold_lam(binders: &[Binder], body: Term) -> Term {
    fold_binders(binders, body, |name, ty, inner| {
        Term::Lam(name.to_string(), Rc::new(ty), Rc::new(inner))
    })
}

fn fold_sig(binders: &[Binder], body: Term) -> Term {
    fold_binders(binders, body, |name, ty, inner| {
        Term::Sig(name.to_string(), Rc::new(ty), Rc::new(inner))
    })
}

impl ToCore<CtxElem> for Decl {
    /// A global declaration elaborates to a context element whose type is
    /// the `Pi` over all parameter binders, and whose definition (if any)
    /// is the `Lam` over the same binders.
    fn to_core(&self) -> CtxElem {
        let ty = fold_pi(&self.params, self.ty.to_core());
        match &self.def {
            Some(def) => {
                let def_core = fold_lam(&self.params, def.to_core());
                CtxElem::Def {
                    name: self.name.clone(),
                    ty: Rc::new(ty),
                    def: Rc::new(def_core),
                }
            }
            None => CtxElem::Var {
                name: self.name.clone(),
                ty: Rc::new(ty),
            },
        }
    }
}

impl ToCore<Vec<CtxElem>> for Program {
    fn to_core(&self) -> Vec<CtxElem> {
        self.decls.iter().map(|d| d.to_core()).collect()
    }
}
