//! The core term language (spec.md §3, `Term`).
//!
//! Strictly unary: every binder form carries exactly one bound name. The
//! surface AST's grouped binders, n-ary application, arrows and anonymous
//! products are gone by the time a term reaches this representation — see
//! [`crate::syntax::translation::concrete_to_core`].

use std::fmt;
use std::rc::Rc;

use crate::syntax::concrete::Sort;

/// The anonymous binder name used wherever the surface syntax didn't give
/// one (e.g. `Arrow`'s domain). α-equivalence never distinguishes `_` from
/// any other bound name.
pub const ANON: &str = "_";

#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    Sort(Sort),
    Var(String),
    Lam(String, Rc<Term>, Rc<Term>),
    Pi(String, Rc<Term>, Rc<Term>),
    Pair(Rc<Term>, Rc<Term>, Option<Rc<Term>>),
    Fst(Rc<Term>),
    Snd(Rc<Term>),
    Sig(String, Rc<Term>, Rc<Term>),
    Let(String, Option<Rc<Term>>, Rc<Term>, Rc<Term>),
    App(Rc<Term>, Rc<Term>),
}

impl Term {
    pub fn rc(self) -> Rc<Term> {
        Rc::new(self)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Sort(Sort::Prop) => write!(f, "Prop"),
            Term::Sort(Sort::Type) => write!(f, "Type"),
            Term::Var(x) => write!(f, "{}", x),
            Term::Lam(x, t, b) => write!(f, "fun ({} : {}) => {}", x, t, b),
            Term::Pi(x, t, b) if x == ANON => write!(f, "{} -> {}", t, b),
            Term::Pi(x, t, b) => write!(f, "forall ({} : {}), {}", x, t, b),
            Term::Pair(a, b, None) => write!(f, "<{}, {}>", a, b),
            Term::Pair(a, b, Some(ty)) => write!(f, "<{}, {}> : {}", a, b, ty),
            Term::Fst(p) => write!(f, "{}.1", p),
            Term::Snd(p) => write!(f, "{}.2", p),
            Term::Sig(x, t, b) if x == ANON => write!(f, "{} & {}", t, b),
            Term::Sig(x, t, b) => write!(f, "exist ({} : {}), {}", x, t, b),
            Term::Let(x, None, d, b) => write!(f, "let {} := {} in {}", x, d, b),
            Term::Let(x, Some(t), d, b) => write!(f, "let {} : {} := {} in {}", x, t, d, b),
            Term::App(fun, arg) => write!(f, "({} {})", fun, arg),
        }
    }
}

/// An element of a judgment context (spec.md §3): either an opaque
/// variable or a transparent definition.
#[derive(Clone, Debug, PartialEq)]
pub enum CtxElem {
    Var { name: String, ty: Rc<Term> },
    Def { name: String, ty: Rc<Term>, def: Rc<Term> },
}

impl CtxElem {
    pub fn name(&self) -> &str {
        match self {
            CtxElem::Var { name, .. } | CtxElem::Def { name, .. } => name,
        }
    }

    pub fn ty(&self) -> &Rc<Term> {
        match self {
            CtxElem::Var { ty, .. } | CtxElem::Def { ty, .. } => ty,
        }
    }

    pub fn def(&self) -> Option<&Rc<Term>> {
        match self {
            CtxElem::Var { .. } => None,
            CtxElem::Def { def, .. } => Some(def),
        }
    }
}

impl fmt::Display for CtxElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CtxElem::Var { name, ty } => write!(f, "var {} : {}", name, ty),
            CtxElem::Def { name, ty, def } => write!(f, "def {} : {} := {}", name, ty, def),
        }
    }
}

/// The ordered pair of (global declarations, local parameters) that a term
/// is checked against. Globals precede locals in scope; rightmost wins on
/// name lookup within either list.
///
/// Both lists are `im::Vector`s: extending a context is `O(log n)` and
/// shares structure with every context it was extended from, matching the
/// "logically persistent list" design called for in spec.md §9.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JudgContext {
    pub globals: im::Vector<CtxElem>,
    pub locals: im::Vector<CtxElem>,
}

impl JudgContext {
    pub fn new() -> JudgContext {
        JudgContext::default()
    }

    pub fn extend_global(&self, elem: CtxElem) -> JudgContext {
        let mut globals = self.globals.clone();
        globals.push_back(elem);
        JudgContext {
            globals,
            locals: self.locals.clone(),
        }
    }

    pub fn extend_local(&self, elem: CtxElem) -> JudgContext {
        let mut locals = self.locals.clone();
        locals.push_back(elem);
        JudgContext {
            globals: self.globals.clone(),
            locals,
        }
    }

    /// Search locals right-to-left, then globals right-to-left.
    pub fn lookup(&self, name: &str) -> Option<&CtxElem> {
        self.locals
            .iter()
            .rev()
            .find(|e| e.name() == name)
            .or_else(|| self.globals.iter().rev().find(|e| e.name() == name))
    }
}

/// A read-only typed view over the globals accepted by a full run of the
/// kernel (spec.md §6: `check(source) -> Result<GlobalContext, Diagnostic>`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlobalContext(pub(crate) im::Vector<CtxElem>);

impl GlobalContext {
    pub fn lookup(&self, name: &str) -> Option<&CtxElem> {
        self.0.iter().rev().find(|e| e.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CtxElem> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
