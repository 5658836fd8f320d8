//! The surface AST (spec.md §3, `PTerm`).
//!
//! Nodes here are produced by the parser and consumed by the elaborator;
//! once elaboration has run, surface nodes are never looked at again.

use crate::pos::Range;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sort {
    Prop,
    Type,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PTerm {
    Sort {
        range: Range,
        sort: Sort,
    },
    Variable {
        range: Range,
        name: String,
    },
    Lambda {
        range: Range,
        binders: Vec<Binder>,
        body: Box<PTerm>,
    },
    Pi {
        range: Range,
        binders: Vec<Binder>,
        body: Box<PTerm>,
    },
    Arrow {
        range: Range,
        input: Box<PTerm>,
        output: Box<PTerm>,
    },
    Pair {
        range: Range,
        first: Box<PTerm>,
        second: Box<PTerm>,
        ty: Option<Box<PTerm>>,
    },
    First {
        range: Range,
        term: Box<PTerm>,
    },
    Second {
        range: Range,
        term: Box<PTerm>,
    },
    Sigma {
        range: Range,
        binders: Vec<Binder>,
        body: Box<PTerm>,
    },
    Prod {
        range: Range,
        first: Box<PTerm>,
        second: Box<PTerm>,
    },
    Let {
        range: Range,
        name: String,
        name_range: Range,
        params: Vec<Binder>,
        ty: Option<Box<PTerm>>,
        def: Box<PTerm>,
        body: Box<PTerm>,
    },
    Apply {
        range: Range,
        terms: Vec<PTerm>,
    },
}

impl PTerm {
    pub fn range(&self) -> Range {
        match self {
            PTerm::Sort { range, .. }
            | PTerm::Variable { range, .. }
            | PTerm::Lambda { range, .. }
            | PTerm::Pi { range, .. }
            | PTerm::Arrow { range, .. }
            | PTerm::Pair { range, .. }
            | PTerm::First { range, .. }
            | PTerm::Second { range, .. }
            | PTerm::Sigma { range, .. }
            | PTerm::Prod { range, .. }
            | PTerm::Let { range, .. }
            | PTerm::Apply { range, .. } => *range,
        }
    }
}

/// One name bound to a single type, as in `(x₁ x₂ … : T)`, or one local
/// definition, as in `(x : T := d)` / `(x := d)`.
#[derive(Clone, Debug, PartialEq)]
pub enum Binder {
    Var {
        range: Range,
        names: Vec<(String, Range)>,
        ty: Box<PTerm>,
    },
    Def {
        range: Range,
        name: String,
        name_range: Range,
        ty: Option<Box<PTerm>>,
        def: Box<PTerm>,
    },
}

impl Binder {
    pub fn range(&self) -> Range {
        match self {
            Binder::Var { range, .. } | Binder::Def { range, .. } => *range,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeclKind {
    Def,
    Var,
}

/// A global declaration: `def NAME params : TYPE := BODY;` or
/// `var NAME params : TYPE;`.
#[derive(Clone, Debug, PartialEq)]
pub struct Decl {
    pub kind: DeclKind,
    pub name: String,
    pub name_range: Range,
    pub params: Vec<Binder>,
    pub ty: Box<PTerm>,
    pub def: Option<Box<PTerm>>,
    pub range: Range,
}

/// One entry of a declaration's flattened local parameter list: one per
/// bound name, independent of how many names a single `Var` binder grouped
/// together.
#[derive(Clone, Debug, PartialEq)]
pub enum LocalElem {
    Var {
        name: String,
        range: Range,
        ty: PTerm,
    },
    Def {
        name: String,
        range: Range,
        ty: Option<PTerm>,
        def: PTerm,
    },
}

impl LocalElem {
    pub fn name(&self) -> &str {
        match self {
            LocalElem::Var { name, .. } | LocalElem::Def { name, .. } => name,
        }
    }

    pub fn range(&self) -> Range {
        match self {
            LocalElem::Var { range, .. } | LocalElem::Def { range, .. } => *range,
        }
    }
}

impl Decl {
    /// Flatten the grouped parameter binder list into one [`LocalElem`] per
    /// bound name (spec.md §3: "a flattened list of parameter elements").
    pub fn flatten_locals(&self) -> Vec<LocalElem> {
        let mut out = Vec::new();
        for binder in &self.params {
            match binder {
                Binder::Var { names, ty, .. } => {
                    for (name, range) in names {
                        out.push(LocalElem::Var {
                            name: name.clone(),
                            range: *range,
                            ty: (**ty).clone(),
                        });
                    }
                }
                Binder::Def {
                    name,
                    name_range,
                    ty,
                    def,
                    ..
                } => {
                    out.push(LocalElem::Def {
                        name: name.clone(),
                        range: *name_range,
                        ty: ty.as_deref().cloned(),
                        def: (**def).clone(),
                    });
                }
            }
        }
        out
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub decls: Vec<Decl>,
}

impl Program {
    pub fn decls(&self) -> &[Decl] {
        &self.decls
    }
}
