//! Structured errors for the scope & dependency checker (spec.md §4.C, §7).

use thiserror::Error;

use crate::pos::Range;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum DepKind {
    #[error("type")]
    Type,
    #[error("definition")]
    Def,
}

/// One edge of the use/definition graph walked during cycle detection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: DepKind,
    pub range: Range,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum CtxError {
    #[error("global `{name}` is declared more than once")]
    DuplicateGlobal { name: String, range: Range },

    #[error("`{name}` is bound more than once in this declaration's parameters")]
    DuplicateLocal { name: String, range: Range },

    #[error("`{name}` refers to itself in its own {kind}")]
    SelfReference {
        name: String,
        kind: DepKind,
        range: Range,
    },

    #[error("`{name}` is undefined (referenced from `{enclosing}`)")]
    Undefined {
        name: String,
        enclosing: String,
        kind: DepKind,
        range: Range,
    },

    #[error("cyclic dependency among {path:?}")]
    Cycle { path: Vec<Edge>, range: Range },
}

impl CtxError {
    pub fn range(&self) -> Range {
        match self {
            CtxError::DuplicateGlobal { range, .. }
            | CtxError::DuplicateLocal { range, .. }
            | CtxError::SelfReference { range, .. }
            | CtxError::Undefined { range, .. }
            | CtxError::Cycle { range, .. } => *range,
        }
    }
}
