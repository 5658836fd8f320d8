//! Structured errors for the bidirectional type checker (spec.md §4.G, §7).

use thiserror::Error;

use crate::syntax::concrete::Sort;
use crate::syntax::core::{CtxElem, Term};

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TypeError {
    #[error("`Type` has no type")]
    TypeHasNoType,

    #[error("unbound variable `{name}`")]
    UnboundVariable { name: String },

    #[error("expected a sort, found `{actual}`")]
    ExpectedSort { actual: Term },

    #[error("expected a function type, found `{actual_ty}` as the type of `{func}`")]
    ExpectedPi { func: Term, actual_ty: Term },

    #[error("expected a pair type, found `{actual_ty}` as the type of `{pair}`")]
    ExpectedSigma { pair: Term, actual_ty: Term },

    #[error("no sort accepts a Sigma formed from `{s0:?}` and `{s1:?}`")]
    ImpossibleCombination { s0: Sort, s1: Sort },

    #[error("expected `{expected}`, found `{actual}`")]
    TypeMismatch { expected: Term, actual: Term },
}

/// A `TypeError` together with the context element whose well-formedness
/// check raised it (spec.md §4.G: "the first error aborts the whole check
/// and is returned with the offending context element attached").
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{error} (at `{at}`)")]
pub struct WFError {
    pub error: TypeError,
    pub at: CtxElem,
}
