//! A type-checking kernel for a Calculus of Constructions with Σ-types.
//!
//! The pipeline is three stages over a single source string:
//!
//!   lex → parse → [`scope::check_scope`] → [`syntax::translation::ToCore`] → [`semantics::check_program`]
//!
//! [`check`] drives all of them and reports the first failure, tagged with
//! the phase it came from. Each stage is also exported on its own
//! (`syntax::lexer`, `syntax::parse`, `scope::check_scope`,
//! `syntax::translation::ToCore`, `semantics::infer`/`check`) so a caller
//! that only wants, say, a parse tree for an editor doesn't have to run the
//! whole kernel to get one.

pub mod pos;
pub mod scope;
pub mod semantics;
pub mod syntax;

use pos::Range;
use scope::CtxError;
use semantics::WFError;
use syntax::core::{CtxElem, GlobalContext};
use syntax::lexer::LexError;
use syntax::parse::ParseError;
use syntax::translation::ToCore;

/// Which stage of the pipeline a [`Diagnostic`] came from (spec.md §6).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Tokenize,
    Parse,
    Context,
    Typecheck,
}

/// The tagged result of a failed [`check`] run: a phase, and that phase's
/// own structured error. `Diagnostic` never renders text itself — that's a
/// presentation concern, out of scope for the kernel (spec.md §1, §6).
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub phase: Phase,
    pub kind: DiagnosticKind,
}

/// The per-phase error payload. `ParseError::Lex` is surfaced as
/// `Phase::Tokenize` rather than `Phase::Parse`, matching spec.md's
/// four-phase taxonomy (Tokenize/Parse/Context/Typecheck) rather than the
/// parser's own two-variant error enum.
#[derive(Clone, Debug, PartialEq)]
pub enum DiagnosticKind {
    Lex(LexError),
    Parse(ParseError),
    Scope(CtxError),
    Typecheck(WFError),
}

impl Diagnostic {
    /// The source range the diagnostic points at, when the underlying error
    /// carries one.
    pub fn range(&self) -> Option<Range> {
        match &self.kind {
            DiagnosticKind::Lex(LexError::UnexpectedChar(_, pos)) => Some(Range::zero(*pos)),
            DiagnosticKind::Lex(LexError::UnclosedComment(pos)) => Some(Range::zero(*pos)),
            DiagnosticKind::Parse(ParseError::Lex(_)) => None,
            DiagnosticKind::Parse(ParseError::UnexpectedToken { actual, .. }) => {
                Some(actual.range)
            }
            DiagnosticKind::Scope(err) => Some(err.range()),
            DiagnosticKind::Typecheck(_) => None,
        }
    }

    fn from_parse_error(err: ParseError) -> Diagnostic {
        match err {
            ParseError::Lex(lex_err) => Diagnostic {
                phase: Phase::Tokenize,
                kind: DiagnosticKind::Lex(lex_err),
            },
            other => Diagnostic {
                phase: Phase::Parse,
                kind: DiagnosticKind::Parse(other),
            },
        }
    }
}

/// Run the whole kernel over `source`: tokenize, parse, scope-check,
/// elaborate, and type-check, in that order, stopping at the first
/// failure (spec.md §6-§7: every error is fatal, earlier phases
/// short-circuit later ones).
pub fn check(source: &str) -> Result<GlobalContext, Diagnostic> {
    let (program, _trace) =
        syntax::parse::parse_program(source).map_err(Diagnostic::from_parse_error)?;

    scope::check_scope(&program).map_err(|err| Diagnostic {
        phase: Phase::Context,
        kind: DiagnosticKind::Scope(err),
    })?;

    let elems: Vec<CtxElem> = program.to_core();

    semantics::check_program(&elems).map_err(|err| Diagnostic {
        phase: Phase::Typecheck,
        kind: DiagnosticKind::Typecheck(err),
    })
}
