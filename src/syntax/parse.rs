//! Recursive-descent parser (spec.md §4.B).
//!
//! One token of lookahead, no backtracking, no error recovery: the first
//! error wins and is returned with its source position. Precedence is
//! encoded directly in the call chain, from weakest to strongest:
//! quantifier/`let` → `->` → `&` → application → projection → atom.

use thiserror::Error;

use crate::pos::{Position, Range};
use crate::syntax::concrete::{Binder, Decl, DeclKind, PTerm, Program, Sort};
use crate::syntax::lexer::{normalize_line_endings, LexError, Lexer};
use crate::syntax::token::{Token, TokenKind};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("expected {expected}, found {actual}")]
    UnexpectedToken { expected: String, actual: Token },
}

/// One entry of the diagnostic trace tree (spec.md §4.B, §9): a record of
/// entering and leaving a grammar production, independent of whether it
/// succeeded. Never consulted by the parser itself.
#[derive(Clone, Debug)]
pub struct TraceNode {
    pub production: &'static str,
    pub range: Range,
    pub success: bool,
}

#[derive(Default)]
pub struct ParseTrace {
    nodes: Vec<TraceNode>,
    stack: Vec<(&'static str, Position)>,
}

impl ParseTrace {
    fn enter(&mut self, production: &'static str, at: Position) {
        self.stack.push((production, at));
    }

    fn exit(&mut self, end: Position, success: bool) {
        if let Some((production, start)) = self.stack.pop() {
            self.nodes.push(TraceNode {
                production,
                range: Range::new(start, end),
                success,
            });
        }
    }

    pub fn nodes(&self) -> &[TraceNode] {
        &self.nodes
    }
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    cur: Token,
    prev_end: Position,
    trace: ParseTrace,
}

/// Runs `body`, recording a trace entry for `production` that spans from
/// the lookahead token's start to wherever the parser ends up, regardless
/// of whether `body` succeeded.
macro_rules! traced {
    ($self:ident, $production:expr, $body:expr) => {{
        let start = $self.cur.range.start;
        $self.trace.enter($production, start);
        let result = $body;
        $self.trace.exit($self.prev_end, result.is_ok());
        result
    }};
}

impl<'a> Parser<'a> {
    pub fn new(normalized_src: &'a str) -> Result<Parser<'a>, ParseError> {
        let mut lexer = Lexer::new(normalized_src);
        let cur = lexer.next_token()?;
        Ok(Parser {
            lexer,
            cur,
            prev_end: Position::start(),
            trace: ParseTrace::default(),
        })
    }

    pub fn into_trace(self) -> ParseTrace {
        self.trace
    }

    fn bump(&mut self) -> Result<Token, ParseError> {
        let next = self.lexer.next_token()?;
        self.prev_end = self.cur.range.end;
        Ok(std::mem::replace(&mut self.cur, next))
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.cur.kind == kind {
            self.bump()
        } else {
            Err(ParseError::UnexpectedToken {
                expected: kind.describe().to_string(),
                actual: self.cur.clone(),
            })
        }
    }

    fn expect_ident(&mut self) -> Result<(String, Range), ParseError> {
        match self.cur.kind.clone() {
            TokenKind::Ident(name) => {
                let tok = self.bump()?;
                Ok((name, tok.range))
            }
            _ => Err(ParseError::UnexpectedToken {
                expected: "identifier".to_string(),
                actual: self.cur.clone(),
            }),
        }
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut decls = Vec::new();
        while self.cur.kind != TokenKind::Eof {
            decls.push(self.parse_decl()?);
        }
        Ok(Program { decls })
    }

    fn parse_decl(&mut self) -> Result<Decl, ParseError> {
        traced!(self, "Decl", {
            let start = self.cur.range;

            let kind = match self.cur.kind {
                TokenKind::Def => {
                    self.bump()?;
                    DeclKind::Def
                }
                TokenKind::Var => {
                    self.bump()?;
                    DeclKind::Var
                }
                _ => DeclKind::Def,
            };

            let (name, name_range) = self.expect_ident()?;

            let mut params = Vec::new();
            while self.cur.kind == TokenKind::LParen {
                params.push(self.parse_closed_binder()?);
            }

            self.expect(TokenKind::Colon)?;
            let ty = Box::new(self.parse_term()?);

            let def = if self.cur.kind == TokenKind::ColonEq {
                self.bump()?;
                Some(Box::new(self.parse_term()?))
            } else {
                None
            };

            match (kind, &def) {
                (DeclKind::Def, None) => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "':=' ".to_string(),
                        actual: self.cur.clone(),
                    })
                }
                (DeclKind::Var, Some(_)) => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "';'".to_string(),
                        actual: self.cur.clone(),
                    })
                }
                _ => {}
            }

            let semi = self.expect(TokenKind::Semi)?;
            let range = start.to(semi.range);

            Ok(Decl {
                kind,
                name,
                name_range,
                params,
                ty,
                def,
                range,
            })
        })
    }

    /// `Binder ::= OpenBinder | ClosedBinder`, with an `OpenBinder` only
    /// permitted as the very first binder after a quantifier keyword.
    fn parse_binder_list(&mut self) -> Result<Vec<Binder>, ParseError> {
        let mut binders = Vec::new();
        let first = if self.cur.kind == TokenKind::LParen {
            self.parse_closed_binder()?
        } else {
            self.parse_open_binder()?
        };
        binders.push(first);
        while self.cur.kind == TokenKind::LParen {
            binders.push(self.parse_closed_binder()?);
        }
        Ok(binders)
    }

    fn parse_open_binder(&mut self) -> Result<Binder, ParseError> {
        traced!(self, "OpenBinder", {
            let start = self.cur.range;
            let mut names = vec![self.expect_ident()?];
            while matches!(self.cur.kind, TokenKind::Ident(_)) {
                names.push(self.expect_ident()?);
            }
            self.expect(TokenKind::Colon)?;
            let ty = Box::new(self.parse_term()?);
            let range = start.to(ty.range());
            Ok(Binder::Var { range, names, ty })
        })
    }

    fn parse_closed_binder(&mut self) -> Result<Binder, ParseError> {
        traced!(self, "ClosedBinder", {
            let open = self.expect(TokenKind::LParen)?;
            let mut names = vec![self.expect_ident()?];
            while matches!(self.cur.kind, TokenKind::Ident(_)) {
                names.push(self.expect_ident()?);
            }

            if self.cur.kind == TokenKind::ColonEq {
                // `(x := d)` — single name, no type annotation.
                if names.len() != 1 {
                    return Err(ParseError::UnexpectedToken {
                        expected: "':'".to_string(),
                        actual: self.cur.clone(),
                    });
                }
                self.bump()?;
                let def = Box::new(self.parse_term()?);
                let close = self.expect(TokenKind::RParen)?;
                let (name, name_range) = names.into_iter().next().unwrap();
                return Ok(Binder::Def {
                    range: open.range.to(close.range),
                    name,
                    name_range,
                    ty: None,
                    def,
                });
            }

            self.expect(TokenKind::Colon)?;
            let ty = Box::new(self.parse_term()?);

            if self.cur.kind == TokenKind::ColonEq {
                // `(x : T := d)` — single name, typed definition.
                if names.len() != 1 {
                    return Err(ParseError::UnexpectedToken {
                        expected: "')'".to_string(),
                        actual: self.cur.clone(),
                    });
                }
                self.bump()?;
                let def = Box::new(self.parse_term()?);
                let close = self.expect(TokenKind::RParen)?;
                let (name, name_range) = names.into_iter().next().unwrap();
                return Ok(Binder::Def {
                    range: open.range.to(close.range),
                    name,
                    name_range,
                    ty: Some(ty),
                    def,
                });
            }

            let close = self.expect(TokenKind::RParen)?;
            Ok(Binder::Var {
                range: open.range.to(close.range),
                names,
                ty,
            })
        })
    }

    pub fn parse_term(&mut self) -> Result<PTerm, ParseError> {
        traced!(self, "Term", {
            match self.cur.kind {
                TokenKind::Fun => {
                    let start = self.cur.range;
                    self.bump()?;
                    let binders = self.parse_binder_list()?;
                    self.expect(TokenKind::FatArrow)?;
                    let body = Box::new(self.parse_term()?);
                    let range = start.to(body.range());
                    Ok(PTerm::Lambda {
                        range,
                        binders,
                        body,
                    })
                }
                TokenKind::Forall => {
                    let start = self.cur.range;
                    self.bump()?;
                    let binders = self.parse_binder_list()?;
                    self.expect(TokenKind::Comma)?;
                    let body = Box::new(self.parse_term()?);
                    let range = start.to(body.range());
                    Ok(PTerm::Pi {
                        range,
                        binders,
                        body,
                    })
                }
                TokenKind::Exist => {
                    let start = self.cur.range;
                    self.bump()?;
                    let binders = self.parse_binder_list()?;
                    self.expect(TokenKind::Comma)?;
                    let body = Box::new(self.parse_term()?);
                    let range = start.to(body.range());
                    Ok(PTerm::Sigma {
                        range,
                        binders,
                        body,
                    })
                }
                TokenKind::Let => {
                    let start = self.cur.range;
                    self.bump()?;
                    let (name, name_range) = self.expect_ident()?;
                    let mut params = Vec::new();
                    while self.cur.kind == TokenKind::LParen {
                        params.push(self.parse_closed_binder()?);
                    }
                    let ty = if self.cur.kind == TokenKind::Colon {
                        self.bump()?;
                        Some(Box::new(self.parse_term()?))
                    } else {
                        None
                    };
                    self.expect(TokenKind::ColonEq)?;
                    let def = Box::new(self.parse_term()?);
                    self.expect(TokenKind::In)?;
                    let body = Box::new(self.parse_term()?);
                    let range = start.to(body.range());
                    Ok(PTerm::Let {
                        range,
                        name,
                        name_range,
                        params,
                        ty,
                        def,
                        body,
                    })
                }
                _ => self.parse_arrow(),
            }
        })
    }

    fn parse_arrow(&mut self) -> Result<PTerm, ParseError> {
        traced!(self, "Arrow", {
            let input = self.parse_prod()?;
            if self.cur.kind == TokenKind::Arrow {
                self.bump()?;
                let output = Box::new(self.parse_term()?);
                let range = input.range().to(output.range());
                Ok(PTerm::Arrow {
                    range,
                    input: Box::new(input),
                    output,
                })
            } else {
                Ok(input)
            }
        })
    }

    fn parse_prod(&mut self) -> Result<PTerm, ParseError> {
        traced!(self, "Prod", {
            let mut term = self.parse_app()?;
            while self.cur.kind == TokenKind::Amp {
                self.bump()?;
                let rhs = self.parse_app()?;
                let range = term.range().to(rhs.range());
                term = PTerm::Prod {
                    range,
                    first: Box::new(term),
                    second: Box::new(rhs),
                };
            }
            Ok(term)
        })
    }

    fn parse_app(&mut self) -> Result<PTerm, ParseError> {
        traced!(self, "App", {
            let head = self.parse_proj()?;
            let mut terms = vec![head];
            while self.starts_atom() {
                terms.push(self.parse_proj()?);
            }
            if terms.len() == 1 {
                Ok(terms.into_iter().next().unwrap())
            } else {
                let range = terms[0].range().to(terms[terms.len() - 1].range());
                Ok(PTerm::Apply { range, terms })
            }
        })
    }

    fn starts_atom(&self) -> bool {
        matches!(
            self.cur.kind,
            TokenKind::Prop | TokenKind::Type | TokenKind::Ident(_) | TokenKind::LParen | TokenKind::Lt
        )
    }

    fn parse_proj(&mut self) -> Result<PTerm, ParseError> {
        traced!(self, "Proj", {
            let mut term = self.parse_atom()?;
            loop {
                match self.cur.kind {
                    TokenKind::Dot1 => {
                        let tok = self.bump()?;
                        let range = term.range().to(tok.range);
                        term = PTerm::First {
                            range,
                            term: Box::new(term),
                        };
                    }
                    TokenKind::Dot2 => {
                        let tok = self.bump()?;
                        let range = term.range().to(tok.range);
                        term = PTerm::Second {
                            range,
                            term: Box::new(term),
                        };
                    }
                    _ => break,
                }
            }
            Ok(term)
        })
    }

    fn parse_atom(&mut self) -> Result<PTerm, ParseError> {
        traced!(self, "Atom", {
            match self.cur.kind.clone() {
                TokenKind::Prop => {
                    let tok = self.bump()?;
                    Ok(PTerm::Sort {
                        range: tok.range,
                        sort: Sort::Prop,
                    })
                }
                TokenKind::Type => {
                    let tok = self.bump()?;
                    Ok(PTerm::Sort {
                        range: tok.range,
                        sort: Sort::Type,
                    })
                }
                TokenKind::Ident(name) => {
                    let tok = self.bump()?;
                    Ok(PTerm::Variable {
                        range: tok.range,
                        name,
                    })
                }
                TokenKind::LParen => {
                    self.bump()?;
                    let inner = self.parse_term()?;
                    self.expect(TokenKind::RParen)?;
                    Ok(inner)
                }
                TokenKind::Lt => {
                    let open = self.bump()?;
                    let first = Box::new(self.parse_term()?);
                    self.expect(TokenKind::Comma)?;
                    let second = Box::new(self.parse_term()?);
                    let close = self.expect(TokenKind::Gt)?;
                    let ty = if self.cur.kind == TokenKind::Colon {
                        self.bump()?;
                        Some(Box::new(self.parse_term()?))
                    } else {
                        None
                    };
                    let end = ty.as_ref().map_or(close.range, |t| t.range());
                    Ok(PTerm::Pair {
                        range: open.range.to(end),
                        first,
                        second,
                        ty,
                    })
                }
                _ => Err(ParseError::UnexpectedToken {
                    expected: "a term".to_string(),
                    actual: self.cur.clone(),
                }),
            }
        })
    }
}

/// Parses a whole program (spec.md §6: `def`/`var` declarations terminated
/// by `;`).
pub fn parse_program(source: &str) -> Result<(Program, ParseTrace), ParseError> {
    let normalized = normalize_line_endings(source);
    // `normalized` must outlive the parser; we re-borrow it via a leaked
    // local by parsing eagerly and only returning owned data.
    let mut parser = Parser::new(&normalized)?;
    let program = parser.parse_program()?;
    Ok((program, parser.into_trace()))
}
