//! The tokenizer (spec.md §4.A).
//!
//! Produces one [`Token`] per call to [`Lexer::next_token`], skipping
//! whitespace, line comments, and nested block comments along the way. Line
//! endings are normalized to `\n` up front so the rest of the pipeline never
//! has to think about `\r`.

use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use crate::pos::{Position, Range};
use crate::syntax::token::{is_ident_continue, is_ident_start, keyword, Token, TokenKind};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("unexpected character {0:?} at {1}")]
    UnexpectedChar(char, Position),
    #[error("unclosed block comment opened at {0}")]
    UnclosedComment(Position),
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    pos: Position,
}

impl<'a> Lexer<'a> {
    pub fn new(normalized_src: &'a str) -> Lexer<'a> {
        Lexer {
            chars: normalized_src.chars().peekable(),
            pos: Position::start(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek2(&mut self) -> Option<char> {
        let mut clone = self.chars.clone();
        clone.next();
        clone.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.pos.line += 1;
            self.pos.col = 1;
        } else {
            self.pos.col += 1;
        }
        Some(c)
    }

    fn starts_with(&mut self, s: &str) -> bool {
        let mut clone = self.chars.clone();
        for expected in s.chars() {
            if clone.next() != Some(expected) {
                return false;
            }
        }
        true
    }

    fn bump_str(&mut self, s: &str) {
        for _ in s.chars() {
            self.bump();
        }
    }

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('-') if self.peek2() == Some('-') => {
                    self.bump_str("--");
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('{') if self.peek2() == Some('-') => {
                    let open_at = self.pos;
                    self.bump_str("{-");
                    let mut depth = 1usize;
                    while depth > 0 {
                        if self.starts_with("{-") {
                            self.bump_str("{-");
                            depth += 1;
                        } else if self.starts_with("-}") {
                            self.bump_str("-}");
                            depth -= 1;
                        } else if self.bump().is_none() {
                            return Err(LexError::UnclosedComment(open_at));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_trivia()?;

        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenKind::Eof, Range::zero(start)));
        };

        // Punctuation, longest match first.
        let punct: &[(&str, TokenKind)] = &[
            ("=>", TokenKind::FatArrow),
            ("->", TokenKind::Arrow),
            (":=", TokenKind::ColonEq),
            (".1", TokenKind::Dot1),
            (".2", TokenKind::Dot2),
            ("(", TokenKind::LParen),
            (")", TokenKind::RParen),
            (":", TokenKind::Colon),
            (",", TokenKind::Comma),
            ("<", TokenKind::Lt),
            (">", TokenKind::Gt),
            ("&", TokenKind::Amp),
            (";", TokenKind::Semi),
        ];
        for (lexeme, kind) in punct {
            if self.starts_with(lexeme) {
                self.bump_str(lexeme);
                return Ok(Token::new(kind.clone(), Range::new(start, self.pos)));
            }
        }

        if is_ident_start(c) {
            let mut ident = String::new();
            while let Some(c) = self.peek() {
                if is_ident_continue(c) {
                    ident.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            let range = Range::new(start, self.pos);
            let kind = match keyword(&ident) {
                // A keyword followed directly by another identifier
                // character would already have been consumed above, so
                // reaching here with a keyword match is unambiguous.
                Some(kw) => kw,
                None => TokenKind::Ident(ident),
            };
            return Ok(Token::new(kind, range));
        }

        self.bump();
        Err(LexError::UnexpectedChar(c, start))
    }
}

/// Normalize `\r\n` and bare `\r` line endings to `\n`.
pub fn normalize_line_endings(src: &str) -> String {
    src.replace("\r\n", "\n").replace('\r', "\n")
}
