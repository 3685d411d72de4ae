//! Reader for the term notation.
//!
//! Builds symbols directly into a [`SymbolTable`]:
//!
//! ```text
//! term := Var | '_' | number | string | atom
//!       | (atom | Var) '(' [term {',' term}] ')'
//!       | '[' [term {',' term} ['|' term]] ']'
//! ```
//!
//! `nil` and `[]` read as the null singleton, `true`/`false` as booleans.
//! Atoms are string constants named after themselves and are interned, so
//! repeated atoms share a symbol.

use super::token::Token;
use crate::error::{NexusError, Result};
use crate::symbol::{SymbolId, SymbolTable, Value};
use logos::Logos;
use rustc_hash::FxHashMap;
use std::iter::Peekable;
use std::ops::Range;
use std::vec::IntoIter;

/// Deepest nesting of brackets and argument lists the reader accepts.
pub const MAX_NESTING: usize = 512;

/// Token stream with source positions for error messages.
struct Tokens<'a> {
    input: &'a str,
    tokens: Peekable<IntoIter<(Token, Range<usize>)>>,
    depth: usize,
}

impl<'a> Tokens<'a> {
    fn lex(input: &'a str) -> Result<Self> {
        let mut tokens = Vec::new();
        for (token, span) in Token::lexer(input).spanned() {
            match token {
                Ok(token) => tokens.push((token, span)),
                Err(()) => {
                    return Err(parse_error(
                        input,
                        span.start,
                        format!("unexpected character(s) {:?}", &input[span]),
                    ))
                }
            }
        }
        Ok(Self {
            input,
            tokens: tokens.into_iter().peekable(),
            depth: 0,
        })
    }

    fn peek(&mut self) -> Option<&Token> {
        self.tokens.peek().map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<(Token, Range<usize>)> {
        self.tokens.next()
    }

    /// Offset of the next token, or the end of input.
    fn offset(&mut self) -> usize {
        match self.tokens.peek() {
            Some((_, span)) => span.start,
            None => self.input.len(),
        }
    }

    fn error(&mut self, message: impl Into<String>) -> NexusError {
        let offset = self.offset();
        parse_error(self.input, offset, message.into())
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.tokens.peek() {
            Some((t, _)) if *t == expected => {
                self.next();
                Ok(())
            }
            Some((t, _)) => {
                let message = format!("expected {}, got {}", expected, t);
                Err(self.error(message))
            }
            None => Err(self.error(format!("expected {}, got end of input", expected))),
        }
    }

    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error(format!("terms nested deeper than {} levels", MAX_NESTING)));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn expect_end(&mut self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(t) => {
                let message = format!("unexpected trailing {}", t);
                Err(self.error(message))
            }
        }
    }
}

fn parse_error(input: &str, offset: usize, message: String) -> NexusError {
    let before = &input[..offset.min(input.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    NexusError::Parse {
        location: format!("{}:{}", line, column),
        message,
    }
}

/// Reads terms into a symbol table.
///
/// Variable names are scoped to the reader: every `X` read by the same
/// reader is the same variable symbol.
pub struct TermReader<'t> {
    table: &'t mut SymbolTable,
    variables: FxHashMap<String, SymbolId>,
}

impl<'t> TermReader<'t> {
    pub fn new(table: &'t mut SymbolTable) -> Self {
        Self::with_variables(table, FxHashMap::default())
    }

    /// Continue a variable scope from an earlier reader.
    pub fn with_variables(table: &'t mut SymbolTable, variables: FxHashMap<String, SymbolId>) -> Self {
        Self { table, variables }
    }

    pub fn variables(&self) -> &FxHashMap<String, SymbolId> {
        &self.variables
    }

    pub fn into_variables(self) -> FxHashMap<String, SymbolId> {
        self.variables
    }

    /// Read exactly one term.
    pub fn read_term(&mut self, input: &str) -> Result<SymbolId> {
        let mut tokens = Tokens::lex(input)?;
        let term = self.term(&mut tokens)?;
        tokens.expect_end()?;
        Ok(term)
    }

    /// Read `left = right`.
    pub fn read_equation(&mut self, input: &str) -> Result<(SymbolId, SymbolId)> {
        let mut tokens = Tokens::lex(input)?;
        let left = self.term(&mut tokens)?;
        tokens.expect(Token::Eq)?;
        let right = self.term(&mut tokens)?;
        tokens.expect_end()?;
        Ok((left, right))
    }

    fn term(&mut self, tokens: &mut Tokens<'_>) -> Result<SymbolId> {
        tokens.descend()?;
        let term = self.primary(tokens)?;
        tokens.ascend();
        Ok(term)
    }

    fn primary(&mut self, tokens: &mut Tokens<'_>) -> Result<SymbolId> {
        let Some((token, _)) = tokens.next() else {
            return Err(tokens.error("expected a term, got end of input"));
        };

        match token {
            Token::Var(name) => {
                let var = self.variable(&name);
                if tokens.peek() == Some(&Token::LParen) {
                    return self.compound(var, tokens);
                }
                Ok(var)
            }
            Token::Atom(name) => {
                if tokens.peek() == Some(&Token::LParen) {
                    let functor = self.table.intern_constant(&name, name.as_str());
                    return self.compound(functor, tokens);
                }
                Ok(self.atom(&name))
            }
            Token::Int(n) => Ok(self.table.intern_constant(&n.to_string(), n)),
            Token::Float(x) => Ok(self.table.intern_constant(&format!("{:?}", x), x)),
            Token::Str(s) => Ok(self.table.intern_constant(&format!("{:?}", s), s)),
            Token::LBracket => self.list(tokens),
            other => Err(tokens.error(format!("unexpected {}", other))),
        }
    }

    fn variable(&mut self, name: &str) -> SymbolId {
        if name == "_" {
            return self.table.anonymous();
        }
        if let Some(&id) = self.variables.get(name) {
            return id;
        }
        let id = self.table.new_variable(name);
        self.variables.insert(name.to_string(), id);
        id
    }

    fn atom(&mut self, name: &str) -> SymbolId {
        match name {
            "nil" => self.table.null(),
            "true" => self.table.intern_constant(name, Value::Bool(true)),
            "false" => self.table.intern_constant(name, Value::Bool(false)),
            _ => self.table.intern_constant(name, name),
        }
    }

    /// Arguments after a functor; the `(` has not been consumed yet.
    fn compound(&mut self, functor: SymbolId, tokens: &mut Tokens<'_>) -> Result<SymbolId> {
        tokens.expect(Token::LParen)?;
        let mut args = Vec::new();
        if tokens.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.term(tokens)?);
                if tokens.peek() == Some(&Token::Comma) {
                    tokens.next();
                } else {
                    break;
                }
            }
        }
        tokens.expect(Token::RParen)?;
        Ok(self.table.new_structure(functor, args))
    }

    /// List elements; the `[` has been consumed.
    fn list(&mut self, tokens: &mut Tokens<'_>) -> Result<SymbolId> {
        if tokens.peek() == Some(&Token::RBracket) {
            tokens.next();
            return Ok(self.table.null());
        }

        let mut items = Vec::new();
        loop {
            items.push(self.term(tokens)?);
            if tokens.peek() == Some(&Token::Comma) {
                tokens.next();
            } else {
                break;
            }
        }
        let tail = if tokens.peek() == Some(&Token::Pipe) {
            tokens.next();
            self.term(tokens)?
        } else {
            self.table.null()
        };
        tokens.expect(Token::RBracket)?;
        Ok(self.table.new_list_from(&items, tail))
    }
}

/// Read a single term with a fresh variable scope.
pub fn parse_term(table: &mut SymbolTable, input: &str) -> Result<SymbolId> {
    TermReader::new(table).read_term(input)
}

/// Read `left = right`; both sides share one variable scope.
pub fn parse_equation(table: &mut SymbolTable, input: &str) -> Result<(SymbolId, SymbolId)> {
    TermReader::new(table).read_equation(input)
}
