//! Term notation: lexer and reader.

mod parser;
mod token;

pub use parser::{parse_equation, parse_term, TermReader, MAX_NESTING};
pub use token::Token;
