pub mod cst;
pub mod lexeme;
pub mod lexer;
pub mod literal;
pub mod parser;
pub mod span;

use crate::diagnostic::Diagnostic;
use lexer::Lexer;
use parser::{Parsed, Parser};

/// Lex and parse one source file. Lexical errors stop before parsing.
pub fn parse_source(source: &str, file_id: u16) -> Result<Parsed, Vec<Diagnostic>> {
    let (tokens, lex_errors) = Lexer::new(source, file_id).tokenize();
    if lex_errors.iter().any(|d| d.is_fatal()) {
        return Err(lex_errors);
    }
    Parser::new(tokens).parse_file()
}
