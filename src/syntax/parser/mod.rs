mod expr;
mod items;
mod stmt;

use crate::cst::Module;
use crate::diagnostic::Diagnostic;
use crate::lexeme::Lexeme;
use crate::span::{Span, Spanned};

const MAX_NESTING_DEPTH: u32 = 256;

/// Successful parse: the tree plus any non-fatal notes (ambiguities).
#[derive(Debug)]
pub struct Parsed {
    pub module: Module,
    pub notes: Vec<Diagnostic>,
}

pub(crate) struct Parser {
    tokens: Vec<Spanned<Lexeme>>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    depth: u32,
    /// Set once the depth cap is hit; the rest of the input is skipped and
    /// no further syntax errors are recorded.
    overflowed: bool,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Spanned<Lexeme>>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            depth: 0,
            overflowed: false,
        }
    }

    fn enter_nesting(&mut self) -> bool {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            if self.overflowed {
                return false;
            }
            self.error_with_help(
                "nesting depth exceeded (maximum 256 levels)",
                "simplify your program by extracting deeply nested code into functions",
            );
            self.overflowed = true;
            return false;
        }
        true
    }

    fn exit_nesting(&mut self) {
        self.depth -= 1;
    }

    /// Parse a whole source file. On failure the error list also carries
    /// the ambiguity notes collected so far.
    pub(crate) fn parse_file(mut self) -> Result<Parsed, Vec<Diagnostic>> {
        let imports = self.parse_imports();
        let items = self.parse_items();
        let module = Module { imports, items };

        if self.diagnostics.iter().any(|d| d.is_fatal()) {
            return Err(self.diagnostics);
        }
        Ok(Parsed {
            module,
            notes: self.diagnostics,
        })
    }

    /// Skip to just past the next `;`, or up to the next `}`, for error recovery.
    fn synchronize(&mut self) {
        if self.pos > 0
            && matches!(
                self.tokens[self.pos - 1].node,
                Lexeme::Semicolon | Lexeme::RBrace
            )
        {
            return;
        }
        loop {
            match self.peek() {
                Lexeme::Semicolon => {
                    self.advance();
                    return;
                }
                Lexeme::RBrace | Lexeme::Eof => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn fatal_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_fatal()).count()
    }

    // --- Token helpers ---

    fn peek(&self) -> &Lexeme {
        &self.tokens[self.pos].node
    }

    fn peek_nth(&self, n: usize) -> &Lexeme {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].node
    }

    fn current_span(&self) -> Span {
        self.tokens[self.pos].span
    }

    fn prev_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            self.current_span()
        }
    }

    fn advance(&mut self) -> &Spanned<Lexeme> {
        let tok = &self.tokens[self.pos];
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, token: &Lexeme) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    fn eat(&mut self, token: &Lexeme) -> bool {
        if self.at(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Lexeme) -> Span {
        if self.at(token) {
            let span = self.current_span();
            self.advance();
            span
        } else {
            self.error_at_current(&format!(
                "expected {}, found {}",
                token.description(),
                self.peek().description()
            ));
            self.current_span()
        }
    }

    fn expect_ident(&mut self) -> Spanned<String> {
        if let Lexeme::Ident(name) = self.peek().clone() {
            let span = self.current_span();
            self.advance();
            Spanned::new(name, span)
        } else {
            self.error_at_current(&format!(
                "expected identifier, found {}",
                self.peek().description()
            ));
            Spanned::new("_error_".to_string(), self.current_span())
        }
    }

    fn error_at_current(&mut self, msg: &str) {
        if self.overflowed {
            return;
        }
        self.diagnostics
            .push(Diagnostic::syntax(msg.to_string(), self.current_span()));
    }

    fn error_at(&mut self, msg: &str, span: Span) {
        if self.overflowed {
            return;
        }
        self.diagnostics
            .push(Diagnostic::syntax(msg.to_string(), span));
    }

    fn error_with_help(&mut self, msg: &str, help: &str) {
        if self.overflowed {
            return;
        }
        self.diagnostics.push(
            Diagnostic::syntax(msg.to_string(), self.current_span()).with_help(help.to_string()),
        );
    }

    fn note_ambiguity(&mut self, msg: String, span: Span) {
        self.diagnostics.push(Diagnostic::ambiguity(msg, span));
    }
}
