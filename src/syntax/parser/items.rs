use crate::cst::*;
use crate::lexeme::Lexeme;
use crate::span::Spanned;

use super::Parser;

impl Parser {
    pub(super) fn parse_imports(&mut self) -> Vec<Spanned<Import>> {
        let mut imports = Vec::new();
        while self.at(&Lexeme::Import) {
            let start = self.current_span();
            self.advance();
            let import = if let Lexeme::Bytes(bytes) = self.peek().clone() {
                self.advance();
                Import::Path(String::from_utf8_lossy(&bytes).into_owned())
            } else {
                Import::Dotted(self.parse_dotted_name())
            };
            self.eat(&Lexeme::Semicolon);
            let span = start.merge(self.prev_span());
            imports.push(Spanned::new(import, span));
        }
        imports
    }

    /// `a.b.c`. Keywords are accepted after a dot so `stdlib.const` is a valid name.
    fn parse_dotted_name(&mut self) -> Vec<String> {
        let first = self.expect_ident();
        let mut parts = vec![first.node];
        while self.eat(&Lexeme::Dot) {
            let part = match self.peek() {
                Lexeme::Ident(name) => Some(name.clone()),
                other => other.keyword_text().map(str::to_string),
            };
            let Some(part) = part else {
                self.error_at_current(&format!(
                    "expected module name part, found {}",
                    self.peek().description()
                ));
                break;
            };
            self.advance();
            parts.push(part);
        }
        parts
    }

    pub(super) fn parse_items(&mut self) -> Vec<Spanned<Item>> {
        let mut items = Vec::new();
        while !self.at(&Lexeme::Eof) {
            let start = self.current_span();
            let before = self.fatal_count();
            let pos = self.pos;

            if self.at(&Lexeme::Let) || self.at(&Lexeme::Const) {
                let is_const = self.at(&Lexeme::Const);
                let decl = self.parse_decl();
                self.expect(&Lexeme::Semicolon);
                let span = start.merge(self.prev_span());
                let item = if is_const {
                    Item::Const(decl)
                } else {
                    Item::Let(decl)
                };
                items.push(Spanned::new(item, span));
            } else if self.at(&Lexeme::Function) || self.at(&Lexeme::Inline) {
                let func = self.parse_function();
                let span = start.merge(self.prev_span());
                items.push(Spanned::new(Item::Function(func), span));
            } else if self.at(&Lexeme::Import) {
                self.error_with_help(
                    "imports must come before any declaration",
                    "move this import to the top of the file",
                );
                self.advance();
            } else {
                self.error_with_help(
                    &format!(
                        "expected item (let, const or function), found {}",
                        self.peek().description()
                    ),
                    "top-level items are variable, constant and function declarations",
                );
                self.advance();
            }

            if self.fatal_count() > before {
                self.synchronize();
                if self.at(&Lexeme::RBrace) {
                    self.advance();
                }
            }
            if self.pos == pos {
                self.advance();
            }
        }
        items
    }

    /// `let a, b = expr` / `const c = expr` without the terminating `;`.
    pub(super) fn parse_decl(&mut self) -> Decl {
        self.advance(); // let | const
        let mut names = vec![self.expect_ident()];
        while self.eat(&Lexeme::Comma) {
            names.push(self.expect_ident());
        }
        self.expect(&Lexeme::Assign);
        let value = self.parse_expr();
        Decl { names, value }
    }

    fn parse_function(&mut self) -> FunctionDecl {
        let inline = self.eat(&Lexeme::Inline);
        self.expect(&Lexeme::Function);
        let name = self.expect_ident();
        self.expect(&Lexeme::LParen);
        let params = self.parse_params();
        self.expect(&Lexeme::RParen);
        let body = self.parse_block();
        FunctionDecl {
            inline,
            name,
            params,
            body,
        }
    }

    fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        while !self.at(&Lexeme::RParen) && !self.at(&Lexeme::Eof) {
            let name = self.expect_ident();
            let ty = if self.eat(&Lexeme::Colon) {
                let ty_name = self.expect_ident();
                let ty = match ty_name.node.as_str() {
                    "int" => ParamType::Int,
                    "byte" => ParamType::Byte,
                    other => {
                        self.error_at(
                            &format!("unknown parameter type '{}', expected 'int' or 'byte'", other),
                            ty_name.span,
                        );
                        ParamType::Int
                    }
                };
                Some(Spanned::new(ty, ty_name.span))
            } else {
                None
            };
            params.push(Param { name, ty });
            if !self.eat(&Lexeme::Comma) {
                break;
            }
        }
        params
    }
}
