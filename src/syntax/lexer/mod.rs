use crate::diagnostic::Diagnostic;
use crate::lexeme::Lexeme;
use crate::literal::StringEncoding;
use crate::span::{Span, Spanned};

pub(crate) struct Lexer<'src> {
    source: &'src [u8],
    file_id: u16,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    pub(crate) fn new(source: &'src str, file_id: u16) -> Self {
        Self {
            source: source.as_bytes(),
            file_id,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn tokenize(mut self) -> (Vec<Spanned<Lexeme>>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.node == Lexeme::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn next_token(&mut self) -> Spanned<Lexeme> {
        loop {
            self.skip_whitespace_and_comments();

            if self.pos >= self.source.len() {
                return self.make_token(Lexeme::Eof, self.pos, self.pos);
            }

            let start = self.pos;
            let ch = self.source[self.pos];

            if is_ident_start(ch) {
                return self.scan_ident_or_keyword();
            }

            if ch.is_ascii_digit() {
                return self.scan_number();
            }

            if ch == b'"' {
                if let Some(tok) = self.scan_string(start, StringEncoding::Plain) {
                    return tok;
                }
                continue;
            }

            if let Some(tok) = self.scan_symbol(start) {
                return tok;
            }
            // scan_symbol returned None → error was recorded, try again
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }

            if self.starts_with(b"//") {
                while self.pos < self.source.len() && self.source[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }

            if self.starts_with(b"/*") {
                let start = self.pos;
                self.pos += 2;
                while self.pos < self.source.len() && !self.starts_with(b"*/") {
                    self.pos += 1;
                }
                if self.pos >= self.source.len() {
                    self.error(
                        "unterminated block comment".to_string(),
                        start,
                        self.pos,
                    );
                } else {
                    self.pos += 2;
                }
                continue;
            }

            break;
        }
    }

    fn scan_ident_or_keyword(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        while self.pos < self.source.len() && is_ident_continue(self.source[self.pos]) {
            self.pos += 1;
        }
        let text = self.text(start, self.pos);

        // Encoded string literal: b64"...", b32"...", addr"..."
        if self.peek() == Some(b'"') {
            if let Some(encoding) = StringEncoding::from_prefix(&text) {
                if let Some(tok) = self.scan_string(start, encoding) {
                    return tok;
                }
                return self.make_token(Lexeme::Bytes(Vec::new()), start, self.pos);
            }
        }

        let token = Lexeme::from_keyword(&text).unwrap_or(Lexeme::Ident(text));
        self.make_token(token, start, self.pos)
    }

    /// Scan a quoted string starting at the opening quote under `self.pos`.
    /// `start` is where the token began (before any encoding prefix).
    fn scan_string(&mut self, start: usize, encoding: StringEncoding) -> Option<Spanned<Lexeme>> {
        self.pos += 1; // opening quote
        let body_start = self.pos;
        while self.pos < self.source.len() {
            match self.source[self.pos] {
                b'"' => break,
                b'\\' => self.pos += 2,
                b'\n' => break,
                _ => self.pos += 1,
            }
        }
        if self.pos >= self.source.len() || self.source[self.pos] != b'"' {
            self.pos = self.pos.min(self.source.len());
            self.diagnostics.push(
                Diagnostic::syntax(
                    "unterminated string literal".to_string(),
                    Span::new(self.file_id, start as u32, self.pos as u32),
                )
                .with_help("close the string with '\"' on the same line".to_string()),
            );
            return None;
        }
        let body = self.text(body_start, self.pos);
        self.pos += 1; // closing quote

        match encoding.decode(&body) {
            Ok(bytes) => Some(self.make_token(Lexeme::Bytes(bytes), start, self.pos)),
            Err(msg) => {
                self.error(msg, start, self.pos);
                Some(self.make_token(Lexeme::Bytes(Vec::new()), start, self.pos))
            }
        }
    }

    fn scan_number(&mut self) -> Spanned<Lexeme> {
        let start = self.pos;
        let (digits_start, radix) = if self.starts_with(b"0x") || self.starts_with(b"0X") {
            self.pos += 2;
            (self.pos, 16)
        } else {
            (self.pos, 10)
        };
        while self.pos < self.source.len() && self.source[self.pos].is_ascii_alphanumeric() {
            self.pos += 1;
        }
        let digits = self.text(digits_start, self.pos);
        match u64::from_str_radix(&digits, radix) {
            Ok(n) => self.make_token(Lexeme::Integer(n), start, self.pos),
            Err(e) => {
                let text = self.text(start, self.pos);
                let msg = match e.kind() {
                    std::num::IntErrorKind::PosOverflow => {
                        format!("integer literal '{}' is too large", text)
                    }
                    _ => format!("invalid integer literal '{}'", text),
                };
                self.diagnostics.push(
                    Diagnostic::syntax(
                        msg,
                        Span::new(self.file_id, start as u32, self.pos as u32),
                    )
                    .with_help(format!("integers are unsigned 64-bit, maximum {}", u64::MAX)),
                );
                self.make_token(Lexeme::Integer(0), start, self.pos)
            }
        }
    }

    fn scan_symbol(&mut self, start: usize) -> Option<Spanned<Lexeme>> {
        let ch = self.source[self.pos];
        self.pos += 1;

        let token = match ch {
            b'(' => Lexeme::LParen,
            b')' => Lexeme::RParen,
            b'{' => Lexeme::LBrace,
            b'}' => Lexeme::RBrace,
            b'[' => Lexeme::LBracket,
            b']' => Lexeme::RBracket,
            b',' => Lexeme::Comma,
            b':' => Lexeme::Colon,
            b';' => Lexeme::Semicolon,
            b'.' => Lexeme::Dot,
            b'+' => Lexeme::Plus,
            b'-' => Lexeme::Minus,
            b'*' => Lexeme::Star,
            b'/' => Lexeme::Slash,
            b'%' => Lexeme::Percent,
            b'^' => Lexeme::Caret,
            b'~' => Lexeme::Tilde,
            b'=' => self.pick(b'=', Lexeme::EqEq, Lexeme::Assign),
            b'!' => self.pick(b'=', Lexeme::NotEq, Lexeme::Bang),
            b'<' => self.pick(b'=', Lexeme::LtEq, Lexeme::Lt),
            b'>' => self.pick(b'=', Lexeme::GtEq, Lexeme::Gt),
            b'&' => self.pick(b'&', Lexeme::AmpAmp, Lexeme::Amp),
            b'|' => self.pick(b'|', Lexeme::PipePipe, Lexeme::Pipe),
            _ => {
                let shown = std::str::from_utf8(&self.source[start..])
                    .ok()
                    .and_then(|s| s.chars().next())
                    .unwrap_or(ch as char);
                // Skip the rest of a multi-byte character.
                while self.pos < self.source.len() && (self.source[self.pos] & 0xC0) == 0x80 {
                    self.pos += 1;
                }
                self.error(
                    format!("unexpected character '{}' (U+{:04X})", shown, shown as u32),
                    start,
                    self.pos,
                );
                return None;
            }
        };

        Some(self.make_token(token, start, self.pos))
    }

    /// Two-character operator if the next byte is `second`, else the one-character form.
    fn pick(&mut self, second: u8, double: Lexeme, single: Lexeme) -> Lexeme {
        if self.peek() == Some(second) {
            self.pos += 1;
            double
        } else {
            single
        }
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn starts_with(&self, prefix: &[u8]) -> bool {
        self.source[self.pos..].starts_with(prefix)
    }

    fn text(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.source[start..end]).into_owned()
    }

    fn error(&mut self, msg: String, start: usize, end: usize) {
        self.diagnostics.push(Diagnostic::syntax(
            msg,
            Span::new(self.file_id, start as u32, end as u32),
        ));
    }

    fn make_token(&self, token: Lexeme, start: usize, end: usize) -> Spanned<Lexeme> {
        Spanned::new(token, Span::new(self.file_id, start as u32, end as u32))
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}

#[cfg(test)]
mod tests;
