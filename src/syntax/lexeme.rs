/// All lexemes of the language.
#[derive(Clone, Debug, PartialEq)]
pub enum Lexeme {
    // Keywords
    Import,
    Let,
    Const,
    Function,
    Inline,
    If,
    Else,
    For,
    Break,
    Return,
    Error,

    // Symbols
    LParen,    // (
    RParen,    // )
    LBrace,    // {
    RBrace,    // }
    LBracket,  // [
    RBracket,  // ]
    Comma,     // ,
    Colon,     // :
    Semicolon, // ;
    Dot,       // .
    Assign,    // =
    EqEq,      // ==
    NotEq,     // !=
    Lt,        // <
    LtEq,      // <=
    Gt,        // >
    GtEq,      // >=
    Plus,      // +
    Minus,     // -
    Star,      // *
    Slash,     // /
    Percent,   // %
    Amp,       // &
    AmpAmp,    // &&
    Pipe,      // |
    PipePipe,  // ||
    Caret,     // ^
    Tilde,     // ~
    Bang,      // !

    // Literals
    Integer(u64),
    Bytes(Vec<u8>),
    Ident(String),

    // End of file
    Eof,
}

impl Lexeme {
    /// Try to match an identifier string to a keyword lexeme.
    pub fn from_keyword(s: &str) -> Option<Lexeme> {
        match s {
            "import" => Some(Lexeme::Import),
            "let" => Some(Lexeme::Let),
            "const" => Some(Lexeme::Const),
            "function" => Some(Lexeme::Function),
            "inline" => Some(Lexeme::Inline),
            "if" => Some(Lexeme::If),
            "else" => Some(Lexeme::Else),
            "for" => Some(Lexeme::For),
            "break" => Some(Lexeme::Break),
            "return" => Some(Lexeme::Return),
            "error" => Some(Lexeme::Error),
            _ => None,
        }
    }

    /// Source text of a keyword lexeme.
    pub fn keyword_text(&self) -> Option<&'static str> {
        match self {
            Lexeme::Import => Some("import"),
            Lexeme::Let => Some("let"),
            Lexeme::Const => Some("const"),
            Lexeme::Function => Some("function"),
            Lexeme::Inline => Some("inline"),
            Lexeme::If => Some("if"),
            Lexeme::Else => Some("else"),
            Lexeme::For => Some("for"),
            Lexeme::Break => Some("break"),
            Lexeme::Return => Some("return"),
            Lexeme::Error => Some("error"),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Lexeme::Import => "'import'",
            Lexeme::Let => "'let'",
            Lexeme::Const => "'const'",
            Lexeme::Function => "'function'",
            Lexeme::Inline => "'inline'",
            Lexeme::If => "'if'",
            Lexeme::Else => "'else'",
            Lexeme::For => "'for'",
            Lexeme::Break => "'break'",
            Lexeme::Return => "'return'",
            Lexeme::Error => "'error'",
            Lexeme::LParen => "'('",
            Lexeme::RParen => "')'",
            Lexeme::LBrace => "'{'",
            Lexeme::RBrace => "'}'",
            Lexeme::LBracket => "'['",
            Lexeme::RBracket => "']'",
            Lexeme::Comma => "','",
            Lexeme::Colon => "':'",
            Lexeme::Semicolon => "';'",
            Lexeme::Dot => "'.'",
            Lexeme::Assign => "'='",
            Lexeme::EqEq => "'=='",
            Lexeme::NotEq => "'!='",
            Lexeme::Lt => "'<'",
            Lexeme::LtEq => "'<='",
            Lexeme::Gt => "'>'",
            Lexeme::GtEq => "'>='",
            Lexeme::Plus => "'+'",
            Lexeme::Minus => "'-'",
            Lexeme::Star => "'*'",
            Lexeme::Slash => "'/'",
            Lexeme::Percent => "'%'",
            Lexeme::Amp => "'&'",
            Lexeme::AmpAmp => "'&&'",
            Lexeme::Pipe => "'|'",
            Lexeme::PipePipe => "'||'",
            Lexeme::Caret => "'^'",
            Lexeme::Tilde => "'~'",
            Lexeme::Bang => "'!'",
            Lexeme::Integer(_) => "integer literal",
            Lexeme::Bytes(_) => "string literal",
            Lexeme::Ident(_) => "identifier",
            Lexeme::Eof => "end of file",
        }
    }
}
