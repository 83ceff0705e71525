use super::*;

fn lex(source: &str) -> Vec<Lexeme> {
    let (tokens, diags) = Lexer::new(source, 0).tokenize();
    assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
    tokens.into_iter().map(|t| t.node).collect()
}

fn lex_errors(source: &str) -> Vec<Diagnostic> {
    Lexer::new(source, 0).tokenize().1
}

#[test]
fn test_keywords_and_idents() {
    let toks = lex("inline function foo let x");
    assert_eq!(
        toks,
        vec![
            Lexeme::Inline,
            Lexeme::Function,
            Lexeme::Ident("foo".into()),
            Lexeme::Let,
            Lexeme::Ident("x".into()),
            Lexeme::Eof
        ]
    );
}

#[test]
fn test_two_char_operators() {
    let toks = lex("== != <= >= && || = < > & | !");
    assert_eq!(
        toks,
        vec![
            Lexeme::EqEq,
            Lexeme::NotEq,
            Lexeme::LtEq,
            Lexeme::GtEq,
            Lexeme::AmpAmp,
            Lexeme::PipePipe,
            Lexeme::Assign,
            Lexeme::Lt,
            Lexeme::Gt,
            Lexeme::Amp,
            Lexeme::Pipe,
            Lexeme::Bang,
            Lexeme::Eof
        ]
    );
}

#[test]
fn test_integers() {
    assert_eq!(lex("42 0x1F")[..2], [Lexeme::Integer(42), Lexeme::Integer(31)]);
}

#[test]
fn test_integer_overflow() {
    let diags = lex_errors("18446744073709551616");
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("too large"));
    assert_eq!(diags[0].kind, crate::diagnostic::DiagnosticKind::Syntax);
}

#[test]
fn test_plain_and_encoded_strings() {
    let toks = lex(r#""123" b64"MTIz" b32"GEZDG""#);
    assert_eq!(
        toks[..3],
        [
            Lexeme::Bytes(b"123".to_vec()),
            Lexeme::Bytes(b"123".to_vec()),
            Lexeme::Bytes(b"123".to_vec())
        ]
    );
}

#[test]
fn test_address_literal() {
    let addr = crate::literal::encode_address(&[1u8; 32]);
    let toks = lex(&format!("addr\"{}\"", addr));
    assert_eq!(toks[0], Lexeme::Bytes(vec![1u8; 32]));
}

#[test]
fn test_prefix_without_quote_is_ident() {
    assert_eq!(lex("b64")[0], Lexeme::Ident("b64".into()));
}

#[test]
fn test_bad_base64_reports_span() {
    let diags = lex_errors("let x = b64\"!!\";");
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("base64"));
    assert_eq!(diags[0].span.start, 8);
    assert_eq!(diags[0].span.end, 15);
}

#[test]
fn test_unterminated_string() {
    let diags = lex_errors("\"abc\nlet");
    assert!(diags[0].message.contains("unterminated string"));
}

#[test]
fn test_comments_skipped() {
    let toks = lex("a // line\n /* block\n more */ b");
    assert_eq!(
        toks,
        vec![
            Lexeme::Ident("a".into()),
            Lexeme::Ident("b".into()),
            Lexeme::Eof
        ]
    );
}

#[test]
fn test_unexpected_character() {
    let diags = lex_errors("let x = 1 @ 2;");
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("unexpected character '@'"));
}

#[test]
fn test_spans() {
    let (tokens, _) = Lexer::new("let abc", 3).tokenize();
    assert_eq!(tokens[1].span, Span::new(3, 4, 7));
}
