use super::*;

fn kinds(src: &str) -> Vec<TokenKind> {
    lex(src).unwrap().into_iter().map(|t| t.kind).collect()
}

#[test]
fn lexes_numbers_strings_and_punctuation() {
    assert_eq!(
        kinds("x = 1_000 + .5e1 ?? 'a\\n'"),
        vec![
            TokenKind::Ident("x".to_owned()),
            TokenKind::Punct(Punct::Assign),
            TokenKind::Number(1000.0),
            TokenKind::Punct(Punct::Plus),
            TokenKind::Number(5.0),
            TokenKind::Punct(Punct::Nullish),
            TokenKind::Str("a\n".to_owned()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn longest_punctuation_wins() {
    assert_eq!(
        kinds("a?.b !== c ... =>"),
        vec![
            TokenKind::Ident("a".to_owned()),
            TokenKind::Punct(Punct::QuestionDot),
            TokenKind::Ident("b".to_owned()),
            TokenKind::Punct(Punct::NeEq),
            TokenKind::Ident("c".to_owned()),
            TokenKind::Punct(Punct::Ellipsis),
            TokenKind::Punct(Punct::Arrow),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn hex_literals() {
    assert_eq!(kinds("0xff")[0], TokenKind::Number(255.0));
}

#[test]
fn newline_flag_tracks_line_breaks_and_comments() {
    let toks = lex("a // c\n b /* x\n */ c /* y */ d").unwrap();
    assert!(!toks[0].nl_before);
    assert!(toks[1].nl_before);
    assert!(toks[2].nl_before);
    assert!(!toks[3].nl_before);
}

#[test]
fn template_parts_record_expression_spans() {
    let src = "`a${b + 1}c`";
    let toks = lex(src).unwrap();
    let TokenKind::Template(parts) = &toks[0].kind else {
        panic!("expected template");
    };
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], TemplatePart::Text("a".to_owned()));
    let TemplatePart::Expr(span) = parts[1] else {
        panic!("expected expr part");
    };
    assert_eq!(&src[span.start..span.end], "b + 1");
    assert_eq!(parts[2], TemplatePart::Text("c".to_owned()));
}

#[test]
fn nested_braces_inside_template_expression() {
    let src = "`${ {a: 1}.a }`";
    let toks = lex(src).unwrap();
    let TokenKind::Template(parts) = &toks[0].kind else {
        panic!("expected template");
    };
    let TemplatePart::Expr(span) = parts[0] else {
        panic!("expected expr part");
    };
    assert_eq!(src[span.start..span.end].trim(), "{a: 1}.a");
}

#[test]
fn errors_carry_offsets() {
    let err = lex("const s = 'open").unwrap_err();
    assert_eq!(err.offset, 10);
    assert!(err.message.contains("unterminated string"));

    let err = lex("a /* never closed").unwrap_err();
    assert!(err.message.contains("block comment"));

    let err = lex("let x = 3px").unwrap_err();
    assert!(err.message.contains("numeric literal"));
}

#[test]
fn raw_jsx_helpers() {
    let mut lx = Lexer::new("  hello {x}</div>");
    assert_eq!(lx.jsx_text(), "  hello ");
    assert!(lx.eat_raw('{'));
    lx.pos = "  hello {x}".len();
    assert_eq!(lx.peek_raw_after_ws(), Some('<'));
    assert!(lx.eat_raw('<'));
    assert!(lx.eat_raw('/'));
    assert_eq!(lx.jsx_name().as_deref(), Some("div"));

    let mut lx = Lexer::new("stroke-width=\"2\"");
    assert_eq!(lx.jsx_name().as_deref(), Some("stroke-width"));
    assert!(lx.eat_raw('='));
    assert!(lx.eat_raw('"'));
    assert_eq!(lx.jsx_text_until('"').as_deref(), Some("2"));
}

#[test]
fn question_dot_before_a_digit_is_a_conditional() {
    assert_eq!(
        kinds("x?.5:0"),
        vec![
            TokenKind::Ident("x".to_owned()),
            TokenKind::Punct(Punct::Question),
            TokenKind::Number(0.5),
            TokenKind::Punct(Punct::Colon),
            TokenKind::Number(0.0),
            TokenKind::Eof,
        ]
    );
    assert_eq!(kinds("a?.[0]")[1], TokenKind::Punct(Punct::QuestionDot));
}

#[test]
fn deeply_nested_templates_are_rejected() {
    let depth = 200;
    let src = format!("{}x{}", "`${".repeat(depth), "}`".repeat(depth));
    let err = lex(&src).unwrap_err();
    assert!(err.message.contains("nested too deeply"), "{}", err.message);

    let shallow = format!("{}x{}", "`${".repeat(4), "}`".repeat(4));
    assert!(lex(&shallow).is_ok());
}
