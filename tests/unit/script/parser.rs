use super::*;

fn program(src: &str) -> Program {
    parse_program(src).unwrap_or_else(|e| panic!("{}", e.describe(src)))
}

#[test]
fn precedence_and_associativity() {
    let e = parse_expr("1 + 2 * 3 ** 2 ** 0").unwrap();
    let Expr::Binary { op, right, .. } = e else {
        panic!("expected binary");
    };
    assert_eq!(op, BinaryOp::Add);
    let Expr::Binary { op, right, .. } = *right else {
        panic!("expected mul");
    };
    assert_eq!(op, BinaryOp::Mul);
    let Expr::Binary { op, right, .. } = *right else {
        panic!("expected pow");
    };
    assert_eq!(op, BinaryOp::Pow);
    assert!(matches!(*right, Expr::Binary { op: BinaryOp::Pow, .. }));
}

#[test]
fn arrow_functions_in_all_shapes() {
    for src in [
        "x => x * 2",
        "(a, b) => a + b",
        "() => { return 1 }",
        "({ frame }) => frame",
        "([a, b] = [1, 2]) => a",
        "(props: { title: string }): JSX.Element => null",
        "async (x) => x",
        "(...rest) => rest.length",
    ] {
        let e = parse_expr(src).unwrap_or_else(|err| panic!("{src}: {err}"));
        assert!(
            matches!(&e, Expr::Function(f) if f.is_arrow),
            "{src} should parse as arrow"
        );
    }
    assert!(matches!(parse_expr("(a) ? b : c").unwrap(), Expr::Cond { .. }));
    assert!(matches!(parse_expr("(a + b)").unwrap(), Expr::Binary { .. }));
}

#[test]
fn type_annotations_and_declarations_are_skipped() {
    let p = program(
        "interface Props { title: string; items: Array<number> }\n\
         type Mode = 'a' | 'b';\n\
         const x: number = 3 as number;\n\
         function Main({ title }: Props): JSX.Element { return null; }\n\
         const [v, setV] = useState<number>(0);\n\
         const cb = (fn: (n: number) => void) => fn(1);",
    );
    let real: Vec<_> = p.body.iter().filter(|s| **s != Stmt::Empty).collect();
    assert_eq!(real.len(), 4);
}

#[test]
fn automatic_semicolons_do_not_join_lines_with_parens() {
    let p = program("const a = b\n(c)\n[1].length");
    assert_eq!(p.body.len(), 3);
    assert!(parse_program("const a = 1 2").is_err());
}

#[test]
fn jsx_elements_attributes_and_children() {
    let e = parse_expr(
        r#"<AbsoluteFill style={{ opacity: 1 }} data-x="a &amp; b" hidden {...rest}>
             Hello {name}!
             <Sequence from={10}><div /></Sequence>
             {/* comment */}
           </AbsoluteFill>"#,
    )
    .unwrap();
    let Expr::Jsx(el) = e else {
        panic!("expected jsx");
    };
    assert!(matches!(&el.name, JsxName::Component(Expr::Ident(n)) if n == "AbsoluteFill"));
    assert_eq!(el.attrs.len(), 4);
    assert!(matches!(
        &el.attrs[1],
        JsxAttr::Named(n, Some(Expr::Str(s))) if n == "data-x" && &**s == "a & b"
    ));
    assert!(matches!(&el.attrs[2], JsxAttr::Named(n, None) if n == "hidden"));
    assert!(matches!(&el.attrs[3], JsxAttr::Spread(_)));
    assert_eq!(el.children.len(), 4);
    assert_eq!(el.children[0], JsxChild::Text("Hello ".to_owned()));
    assert_eq!(el.children[2], JsxChild::Text("!".to_owned()));
}

#[test]
fn jsx_fragments_and_member_tags() {
    let e = parse_expr("<><React.Fragment>x</React.Fragment></>").unwrap();
    let Expr::Jsx(el) = e else {
        panic!("expected jsx");
    };
    assert_eq!(el.name, JsxName::Fragment);
    let JsxChild::Expr(Expr::Jsx(inner)) = &el.children[0] else {
        panic!("expected nested element");
    };
    assert!(matches!(&inner.name, JsxName::Component(Expr::Member { .. })));
}

#[test]
fn mismatched_jsx_closing_tag_is_reported() {
    let err = parse_program("const A = () => <div><span></div></span>;").unwrap_err();
    assert!(err.message.contains("expected closing tag </span>"), "{}", err.message);
    let err = parse_program("const A = () => <div>").unwrap_err();
    assert!(err.message.contains("unterminated JSX"), "{}", err.message);
}

#[test]
fn templates_parse_embedded_expressions() {
    let e = parse_expr("`translate(${x * 2}px, ${y}px)`").unwrap();
    let Expr::Template(chunks) = e else {
        panic!("expected template");
    };
    assert_eq!(chunks.len(), 5);
    assert!(matches!(chunks[1], TemplateChunk::Expr(Expr::Binary { .. })));
}

#[test]
fn statements_cover_loops_switch_and_try() {
    let p = program(
        "for (let i = 0; i < 3; i++) { continue }\n\
         for (const [k, v] of Object.entries(o)) {}\n\
         for (const k in o) {}\n\
         while (false) break;\n\
         switch (x) { case 1: y = 2; break; default: y = 3 }\n\
         try { throw new Error('x') } catch (e) { } finally { }",
    );
    assert!(matches!(p.body[0], Stmt::For { .. }));
    assert!(matches!(p.body[1], Stmt::ForOf { .. }));
    assert!(matches!(p.body[2], Stmt::ForIn { .. }));
    assert!(matches!(p.body[3], Stmt::While { .. }));
    assert!(matches!(&p.body[4], Stmt::Switch { cases, .. } if cases.len() == 2));
    assert!(matches!(p.body[5], Stmt::Try { .. }));
}

#[test]
fn deep_nesting_is_rejected_instead_of_overflowing() {
    let src = format!("const x = {}1{};", "(".repeat(5000), ")".repeat(5000));
    let err = parse_program(&src).unwrap_err();
    assert!(err.message.contains("nested too deeply"));
}

#[test]
fn long_flat_chains_hit_the_nesting_limit() {
    let n = 100_000;
    let sources = [
        format!("const x = 1{};", "+1".repeat(n)),
        format!("const x = a{};", " || b".repeat(n)),
        format!("const x = a{};", " && b".repeat(n)),
        format!("const x = a{};", " === b".repeat(n)),
        format!("const x = a{};", " - b".repeat(n)),
        format!("const x = 2{};", " * 2".repeat(n)),
        format!("const x = 2{};", " ** 2".repeat(n)),
        format!("const x = o{};", ".a".repeat(n)),
        format!("const x = o{};", "?.a".repeat(n)),
        format!("const x = f{};", "()".repeat(n)),
        format!("const x = o{};", "[0]".repeat(n)),
        format!("const x = new a{}();", ".b".repeat(n)),
    ];
    for src in &sources {
        let err = parse_program(src).unwrap_err();
        assert!(err.message.contains("nested too deeply"), "{}", &src[..24]);
    }
}

#[test]
fn nested_destructuring_hits_the_nesting_limit() {
    let n = 50_000;
    let array = format!("const {}a{} = 0;", "[".repeat(n), "]".repeat(n));
    let object = format!("const {}a{} = 0;", "{ k: ".repeat(n), " }".repeat(n));
    let params = format!("function f({}a{}) {{}}", "[".repeat(n), "]".repeat(n));
    for src in [&array, &object, &params] {
        let err = parse_program(src).unwrap_err();
        assert!(err.message.contains("nested too deeply"), "{}", &src[..16]);
    }
}

#[test]
fn moderate_chains_still_parse() {
    let sum = format!("const x = 1{};", " + 1".repeat(60));
    assert!(parse_program(&sum).is_ok());
    let calls = format!("const x = items{};", ".map((v) => v)".repeat(20));
    assert!(parse_program(&calls).is_ok());
    let p = program("const [[a, { b: [c] }]] = v; const { d: { e } } = w;");
    assert_eq!(p.body.len(), 2);
}

#[test]
fn const_requires_initializer() {
    let err = parse_program("const a;").unwrap_err();
    assert!(err.message.contains("missing initializer"));
}
