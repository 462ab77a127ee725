use super::*;

fn kind_of(src: &str) -> CompileErrorKind {
    match try_compile(src, ModuleRegistry::global()) {
        Ok(c) => panic!("expected failure, compiled {c:?}"),
        Err(e) => e.kind,
    }
}

#[test]
fn empty_input_is_not_an_error() {
    for src in ["", "   \n  ", "\t"] {
        let r = compile(src);
        assert!(r.is_empty(), "{src:?}");
    }
}

#[test]
fn last_pascal_case_callable_wins() {
    let src = r#"
        const Helper = () => <div>helper</div>;
        function Title() { return <h1>t</h1>; }
        const Main = () => <AbsoluteFill><Helper /><Title /></AbsoluteFill>;
    "#;
    let r = compile(src);
    assert!(r.error.is_none(), "{:?}", r.error);
    assert_eq!(r.component.as_ref().map(Component::name), Some("Main"));
}

#[test]
fn non_callable_pascal_bindings_are_skipped() {
    let src = "const Scene = () => null;\nconst Total = 42;";
    assert_eq!(compile(src).component.map(|c| c.name().to_owned()).as_deref(), Some("Scene"));

    let r = compile("const Total = 42;\nconst helper = () => null;");
    assert!(r.component.is_none());
    let msg = r.error.unwrap_or_default();
    assert!(msg.contains("did not produce a valid component"), "{msg}");
    assert_eq!(kind_of("const Total = 42;"), CompileErrorKind::NoComponent);
}

#[test]
fn syntax_errors_become_diagnostics() {
    let r = compile("const Main = () => <div>{1 + }</div>;");
    assert!(r.component.is_none());
    let msg = r.error.unwrap_or_default();
    assert!(msg.starts_with("SyntaxError: line 1"), "{msg}");
    assert_eq!(kind_of("const Main = (;"), CompileErrorKind::Syntax);
}

#[test]
fn runtime_errors_become_diagnostics() {
    let r = compile("const x = missing.value;\nconst Main = () => null;");
    assert_eq!(r.error.as_deref(), Some("ReferenceError: missing is not defined"));
    assert_eq!(kind_of("throw new Error('nope')"), CompileErrorKind::Runtime);
    assert_eq!(kind_of("while (true) {}"), CompileErrorKind::Runtime);
}

#[test]
fn hooks_at_module_level_fail_cleanly() {
    let r = compile("const frame = useCurrentFrame();\nconst Main = () => null;");
    let msg = r.error.unwrap_or_default();
    assert!(msg.contains("Invalid hook call"), "{msg}");
}

#[test]
fn fences_and_linkage_are_stripped() {
    let src = "```tsx\nimport { AbsoluteFill, useCurrentFrame } from 'remotion';\nimport React from 'react';\n\nexport const MyComposition: React.FC = () => {\n  const frame = useCurrentFrame();\n  return <AbsoluteFill>{frame}</AbsoluteFill>;\n};\n\nexport default MyComposition;\n```";
    let r = compile(src);
    assert!(r.error.is_none(), "{:?}", r.error);
    assert_eq!(r.component.map(|c| c.name().to_owned()).as_deref(), Some("MyComposition"));
}

#[test]
fn pascal_detection() {
    assert!(is_pascal_case("Main"));
    assert!(is_pascal_case("Scene2"));
    assert!(!is_pascal_case("main"));
    assert!(!is_pascal_case("_Main"));
    assert!(!is_pascal_case(""));
}

#[test]
fn candidates_follow_source_order_including_destructuring() {
    let program = crate::script::parser::parse_program(
        "const { A, b: B } = x;\nfunction C() {}\nlet [D, ...Rest] = y;\nconst A2 = 1;",
    )
    .unwrap();
    assert_eq!(top_level_pascal_bindings(&program), vec!["A", "B", "C", "D", "Rest", "A2"]);
}

#[test]
fn compilation_is_deterministic() {
    let src = "const Main = () => <div>{Math.random()}</div>;";
    let cfg = crate::foundation::core::VideoConfig::default();
    let a = compile(src).component.unwrap().render(0, &cfg).unwrap();
    let b = compile(src).component.unwrap().render(0, &cfg).unwrap();
    assert_eq!(a, b);
}

#[test]
fn flat_chains_fail_as_syntax_errors() {
    let n = 100_000;
    for src in [
        format!("const x = 1{};\nconst Main = () => null;", "+1".repeat(n)),
        format!("const x = o{};\nconst Main = () => null;", ".a".repeat(n)),
        format!("const {}a{} = 0;\nconst Main = () => null;", "[".repeat(n / 2), "]".repeat(n / 2)),
    ] {
        let r = compile(&src);
        assert!(r.component.is_none());
        let msg = r.error.unwrap_or_default();
        assert!(msg.contains("nested too deeply"), "{msg}");
    }
}

#[test]
fn long_value_chains_are_dropped_without_recursion() {
    let n = 60_000;
    let chains = [
        "let a = null; for (let i = 0; i < N; i++) { a = { n: a }; }",
        "let a = []; for (let i = 0; i < N; i++) { a = [a]; }",
        "let a = () => 0; for (let i = 0; i < N; i++) { const g = a; a = () => g(); }",
        "let a = null; for (let i = 0; i < N; i++) { a = <div>{a}</div>; }",
    ];
    for chain in chains {
        let chain = chain.replace('N', &n.to_string());
        let ok = compile(&format!("{chain}\nconst Main = () => null;"));
        assert_eq!(ok.component.as_ref().map(Component::name), Some("Main"), "{chain}");
        drop(ok);

        let reset = compile(&format!("{chain}\na = null;\nconst Main = () => null;"));
        assert!(reset.component.is_some(), "{chain}");

        let failed = compile(&format!("{chain}\nthrow new Error('late');"));
        assert_eq!(failed.error.as_deref(), Some("Error: late"), "{chain}");
    }
}

#[test]
fn optional_chaining_compiles() {
    let r = compile("const Main = (p) => { const t = p?.title ?? 'x'; return <h1>{t}{p?.sub?.()}</h1>; };");
    assert!(r.error.is_none(), "{:?}", r.error);
    let frame = r
        .component
        .unwrap()
        .render(0, &crate::foundation::core::VideoConfig::default())
        .unwrap();
    assert_eq!(frame.text_content(), "x");
}
