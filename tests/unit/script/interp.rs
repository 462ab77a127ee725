use super::*;
use crate::script::intrinsics;
use crate::script::parser::parse_program;

fn run_with(src: &str, limits: Limits) -> Result<Value, Exception> {
    let program = parse_program(src).unwrap_or_else(|e| panic!("{}", e.describe(src)));
    let env = Scope::root();
    intrinsics::install(&env);
    let mut it = Interp::new(limits);
    it.run_program(&program.body, &env)?;
    let out = lookup(&env, "result");
    env.clear();
    out
}

fn run(src: &str) -> Value {
    run_with(src, Limits::default()).unwrap_or_else(|e| panic!("{}", e.describe()))
}

fn run_str(src: &str) -> String {
    run(src).to_js_string()
}

fn run_err(src: &str) -> String {
    match run_with(src, Limits::default()) {
        Ok(v) => panic!("expected failure, got {}", v.to_js_string()),
        Err(e) => e.describe(),
    }
}

#[test]
fn arithmetic_and_coercions() {
    assert_eq!(
        run_str(r#"const result = [1 + 2, "a" + 1, 7 % 3, 2 ** 10, 1 / 0, "3" * "4"].join(",")"#),
        "3,a1,1,1024,Infinity,12"
    );
    assert_eq!(run_str("const result = 0.1 + 0.2"), "0.30000000000000004");
    assert_eq!(run_str("const result = typeof null + typeof (() => 1)"), "objectfunction");
    assert_eq!(run_str("const result = null ?? 'd'"), "d");
    assert_eq!(run_str("const result = 0 || 'x'"), "x");
}

#[test]
fn closures_capture_mutable_state() {
    let src = r#"
        function counter() {
            let n = 0;
            return () => ++n;
        }
        const c = counter();
        c(); c();
        const result = c();
    "#;
    assert_eq!(run_str(src), "3");
}

#[test]
fn hoisted_function_declarations() {
    assert_eq!(run_str("const result = double(21);\nfunction double(x) { return x * 2 }"), "42");
}

#[test]
fn destructuring_with_defaults_and_rest() {
    let src = r#"
        const { a, b: renamed = 5, ...others } = { a: 1, c: 3, d: 4 };
        const [x, , y = 9, ...tail] = [10, 20, undefined, 40, 50];
        const result = [a, renamed, Object.keys(others).join(""), x, y, tail.length].join("|");
    "#;
    assert_eq!(run_str(src), "1|5|cd|10|9|2");
}

#[test]
fn try_catch_finally_ordering() {
    let src = r#"
        const log = [];
        try {
            log.push("try");
            throw new Error("boom");
        } catch (e) {
            log.push(e.message);
        } finally {
            log.push("finally");
        }
        const result = log.join(",");
    "#;
    assert_eq!(run_str(src), "try,boom,finally");
}

#[test]
fn uncaught_errors_describe_themselves() {
    assert_eq!(run_err("const result = nope + 1"), "ReferenceError: nope is not defined");
    assert_eq!(run_err("throw 42"), "Uncaught 42");
    assert_eq!(
        run_err("const o = undefined; const result = o.x"),
        "TypeError: Cannot read properties of undefined (reading 'x')"
    );
    assert_eq!(
        run_err("const k = 1; k = 2;"),
        "TypeError: Assignment to constant variable."
    );
}

#[test]
fn optional_chaining_short_circuits() {
    assert_eq!(run_str("const o = null; const result = o?.a.b.c ?? 'none'"), "none");
    assert_eq!(run_str("const o = { f: () => 7 }; const result = o.g?.() ?? o.f?.()"), "7");
}

#[test]
fn array_pipeline() {
    let src = r#"
        const result = [1, 2, 3, 4, 5]
            .map((n) => n * n)
            .filter((n) => n % 2 === 1)
            .reduce((acc, n) => acc + n, 0);
    "#;
    assert_eq!(run_str(src), "35");
    assert_eq!(
        run_str("const result = Array.from({ length: 4 }, (_, i) => i * 10).join('-')"),
        "0-10-20-30"
    );
}

#[test]
fn loops_switch_and_templates() {
    let src = r#"
        let out = "";
        for (let i = 0; i < 5; i++) {
            if (i === 3) continue;
            out += i;
        }
        for (const k in { p: 1, q: 2 }) out += k;
        switch (out.length) {
            case 6:
                out += "!";
                break;
            default:
                out += "?";
        }
        const result = `${out}:${out.length}`;
    "#;
    assert_eq!(run_str(src), "0124pq!:7");
}

#[test]
fn jsx_builds_elements() {
    let v = run(r#"const result = <div className="x" key="k">hi {1 + 1}</div>"#);
    let Value::Element(el) = v else {
        panic!("expected element");
    };
    assert!(matches!(&el.ty, ElementType::Host(tag) if &**tag == "div"));
    let props = el.props.borrow();
    assert!(props.get("key").is_none());
    assert_eq!(props.get("className").map(Value::to_js_string).as_deref(), Some("x"));
    let Some(Value::Array(children)) = props.get("children") else {
        panic!("expected children array");
    };
    let children = children.borrow();
    assert_eq!(children[0].to_js_string(), "hi ");
    assert_eq!(children[1].to_js_string(), "2");
}

#[test]
fn component_tags_keep_the_function() {
    let v = run("const Dot = () => null; const result = <Dot size={3} />;");
    let Value::Element(el) = v else {
        panic!("expected element");
    };
    assert!(matches!(&el.ty, ElementType::Component(_)));
    assert_eq!(el.props.borrow().get("size").map(Value::to_number), Some(3.0));
}

#[test]
fn step_budget_aborts_infinite_loops() {
    let limits = Limits {
        max_steps: 10_000,
        ..Limits::default()
    };
    let err = run_with("let i = 0; while (true) { i++ }", limits).unwrap_err();
    assert!(matches!(err, Exception::Abort(_)));
    assert!(err.describe().contains("10000 steps"), "{}", err.describe());
}

#[test]
fn aborts_bypass_catch_blocks() {
    let limits = Limits {
        max_steps: 5_000,
        ..Limits::default()
    };
    let err = run_with("try { while (true) {} } catch (e) {} const result = 1;", limits).unwrap_err();
    assert!(matches!(err, Exception::Abort(_)));
}

#[test]
fn runaway_recursion_hits_call_depth_limit() {
    let handle = std::thread::Builder::new()
        .stack_size(16 * 1024 * 1024)
        .spawn(|| match run_with("function f(n) { return f(n + 1) } const result = f(0);", Limits::default()) {
            Ok(_) => "completed".to_owned(),
            Err(e) => e.describe(),
        })
        .expect("spawn");
    let msg = handle.join().expect("join");
    assert_eq!(msg, "maximum call depth of 64 exceeded");
}

#[test]
fn math_random_is_deterministic_per_interpreter() {
    let a = run_str("const result = [Math.random(), Math.random()].join(',')");
    let b = run_str("const result = [Math.random(), Math.random()].join(',')");
    assert_eq!(a, b);
}

#[test]
fn json_round_trip_through_intrinsics() {
    assert_eq!(
        run_str(r#"const result = JSON.stringify(JSON.parse('{"a":[1,2,{"b":null}]}'))"#),
        r#"{"a":[1,2,{"b":null}]}"#
    );
}
