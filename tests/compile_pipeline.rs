use wavyte_live::{Component, RenderedNode, VideoConfig, compile};

fn fixture() -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/generated_scene.md");
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

fn compiled(src: &str) -> Component {
    let r = compile(src);
    assert!(r.error.is_none(), "unexpected diagnostic: {:?}", r.error);
    r.component.expect("component")
}

#[test]
fn fenced_typescript_with_imports_and_exports_compiles() {
    let c = compiled(&fixture());
    assert_eq!(c.name(), "LaunchScene");
}

#[test]
fn generated_scene_renders_over_time() {
    let c = compiled(&fixture());
    let surface = VideoConfig::new(1280, 720, 150).unwrap();

    let first = c.render(0, &surface).unwrap();
    assert_eq!(first.component, "LaunchScene");
    assert_eq!(first.find("h1").map(RenderedNode::text_content).as_deref(), Some("Launch day"));
    assert!(first.find("span").is_none(), "counter must be hidden before its sequence");
    let Some(RenderedNode::Element { props, .. }) = first.find("p") else {
        panic!("missing caption");
    };
    assert_eq!(props["data-size"], "1280x720");
    assert_eq!(first.find("p").map(RenderedNode::text_content).as_deref(), Some("fast · small · sharp"));

    let counting = c.render(50, &surface).unwrap();
    assert_eq!(counting.find("span").map(RenderedNode::text_content).as_deref(), Some("200"));
    let settled = c.render(75, &surface).unwrap();
    assert_eq!(settled.find("span").map(RenderedNode::text_content).as_deref(), Some("1200"));
    assert!(c.render(105, &surface).unwrap().find("span").is_none());
}

#[test]
fn recompiling_the_same_source_is_deterministic() {
    let src = fixture();
    let a = compiled(&src);
    let b = compiled(&src);
    assert!(!Component::ptr_eq(&a, &b));
    let surface = VideoConfig::default();
    for frame in [0, 12, 47, 80, 299] {
        let ra = serde_json::to_value(a.render(frame, &surface).unwrap()).unwrap();
        let rb = serde_json::to_value(b.render(frame, &surface).unwrap()).unwrap();
        assert_eq!(ra, rb, "frame {frame}");
    }
}

#[test]
fn helper_then_main_selects_main() {
    let c = compiled("const Helper = () => <b>h</b>;\nconst Main = () => <Helper />;");
    assert_eq!(c.name(), "Main");
    let frame = c.render(0, &VideoConfig::default()).unwrap();
    assert_eq!(frame.text_content(), "h");
}

#[test]
fn diagnostics_never_carry_a_component() {
    for src in [
        "const Total = 42;",
        "const Main = () => <div>{1 + }</div>;",
        "const Main = (",
        "throw new TypeError('boom');",
        "const Main = () => null;\nuseCurrentFrame();",
        "const Main = () => staticFile('a.png');\nMain();",
    ] {
        let r = compile(src);
        assert!(r.component.is_none(), "{src}");
        assert!(r.error.as_deref().is_some_and(|e| !e.is_empty()), "{src}");
    }
}

#[test]
fn partial_stream_prefixes_never_panic() {
    let src = fixture();
    for (i, _) in src.char_indices().step_by(37) {
        let r = compile(&src[..i]);
        assert!(!(r.component.is_some() && r.error.is_some()), "prefix of {i} bytes");
    }
}
