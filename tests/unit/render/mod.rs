use super::*;
use crate::compiler::compile;

fn component(src: &str) -> Component {
    let r = compile(src);
    match r.component {
        Some(c) => c,
        None => panic!("compile failed: {:?}", r.error),
    }
}

fn surface() -> VideoConfig {
    VideoConfig::new(1280, 720, 90).unwrap()
}

#[test]
fn renders_host_tags_and_builtins() {
    let c = component(
        r#"const Main = () => (
            <AbsoluteFill style={{ backgroundColor: "black" }}>
                <h1 className="title">Hello</h1>
            </AbsoluteFill>
        );"#,
    );
    let frame = c.render(0, &surface()).unwrap();
    assert_eq!(frame.component, "Main");
    let Some(RenderedNode::Element { tag, props, children }) = frame.nodes.first() else {
        panic!("expected root element");
    };
    assert_eq!(tag, "AbsoluteFill");
    assert_eq!(props["style"]["backgroundColor"], "black");
    assert_eq!(children.len(), 1);
    assert_eq!(frame.find("h1").map(RenderedNode::text_content).as_deref(), Some("Hello"));
}

#[test]
fn hooks_see_the_frame_and_surface() {
    let c = component(
        r#"const Main = () => {
            const frame = useCurrentFrame();
            const { width, fps, durationInFrames } = useVideoConfig();
            const opacity = interpolate(frame, [0, 30], [0, 1], { extrapolateRight: "clamp" });
            return <div>{`${frame}/${width}/${fps}/${durationInFrames}/${opacity}`}</div>;
        };"#,
    );
    assert_eq!(c.render(15, &surface()).unwrap().text_content(), "15/1280/30/90/0.5");
    assert_eq!(c.render(60, &surface()).unwrap().text_content(), "60/1280/30/90/1");
}

#[test]
fn sequences_shift_and_window_time() {
    let c = component(
        r#"
        const Inner = () => <span>{useCurrentFrame()}</span>;
        const Main = () => (
            <AbsoluteFill>
                <Sequence from={10} durationInFrames={20}><Inner /></Sequence>
            </AbsoluteFill>
        );"#,
    );
    let cfg = surface();
    assert!(c.render(5, &cfg).unwrap().find("Sequence").is_none());
    let inside = c.render(15, &cfg).unwrap();
    assert_eq!(inside.find("span").map(RenderedNode::text_content).as_deref(), Some("5"));
    assert!(c.render(30, &cfg).unwrap().find("Sequence").is_none());
}

#[test]
fn fragments_and_arrays_flatten() {
    let c = component(
        "const Main = () => <>{[1, 2, 3].map((n) => <i key={n}>{n}</i>)}{false}{null}</>;",
    );
    let frame = c.render(0, &surface()).unwrap();
    assert_eq!(frame.nodes.len(), 3);
    assert_eq!(frame.text_content(), "123");
}

#[test]
fn invalid_children_and_throws_are_render_errors() {
    let c = component("const Main = () => <div>{{ a: 1 }}</div>;");
    let err = c.render(0, &surface()).unwrap_err();
    assert!(err.to_string().contains("Objects are not valid as a React child"), "{err}");

    let c = component("const Main = () => { throw new Error('bad frame'); };");
    assert_eq!(
        c.render(0, &surface()).unwrap_err(),
        RenderError::Script("Error: bad frame".to_owned())
    );
}

#[test]
fn out_of_bounds_frames_are_rejected() {
    let c = component("const Main = () => null;");
    assert_eq!(
        c.render(90, &surface()).unwrap_err(),
        RenderError::FrameOutOfBounds {
            frame: 90,
            duration: 90
        }
    );
}

#[test]
fn self_recursive_components_are_bounded() {
    let c = component("const Main = () => <div><Main /></div>;");
    let err = c.render(0, &surface()).unwrap_err();
    assert!(err.to_string().contains("nested deeper"), "{err}");
}

#[test]
fn spring_and_colors_are_available() {
    let c = component(
        r##"const Main = () => {
            const frame = useCurrentFrame();
            const { fps } = useVideoConfig();
            const s = spring({ frame, fps, config: { damping: 200 } });
            const c = interpolateColors(frame, [0, 10], ["#000000", "#ffffff"]);
            return <div data-s={s} style={{ color: c }} />;
        };"##,
    );
    let frame = c.render(5, &surface()).unwrap();
    let Some(RenderedNode::Element { props, .. }) = frame.find("div") else {
        panic!("expected div");
    };
    assert_eq!(props["style"]["color"], "rgba(128, 128, 128, 1)");
    let s = props["data-s"].as_f64().unwrap();
    assert!(s > 0.0 && s < 1.0, "{s}");
}
