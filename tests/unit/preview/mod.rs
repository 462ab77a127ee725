use super::*;
use crate::foundation::error::LiveError;

fn preview(interval_ms: u64) -> LivePreview {
    let opts = PreviewOpts {
        width: 640,
        height: 360,
        compile_interval_ms: interval_ms,
    };
    LivePreview::new(&opts, 90).unwrap()
}

fn done(source: &str) -> GenerationOutcome {
    GenerationOutcome::Done {
        source: source.to_owned(),
    }
}

const GOOD: &str = "const Scene = () => <AbsoluteFill><h1>Hi</h1></AbsoluteFill>;";

#[test]
fn starts_as_placeholder() {
    let p = preview(0);
    assert_eq!(p.status(), &PreviewStatus::Placeholder);
    assert!(p.render(0).is_none());
    assert_eq!(p.surface().duration_in_frames, 90);
}

#[test]
fn transient_failures_keep_the_last_good_component() {
    let mut p = preview(0);
    p.on_delta("const Scene = () =>");
    assert_eq!(p.status(), &PreviewStatus::Placeholder);
    assert!(p.diagnostic().is_some());

    p.on_delta(GOOD);
    assert_eq!(p.status(), &PreviewStatus::Live);
    let first = p.component().cloned().unwrap();

    p.on_delta(&format!("{GOOD}\nconst Broken = ("));
    assert_eq!(p.status(), &PreviewStatus::Live);
    assert!(Component::ptr_eq(p.component().unwrap(), &first));
    assert!(p.diagnostic().unwrap_or_default().starts_with("SyntaxError"));

    let frame = p.render(10).unwrap().unwrap();
    assert_eq!(frame.text_content(), "Hi");
}

#[test]
fn final_source_is_always_compiled() {
    let mut p = preview(60 * 60 * 1000);
    p.on_delta("const");
    p.on_delta("const Scene = () => null");
    assert_eq!(p.compile_count(), 1);

    p.on_finish(&done(GOOD));
    assert_eq!(p.compile_count(), 2);
    assert_eq!(p.status(), &PreviewStatus::Live);
    assert_eq!(p.component().map(Component::name), Some("Scene"));
}

#[test]
fn unchanged_source_is_not_recompiled() {
    let mut p = preview(0);
    p.on_delta(GOOD);
    p.on_finish(&done(GOOD));
    assert_eq!(p.compile_count(), 1);
}

#[test]
fn done_without_component_is_terminal_diagnostic() {
    let mut p = preview(0);
    p.on_delta("const total = 1;");
    assert_eq!(p.status(), &PreviewStatus::Placeholder);
    p.on_finish(&done("const total = 1;"));
    match p.status() {
        PreviewStatus::Failed(msg) => assert!(msg.contains("did not produce a valid component"), "{msg}"),
        other => panic!("unexpected status {other:?}"),
    }
}

#[test]
fn empty_generation_reports_missing_code() {
    let mut p = preview(0);
    p.on_finish(&done("   "));
    assert_eq!(
        p.status(),
        &PreviewStatus::Failed("Generation finished without producing any code.".to_owned())
    );
}

#[test]
fn stream_failure_keeps_component_but_records_error() {
    let mut p = preview(0);
    p.on_delta(GOOD);
    p.on_finish(&GenerationOutcome::Failed {
        error: LiveError::stream("rate limited"),
        source: GOOD.to_owned(),
    });
    assert_eq!(p.status(), &PreviewStatus::Live);
    assert_eq!(p.diagnostic(), Some("stream error: rate limited"));

    let mut empty = preview(0);
    empty.on_finish(&GenerationOutcome::Failed {
        error: LiveError::transport("HTTP 500"),
        source: String::new(),
    });
    assert_eq!(empty.status(), &PreviewStatus::Failed("transport error: HTTP 500".to_owned()));
}

#[test]
fn reset_returns_to_placeholder() {
    let mut p = preview(0);
    p.update(GOOD);
    p.reset();
    assert_eq!(p.status(), &PreviewStatus::Placeholder);
    assert!(p.component().is_none());
    assert!(p.update(GOOD));
}

#[test]
fn rejects_empty_surface() {
    let opts = PreviewOpts {
        width: 0,
        ..PreviewOpts::default()
    };
    assert!(LivePreview::new(&opts, 30).is_err());
    assert!(LivePreview::new(&PreviewOpts::default(), 0).is_err());
}
