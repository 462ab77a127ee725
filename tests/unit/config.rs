use super::*;

#[test]
fn generator_config_defaults_fill_in() {
    let cfg = GeneratorConfig::from_reader(r#"{"endpoint":"https://gen.example/api/stream"}"#.as_bytes()).unwrap();
    assert_eq!(cfg, GeneratorConfig::new("https://gen.example/api/stream"));
    assert_eq!(cfg.connect_timeout(), Duration::from_secs(10));
    assert_eq!(cfg.request_timeout(), None);
}

#[test]
fn generator_config_reads_all_fields() {
    let json = r#"{
        "endpoint": "http://localhost:3000/generate",
        "model": "large",
        "connectTimeoutMs": 500,
        "requestTimeoutMs": 60000,
        "headers": { "authorization": "Bearer x", "x-team": "motion" }
    }"#;
    let cfg = GeneratorConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(cfg.model.as_deref(), Some("large"));
    assert_eq!(cfg.request_timeout(), Some(Duration::from_secs(60)));
    assert_eq!(cfg.headers.len(), 2);
}

#[test]
fn generator_config_rejects_bad_values() {
    for json in [
        r#"{"endpoint":"ftp://x"}"#,
        r#"{"endpoint":"https://"}"#,
        r#"{"endpoint":"https://x","connectTimeoutMs":0}"#,
        r#"{"endpoint":"https://x","requestTimeoutMs":0}"#,
        r#"{"endpoint":"https://x","model":"  "}"#,
        r#"{"endpoint":"https://x","headers":{"bad header":"v"}}"#,
        r#"{"endpoint":"https://x","unknown":1}"#,
    ] {
        let err = GeneratorConfig::from_reader(json.as_bytes()).unwrap_err();
        assert!(matches!(err, LiveError::Validation(_)), "{json}: {err}");
    }
}

#[test]
fn preview_opts_default_and_partial() {
    assert_eq!(PreviewOpts::from_reader("{}".as_bytes()).unwrap(), PreviewOpts::default());
    let opts = PreviewOpts::from_reader(r#"{"width":640,"compileIntervalMs":0}"#.as_bytes()).unwrap();
    assert_eq!((opts.width, opts.height), (640, 1080));
    assert_eq!(opts.compile_interval(), Duration::ZERO);
}

#[test]
fn preview_opts_rejects_empty_surface() {
    let err = PreviewOpts::from_reader(r#"{"height":0}"#.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("1920x0"));
}

#[test]
fn from_path_reports_missing_file() {
    let err = GeneratorConfig::from_path("/definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("open generator config"));
}
