use std::path::PathBuf;
use std::process::{Command, Output};

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_wavyte-live")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "wavyte-live.exe"
            } else {
                "wavyte-live"
            });
            p
        })
}

fn run(args: &[&str]) -> Output {
    Command::new(exe()).args(args).output().unwrap()
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

#[test]
fn cli_prompt_prints_sections() {
    let out = run(&["prompt", "--config", &fixture("generation.json"), "--duration", "2"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.contains("## Style: Neon"));
    assert!(text.contains("2 seconds (60 frames at 30 fps)"));
}

#[test]
fn cli_prompt_rejects_bad_duration() {
    let out = run(&["prompt", "--duration", "0"]);
    assert!(!out.status.success());
}

#[test]
fn cli_globals_lists_registry() {
    let out = run(&["globals"]);
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert!(text.lines().any(|l| l == "remotion\tuseCurrentFrame\tfunction"));
    assert!(text.lines().any(|l| l == "remotion\tAbsoluteFill\tcomponent"));
    assert!(!text.contains("staticFile"));
}

#[test]
fn cli_compile_renders_frame_json() {
    let input = fixture("generated_scene.md");
    let out = run(&["compile", "--in", &input]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8(out.stdout).unwrap().trim(), "LaunchScene");

    let out = run(&["compile", "--in", &input, "--frame", "75", "--duration", "5"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let frame: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(frame["frame"], 75);
    assert_eq!(frame["component"], "LaunchScene");
}

#[test]
fn cli_compile_reports_diagnostics() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("broken.jsx");
    std::fs::write(&path, "const Main = () => <div>{1 + }</div>;").unwrap();

    let out = run(&["compile", "--in", &path.to_string_lossy()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("SyntaxError"));
}
