use super::*;
use crate::registry::Export;

fn build(cfg: &GenerationConfig) -> String {
    build_system_prompt(cfg, ModuleRegistry::global()).unwrap()
}

#[test]
fn duration_line_carries_seconds_and_frames() {
    let ten = build(&GenerationConfig::with_duration(10.0));
    assert!(ten.contains("10 seconds"));
    assert!(ten.contains("(300 frames at 30 fps)"));

    let five = build(&GenerationConfig::with_duration(5.0));
    assert!(five.contains("5 seconds"));
    assert!(five.contains("(150 frames at 30 fps)"));

    let half = build(&GenerationConfig::with_duration(2.5));
    assert!(half.contains("2.5 seconds (75 frames"));
}

#[test]
fn non_positive_durations_are_rejected() {
    for d in [0.0, -3.0, f64::NAN, f64::INFINITY] {
        let err = build_system_prompt(&GenerationConfig::with_duration(d), ModuleRegistry::global())
            .unwrap_err();
        assert!(matches!(err, LiveError::Validation(_)), "{d}");
    }
}

#[test]
fn output_is_deterministic_and_scratch_adds_nothing() {
    let cfg = GenerationConfig {
        preset: Preset::Scratch,
        ..GenerationConfig::default()
    };
    let a = build(&cfg);
    assert_eq!(a, build(&cfg));
    assert!(!a.contains("## Preset"));
    assert_eq!(a, build(&GenerationConfig::default()));
}

#[test]
fn hard_rules_are_always_present() {
    let p = build(&GenerationConfig::default());
    assert!(p.contains("Do not write import statements"));
    assert!(p.contains("Do not write export statements"));
    assert!(p.contains("markdown code fences"));
    assert!(p.contains("PascalCase"));
}

#[test]
fn every_registry_name_is_listed() {
    let p = build(&GenerationConfig::default());
    for name in ModuleRegistry::global().list_names() {
        assert!(p.contains(&name), "missing {name}");
    }
    assert!(!p.contains("staticFile"));
}

#[test]
fn hints_follow_the_registry() {
    let minimal = ModuleRegistry::builder()
        .module("remotion", [("AbsoluteFill", Export::constant("x"))])
        .build()
        .unwrap();
    let cfg = GenerationConfig {
        preset: Preset::Infographics,
        ..GenerationConfig::default()
    };
    let p = build_system_prompt(&cfg, &minimal).unwrap();
    for absent in ["interpolate", "spring", "useCurrentFrame", "Sequence"] {
        assert!(!p.contains(absent), "prompt mentions {absent}");
    }
    assert!(p.contains("## Preset: Infographics"));
}

#[test]
fn presets_add_guidance() {
    for preset in [
        Preset::Infographics,
        Preset::TextAnimation,
        Preset::Posters,
        Preset::Presentation,
    ] {
        let p = build(&GenerationConfig {
            preset,
            ..GenerationConfig::default()
        });
        assert!(p.contains("## Preset:"), "{preset}");
    }
}

#[test]
fn style_block_is_keyed_and_unknown_styles_are_ignored() {
    let styled = build(&GenerationConfig {
        style: Some("Neon".to_owned()),
        ..GenerationConfig::default()
    });
    assert!(styled.contains("## Style: Neon"));

    let unknown = build(&GenerationConfig {
        style: Some("vaporwave-deluxe".to_owned()),
        ..GenerationConfig::default()
    });
    assert_eq!(unknown, build(&GenerationConfig::default()));
}

#[test]
fn media_urls_pick_the_embedding_component() {
    let p = build(&GenerationConfig {
        media_urls: vec![
            "https://cdn.example.com/shoe.PNG?w=800".to_owned(),
            "https://cdn.example.com/clip.mp4".to_owned(),
            "https://cdn.example.com/theme.mp3".to_owned(),
        ],
        ..GenerationConfig::default()
    });
    assert!(p.contains("<Img src=\"https://cdn.example.com/shoe.PNG?w=800\""));
    assert!(p.contains("<Video src=\"https://cdn.example.com/clip.mp4\""));
    assert!(p.contains("<Audio src=\"https://cdn.example.com/theme.mp3\" />"));
    let img = p.find("shoe.PNG").unwrap();
    let video = p.find("clip.mp4").unwrap();
    assert!(img < video);
}

#[test]
fn theme_colors_are_verbatim() {
    let p = build(&GenerationConfig {
        theme_colors: Some(ThemeColors {
            primary: "#FF5733".to_owned(),
            secondary: "rgb(10, 20, 30)".to_owned(),
            accent: "gold".to_owned(),
            background: "#000".to_owned(),
        }),
        ..GenerationConfig::default()
    });
    for line in [
        "- primary: #FF5733",
        "- secondary: rgb(10, 20, 30)",
        "- accent: gold",
        "- background: #000",
    ] {
        assert!(p.contains(line), "{line}");
    }
}

#[test]
fn config_parses_camel_case_json() {
    let cfg: GenerationConfig = r##"{
        "preset": "text-animation",
        "durationSeconds": 6,
        "themeColors": {"primary": "#111", "secondary": "#222", "accent": "#333", "background": "#444"},
        "mediaUrls": ["https://x/y.png"]
    }"##
    .parse()
    .unwrap();
    assert_eq!(cfg.preset, Preset::TextAnimation);
    assert_eq!(cfg.frame_count().unwrap(), 180);
    assert_eq!(cfg.media_urls.len(), 1);

    let bad: Result<GenerationConfig, _> = r#"{"durationSeconds": 0}"#.parse();
    assert!(matches!(bad, Err(LiveError::Validation(_))));
    assert!("unknown".parse::<Preset>().is_err());
}
