use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LiveError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        LiveError::registry("x")
            .to_string()
            .contains("registry error:")
    );
    assert!(
        LiveError::transport("x")
            .to_string()
            .contains("transport error:")
    );
    assert!(LiveError::stream("x").to_string().contains("stream error:"));
    assert!(
        LiveError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LiveError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn serde_json_errors_map_to_serde_variant() {
    let e = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: LiveError = e.into();
    assert!(matches!(err, LiveError::Serde(_)));
}
