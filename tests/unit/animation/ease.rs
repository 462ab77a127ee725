use super::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn endpoints_are_fixed_for_standard_curves() {
    for e in [
        Ease::Linear,
        Ease::Quad,
        Ease::Cubic,
        Ease::Sin,
        Ease::Circle,
        Ease::Bounce,
        Ease::ease(),
        Ease::InOut(Box::new(Ease::Cubic)),
        Ease::Out(Box::new(Ease::Quad)),
    ] {
        assert!(close(e.apply(0.0), 0.0), "{e:?} at 0");
        assert!(close(e.apply(1.0), 1.0), "{e:?} at 1");
    }
}

#[test]
fn out_mirrors_in() {
    let e = Ease::Out(Box::new(Ease::Quad));
    assert!(close(e.apply(0.5), 0.75));
    let e = Ease::In(Box::new(Ease::Quad));
    assert!(close(e.apply(0.5), 0.25));
}

#[test]
fn in_out_is_symmetric_around_midpoint() {
    let e = Ease::InOut(Box::new(Ease::Cubic));
    assert!(close(e.apply(0.5), 0.5));
    assert!(close(e.apply(0.25) + e.apply(0.75), 1.0));
}

#[test]
fn bezier_matches_linear_when_control_points_are_diagonal() {
    let b = CubicBezier::new(0.25, 0.25, 0.75, 0.75);
    assert!(close(b.solve(0.3), 0.3));
}

#[test]
fn bezier_is_monotonic_for_css_ease() {
    let e = Ease::ease();
    let mut prev = 0.0;
    for i in 1..=20 {
        let v = e.apply(f64::from(i) / 20.0);
        assert!(v >= prev);
        prev = v;
    }
}
