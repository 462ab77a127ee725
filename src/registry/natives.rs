//! Script-callable implementations behind the `react` and `remotion` exports.

use crate::animation::ease::{CubicBezier, Ease};
use crate::animation::interpolate::{Extrapolate, InterpolateOpts, interpolate, interpolate_colors};
use crate::animation::random::{Seed, random_for_seed};
use crate::animation::spring::{SpringConfig, SpringParams, spring};
use crate::script::interp::{
    Exception, FrameContext, Interp, create_element, plain_error, range_error, type_error,
};
use crate::script::value::{Function, PropMap, Value};
use std::rc::Rc;

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

/// Hooks only make sense while a component is being rendered for a frame.
fn render_context(it: &Interp, hook: &str) -> Result<FrameContext, Exception> {
    it.frame().copied().ok_or_else(|| {
        plain_error(format!(
            "Invalid hook call: {hook}() can only be called while rendering a component"
        ))
    })
}

fn number_array(v: &Value, what: &str) -> Result<Vec<f64>, Exception> {
    match v {
        Value::Array(items) => Ok(items.borrow().iter().map(Value::to_number).collect()),
        other => Err(type_error(format!(
            "{what} must be an array, got {}",
            other.type_of()
        ))),
    }
}

fn option(opts: &Value, key: &str) -> Value {
    match opts {
        Value::Object(o) => o.borrow().get(key).cloned().unwrap_or_default(),
        _ => Value::Undefined,
    }
}

fn option_number(opts: &Value, key: &str, default: f64) -> f64 {
    match option(opts, key) {
        Value::Undefined | Value::Null => default,
        v => v.to_number(),
    }
}

// ---- react --------------------------------------------------------------------------------------

pub(crate) fn create_element_native(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let props = match args.get(1) {
        Some(Value::Object(o)) => o.borrow().clone(),
        Some(Value::Undefined | Value::Null) | None => PropMap::new(),
        Some(other) => {
            return Err(type_error(format!(
                "createElement props must be an object, got {}",
                other.type_of()
            )));
        }
    };
    let children = args.get(2..).map(<[Value]>::to_vec).unwrap_or_default();
    // An explicit `children` prop survives when no positional children are passed.
    create_element(&arg(args, 0), props, children)
}

pub(crate) fn use_state(it: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    render_context(it, "useState")?;
    let init = arg(args, 0);
    let value = if init.is_callable() {
        it.call(&init, &[])?
    } else {
        init
    };
    // Renders are pure functions of the frame: state never changes between them.
    Ok(Value::array(vec![
        value,
        Function::native("setState", ignore),
    ]))
}

pub(crate) fn use_memo(it: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    render_context(it, "useMemo")?;
    it.call(&arg(args, 0), &[])
}

pub(crate) fn use_callback(it: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    render_context(it, "useCallback")?;
    Ok(arg(args, 0))
}

pub(crate) fn use_effect(it: &mut Interp, _: &[Value]) -> Result<Value, Exception> {
    render_context(it, "useEffect")?;
    Ok(Value::Undefined)
}

pub(crate) fn use_ref(it: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    render_context(it, "useRef")?;
    Ok(Value::object(PropMap::new().with("current", arg(args, 0))))
}

fn ignore(_: &mut Interp, _: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Undefined)
}

// ---- remotion: frame context --------------------------------------------------------------------

pub(crate) fn use_current_frame(it: &mut Interp, _: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Num(render_context(it, "useCurrentFrame")?.frame))
}

pub(crate) fn use_video_config(it: &mut Interp, _: &[Value]) -> Result<Value, Exception> {
    let ctx = render_context(it, "useVideoConfig")?;
    Ok(Value::object(
        PropMap::new()
            .with("width", Value::Num(f64::from(ctx.config.width)))
            .with("height", Value::Num(f64::from(ctx.config.height)))
            .with("fps", Value::Num(ctx.config.fps.as_f64()))
            .with("durationInFrames", Value::Num(ctx.config.duration_in_frames as f64))
            .with("id", Value::str("preview")),
    ))
}

// ---- remotion: animation helpers ----------------------------------------------------------------

fn extrapolate(opts: &Value, key: &str) -> Result<Extrapolate, Exception> {
    match option(opts, key) {
        Value::Undefined => Ok(Extrapolate::default()),
        v => Extrapolate::parse(&v.to_js_string()).map_err(|e| plain_error(format!("{key}: {e}"))),
    }
}

pub(crate) fn interpolate_native(it: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let input = arg(args, 0).to_number();
    let input_range = number_array(&arg(args, 1), "inputRange")?;
    let output_range = number_array(&arg(args, 2), "outputRange")?;
    let opts = arg(args, 3);
    let io = InterpolateOpts {
        left: extrapolate(&opts, "extrapolateLeft")?,
        right: extrapolate(&opts, "extrapolateRight")?,
    };
    let easing = option(&opts, "easing");
    let eased = if easing.is_callable() {
        interpolate(input, &input_range, &output_range, io, |t| {
            it.call(&easing, &[Value::Num(t)]).map(|v| v.to_number())
        })
    } else {
        interpolate(input, &input_range, &output_range, io, Ok::<f64, Exception>)
    };
    let value = eased.map_err(plain_error)??;
    Ok(Value::Num(value))
}

pub(crate) fn interpolate_colors_native(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let input = arg(args, 0).to_number();
    let input_range = number_array(&arg(args, 1), "inputRange")?;
    let colors = match arg(args, 2) {
        Value::Array(items) => items.borrow().iter().map(Value::to_js_string).collect::<Vec<_>>(),
        other => {
            return Err(type_error(format!(
                "outputRange must be an array of colors, got {}",
                other.type_of()
            )));
        }
    };
    let css = interpolate_colors(input, &input_range, &colors).map_err(plain_error)?;
    Ok(Value::str(&css))
}

/// `spring({ frame, fps, config?, from?, to?, delay?, durationInFrames?, reverse? })`.
pub(crate) fn spring_native(it: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let opts = arg(args, 0);
    if !matches!(opts, Value::Object(_)) {
        return Err(type_error("spring() expects an options object"));
    }
    let frame = match option(&opts, "frame") {
        Value::Num(n) if n.is_finite() => n,
        other => {
            return Err(type_error(format!(
                "spring(): \"frame\" must be a finite number, got {}",
                other.to_js_string()
            )));
        }
    };
    let fps = match option(&opts, "fps") {
        Value::Undefined => match it.frame() {
            Some(ctx) => ctx.config.fps.as_f64(),
            None => return Err(type_error("spring(): \"fps\" is required")),
        },
        v => v.to_number(),
    };
    if !(fps.is_finite() && fps > 0.0) {
        return Err(range_error(format!("spring(): \"fps\" must be > 0, got {fps}")));
    }
    let cfg_value = option(&opts, "config");
    let defaults = SpringConfig::default();
    let config = SpringConfig {
        damping: option_number(&cfg_value, "damping", defaults.damping),
        mass: option_number(&cfg_value, "mass", defaults.mass),
        stiffness: option_number(&cfg_value, "stiffness", defaults.stiffness),
        overshoot_clamping: option(&cfg_value, "overshootClamping").truthy(),
    };
    if config.mass <= 0.0 || config.stiffness <= 0.0 || config.damping <= 0.0 {
        return Err(range_error("spring(): mass, stiffness and damping must be > 0"));
    }
    let duration_in_frames = match option(&opts, "durationInFrames") {
        Value::Undefined | Value::Null => None,
        v => Some(v.to_number()),
    };
    Ok(Value::Num(spring(&SpringParams {
        frame,
        fps,
        config,
        from: option_number(&opts, "from", 0.0),
        to: option_number(&opts, "to", 1.0),
        delay: option_number(&opts, "delay", 0.0),
        duration_in_frames,
        reverse: option(&opts, "reverse").truthy(),
    })))
}

pub(crate) fn random_native(it: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    match arg(args, 0) {
        Value::Num(n) => Ok(Value::Num(random_for_seed(Seed::Number(n)))),
        Value::Str(s) => Ok(Value::Num(random_for_seed(Seed::Text(&s)))),
        // `null` asks for a non-seeded value; the interpreter stream keeps it reproducible.
        Value::Null => Ok(Value::Num(it.next_random())),
        other => Err(type_error(format!(
            "random() expects a number, string or null seed, got {}",
            other.type_of()
        ))),
    }
}

// ---- remotion: Easing ---------------------------------------------------------------------------

fn ease_arg(args: &[Value], i: usize, who: &str) -> Result<Ease, Exception> {
    match args.get(i) {
        Some(Value::Func(f)) => match &**f {
            Function::Ease(e) => Ok(e.clone()),
            _ => Err(type_error(format!(
                "Easing.{who}() expects an Easing curve such as Easing.quad"
            ))),
        },
        _ => Err(type_error(format!("Easing.{who}() expects an easing function"))),
    }
}

fn ease_value(e: Ease) -> Value {
    Value::Func(Rc::new(Function::Ease(e)))
}

pub(crate) fn easing_in(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(ease_value(Ease::In(Box::new(ease_arg(args, 0, "in")?))))
}

pub(crate) fn easing_out(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(ease_value(Ease::Out(Box::new(ease_arg(args, 0, "out")?))))
}

pub(crate) fn easing_in_out(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(ease_value(Ease::InOut(Box::new(ease_arg(args, 0, "inOut")?))))
}

pub(crate) fn easing_poly(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(ease_value(Ease::Poly(arg(args, 0).to_number())))
}

pub(crate) fn easing_back(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let s = match arg(args, 0) {
        Value::Undefined => 1.70158,
        v => v.to_number(),
    };
    Ok(ease_value(Ease::Back(s)))
}

pub(crate) fn easing_elastic(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let bounciness = match arg(args, 0) {
        Value::Undefined => 1.0,
        v => v.to_number(),
    };
    Ok(ease_value(Ease::Elastic(bounciness)))
}

pub(crate) fn easing_bezier(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let [x1, y1, x2, y2] = [0, 1, 2, 3].map(|i| arg(args, i).to_number());
    if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
        return Err(range_error("Easing.bezier(): x values must be in [0, 1]"));
    }
    Ok(ease_value(Ease::Bezier(CubicBezier::new(x1, y1, x2, y2))))
}
