//! Language-level globals that every factory body sees next to the registry capabilities.

use crate::script::interp::{Exception, Interp, make_error, own_keys, range_error, type_error};
use crate::script::methods::check_len;
use crate::script::value::{Function, PropMap, Scope, Value, number_to_string};

pub(crate) fn install(scope: &Scope) {
    scope.declare("Math", math(), false);
    scope.declare(
        "Array",
        Function::native_with(
            "Array",
            array_ctor,
            PropMap::new()
                .with("isArray", Function::native("isArray", array_is_array))
                .with("from", Function::native("from", array_from))
                .with("of", Function::native("of", array_of)),
        ),
        false,
    );
    scope.declare(
        "Object",
        Function::native_with(
            "Object",
            object_ctor,
            PropMap::new()
                .with("keys", Function::native("keys", object_keys))
                .with("values", Function::native("values", object_values))
                .with("entries", Function::native("entries", object_entries))
                .with("assign", Function::native("assign", object_assign))
                .with("fromEntries", Function::native("fromEntries", object_from_entries))
                .with("freeze", Function::native("freeze", identity)),
        ),
        false,
    );
    scope.declare(
        "JSON",
        Value::object(
            PropMap::new()
                .with("stringify", Function::native("stringify", json_stringify))
                .with("parse", Function::native("parse", json_parse)),
        ),
        false,
    );
    scope.declare(
        "String",
        Function::native_with(
            "String",
            string_ctor,
            PropMap::new().with("fromCharCode", Function::native("fromCharCode", from_char_code)),
        ),
        false,
    );
    scope.declare(
        "Number",
        Function::native_with(
            "Number",
            number_ctor,
            PropMap::new()
                .with("isInteger", Function::native("isInteger", number_is_integer))
                .with("isFinite", Function::native("isFinite", number_is_finite))
                .with("isNaN", Function::native("isNaN", number_is_nan))
                .with("parseFloat", Function::native("parseFloat", parse_float))
                .with("parseInt", Function::native("parseInt", parse_int))
                .with("MAX_SAFE_INTEGER", Value::Num(9_007_199_254_740_991.0))
                .with("MIN_SAFE_INTEGER", Value::Num(-9_007_199_254_740_991.0))
                .with("EPSILON", Value::Num(f64::EPSILON))
                .with("MAX_VALUE", Value::Num(f64::MAX)),
        ),
        false,
    );
    scope.declare("Boolean", Function::native("Boolean", boolean_ctor), false);
    scope.declare("Error", Function::native("Error", error_ctor), false);
    scope.declare("TypeError", Function::native("TypeError", type_error_ctor), false);
    scope.declare("RangeError", Function::native("RangeError", range_error_ctor), false);
    scope.declare("parseInt", Function::native("parseInt", parse_int), false);
    scope.declare("parseFloat", Function::native("parseFloat", parse_float), false);
    scope.declare("isNaN", Function::native("isNaN", global_is_nan), false);
    scope.declare("isFinite", Function::native("isFinite", global_is_finite), false);
    scope.declare(
        "console",
        Value::object(
            PropMap::new()
                .with("log", Function::native("log", console_log))
                .with("info", Function::native("info", console_log))
                .with("debug", Function::native("debug", console_log))
                .with("warn", Function::native("warn", console_warn))
                .with("error", Function::native("error", console_warn)),
        ),
        false,
    );
    scope.declare("NaN", Value::Num(f64::NAN), false);
    scope.declare("Infinity", Value::Num(f64::INFINITY), false);
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

fn num(args: &[Value], i: usize) -> f64 {
    args.get(i).map_or(f64::NAN, Value::to_number)
}

// ---- Math ---------------------------------------------------------------------------------------

macro_rules! math_unary {
    ($($name:ident => $f:expr),* $(,)?) => {
        $(
            fn $name(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
                let f: fn(f64) -> f64 = $f;
                Ok(Value::Num(f(num(args, 0))))
            }
        )*
    };
}

math_unary! {
    math_abs => f64::abs,
    math_floor => f64::floor,
    math_ceil => f64::ceil,
    math_trunc => f64::trunc,
    math_sqrt => f64::sqrt,
    math_cbrt => f64::cbrt,
    math_exp => f64::exp,
    math_log => f64::ln,
    math_log2 => f64::log2,
    math_log10 => f64::log10,
    math_sin => f64::sin,
    math_cos => f64::cos,
    math_tan => f64::tan,
    math_asin => f64::asin,
    math_acos => f64::acos,
    math_atan => f64::atan,
    math_sign => |x| if x.is_nan() || x == 0.0 { x } else { x.signum() },
    // JS rounds half-way cases towards +Infinity.
    math_round => |x| (x + 0.5).floor(),
}

fn math_pow(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Num(num(args, 0).powf(num(args, 1))))
}

fn math_atan2(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Num(num(args, 0).atan2(num(args, 1))))
}

fn math_hypot(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Num(
        args.iter().map(|a| a.to_number().powi(2)).sum::<f64>().sqrt(),
    ))
}

fn math_min(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let mut out = f64::INFINITY;
    for a in args {
        let v = a.to_number();
        if v.is_nan() {
            return Ok(Value::Num(f64::NAN));
        }
        out = out.min(v);
    }
    Ok(Value::Num(out))
}

fn math_max(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let mut out = f64::NEG_INFINITY;
    for a in args {
        let v = a.to_number();
        if v.is_nan() {
            return Ok(Value::Num(f64::NAN));
        }
        out = out.max(v);
    }
    Ok(Value::Num(out))
}

fn math_random(it: &mut Interp, _: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Num(it.next_random()))
}

fn math() -> Value {
    Value::object(
        PropMap::new()
            .with("PI", Value::Num(std::f64::consts::PI))
            .with("E", Value::Num(std::f64::consts::E))
            .with("SQRT2", Value::Num(std::f64::consts::SQRT_2))
            .with("LN2", Value::Num(std::f64::consts::LN_2))
            .with("LN10", Value::Num(std::f64::consts::LN_10))
            .with("abs", Function::native("abs", math_abs))
            .with("floor", Function::native("floor", math_floor))
            .with("ceil", Function::native("ceil", math_ceil))
            .with("round", Function::native("round", math_round))
            .with("trunc", Function::native("trunc", math_trunc))
            .with("sign", Function::native("sign", math_sign))
            .with("sqrt", Function::native("sqrt", math_sqrt))
            .with("cbrt", Function::native("cbrt", math_cbrt))
            .with("exp", Function::native("exp", math_exp))
            .with("log", Function::native("log", math_log))
            .with("log2", Function::native("log2", math_log2))
            .with("log10", Function::native("log10", math_log10))
            .with("sin", Function::native("sin", math_sin))
            .with("cos", Function::native("cos", math_cos))
            .with("tan", Function::native("tan", math_tan))
            .with("asin", Function::native("asin", math_asin))
            .with("acos", Function::native("acos", math_acos))
            .with("atan", Function::native("atan", math_atan))
            .with("atan2", Function::native("atan2", math_atan2))
            .with("pow", Function::native("pow", math_pow))
            .with("hypot", Function::native("hypot", math_hypot))
            .with("min", Function::native("min", math_min))
            .with("max", Function::native("max", math_max))
            .with("random", Function::native("random", math_random)),
    )
}

// ---- Array / Object -----------------------------------------------------------------------------

fn array_ctor(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    match args {
        [Value::Num(n)] => {
            if *n < 0.0 || n.fract() != 0.0 || !n.is_finite() {
                return Err(range_error("Invalid array length"));
            }
            check_len(*n as usize)?;
            Ok(Value::array(vec![Value::Undefined; *n as usize]))
        }
        _ => Ok(Value::array(args.to_vec())),
    }
}

fn array_is_array(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Bool(matches!(arg(args, 0), Value::Array(_))))
}

fn array_of(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::array(args.to_vec()))
}

/// `Array.from(iterable | {length}, mapFn?)`.
fn array_from(it: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let source = arg(args, 0);
    let items = match &source {
        Value::Array(_) | Value::Str(_) => it.iterate(&source)?,
        Value::Object(o) => {
            let len = o.borrow().get("length").map_or(0.0, Value::to_number);
            let len = if len.is_finite() && len > 0.0 { len as usize } else { 0 };
            check_len(len)?;
            (0..len)
                .map(|i| o.borrow().get(&i.to_string()).cloned().unwrap_or_default())
                .collect()
        }
        Value::Undefined | Value::Null => {
            return Err(type_error(format!(
                "{} is not iterable",
                source.to_js_string()
            )));
        }
        _ => Vec::new(),
    };
    let map = arg(args, 1);
    if !map.is_callable() {
        return Ok(Value::array(items));
    }
    let mut out = Vec::with_capacity(items.len());
    for (i, v) in items.into_iter().enumerate() {
        out.push(it.call(&map, &[v, Value::Num(i as f64)])?);
    }
    Ok(Value::array(out))
}

fn object_ctor(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(match arg(args, 0) {
        v @ (Value::Object(_) | Value::Array(_) | Value::Func(_)) => v,
        _ => Value::object(PropMap::new()),
    })
}

fn object_keys(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::array(
        own_keys(&arg(args, 0)).into_iter().map(Value::Str).collect(),
    ))
}

fn object_values(it: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let obj = arg(args, 0);
    let mut out = Vec::new();
    for k in own_keys(&obj) {
        out.push(it.get_member(&obj, &Value::Str(k))?);
    }
    Ok(Value::array(out))
}

fn object_entries(it: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let obj = arg(args, 0);
    let mut out = Vec::new();
    for k in own_keys(&obj) {
        let v = it.get_member(&obj, &Value::Str(k.clone()))?;
        out.push(Value::array(vec![Value::Str(k), v]));
    }
    Ok(Value::array(out))
}

fn object_assign(it: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let target = arg(args, 0);
    let Value::Object(t) = &target else {
        return Err(type_error("Object.assign target must be an object"));
    };
    for src in args.iter().skip(1) {
        for k in own_keys(src) {
            let v = it.get_member(src, &Value::Str(k.clone()))?;
            t.borrow_mut().set(&k, v);
        }
    }
    Ok(target)
}

fn object_from_entries(it: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let mut props = PropMap::new();
    for entry in it.iterate(&arg(args, 0))? {
        let Value::Array(pair) = entry else {
            return Err(type_error("Iterator value is not an entry object"));
        };
        let pair = pair.borrow();
        let key = pair.first().cloned().unwrap_or_default().to_key();
        props.set(&key, pair.get(1).cloned().unwrap_or_default());
    }
    Ok(Value::object(props))
}

fn identity(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(arg(args, 0))
}

// ---- JSON ---------------------------------------------------------------------------------------

fn json_stringify(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let Some(json) = arg(args, 0).to_json() else {
        return Ok(Value::Undefined);
    };
    let indent = match arg(args, 2) {
        Value::Num(n) if n >= 1.0 => Some(" ".repeat(n.min(10.0) as usize)),
        Value::Str(s) if !s.is_empty() => Some(s.chars().take(10).collect()),
        _ => None,
    };
    let text = match indent {
        None => serde_json::to_string(&json),
        Some(indent) => {
            let mut buf = Vec::new();
            let fmt = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
            serde::Serialize::serialize(&json, &mut ser)
                .map(|()| String::from_utf8_lossy(&buf).into_owned())
        }
    }
    .map_err(|e| type_error(format!("JSON.stringify failed: {e}")))?;
    Ok(Value::str(&text))
}

fn json_parse(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let text = arg(args, 0).to_js_string();
    let json: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
        Exception::Throw(make_error("SyntaxError", &format!("JSON.parse: {e}")))
    })?;
    Ok(Value::from_json(&json))
}

// ---- String / Number / Boolean ------------------------------------------------------------------

fn string_ctor(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(match args.first() {
        None => Value::str(""),
        Some(v) => Value::str(&v.to_js_string()),
    })
}

fn from_char_code(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::str(
        &args
            .iter()
            .map(|a| char::from_u32(a.to_number() as u32).unwrap_or('\u{fffd}'))
            .collect::<String>(),
    ))
}

fn number_ctor(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Num(args.first().map_or(0.0, Value::to_number)))
}

fn number_is_integer(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Bool(
        matches!(arg(args, 0), Value::Num(n) if n.is_finite() && n.fract() == 0.0),
    ))
}

fn number_is_finite(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Bool(matches!(arg(args, 0), Value::Num(n) if n.is_finite())))
}

fn number_is_nan(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Bool(matches!(arg(args, 0), Value::Num(n) if n.is_nan())))
}

fn global_is_nan(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Bool(num(args, 0).is_nan()))
}

fn global_is_finite(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Bool(num(args, 0).is_finite()))
}

fn boolean_ctor(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Bool(arg(args, 0).truthy()))
}

/// Longest numeric prefix, as `parseFloat` reads it.
fn parse_float(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let s = arg(args, 0).to_js_string();
    let t = s.trim_start();
    if t.starts_with("Infinity") || t.starts_with("+Infinity") {
        return Ok(Value::Num(f64::INFINITY));
    }
    if t.starts_with("-Infinity") {
        return Ok(Value::Num(f64::NEG_INFINITY));
    }
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let bytes = t.as_bytes();
    while end < bytes.len() {
        let c = bytes[end];
        let ok = match c {
            b'0'..=b'9' => true,
            b'+' | b'-' => end == 0 || matches!(bytes[end - 1], b'e' | b'E'),
            b'.' if !seen_dot && !seen_exp => {
                seen_dot = true;
                true
            }
            b'e' | b'E' if !seen_exp && end > 0 => {
                seen_exp = true;
                true
            }
            _ => false,
        };
        if !ok {
            break;
        }
        end += 1;
    }
    // Back off until the prefix parses (e.g. "1e" or "-.").
    while end > 0 {
        if let Ok(v) = t[..end].parse::<f64>() {
            return Ok(Value::Num(v));
        }
        end -= 1;
    }
    Ok(Value::Num(f64::NAN))
}

fn parse_int(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    let s = arg(args, 0).to_js_string();
    let mut t = s.trim();
    let neg = t.starts_with('-');
    if neg || t.starts_with('+') {
        t = &t[1..];
    }
    let mut radix = match arg(args, 1) {
        Value::Undefined => 10,
        v => v.to_number() as u32,
    };
    if radix == 0 {
        radix = 10;
    }
    if (radix == 16 || args.get(1).is_none())
        && (t.starts_with("0x") || t.starts_with("0X"))
    {
        t = &t[2..];
        radix = 16;
    }
    if !(2..=36).contains(&radix) {
        return Ok(Value::Num(f64::NAN));
    }
    let digits: String = t.chars().take_while(|c| c.is_digit(radix)).collect();
    if digits.is_empty() {
        return Ok(Value::Num(f64::NAN));
    }
    let mut v = 0f64;
    for c in digits.chars() {
        v = v * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0));
    }
    Ok(Value::Num(if neg { -v } else { v }))
}

// ---- Errors / console ---------------------------------------------------------------------------

fn error_ctor(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(error_value("Error", args))
}

fn type_error_ctor(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(error_value("TypeError", args))
}

fn range_error_ctor(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    Ok(error_value("RangeError", args))
}

fn error_value(name: &str, args: &[Value]) -> Value {
    let message = match arg(args, 0) {
        Value::Undefined => String::new(),
        v => v.to_js_string(),
    };
    make_error(name, &message)
}

fn console_line(args: &[Value]) -> String {
    args.iter()
        .map(|a| match a {
            Value::Str(s) => s.to_string(),
            Value::Num(n) => number_to_string(*n),
            other => other
                .to_json()
                .map_or_else(|| other.to_js_string(), |j| j.to_string()),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn console_log(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    tracing::debug!(target: "wavyte_live::script", "{}", console_line(args));
    Ok(Value::Undefined)
}

fn console_warn(_: &mut Interp, args: &[Value]) -> Result<Value, Exception> {
    tracing::warn!(target: "wavyte_live::script", "{}", console_line(args));
    Ok(Value::Undefined)
}
