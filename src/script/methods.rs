//! Methods of arrays, strings, numbers and plain objects, dispatched on the receiver's runtime
//! type. Property lookup hands out a bound `Function::Method`; calling it lands in
//! [`call_method`].

use crate::script::interp::{Exception, Interp, range_error, type_error};
use crate::script::value::{Function, Value, number_to_string};
use std::cmp::Ordering;
use std::rc::Rc;

/// Upper bound on array and string sizes produced by built-ins.
pub(crate) const MAX_COLLECTION_LEN: usize = 1 << 20;

const MAX_FLAT_DEPTH: u32 = 64;

const ARRAY_METHODS: &[&str] = &[
    "map", "filter", "forEach", "reduce", "reduceRight", "find", "findIndex", "findLast",
    "findLastIndex", "some", "every", "includes", "indexOf", "lastIndexOf", "join", "slice",
    "concat", "reverse", "sort", "push", "pop", "shift", "unshift", "splice", "flat", "flatMap",
    "fill", "at", "keys", "entries", "toString",
];

const STRING_METHODS: &[&str] = &[
    "charAt", "charCodeAt", "at", "indexOf", "lastIndexOf", "includes", "startsWith", "endsWith",
    "slice", "substring", "substr", "toUpperCase", "toLowerCase", "trim", "trimStart", "trimEnd",
    "split", "replace", "replaceAll", "repeat", "padStart", "padEnd", "concat", "toString",
    "localeCompare",
];

const NUMBER_METHODS: &[&str] = &["toFixed", "toString", "toPrecision", "toLocaleString", "valueOf"];

const OBJECT_METHODS: &[&str] = &["hasOwnProperty", "toString"];

const BOOL_METHODS: &[&str] = &["toString"];

pub(crate) fn check_len(len: usize) -> Result<(), Exception> {
    if len > MAX_COLLECTION_LEN {
        return Err(range_error(format!(
            "Invalid length {len}: collections are limited to {MAX_COLLECTION_LEN} elements"
        )));
    }
    Ok(())
}

/// Bind `name` to `recv` when the receiver type has such a method.
pub(crate) fn bind(recv: &Value, name: Rc<str>) -> Value {
    let table = match recv {
        Value::Array(_) => ARRAY_METHODS,
        Value::Str(_) => STRING_METHODS,
        Value::Num(_) => NUMBER_METHODS,
        Value::Bool(_) => BOOL_METHODS,
        Value::Object(_) => OBJECT_METHODS,
        _ => return Value::Undefined,
    };
    if table.contains(&&*name) {
        Value::Func(Rc::new(Function::Method {
            recv: recv.clone(),
            name,
        }))
    } else {
        Value::Undefined
    }
}

pub(crate) fn call_method(
    it: &mut Interp,
    recv: &Value,
    name: &str,
    args: &[Value],
) -> Result<Value, Exception> {
    match recv {
        Value::Array(_) => array_method(it, recv, name, args),
        Value::Str(s) => string_method(s, name, args),
        Value::Num(n) => number_method(*n, name, args),
        Value::Bool(b) => Ok(Value::str(&b.to_string())),
        Value::Object(o) => match name {
            "hasOwnProperty" => Ok(Value::Bool(
                o.borrow().contains(&arg(args, 0).to_key()),
            )),
            _ => Ok(Value::str(&recv.to_js_string())),
        },
        other => Err(type_error(format!(
            "{}.{name} is not a function",
            other.type_of()
        ))),
    }
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or_default()
}

/// Resolve a relative index (negative counts from the end) clamped to `[0, len]`.
fn rel_index(v: &Value, len: usize, default: usize) -> usize {
    if matches!(v, Value::Undefined) {
        return default;
    }
    let n = v.to_number();
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    }
}

fn callback(args: &[Value], method: &str) -> Result<Value, Exception> {
    let f = arg(args, 0);
    if !f.is_callable() {
        return Err(type_error(format!(
            "{} is not a function (in Array.prototype.{method})",
            f.to_js_string()
        )));
    }
    Ok(f)
}

fn array_method(
    it: &mut Interp,
    recv: &Value,
    name: &str,
    args: &[Value],
) -> Result<Value, Exception> {
    let Value::Array(cell) = recv else {
        return Ok(Value::Undefined);
    };
    // Callbacks may mutate the array; iterate over a snapshot.
    let items = cell.borrow().to_vec();
    let len = items.len();
    let idx = |i: usize| Value::Num(i as f64);

    match name {
        "map" => {
            let f = callback(args, name)?;
            let mut out = Vec::with_capacity(len);
            for (i, v) in items.into_iter().enumerate() {
                out.push(it.call(&f, &[v, idx(i), recv.clone()])?);
            }
            Ok(Value::array(out))
        }
        "filter" => {
            let f = callback(args, name)?;
            let mut out = Vec::new();
            for (i, v) in items.into_iter().enumerate() {
                if it.call(&f, &[v.clone(), idx(i), recv.clone()])?.truthy() {
                    out.push(v);
                }
            }
            Ok(Value::array(out))
        }
        "forEach" => {
            let f = callback(args, name)?;
            for (i, v) in items.into_iter().enumerate() {
                it.call(&f, &[v, idx(i), recv.clone()])?;
            }
            Ok(Value::Undefined)
        }
        "reduce" | "reduceRight" => {
            let f = callback(args, name)?;
            let order: Vec<usize> = if name == "reduce" {
                (0..len).collect()
            } else {
                (0..len).rev().collect()
            };
            let mut order = order.into_iter();
            let mut acc = if args.len() >= 2 {
                args[1].clone()
            } else {
                match order.next() {
                    Some(i) => items[i].clone(),
                    None => return Err(type_error("Reduce of empty array with no initial value")),
                }
            };
            for i in order {
                acc = it.call(&f, &[acc, items[i].clone(), idx(i), recv.clone()])?;
            }
            Ok(acc)
        }
        "find" | "findIndex" | "findLast" | "findLastIndex" => {
            let f = callback(args, name)?;
            let order: Vec<usize> = if name.starts_with("findLast") {
                (0..len).rev().collect()
            } else {
                (0..len).collect()
            };
            for i in order {
                if it.call(&f, &[items[i].clone(), idx(i), recv.clone()])?.truthy() {
                    return Ok(if name.ends_with("Index") {
                        idx(i)
                    } else {
                        items[i].clone()
                    });
                }
            }
            Ok(if name.ends_with("Index") {
                Value::Num(-1.0)
            } else {
                Value::Undefined
            })
        }
        "some" | "every" => {
            let f = callback(args, name)?;
            let want = name == "some";
            for (i, v) in items.into_iter().enumerate() {
                if it.call(&f, &[v, idx(i), recv.clone()])?.truthy() == want {
                    return Ok(Value::Bool(want));
                }
            }
            Ok(Value::Bool(!want))
        }
        "includes" => {
            let needle = arg(args, 0);
            Ok(Value::Bool(items.iter().any(|v| {
                crate::script::value::strict_equals(v, &needle)
                    || matches!((v, &needle), (Value::Num(a), Value::Num(b)) if a.is_nan() && b.is_nan())
            })))
        }
        "indexOf" | "lastIndexOf" => {
            let needle = arg(args, 0);
            let pos = if name == "indexOf" {
                items.iter().position(|v| *v == needle)
            } else {
                items.iter().rposition(|v| *v == needle)
            };
            Ok(Value::Num(pos.map_or(-1.0, |p| p as f64)))
        }
        "join" => {
            let sep = match arg(args, 0) {
                Value::Undefined => ",".to_owned(),
                v => v.to_js_string(),
            };
            Ok(Value::str(
                &items
                    .iter()
                    .map(|v| {
                        if v.is_nullish() {
                            String::new()
                        } else {
                            v.to_js_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(&sep),
            ))
        }
        "toString" => Ok(Value::str(&recv.to_js_string())),
        "slice" => {
            let start = rel_index(&arg(args, 0), len, 0);
            let end = rel_index(&arg(args, 1), len, len);
            Ok(Value::array(if start < end {
                items[start..end].to_vec()
            } else {
                Vec::new()
            }))
        }
        "concat" => {
            let mut out = items;
            for a in args {
                match a {
                    Value::Array(other) => out.extend(other.borrow().iter().cloned()),
                    v => out.push(v.clone()),
                }
            }
            check_len(out.len())?;
            Ok(Value::array(out))
        }
        "reverse" => {
            cell.borrow_mut().reverse();
            Ok(recv.clone())
        }
        "sort" => {
            let mut sorted = items;
            let cmp = arg(args, 0);
            if cmp.is_callable() {
                // Insertion sort keeps the comparator calls fallible and the result stable.
                for i in 1..sorted.len() {
                    let mut j = i;
                    while j > 0 {
                        let r = it
                            .call(&cmp, &[sorted[j - 1].clone(), sorted[j].clone()])?
                            .to_number();
                        if r > 0.0 {
                            sorted.swap(j - 1, j);
                            j -= 1;
                        } else {
                            break;
                        }
                    }
                }
            } else {
                sorted.sort_by(|a, b| match (a, b) {
                    (Value::Undefined, Value::Undefined) => Ordering::Equal,
                    (Value::Undefined, _) => Ordering::Greater,
                    (_, Value::Undefined) => Ordering::Less,
                    _ => a.to_js_string().cmp(&b.to_js_string()),
                });
            }
            **cell.borrow_mut() = sorted;
            Ok(recv.clone())
        }
        "push" => {
            check_len(len + args.len())?;
            let mut items = cell.borrow_mut();
            items.extend(args.iter().cloned());
            Ok(Value::Num(items.len() as f64))
        }
        "pop" => Ok(cell.borrow_mut().pop().unwrap_or_default()),
        "shift" => {
            let mut items = cell.borrow_mut();
            Ok(if items.is_empty() {
                Value::Undefined
            } else {
                items.remove(0)
            })
        }
        "unshift" => {
            check_len(len + args.len())?;
            let mut items = cell.borrow_mut();
            for (i, v) in args.iter().enumerate() {
                items.insert(i, v.clone());
            }
            Ok(Value::Num(items.len() as f64))
        }
        "splice" => {
            let start = rel_index(&arg(args, 0), len, 0);
            let count = match args.get(1) {
                None => len - start,
                Some(v) => (v.to_number().max(0.0) as usize).min(len - start),
            };
            let mut items = cell.borrow_mut();
            let removed: Vec<Value> = items
                .splice(start..start + count, args.iter().skip(2).cloned())
                .collect();
            Ok(Value::array(removed))
        }
        "flat" => {
            let depth = match arg(args, 0) {
                Value::Undefined => 1,
                v => v.to_number().clamp(0.0, f64::from(MAX_FLAT_DEPTH)) as u32,
            };
            let mut out = Vec::new();
            flatten(&items, depth, &mut out)?;
            Ok(Value::array(out))
        }
        "flatMap" => {
            let f = callback(args, name)?;
            let mut out = Vec::new();
            for (i, v) in items.into_iter().enumerate() {
                match it.call(&f, &[v, idx(i), recv.clone()])? {
                    Value::Array(inner) => out.extend(inner.borrow().iter().cloned()),
                    other => out.push(other),
                }
                check_len(out.len())?;
            }
            Ok(Value::array(out))
        }
        "fill" => {
            let value = arg(args, 0);
            let start = rel_index(&arg(args, 1), len, 0);
            let end = rel_index(&arg(args, 2), len, len);
            let mut items = cell.borrow_mut();
            for slot in items.iter_mut().take(end).skip(start) {
                *slot = value.clone();
            }
            Ok(recv.clone())
        }
        "at" => {
            let n = arg(args, 0).to_number();
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            let i = if n < 0.0 { len as f64 + n } else { n };
            Ok(if i < 0.0 {
                Value::Undefined
            } else {
                items.get(i as usize).cloned().unwrap_or_default()
            })
        }
        "keys" => Ok(Value::array((0..len).map(idx).collect())),
        "entries" => Ok(Value::array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| Value::array(vec![idx(i), v]))
                .collect(),
        )),
        _ => Err(type_error(format!("array.{name} is not a function"))),
    }
}

fn flatten(items: &[Value], depth: u32, out: &mut Vec<Value>) -> Result<(), Exception> {
    for v in items {
        match v {
            Value::Array(inner) if depth > 0 => {
                let inner = inner.borrow().to_vec();
                flatten(&inner, depth - 1, out)?;
            }
            other => out.push(other.clone()),
        }
        check_len(out.len())?;
    }
    Ok(())
}

fn chars_slice(chars: &[char], start: usize, end: usize) -> Value {
    if start >= end {
        return Value::str("");
    }
    Value::str(&chars[start..end].iter().collect::<String>())
}

fn string_method(s: &Rc<str>, name: &str, args: &[Value]) -> Result<Value, Exception> {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();
    let text = |i: usize| arg(args, i).to_js_string();

    let find_char_index = |hay: &str, byte: Option<usize>| {
        byte.map_or(-1.0, |b| hay[..b].chars().count() as f64)
    };

    Ok(match name {
        "charAt" => {
            let i = arg(args, 0).to_number();
            let i = if i.is_nan() { 0.0 } else { i };
            chars
                .get(i as usize)
                .filter(|_| i >= 0.0)
                .map_or(Value::str(""), |c| Value::str(c.encode_utf8(&mut [0; 4])))
        }
        "charCodeAt" => {
            let i = arg(args, 0).to_number();
            let i = if i.is_nan() { 0.0 } else { i };
            chars
                .get(i as usize)
                .filter(|_| i >= 0.0)
                .map_or(Value::Num(f64::NAN), |c| Value::Num(f64::from(u32::from(*c))))
        }
        "at" => {
            let n = arg(args, 0).to_number();
            let n = if n.is_nan() { 0.0 } else { n.trunc() };
            let i = if n < 0.0 { len as f64 + n } else { n };
            if i < 0.0 {
                Value::Undefined
            } else {
                chars
                    .get(i as usize)
                    .map_or(Value::Undefined, |c| Value::str(c.encode_utf8(&mut [0; 4])))
            }
        }
        "indexOf" => {
            let needle = text(0);
            let from = rel_index(&arg(args, 1), len, 0);
            let offset: usize = chars[..from].iter().map(|c| c.len_utf8()).sum();
            let found = s[offset..].find(needle.as_str()).map(|b| b + offset);
            Value::Num(find_char_index(&**s, found))
        }
        "lastIndexOf" => Value::Num(find_char_index(&**s, s.rfind(text(0).as_str()))),
        "includes" => Value::Bool(s.contains(text(0).as_str())),
        "startsWith" => Value::Bool(s.starts_with(text(0).as_str())),
        "endsWith" => Value::Bool(s.ends_with(text(0).as_str())),
        "slice" => {
            let start = rel_index(&arg(args, 0), len, 0);
            let end = rel_index(&arg(args, 1), len, len);
            chars_slice(&chars, start, end)
        }
        "substring" => {
            let clamp = |v: &Value, d: usize| match v {
                Value::Undefined => d,
                v => {
                    let n = v.to_number();
                    if n.is_nan() { 0 } else { n.clamp(0.0, len as f64) as usize }
                }
            };
            let a = clamp(&arg(args, 0), 0);
            let b = clamp(&arg(args, 1), len);
            chars_slice(&chars, a.min(b), a.max(b))
        }
        "substr" => {
            let start = rel_index(&arg(args, 0), len, 0);
            let count = match arg(args, 1) {
                Value::Undefined => len - start,
                v => v.to_number().max(0.0) as usize,
            };
            chars_slice(&chars, start, start.saturating_add(count).min(len))
        }
        "toUpperCase" => Value::str(&s.to_uppercase()),
        "toLowerCase" => Value::str(&s.to_lowercase()),
        "trim" => Value::str(s.trim()),
        "trimStart" => Value::str(s.trim_start()),
        "trimEnd" => Value::str(s.trim_end()),
        "split" => {
            let parts: Vec<Value> = match arg(args, 0) {
                Value::Undefined => vec![Value::Str(s.clone())],
                sep => {
                    let sep = sep.to_js_string();
                    if sep.is_empty() {
                        chars.iter().map(|c| Value::str(c.encode_utf8(&mut [0; 4]))).collect()
                    } else {
                        s.split(sep.as_str()).map(Value::str).collect()
                    }
                }
            };
            let limit = match arg(args, 1) {
                Value::Undefined => usize::MAX,
                v => v.to_number().max(0.0) as usize,
            };
            Value::array(parts.into_iter().take(limit).collect())
        }
        "replace" => Value::str(&s.replacen(text(0).as_str(), &text(1), 1)),
        "replaceAll" => {
            let pat = text(0);
            if pat.is_empty() {
                Value::Str(s.clone())
            } else {
                Value::str(&s.replace(pat.as_str(), &text(1)))
            }
        }
        "repeat" => {
            let n = arg(args, 0).to_number();
            if n < 0.0 || !n.is_finite() {
                return Err(range_error(format!("Invalid count value: {}", number_to_string(n))));
            }
            check_len(len.saturating_mul(n as usize))?;
            Value::str(&s.repeat(n as usize))
        }
        "padStart" | "padEnd" => {
            let target = arg(args, 0).to_number().max(0.0) as usize;
            check_len(target)?;
            let fill = match arg(args, 1) {
                Value::Undefined => " ".to_owned(),
                v => v.to_js_string(),
            };
            if target <= len || fill.is_empty() {
                Value::Str(s.clone())
            } else {
                let pad: String = fill.chars().cycle().take(target - len).collect();
                if name == "padStart" {
                    Value::str(&format!("{pad}{s}"))
                } else {
                    Value::str(&format!("{s}{pad}"))
                }
            }
        }
        "concat" => {
            let mut out = s.to_string();
            for a in args {
                out.push_str(&a.to_js_string());
            }
            Value::str(&out)
        }
        "localeCompare" => Value::Num(match (**s).cmp(text(0).as_str()) {
            Ordering::Less => -1.0,
            Ordering::Equal => 0.0,
            Ordering::Greater => 1.0,
        }),
        "toString" => Value::Str(s.clone()),
        _ => return Err(type_error(format!("string.{name} is not a function"))),
    })
}

fn number_method(n: f64, name: &str, args: &[Value]) -> Result<Value, Exception> {
    Ok(match name {
        "toFixed" => {
            let digits = arg(args, 0).to_number();
            let digits = if digits.is_nan() { 0.0 } else { digits };
            if !(0.0..=100.0).contains(&digits) {
                return Err(range_error("toFixed() digits argument must be between 0 and 100"));
            }
            if !n.is_finite() {
                Value::str(&number_to_string(n))
            } else {
                Value::str(&format!("{:.*}", digits as usize, n))
            }
        }
        "toPrecision" => match arg(args, 0) {
            Value::Undefined => Value::str(&number_to_string(n)),
            p => {
                let p = p.to_number();
                if !(1.0..=100.0).contains(&p) {
                    return Err(range_error("toPrecision() argument must be between 1 and 100"));
                }
                if n == 0.0 || !n.is_finite() {
                    Value::str(&format!("{:.*}", (p as usize).saturating_sub(1), n))
                } else {
                    let magnitude = n.abs().log10().floor() as i32;
                    let decimals = (p as i32 - 1 - magnitude).max(0) as usize;
                    Value::str(&format!("{n:.decimals$}"))
                }
            }
        },
        "toString" => match arg(args, 0) {
            Value::Undefined => Value::str(&number_to_string(n)),
            r => {
                let radix = r.to_number() as u32;
                if !(2..=36).contains(&radix) {
                    return Err(range_error("toString() radix must be between 2 and 36"));
                }
                Value::str(&to_radix(n, radix))
            }
        },
        "toLocaleString" => Value::str(&group_thousands(n)),
        "valueOf" => Value::Num(n),
        _ => return Err(type_error(format!("number.{name} is not a function"))),
    })
}

fn to_radix(n: f64, radix: u32) -> String {
    if radix == 10 || !n.is_finite() || n.fract() != 0.0 {
        return number_to_string(n);
    }
    let neg = n < 0.0;
    let mut v = n.abs() as u64;
    if v == 0 {
        return "0".to_owned();
    }
    let mut digits = Vec::new();
    while v > 0 {
        let d = (v % u64::from(radix)) as u32;
        digits.push(char::from_digit(d, radix).unwrap_or('?'));
        v /= u64::from(radix);
    }
    if neg {
        digits.push('-');
    }
    digits.iter().rev().collect()
}

/// `en-US` style grouping with up to three fraction digits.
fn group_thousands(n: f64) -> String {
    if !n.is_finite() {
        return number_to_string(n);
    }
    let fixed = format!("{:.3}", n.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((&fixed, ""));
    let frac = frac.trim_end_matches('0');
    let mut grouped = String::new();
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if n < 0.0 && (int != "0" || !frac.is_empty()) { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_grouping() {
        assert_eq!(group_thousands(1234567.0), "1,234,567");
        assert_eq!(group_thousands(-1234.5), "-1,234.5");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(0.1234), "0.123");
    }

    #[test]
    fn radix_conversion() {
        assert_eq!(to_radix(255.0, 16), "ff");
        assert_eq!(to_radix(-5.0, 2), "-101");
        assert_eq!(to_radix(0.5, 2), "0.5");
    }

    #[test]
    fn relative_indices_clamp() {
        assert_eq!(rel_index(&Value::Num(-2.0), 5, 0), 3);
        assert_eq!(rel_index(&Value::Num(-9.0), 5, 0), 0);
        assert_eq!(rel_index(&Value::Num(9.0), 5, 0), 5);
        assert_eq!(rel_index(&Value::Undefined, 5, 5), 5);
    }
}
