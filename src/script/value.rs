use crate::animation::ease::Ease;
use crate::script::ast::FunctionDef;
use crate::script::interp::{Exception, Interp};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

const MAX_STRING_DEPTH: u32 = 64;

pub(crate) type NativeFn = fn(&mut Interp, &[Value]) -> Result<Value, Exception>;

/// Insertion-ordered property bag backing objects and element props.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct PropMap {
    entries: Vec<(Rc<str>, Value)>,
}

impl PropMap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| &**k == key)
            .map(|(_, v)| v)
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub(crate) fn set(&mut self, key: &str, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| &**k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((Rc::from(key), value)),
        }
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<Value> {
        let i = self.entries.iter().position(|(k, _)| &**k == key)?;
        Some(self.entries.remove(i).1)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Rc<str>, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub(crate) fn with(mut self, key: &str, value: Value) -> Self {
        self.set(key, value);
        self
    }

    fn take_values(&mut self) -> Vec<Value> {
        self.entries.drain(..).map(|(_, v)| v).collect()
    }
}

impl Drop for PropMap {
    fn drop(&mut self) {
        release(self.take_values(), Vec::new());
    }
}

/// Storage behind a script array.
#[derive(Clone, Debug, Default)]
pub(crate) struct ArrayItems(Vec<Value>);

impl Deref for ArrayItems {
    type Target = Vec<Value>;

    fn deref(&self) -> &Vec<Value> {
        &self.0
    }
}

impl DerefMut for ArrayItems {
    fn deref_mut(&mut self) -> &mut Vec<Value> {
        &mut self.0
    }
}

impl Drop for ArrayItems {
    fn drop(&mut self) {
        release(std::mem::take(&mut self.0), Vec::new());
    }
}

/// Dismantle values without recursing through nested containers.
///
/// Script code can build object, array and closure chains far deeper than the native stack, and
/// the derived drop glue would recurse once per link. Uniquely owned containers are opened here
/// and their contents queued; shared ones only lose a reference.
fn release(mut values: Vec<Value>, mut scopes: Vec<Env>) {
    loop {
        if let Some(env) = scopes.pop() {
            if let Ok(mut scope) = Rc::try_unwrap(env) {
                values.extend(scope.take_bindings());
                scopes.extend(scope.parent.take());
            }
            continue;
        }
        let Some(v) = values.pop() else {
            return;
        };
        match v {
            Value::Array(rc) => {
                if let Ok(cell) = Rc::try_unwrap(rc) {
                    let mut items = cell.into_inner();
                    values.append(&mut items.0);
                }
            }
            Value::Object(rc) => {
                if let Ok(cell) = Rc::try_unwrap(rc) {
                    values.extend(cell.into_inner().take_values());
                }
            }
            Value::Element(rc) => {
                if let Ok(Element { ty, props }) = Rc::try_unwrap(rc) {
                    if let ElementType::Component(f) = ty {
                        values.push(Value::Func(f));
                    }
                    values.push(Value::Object(props));
                }
            }
            Value::Func(rc) => match Rc::try_unwrap(rc) {
                Ok(Function::Closure { env, .. }) => scopes.push(env),
                Ok(Function::Method { recv, .. }) => values.push(recv),
                Ok(Function::Native(mut native)) => values.extend(native.statics.take_values()),
                Ok(Function::Builtin(_) | Function::Ease(_)) | Err(_) => {}
            },
            _ => {}
        }
    }
}

/// Host components provided by the registry; they have no script-level body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Builtin {
    AbsoluteFill,
    Sequence,
    Img,
    Video,
    OffthreadVideo,
    Audio,
    Fragment,
}

impl Builtin {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::AbsoluteFill => "AbsoluteFill",
            Self::Sequence => "Sequence",
            Self::Img => "Img",
            Self::Video => "Video",
            Self::OffthreadVideo => "OffthreadVideo",
            Self::Audio => "Audio",
            Self::Fragment => "Fragment",
        }
    }
}

pub(crate) struct Native {
    pub(crate) name: &'static str,
    pub(crate) call: NativeFn,
    /// Properties reachable through the function value, e.g. `Array.from`.
    pub(crate) statics: PropMap,
}

pub(crate) enum Function {
    Closure { def: Rc<FunctionDef>, env: Env },
    Native(Native),
    Builtin(Builtin),
    Ease(Ease),
    /// A method looked up on a primitive or array, bound to its receiver.
    Method { recv: Value, name: Rc<str> },
}

impl Function {
    pub(crate) fn native(name: &'static str, call: NativeFn) -> Value {
        Value::Func(Rc::new(Self::Native(Native {
            name,
            call,
            statics: PropMap::new(),
        })))
    }

    pub(crate) fn native_with(name: &'static str, call: NativeFn, statics: PropMap) -> Value {
        Value::Func(Rc::new(Self::Native(Native {
            name,
            call,
            statics,
        })))
    }

    pub(crate) fn name(&self) -> String {
        match self {
            Self::Closure { def, .. } => def.name.clone().unwrap_or_default(),
            Self::Native(n) => n.name.to_owned(),
            Self::Builtin(b) => b.name().to_owned(),
            Self::Ease(_) => "easing".to_owned(),
            Self::Method { name, .. } => name.to_string(),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name())
    }
}

#[derive(Clone, Debug)]
pub(crate) enum ElementType {
    Host(Rc<str>),
    Builtin(Builtin),
    Component(Rc<Function>),
}

/// Result of evaluating JSX or `React.createElement`. `props.children` follows React's shape:
/// absent, a single value, or an array.
#[derive(Debug)]
pub(crate) struct Element {
    pub(crate) ty: ElementType,
    pub(crate) props: Rc<RefCell<PropMap>>,
}

#[derive(Clone, Debug, Default)]
pub(crate) enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(Rc<str>),
    Array(Rc<RefCell<ArrayItems>>),
    Object(Rc<RefCell<PropMap>>),
    Func(Rc<Function>),
    Element(Rc<Element>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        strict_equals(self, other)
    }
}

impl Value {
    pub(crate) fn str(s: &str) -> Self {
        Self::Str(Rc::from(s))
    }

    pub(crate) fn array(items: Vec<Value>) -> Self {
        Self::Array(Rc::new(RefCell::new(ArrayItems(items))))
    }

    pub(crate) fn object(props: PropMap) -> Self {
        Self::Object(Rc::new(RefCell::new(props)))
    }

    pub(crate) fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    pub(crate) fn is_callable(&self) -> bool {
        matches!(self, Self::Func(_))
    }

    pub(crate) fn truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Num(n) => *n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub(crate) fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Bool(_) => "boolean",
            Self::Num(_) => "number",
            Self::Str(_) => "string",
            Self::Func(_) => "function",
            Self::Null | Self::Array(_) | Self::Object(_) | Self::Element(_) => "object",
        }
    }

    pub(crate) fn to_number(&self) -> f64 {
        match self {
            Self::Undefined => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Num(n) => *n,
            Self::Str(s) => string_to_number(s),
            Self::Array(items) => {
                let items = items.borrow();
                match items.as_slice() {
                    [] => 0.0,
                    [only] => only.to_number(),
                    _ => f64::NAN,
                }
            }
            _ => f64::NAN,
        }
    }

    /// `String(value)` conversion.
    pub(crate) fn to_js_string(&self) -> String {
        self.to_js_string_depth(0)
    }

    fn to_js_string_depth(&self, depth: u32) -> String {
        match self {
            Self::Undefined => "undefined".to_owned(),
            Self::Null => "null".to_owned(),
            Self::Bool(b) => b.to_string(),
            Self::Num(n) => number_to_string(*n),
            Self::Str(s) => s.to_string(),
            // Nested arrays past the limit print as empty, like a cycle does in JS.
            Self::Array(_) if depth > MAX_STRING_DEPTH => String::new(),
            Self::Array(items) => items
                .borrow()
                .iter()
                .map(|v| {
                    if v.is_nullish() {
                        String::new()
                    } else {
                        v.to_js_string_depth(depth + 1)
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            Self::Object(o) => match (o.borrow().get("name"), o.borrow().get("message")) {
                (Some(Value::Str(n)), Some(Value::Str(m))) => format!("{n}: {m}"),
                _ => "[object Object]".to_owned(),
            },
            Self::Func(f) => format!("function {}() {{ [code] }}", f.name()),
            Self::Element(_) => "[object Object]".to_owned(),
        }
    }

    /// Property key form of a value (`obj[key]`).
    pub(crate) fn to_key(&self) -> Rc<str> {
        match self {
            Self::Str(s) => s.clone(),
            other => Rc::from(other.to_js_string().as_str()),
        }
    }

    pub(crate) fn as_array_index(&self) -> Option<usize> {
        match self {
            Self::Num(n) if *n >= 0.0 && n.fract() == 0.0 && *n < 4_294_967_295.0 => {
                Some(*n as usize)
            }
            Self::Str(s) => s.parse::<usize>().ok().filter(|i| i.to_string() == **s),
            _ => None,
        }
    }

    /// Convert to JSON; functions and `undefined` are dropped like `JSON.stringify` does.
    pub(crate) fn to_json(&self) -> Option<serde_json::Value> {
        self.to_json_depth(0)
    }

    fn to_json_depth(&self, depth: u32) -> Option<serde_json::Value> {
        if depth > 64 {
            return Some(serde_json::Value::Null);
        }
        Some(match self {
            Self::Undefined | Self::Func(_) => return None,
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Num(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => serde_json::Value::from(*n as i64),
            Self::Num(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Str(s) => serde_json::Value::String(s.to_string()),
            Self::Array(items) => serde_json::Value::Array(
                items
                    .borrow()
                    .iter()
                    .map(|v| v.to_json_depth(depth + 1).unwrap_or(serde_json::Value::Null))
                    .collect(),
            ),
            Self::Object(o) => {
                let mut map = serde_json::Map::new();
                for (k, v) in o.borrow().iter() {
                    if let Some(j) = v.to_json_depth(depth + 1) {
                        map.insert(k.to_string(), j);
                    }
                }
                serde_json::Value::Object(map)
            }
            Self::Element(el) => {
                let mut map = serde_json::Map::new();
                for (k, v) in el.props.borrow().iter() {
                    if let Some(j) = v.to_json_depth(depth + 1) {
                        map.insert(k.to_string(), j);
                    }
                }
                serde_json::Value::Object(map)
            }
        })
    }

    pub(crate) fn from_json(j: &serde_json::Value) -> Self {
        match j {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => Self::Num(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::str(s),
            serde_json::Value::Array(items) => Self::array(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(map) => {
                let mut props = PropMap::new();
                for (k, v) in map {
                    props.set(k, Self::from_json(v));
                }
                Self::object(props)
            }
        }
    }
}

pub(crate) fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Num(a), Value::Num(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
        (Value::Func(a), Value::Func(b)) => Rc::ptr_eq(a, b),
        (Value::Element(a), Value::Element(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

pub(crate) fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (x, y) if x.is_nullish() && y.is_nullish() => true,
        (x, y) if x.is_nullish() || y.is_nullish() => false,
        (Value::Num(_), Value::Str(_))
        | (Value::Str(_), Value::Num(_))
        | (Value::Bool(_), _)
        | (_, Value::Bool(_)) => a.to_number() == b.to_number(),
        (Value::Array(_) | Value::Object(_), Value::Str(_) | Value::Num(_)) => {
            loose_equals(&Value::str(&a.to_js_string()), b)
        }
        (Value::Str(_) | Value::Num(_), Value::Array(_) | Value::Object(_)) => {
            loose_equals(a, &Value::str(&b.to_js_string()))
        }
        _ => strict_equals(a, b),
    }
}

fn string_to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_or(f64::NAN, |v| v as f64);
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if !t
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    t.parse().unwrap_or(f64::NAN)
}

/// Number formatting compatible with JavaScript's `Number.prototype.toString()`.
pub(crate) fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if n == 0.0 {
        return "0".to_owned();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        if n.fract() == 0.0 {
            return format!("{n:.0}");
        }
        return format!("{n}");
    }
    let s = format!("{n:e}");
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => s,
    }
}

/// A lexical scope. Bindings are looked up through the parent chain at access time.
pub(crate) struct Scope {
    vars: RefCell<HashMap<Rc<str>, Binding>>,
    parent: Option<Env>,
}

pub(crate) type Env = Rc<Scope>;

#[derive(Debug)]
struct Binding {
    value: Value,
    mutable: bool,
}

pub(crate) enum Lookup {
    Found(Value),
    Missing,
}

impl Scope {
    pub(crate) fn root() -> Env {
        Rc::new(Self {
            vars: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    pub(crate) fn child(parent: &Env) -> Env {
        Rc::new(Self {
            vars: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        })
    }

    pub(crate) fn declare(&self, name: &str, value: Value, mutable: bool) {
        self.vars
            .borrow_mut()
            .insert(Rc::from(name), Binding { value, mutable });
    }

    pub(crate) fn lookup(&self, name: &str) -> Lookup {
        if let Some(b) = self.vars.borrow().get(name) {
            return Lookup::Found(b.value.clone());
        }
        match &self.parent {
            Some(p) => p.lookup(name),
            None => Lookup::Missing,
        }
    }

    /// Assign to an existing binding. `Err(true)` means the binding is constant, `Err(false)`
    /// that it does not exist.
    pub(crate) fn assign(&self, name: &str, value: Value) -> Result<(), bool> {
        if let Some(b) = self.vars.borrow_mut().get_mut(name) {
            if !b.mutable {
                return Err(true);
            }
            b.value = value;
            return Ok(());
        }
        match &self.parent {
            Some(p) => p.assign(name, value),
            None => Err(false),
        }
    }

    /// Drop every binding; closures stored in a scope refer back to it, so module teardown
    /// breaks those cycles explicitly.
    pub(crate) fn clear(&self) {
        let values: Vec<Value> = self.vars.borrow_mut().drain().map(|(_, b)| b.value).collect();
        release(values, Vec::new());
    }

    fn take_bindings(&mut self) -> Vec<Value> {
        self.vars.get_mut().drain().map(|(_, b)| b.value).collect()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let values = self.take_bindings();
        release(values, self.parent.take().into_iter().collect());
    }
}
