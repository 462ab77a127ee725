use crate::animation::random::Rng64;
use crate::foundation::core::VideoConfig;
use crate::script::ast::{
    ArrayItem, AssignOp, BinaryOp, DeclKind, Expr, FunctionBody, FunctionDef, JsxAttr, JsxChild,
    JsxElement, JsxName, LogicalOp, MemberProp, ObjectItem, Pattern, PropKey, Stmt, TemplateChunk,
    UnaryOp,
};
use crate::script::methods;
use crate::script::value::{
    Builtin, Element, ElementType, Env, Function, Lookup, PropMap, Scope, Value, loose_equals,
    strict_equals,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Abrupt completion of script evaluation.
#[derive(Debug, Clone)]
pub(crate) enum Exception {
    /// A value thrown by script code or by a built-in; catchable with `try`.
    Throw(Value),
    /// Resource limit hit or host failure; unwinds through every `try`.
    Abort(String),
}

impl Exception {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Throw(v @ Value::Object(_)) => v.to_js_string(),
            Self::Throw(v) => format!("Uncaught {}", v.to_js_string()),
            Self::Abort(msg) => msg.clone(),
        }
    }
}

pub(crate) fn make_error(name: &str, message: &str) -> Value {
    Value::object(
        PropMap::new()
            .with("name", Value::str(name))
            .with("message", Value::str(message)),
    )
}

pub(crate) fn type_error(message: impl AsRef<str>) -> Exception {
    Exception::Throw(make_error("TypeError", message.as_ref()))
}

pub(crate) fn range_error(message: impl AsRef<str>) -> Exception {
    Exception::Throw(make_error("RangeError", message.as_ref()))
}

pub(crate) fn reference_error(message: impl AsRef<str>) -> Exception {
    Exception::Throw(make_error("ReferenceError", message.as_ref()))
}

pub(crate) fn plain_error(message: impl AsRef<str>) -> Exception {
    Exception::Throw(make_error("Error", message.as_ref()))
}

/// Execution budget of one interpreter run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Limits {
    pub(crate) max_steps: u64,
    pub(crate) max_call_depth: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: 2_000_000,
            max_call_depth: 64,
        }
    }
}

/// Frame being rendered, as seen by `useCurrentFrame` and `useVideoConfig`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FrameContext {
    pub(crate) frame: f64,
    pub(crate) config: VideoConfig,
}

enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Seed of `Math.random`; fixed so that evaluation is a pure function of the source.
const MATH_RANDOM_SEED: u64 = 0x5EED_0F_11FE;

pub(crate) struct Interp {
    limits: Limits,
    steps: u64,
    depth: u32,
    rng: Rng64,
    frames: Vec<FrameContext>,
}

impl Interp {
    pub(crate) fn new(limits: Limits) -> Self {
        Self {
            limits,
            steps: 0,
            depth: 0,
            rng: Rng64::new(MATH_RANDOM_SEED),
            frames: Vec::new(),
        }
    }

    pub(crate) fn next_random(&mut self) -> f64 {
        self.rng.next_f64_01()
    }

    pub(crate) fn frame(&self) -> Option<&FrameContext> {
        self.frames.last()
    }

    pub(crate) fn push_frame(&mut self, ctx: FrameContext) {
        self.frames.push(ctx);
    }

    pub(crate) fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub(crate) fn steps(&self) -> u64 {
        self.steps
    }

    fn tick(&mut self) -> Result<(), Exception> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(Exception::Abort(format!(
                "execution exceeded {} steps (infinite loop?)",
                self.limits.max_steps
            )));
        }
        Ok(())
    }

    // ---- programs and statements ------------------------------------------------------------

    /// Run a top-level statement list in `env` (the factory body).
    pub(crate) fn run_program(&mut self, body: &[Stmt], env: &Env) -> Result<(), Exception> {
        self.hoist(body, env);
        self.exec_stmts(body, env)?;
        Ok(())
    }

    fn hoist(&mut self, stmts: &[Stmt], env: &Env) {
        for s in stmts {
            if let Stmt::Function(def) = s {
                let name = def.name.clone().unwrap_or_default();
                env.declare(&name, closure(def, env), true);
            }
        }
    }

    fn exec_stmts(&mut self, stmts: &[Stmt], env: &Env) -> Result<Flow, Exception> {
        for s in stmts {
            match self.exec_stmt(s, env)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_block(&mut self, stmts: &[Stmt], env: &Env) -> Result<Flow, Exception> {
        let scope = Scope::child(env);
        self.hoist(stmts, &scope);
        self.exec_stmts(stmts, &scope)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Env) -> Result<Flow, Exception> {
        self.tick()?;
        match stmt {
            Stmt::VarDecl { kind, decls } => {
                for d in decls {
                    let value = match &d.init {
                        Some(e) => self.eval(e, env)?,
                        None => Value::Undefined,
                    };
                    self.bind_pattern(&d.pattern, value, env, *kind != DeclKind::Const)?;
                }
                Ok(Flow::Normal)
            }
            Stmt::Function(_) | Stmt::Empty => Ok(Flow::Normal),
            Stmt::Return(e) => Ok(Flow::Return(match e {
                Some(e) => self.eval(e, env)?,
                None => Value::Undefined,
            })),
            Stmt::If { test, cons, alt } => {
                if self.eval(test, env)?.truthy() {
                    self.exec_stmt(cons, env)
                } else if let Some(alt) = alt {
                    self.exec_stmt(alt, env)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::Block(stmts) => self.exec_block(stmts, env),
            Stmt::Expr(e) => {
                self.eval(e, env)?;
                Ok(Flow::Normal)
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => self.exec_for(init.as_deref(), test.as_ref(), update.as_ref(), body, env),
            Stmt::ForOf {
                kind,
                pattern,
                iter,
                body,
            } => {
                let iterable = self.eval(iter, env)?;
                let items = self.iterate(&iterable)?;
                self.exec_each(items, *kind, pattern, body, env)
            }
            Stmt::ForIn {
                kind,
                pattern,
                object,
                body,
            } => {
                let object = self.eval(object, env)?;
                let keys = own_keys(&object).into_iter().map(Value::Str).collect();
                self.exec_each(keys, *kind, pattern, body, env)
            }
            Stmt::While { test, body } => {
                while self.eval(test, env)?.truthy() {
                    self.tick()?;
                    match self.exec_stmt(body, env)? {
                        Flow::Break => break,
                        Flow::Return(v) => return Ok(Flow::Return(v)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Switch { disc, cases } => {
                let value = self.eval(disc, env)?;
                let mut start = None;
                for (i, case) in cases.iter().enumerate() {
                    if let Some(test) = &case.test {
                        if strict_equals(&value, &self.eval(test, env)?) {
                            start = Some(i);
                            break;
                        }
                    }
                }
                let start = start.or_else(|| cases.iter().position(|c| c.test.is_none()));
                let Some(start) = start else {
                    return Ok(Flow::Normal);
                };
                let scope = Scope::child(env);
                for case in &cases[start..] {
                    self.hoist(&case.body, &scope);
                    match self.exec_stmts(&case.body, &scope)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        other => return Ok(other),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Throw(e) => Err(Exception::Throw(self.eval(e, env)?)),
            Stmt::Try {
                block,
                param,
                handler,
                finalizer,
            } => {
                let mut result = self.exec_block(block, env);
                let caught = match &result {
                    Err(Exception::Throw(v)) => Some(v.clone()),
                    _ => None,
                };
                if let (Some(thrown), Some(handler)) = (caught, handler) {
                    let scope = Scope::child(env);
                    result = match param {
                        Some(p) => self
                            .bind_pattern(p, thrown, &scope, true)
                            .and_then(|()| self.exec_block(handler, &scope)),
                        None => self.exec_block(handler, &scope),
                    };
                }
                if let Some(finalizer) = finalizer {
                    if matches!(result, Err(Exception::Abort(_))) {
                        return result;
                    }
                    match self.exec_block(finalizer, env)? {
                        Flow::Normal => {}
                        other => return Ok(other),
                    }
                }
                result
            }
        }
    }

    fn exec_for(
        &mut self,
        init: Option<&Stmt>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
        env: &Env,
    ) -> Result<Flow, Exception> {
        let scope = Scope::child(env);
        if let Some(init) = init {
            self.exec_stmt(init, &scope)?;
        }
        loop {
            self.tick()?;
            if let Some(test) = test {
                if !self.eval(test, &scope)?.truthy() {
                    break;
                }
            }
            match self.exec_stmt(body, &scope)? {
                Flow::Break => break,
                Flow::Return(v) => return Ok(Flow::Return(v)),
                Flow::Normal | Flow::Continue => {}
            }
            if let Some(update) = update {
                self.eval(update, &scope)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_each(
        &mut self,
        items: Vec<Value>,
        kind: DeclKind,
        pattern: &Pattern,
        body: &Stmt,
        env: &Env,
    ) -> Result<Flow, Exception> {
        for item in items {
            self.tick()?;
            let scope = Scope::child(env);
            self.bind_pattern(pattern, item, &scope, kind != DeclKind::Const)?;
            match self.exec_stmt(body, &scope)? {
                Flow::Break => break,
                Flow::Return(v) => return Ok(Flow::Return(v)),
                Flow::Normal | Flow::Continue => {}
            }
        }
        Ok(Flow::Normal)
    }

    /// Snapshot the elements of an iterable value.
    pub(crate) fn iterate(&mut self, v: &Value) -> Result<Vec<Value>, Exception> {
        match v {
            Value::Array(items) => Ok(items.borrow().to_vec()),
            Value::Str(s) => Ok(s.chars().map(|c| Value::str(c.encode_utf8(&mut [0; 4]))).collect()),
            other => Err(type_error(format!("{} is not iterable", other.type_of()))),
        }
    }

    // ---- patterns ---------------------------------------------------------------------------

    fn bind_pattern(
        &mut self,
        pattern: &Pattern,
        value: Value,
        env: &Env,
        mutable: bool,
    ) -> Result<(), Exception> {
        match pattern {
            Pattern::Ident(name) => {
                env.declare(name, value, mutable);
                Ok(())
            }
            Pattern::Default(inner, default) => {
                let value = match value {
                    Value::Undefined => self.eval(default, env)?,
                    v => v,
                };
                self.bind_pattern(inner, value, env, mutable)
            }
            Pattern::Object { props, rest } => {
                if value.is_nullish() {
                    return Err(type_error(format!(
                        "Cannot destructure '{}' as it is {}.",
                        value.to_js_string(),
                        value.to_js_string()
                    )));
                }
                let mut used = Vec::with_capacity(props.len());
                for p in props {
                    let key = match &p.key {
                        PropKey::Named(n) => Rc::from(n.as_str()),
                        PropKey::Computed(e) => self.eval(e, env)?.to_key(),
                    };
                    let v = self.get_member(&value, &Value::Str(key.clone()))?;
                    used.push(key);
                    self.bind_pattern(&p.value, v, env, mutable)?;
                }
                if let Some(rest) = rest {
                    let mut remaining = PropMap::new();
                    if let Value::Object(o) = &value {
                        for (k, v) in o.borrow().iter() {
                            if !used.iter().any(|u| u == k) {
                                remaining.set(k, v.clone());
                            }
                        }
                    }
                    env.declare(rest, Value::object(remaining), mutable);
                }
                Ok(())
            }
            Pattern::Array { items, rest } => {
                let values = self.iterate(&value)?;
                for (i, item) in items.iter().enumerate() {
                    if let Some(p) = item {
                        let v = values.get(i).cloned().unwrap_or_default();
                        self.bind_pattern(p, v, env, mutable)?;
                    }
                }
                if let Some(rest) = rest {
                    let tail = values.get(items.len()..).unwrap_or_default().to_vec();
                    self.bind_pattern(rest, Value::array(tail), env, mutable)?;
                }
                Ok(())
            }
        }
    }

    // ---- calls ------------------------------------------------------------------------------

    /// Call any callable value with positional arguments.
    pub(crate) fn call(&mut self, f: &Value, args: &[Value]) -> Result<Value, Exception> {
        let Value::Func(func) = f else {
            return Err(type_error(format!("{} is not a function", f.to_js_string())));
        };
        self.tick()?;
        self.depth += 1;
        if self.depth > self.limits.max_call_depth {
            self.depth -= 1;
            return Err(Exception::Abort(format!(
                "maximum call depth of {} exceeded",
                self.limits.max_call_depth
            )));
        }
        let r = self.call_inner(func, args);
        self.depth -= 1;
        r
    }

    fn call_inner(&mut self, func: &Rc<Function>, args: &[Value]) -> Result<Value, Exception> {
        match &**func {
            Function::Closure { def, env } => self.call_closure(def, env, args),
            Function::Native(n) => (n.call)(self, args),
            Function::Builtin(b) => {
                let props = match args.first() {
                    Some(Value::Object(o)) => o.borrow().clone(),
                    _ => PropMap::new(),
                };
                Ok(Value::Element(Rc::new(Element {
                    ty: ElementType::Builtin(*b),
                    props: Rc::new(RefCell::new(props)),
                })))
            }
            Function::Ease(e) => {
                let t = args.first().map_or(f64::NAN, Value::to_number);
                Ok(Value::Num(e.apply(t)))
            }
            Function::Method { recv, name } => methods::call_method(self, recv, name, args),
        }
    }

    fn call_closure(
        &mut self,
        def: &Rc<FunctionDef>,
        env: &Env,
        args: &[Value],
    ) -> Result<Value, Exception> {
        let scope = Scope::child(env);
        for (i, p) in def.params.iter().enumerate() {
            let arg = args.get(i).cloned().unwrap_or_default();
            self.bind_pattern(p, arg, &scope, true)?;
        }
        if let Some(rest) = &def.rest {
            let tail = args.get(def.params.len()..).unwrap_or_default().to_vec();
            self.bind_pattern(rest, Value::array(tail), &scope, true)?;
        }
        match &def.body {
            FunctionBody::Expr(e) => self.eval(e, &scope),
            FunctionBody::Block(stmts) => {
                self.hoist(stmts, &scope);
                match self.exec_stmts(stmts, &scope)? {
                    Flow::Return(v) => Ok(v),
                    _ => Ok(Value::Undefined),
                }
            }
        }
    }

    fn eval_args(&mut self, args: &[ArrayItem], env: &Env) -> Result<Vec<Value>, Exception> {
        let mut out = Vec::with_capacity(args.len());
        for a in args {
            match a {
                ArrayItem::Item(e) => out.push(self.eval(e, env)?),
                ArrayItem::Spread(e) => {
                    let v = self.eval(e, env)?;
                    out.extend(self.iterate(&v)?);
                }
                ArrayItem::Hole => out.push(Value::Undefined),
            }
        }
        Ok(out)
    }

    // ---- property access --------------------------------------------------------------------

    pub(crate) fn get_member(&mut self, obj: &Value, key: &Value) -> Result<Value, Exception> {
        Ok(match obj {
            Value::Undefined | Value::Null => {
                return Err(type_error(format!(
                    "Cannot read properties of {} (reading '{}')",
                    obj.to_js_string(),
                    key.to_key()
                )));
            }
            Value::Array(items) => {
                if let Some(i) = key.as_array_index() {
                    return Ok(items.borrow().get(i).cloned().unwrap_or_default());
                }
                let k = key.to_key();
                if &*k == "length" {
                    Value::Num(items.borrow().len() as f64)
                } else {
                    methods::bind(obj, k)
                }
            }
            Value::Str(s) => {
                if let Some(i) = key.as_array_index() {
                    return Ok(s
                        .chars()
                        .nth(i)
                        .map_or(Value::Undefined, |c| Value::str(c.encode_utf8(&mut [0; 4]))));
                }
                let k = key.to_key();
                if &*k == "length" {
                    Value::Num(s.chars().count() as f64)
                } else {
                    methods::bind(obj, k)
                }
            }
            Value::Num(_) | Value::Bool(_) => methods::bind(obj, key.to_key()),
            Value::Object(o) => {
                let k = key.to_key();
                let found = o.borrow().get(&k).cloned();
                match found {
                    Some(v) => v,
                    None => methods::bind(obj, k),
                }
            }
            Value::Func(f) => {
                let k = key.to_key();
                match (&**f, &*k) {
                    (Function::Native(n), _) if n.statics.contains(&k) => {
                        n.statics.get(&k).cloned().unwrap_or_default()
                    }
                    (_, "name") => Value::str(&f.name()),
                    _ => Value::Undefined,
                }
            }
            Value::Element(el) => match &*key.to_key() {
                "props" => Value::Object(el.props.clone()),
                "type" => match &el.ty {
                    ElementType::Host(tag) => Value::Str(tag.clone()),
                    ElementType::Builtin(b) => Value::Func(Rc::new(Function::Builtin(*b))),
                    ElementType::Component(f) => Value::Func(f.clone()),
                },
                _ => Value::Undefined,
            },
        })
    }

    fn set_member(&mut self, obj: &Value, key: &Value, value: Value) -> Result<(), Exception> {
        match obj {
            Value::Undefined | Value::Null => Err(type_error(format!(
                "Cannot set properties of {} (setting '{}')",
                obj.to_js_string(),
                key.to_key()
            ))),
            Value::Array(items) => {
                if let Some(i) = key.as_array_index() {
                    methods::check_len(i + 1)?;
                    let mut items = items.borrow_mut();
                    if i >= items.len() {
                        items.resize(i + 1, Value::Undefined);
                    }
                    items[i] = value;
                } else if &*key.to_key() == "length" {
                    let n = value.to_number();
                    if n < 0.0 || n.fract() != 0.0 || !n.is_finite() {
                        return Err(range_error("Invalid array length"));
                    }
                    methods::check_len(n as usize)?;
                    items.borrow_mut().resize(n as usize, Value::Undefined);
                }
                Ok(())
            }
            Value::Object(o) => {
                o.borrow_mut().set(&key.to_key(), value);
                Ok(())
            }
            // Writes to primitives and functions are silently dropped, as in sloppy mode.
            _ => Ok(()),
        }
    }

    // ---- expressions ------------------------------------------------------------------------

    pub(crate) fn eval(&mut self, expr: &Expr, env: &Env) -> Result<Value, Exception> {
        match expr {
            Expr::Num(n) => Ok(Value::Num(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Undefined => Ok(Value::Undefined),
            Expr::Template(chunks) => self.eval_template(chunks, env),
            Expr::Ident(name) => lookup(env, name),
            Expr::Array(items) => Ok(Value::array(self.eval_args(items, env)?)),
            Expr::Object(items) => self.eval_object(items, env),
            Expr::Function(def) => Ok(closure(def, env)),
            Expr::Unary { op, expr } => self.eval_unary(*op, expr, env),
            Expr::Update {
                increment,
                prefix,
                target,
            } => self.eval_update(*increment, *prefix, target, env),
            Expr::Binary { op, left, right } => {
                let l = self.eval(left, env)?;
                let r = self.eval(right, env)?;
                binary_op(*op, &l, &r)
            }
            Expr::Logical { op, left, right } => {
                let l = self.eval(left, env)?;
                let short = match op {
                    LogicalOp::And => !l.truthy(),
                    LogicalOp::Or => l.truthy(),
                    LogicalOp::Nullish => !l.is_nullish(),
                };
                if short { Ok(l) } else { self.eval(right, env) }
            }
            Expr::Cond { test, cons, alt } => {
                if self.eval(test, env)?.truthy() {
                    self.eval(cons, env)
                } else {
                    self.eval(alt, env)
                }
            }
            Expr::Assign { op, target, value } => self.eval_assign(*op, target, value, env),
            Expr::Member { .. } | Expr::Call { .. } => {
                Ok(self.eval_chain(expr, env)?.unwrap_or_default())
            }
            Expr::New { callee, args } => {
                let f = self.eval(callee, env)?;
                if !f.is_callable() {
                    return Err(type_error(format!("{} is not a constructor", f.to_js_string())));
                }
                let args = self.eval_args(args, env)?;
                self.call(&f, &args)
            }
            Expr::Sequence(items) => {
                let mut last = Value::Undefined;
                for e in items {
                    last = self.eval(e, env)?;
                }
                Ok(last)
            }
            Expr::Jsx(el) => self.eval_jsx(el, env),
        }
    }

    /// Evaluate a member/call chain; `None` means an optional link short-circuited.
    fn eval_chain(&mut self, expr: &Expr, env: &Env) -> Result<Option<Value>, Exception> {
        match expr {
            Expr::Member {
                object,
                prop,
                optional,
            } => {
                let Some(obj) = self.eval_chain(object, env)? else {
                    return Ok(None);
                };
                if *optional && obj.is_nullish() {
                    return Ok(None);
                }
                let key = self.member_key(prop, env)?;
                self.get_member(&obj, &key).map(Some)
            }
            Expr::Call {
                callee,
                args,
                optional,
            } => {
                let Some(f) = self.eval_chain(callee, env)? else {
                    return Ok(None);
                };
                if *optional && f.is_nullish() {
                    return Ok(None);
                }
                if !f.is_callable() {
                    return Err(type_error(format!(
                        "{} is not a function",
                        callee_name(callee)
                    )));
                }
                let args = self.eval_args(args, env)?;
                self.call(&f, &args).map(Some)
            }
            other => self.eval(other, env).map(Some),
        }
    }

    fn member_key(&mut self, prop: &MemberProp, env: &Env) -> Result<Value, Exception> {
        match prop {
            MemberProp::Name(n) => Ok(Value::str(n)),
            MemberProp::Computed(e) => self.eval(e, env),
        }
    }

    fn eval_template(&mut self, chunks: &[TemplateChunk], env: &Env) -> Result<Value, Exception> {
        let mut out = String::new();
        for c in chunks {
            match c {
                TemplateChunk::Text(t) => out.push_str(t),
                TemplateChunk::Expr(e) => out.push_str(&self.eval(e, env)?.to_js_string()),
            }
        }
        Ok(Value::str(&out))
    }

    fn eval_object(&mut self, items: &[ObjectItem], env: &Env) -> Result<Value, Exception> {
        let mut props = PropMap::new();
        for item in items {
            match item {
                ObjectItem::Prop(key, value) => {
                    let key = match key {
                        PropKey::Named(n) => Rc::from(n.as_str()),
                        PropKey::Computed(e) => self.eval(e, env)?.to_key(),
                    };
                    let value = self.eval(value, env)?;
                    props.set(&key, value);
                }
                ObjectItem::Spread(e) => match self.eval(e, env)? {
                    Value::Object(o) => {
                        for (k, v) in o.borrow().iter() {
                            props.set(k, v.clone());
                        }
                    }
                    v @ (Value::Array(_) | Value::Str(_)) => {
                        for (i, item) in self.iterate(&v)?.into_iter().enumerate() {
                            props.set(&i.to_string(), item);
                        }
                    }
                    _ => {}
                },
            }
        }
        Ok(Value::object(props))
    }

    fn eval_unary(&mut self, op: UnaryOp, expr: &Expr, env: &Env) -> Result<Value, Exception> {
        if op == UnaryOp::TypeOf {
            // `typeof undeclared` is not a ReferenceError.
            if let Expr::Ident(name) = expr {
                if let Lookup::Missing = env.lookup(name) {
                    return Ok(Value::str("undefined"));
                }
            }
        }
        let v = self.eval(expr, env)?;
        Ok(match op {
            UnaryOp::Neg => Value::Num(-v.to_number()),
            UnaryOp::Plus => Value::Num(v.to_number()),
            UnaryOp::Not => Value::Bool(!v.truthy()),
            UnaryOp::TypeOf => Value::str(v.type_of()),
            UnaryOp::Void => Value::Undefined,
        })
    }

    fn eval_update(
        &mut self,
        increment: bool,
        prefix: bool,
        target: &Expr,
        env: &Env,
    ) -> Result<Value, Exception> {
        let old = self.eval(target, env)?.to_number();
        let new = if increment { old + 1.0 } else { old - 1.0 };
        self.store(target, Value::Num(new), env)?;
        Ok(Value::Num(if prefix { new } else { old }))
    }

    fn eval_assign(
        &mut self,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
        env: &Env,
    ) -> Result<Value, Exception> {
        let value = if op == AssignOp::Assign {
            self.eval(value, env)?
        } else {
            let current = self.eval(target, env)?;
            let rhs = self.eval(value, env)?;
            let bin = match op {
                AssignOp::Add => BinaryOp::Add,
                AssignOp::Sub => BinaryOp::Sub,
                AssignOp::Mul => BinaryOp::Mul,
                AssignOp::Div => BinaryOp::Div,
                AssignOp::Mod | AssignOp::Assign => BinaryOp::Mod,
            };
            binary_op(bin, &current, &rhs)?
        };
        self.store(target, value.clone(), env)?;
        Ok(value)
    }

    fn store(&mut self, target: &Expr, value: Value, env: &Env) -> Result<(), Exception> {
        match target {
            Expr::Ident(name) => match env.assign(name, value) {
                Ok(()) => Ok(()),
                Err(true) => Err(type_error("Assignment to constant variable.")),
                Err(false) => Err(reference_error(format!("{name} is not defined"))),
            },
            Expr::Member { object, prop, .. } => {
                let obj = self.eval(object, env)?;
                let key = self.member_key(prop, env)?;
                self.set_member(&obj, &key, value)
            }
            _ => Err(Exception::Abort("invalid assignment target".to_owned())),
        }
    }

    // ---- JSX --------------------------------------------------------------------------------

    fn eval_jsx(&mut self, el: &JsxElement, env: &Env) -> Result<Value, Exception> {
        let ty = match &el.name {
            JsxName::Intrinsic(tag) => Value::str(tag),
            JsxName::Component(e) => self.eval(e, env)?,
            JsxName::Fragment => Value::Func(Rc::new(Function::Builtin(Builtin::Fragment))),
        };
        let mut props = PropMap::new();
        for attr in &el.attrs {
            match attr {
                JsxAttr::Named(name, value) => {
                    let v = match value {
                        Some(e) => self.eval(e, env)?,
                        None => Value::Bool(true),
                    };
                    props.set(name, v);
                }
                JsxAttr::Spread(e) => {
                    if let Value::Object(o) = self.eval(e, env)? {
                        for (k, v) in o.borrow().iter() {
                            props.set(k, v.clone());
                        }
                    }
                }
            }
        }
        let mut children = Vec::with_capacity(el.children.len());
        for c in &el.children {
            children.push(match c {
                JsxChild::Text(t) => Value::str(t),
                JsxChild::Expr(e) => self.eval(e, env)?,
            });
        }
        create_element(&ty, props, children)
    }
}

/// Shared by JSX and `React.createElement`.
pub(crate) fn create_element(
    ty: &Value,
    mut props: PropMap,
    children: Vec<Value>,
) -> Result<Value, Exception> {
    let ty = match ty {
        Value::Str(tag) => ElementType::Host(tag.clone()),
        Value::Func(f) => match &**f {
            Function::Builtin(b) => ElementType::Builtin(*b),
            _ => ElementType::Component(f.clone()),
        },
        other => {
            return Err(type_error(format!(
                "Element type is invalid: expected a string or a component but got: {}",
                other.to_js_string()
            )));
        }
    };
    props.remove("key");
    props.remove("ref");
    match children.len() {
        0 => {}
        1 => props.set("children", children.into_iter().next().unwrap_or_default()),
        _ => props.set("children", Value::array(children)),
    }
    Ok(Value::Element(Rc::new(Element {
        ty,
        props: Rc::new(RefCell::new(props)),
    })))
}

fn closure(def: &Rc<FunctionDef>, env: &Env) -> Value {
    Value::Func(Rc::new(Function::Closure {
        def: def.clone(),
        env: env.clone(),
    }))
}

fn lookup(env: &Env, name: &str) -> Result<Value, Exception> {
    match env.lookup(name) {
        Lookup::Found(v) => Ok(v),
        Lookup::Missing => Err(reference_error(format!("{name} is not defined"))),
    }
}

fn callee_name(e: &Expr) -> String {
    match e {
        Expr::Ident(n) => n.clone(),
        Expr::Member {
            object,
            prop: MemberProp::Name(n),
            ..
        } => format!("{}.{n}", callee_name(object)),
        Expr::Member { object, .. } => format!("{}[...]", callee_name(object)),
        Expr::Call { callee, .. } => format!("{}(...)", callee_name(callee)),
        _ => "expression".to_owned(),
    }
}

pub(crate) fn own_keys(v: &Value) -> Vec<Rc<str>> {
    match v {
        Value::Object(o) => o.borrow().iter().map(|(k, _)| k.clone()).collect(),
        Value::Array(items) => (0..items.borrow().len())
            .map(|i| Rc::from(i.to_string().as_str()))
            .collect(),
        Value::Str(s) => (0..s.chars().count())
            .map(|i| Rc::from(i.to_string().as_str()))
            .collect(),
        _ => Vec::new(),
    }
}

fn concatenates_as_string(v: &Value) -> bool {
    matches!(
        v,
        Value::Str(_) | Value::Array(_) | Value::Object(_) | Value::Func(_) | Value::Element(_)
    )
}

pub(crate) fn binary_op(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, Exception> {
    Ok(match op {
        BinaryOp::Add => {
            if concatenates_as_string(l) || concatenates_as_string(r) {
                let mut s = l.to_js_string();
                s.push_str(&r.to_js_string());
                Value::str(&s)
            } else {
                Value::Num(l.to_number() + r.to_number())
            }
        }
        BinaryOp::Sub => Value::Num(l.to_number() - r.to_number()),
        BinaryOp::Mul => Value::Num(l.to_number() * r.to_number()),
        BinaryOp::Div => Value::Num(l.to_number() / r.to_number()),
        BinaryOp::Mod => Value::Num(l.to_number() % r.to_number()),
        BinaryOp::Pow => Value::Num(l.to_number().powf(r.to_number())),
        BinaryOp::EqStrict => Value::Bool(strict_equals(l, r)),
        BinaryOp::NeStrict => Value::Bool(!strict_equals(l, r)),
        BinaryOp::EqLoose => Value::Bool(loose_equals(l, r)),
        BinaryOp::NeLoose => Value::Bool(!loose_equals(l, r)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ord = match (l, r) {
                (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                _ => l.to_number().partial_cmp(&r.to_number()),
            };
            Value::Bool(match (op, ord) {
                (_, None) => false,
                (BinaryOp::Lt, Some(o)) => o.is_lt(),
                (BinaryOp::Le, Some(o)) => o.is_le(),
                (BinaryOp::Gt, Some(o)) => o.is_gt(),
                (_, Some(o)) => o.is_ge(),
            })
        }
        BinaryOp::In => {
            let key = l.to_key();
            match r {
                Value::Object(o) => Value::Bool(o.borrow().contains(&key)),
                Value::Array(items) => Value::Bool(
                    &*key == "length" || l.as_array_index().is_some_and(|i| i < items.borrow().len()),
                ),
                other => {
                    return Err(type_error(format!(
                        "Cannot use 'in' operator to search for '{key}' in {}",
                        other.to_js_string()
                    )));
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "../../tests/unit/script/interp.rs"]
mod tests;
