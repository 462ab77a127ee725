//! Source text -> renderable [`Component`], or a diagnostic.
//!
//! Compilation is a pure function of the source string and the registry: the normalized program
//! runs as the body of a factory whose only free names are the registry exports and the language
//! intrinsics, and the last top-level PascalCase binding holding a callable becomes the component.
//! No failure escapes [`compile`]: syntax errors, runtime exceptions, exhausted budgets and even
//! interpreter panics all come back as [`CompileResult::error`].

mod component;

pub use component::Component;

use crate::registry::ModuleRegistry;
use crate::script::ast::{Pattern, Program, Stmt};
use crate::script::interp::{Interp, Limits};
use crate::script::normalize::normalize;
use crate::script::parser::parse_program;
use crate::script::intrinsics;
use crate::script::value::{Lookup, Scope};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Classification of a compilation failure; used for logging only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// The text could not be parsed.
    Syntax,
    /// Evaluating the factory body threw or exhausted its budget.
    Runtime,
    /// The program ran but bound no callable PascalCase name.
    NoComponent,
}

impl CompileErrorKind {
    /// Stable lowercase label (`syntax`, `runtime`, `no-component`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Runtime => "runtime",
            Self::NoComponent => "no-component",
        }
    }
}

/// A classified compilation failure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CompileError {
    /// Failure class.
    pub kind: CompileErrorKind,
    /// Human-readable diagnostic.
    pub message: String,
}

impl CompileError {
    fn new(kind: CompileErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of [`compile`]. `component` and `error` are never both present; both are absent for
/// empty input.
#[derive(Clone, Debug, Default)]
pub struct CompileResult {
    /// The selected component on success.
    pub component: Option<Component>,
    /// Diagnostic on failure.
    pub error: Option<String>,
}

impl CompileResult {
    /// Whether this is the "nothing generated yet" state.
    pub fn is_empty(&self) -> bool {
        self.component.is_none() && self.error.is_none()
    }
}

/// Diagnostic used when a program binds no callable PascalCase name.
pub const NO_COMPONENT_MESSAGE: &str =
    "The code did not produce a valid component: define a PascalCase function component such as `const MyComposition = () => { ... }`";

/// Compile against the process-wide standard registry.
pub fn compile(source: &str) -> CompileResult {
    compile_with(source, ModuleRegistry::global())
}

/// Compile against an explicit registry.
#[tracing::instrument(skip_all, fields(len = source.len()))]
pub fn compile_with(source: &str, registry: &ModuleRegistry) -> CompileResult {
    match try_compile(source, registry) {
        Ok(component) => CompileResult {
            component,
            error: None,
        },
        Err(err) => {
            tracing::debug!(kind = err.kind.as_str(), message = %err.message, "compile failed");
            CompileResult {
                component: None,
                error: Some(err.message),
            }
        }
    }
}

/// Like [`compile_with`] but keeps the failure class. `Ok(None)` is the empty-input state.
pub fn try_compile(
    source: &str,
    registry: &ModuleRegistry,
) -> Result<Option<Component>, CompileError> {
    if source.trim().is_empty() {
        return Ok(None);
    }
    match catch_unwind(AssertUnwindSafe(|| compile_inner(source, registry))) {
        Ok(r) => r.map(Some),
        Err(panic) => Err(CompileError::new(
            CompileErrorKind::Runtime,
            format!("internal compiler error: {}", panic_message(&*panic)),
        )),
    }
}

fn compile_inner(source: &str, registry: &ModuleRegistry) -> Result<Component, CompileError> {
    let normalized = normalize(source);
    let program = parse_program(&normalized).map_err(|e| {
        CompileError::new(
            CompileErrorKind::Syntax,
            format!("SyntaxError: {}", e.describe(&normalized)),
        )
    })?;

    // Factory parameters: intrinsics first so registry exports take precedence on lookup.
    let globals = Scope::root();
    intrinsics::install(&globals);
    let params = Scope::child(&globals);
    registry.declare_into(&params);
    let module = Scope::child(&params);

    let mut interp = Interp::new(Limits::default());
    if let Err(e) = interp.run_program(&program.body, &module) {
        module.clear();
        return Err(CompileError::new(CompileErrorKind::Runtime, e.describe()));
    }

    let candidates = top_level_pascal_bindings(&program);
    let selected = candidates.iter().rev().find_map(|name| match module.lookup(name) {
        Lookup::Found(v) if v.is_callable() => Some((name.clone(), v)),
        _ => None,
    });
    let Some((name, value)) = selected else {
        module.clear();
        return Err(CompileError::new(
            CompileErrorKind::NoComponent,
            NO_COMPONENT_MESSAGE,
        ));
    };
    tracing::debug!(
        component = %name,
        candidates = candidates.len(),
        steps = interp.steps(),
        "compiled component"
    );
    Ok(Component::new(name, value, module))
}

/// Top-level names that look like components, in source order (duplicates keep the last
/// position).
pub(crate) fn top_level_pascal_bindings(program: &Program) -> Vec<String> {
    let mut names = Vec::new();
    for stmt in &program.body {
        match stmt {
            Stmt::Function(def) => names.extend(def.name.clone()),
            Stmt::VarDecl { decls, .. } => {
                for d in decls {
                    pattern_names(&d.pattern, &mut names);
                }
            }
            _ => {}
        }
    }
    let mut out: Vec<String> = Vec::new();
    for name in names.into_iter().filter(|n| is_pascal_case(n)) {
        out.retain(|n| n != &name);
        out.push(name);
    }
    out
}

fn pattern_names(p: &Pattern, out: &mut Vec<String>) {
    match p {
        Pattern::Ident(name) => out.push(name.clone()),
        Pattern::Default(inner, _) => pattern_names(inner, out),
        Pattern::Object { props, rest } => {
            for prop in props {
                pattern_names(&prop.value, out);
            }
            out.extend(rest.clone());
        }
        Pattern::Array { items, rest } => {
            for item in items.iter().flatten() {
                pattern_names(item, out);
            }
            if let Some(rest) = rest {
                pattern_names(rest, out);
            }
        }
    }
}

/// `Main`, `TitleCard`, `Scene2`; not `main` or `_Private`.
pub(crate) fn is_pascal_case(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_uppercase())
}

pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compiler/mod.rs"]
mod tests;
