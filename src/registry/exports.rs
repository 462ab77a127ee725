use crate::animation::ease::Ease;
use crate::script::value::{Builtin, Function, NativeFn, PropMap, Value};
use std::fmt;
use std::rc::Rc;

/// One value a module exports under a bare identifier.
///
/// Exports are plain descriptions (`Send + Sync`); every compilation materializes its own script
/// values from them, so nothing a program does can leak into the registry or into another
/// compilation.
#[derive(Clone)]
pub struct Export(pub(crate) ExportKind);

#[derive(Clone)]
pub(crate) enum ExportKind {
    Native(&'static str, NativeFn),
    Component(Builtin),
    Ease(Ease),
    Namespace(Vec<(&'static str, Export)>),
    Constant(serde_json::Value),
}

impl Export {
    /// A JSON-shaped constant (numbers, strings, arrays, objects).
    pub fn constant(value: impl Into<serde_json::Value>) -> Self {
        Self(ExportKind::Constant(value.into()))
    }

    pub(crate) fn native(name: &'static str, call: NativeFn) -> Self {
        Self(ExportKind::Native(name, call))
    }

    pub(crate) fn component(b: Builtin) -> Self {
        Self(ExportKind::Component(b))
    }

    pub(crate) fn ease(e: Ease) -> Self {
        Self(ExportKind::Ease(e))
    }

    pub(crate) fn namespace(members: Vec<(&'static str, Export)>) -> Self {
        Self(ExportKind::Namespace(members))
    }

    /// Whether generated code can call this export (function or component).
    pub fn is_callable(&self) -> bool {
        matches!(
            self.0,
            ExportKind::Native(..) | ExportKind::Component(_) | ExportKind::Ease(_)
        )
    }

    /// Short category label used by listings: `component`, `function`, `namespace`, `constant`.
    pub fn kind(&self) -> &'static str {
        match self.0 {
            ExportKind::Component(_) => "component",
            ExportKind::Native(..) | ExportKind::Ease(_) => "function",
            ExportKind::Namespace(_) => "namespace",
            ExportKind::Constant(_) => "constant",
        }
    }

    /// Member names of a namespace export, in declaration order.
    pub fn members(&self) -> Vec<&'static str> {
        match &self.0 {
            ExportKind::Namespace(members) => members.iter().map(|(n, _)| *n).collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        match &self.0 {
            ExportKind::Native(name, call) => Function::native(name, *call),
            ExportKind::Component(b) => Value::Func(Rc::new(Function::Builtin(*b))),
            ExportKind::Ease(e) => Value::Func(Rc::new(Function::Ease(e.clone()))),
            ExportKind::Namespace(members) => {
                let mut props = PropMap::new();
                for (name, export) in members {
                    props.set(name, export.to_value());
                }
                Value::object(props)
            }
            ExportKind::Constant(json) => Value::from_json(json),
        }
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ExportKind::Native(name, _) => write!(f, "Export::Native({name})"),
            ExportKind::Component(b) => write!(f, "Export::Component({})", b.name()),
            ExportKind::Ease(e) => write!(f, "Export::Ease({e:?})"),
            ExportKind::Namespace(members) => f
                .debug_map()
                .entries(members.iter().map(|(k, v)| (k, v)))
                .finish(),
            ExportKind::Constant(json) => write!(f, "Export::Constant({json})"),
        }
    }
}
