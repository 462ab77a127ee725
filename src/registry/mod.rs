//! The fixed capability surface generated code may reference by bare identifier.

mod exports;
mod natives;

pub use exports::Export;

use crate::animation::ease::Ease;
use crate::foundation::error::{LiveError, LiveResult};
use crate::script::value::{Builtin, Scope};
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

/// Module identifier of the element/hook layer.
pub const REACT: &str = "react";
/// Module identifier of the animation runtime.
pub const REMOTION: &str = "remotion";

#[derive(Clone, Debug)]
struct ModuleDef {
    id: String,
    exports: Vec<(String, Export)>,
}

/// Immutable mapping `module -> export name -> value`, shared by prompt building and compilation.
///
/// Export names are unique across all modules: a name registered twice is rejected by
/// [`RegistryBuilder::build`] instead of being shadowed at lookup time.
#[derive(Clone, Debug)]
pub struct ModuleRegistry {
    modules: Vec<ModuleDef>,
    index: HashMap<String, (usize, usize)>,
}

/// Accumulates modules before validating them into a [`ModuleRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    modules: Vec<ModuleDef>,
}

impl RegistryBuilder {
    /// Append a module. Registration order is preserved in listings.
    pub fn module<N: Into<String>>(
        mut self,
        id: impl Into<String>,
        exports: impl IntoIterator<Item = (N, Export)>,
    ) -> Self {
        self.modules.push(ModuleDef {
            id: id.into(),
            exports: exports.into_iter().map(|(n, e)| (n.into(), e)).collect(),
        });
        self
    }

    /// Register the `react` and `remotion` modules.
    pub fn standard(self) -> Self {
        self.module(REACT, react_exports())
            .module(REMOTION, remotion_exports())
    }

    /// Validate identifiers and uniqueness and freeze the registry.
    pub fn build(self) -> LiveResult<ModuleRegistry> {
        let mut index = HashMap::new();
        let mut seen_modules = BTreeSet::new();
        for (mi, module) in self.modules.iter().enumerate() {
            if !seen_modules.insert(module.id.as_str()) {
                return Err(LiveError::registry(format!(
                    "module \"{}\" is registered twice",
                    module.id
                )));
            }
            for (ei, (name, _)) in module.exports.iter().enumerate() {
                if !is_identifier(name) {
                    return Err(LiveError::registry(format!(
                        "export \"{name}\" of module \"{}\" is not a valid identifier",
                        module.id
                    )));
                }
                if let Some((prev, _)) = index.insert(name.clone(), (mi, ei)) {
                    return Err(LiveError::registry(format!(
                        "export \"{name}\" of module \"{}\" collides with module \"{}\"",
                        module.id, self.modules[prev].id
                    )));
                }
            }
        }
        Ok(ModuleRegistry {
            modules: self.modules,
            index,
        })
    }
}

impl ModuleRegistry {
    /// Start an empty registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The process-wide standard registry, built on first use.
    pub fn global() -> &'static ModuleRegistry {
        static GLOBAL: OnceLock<ModuleRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| match Self::builder().standard().build() {
            Ok(registry) => registry,
            Err(err) => {
                // Only reachable if the built-in tables themselves collide.
                tracing::error!(%err, "standard module registry is inconsistent");
                Self::empty()
            }
        })
    }

    fn empty() -> Self {
        Self {
            modules: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Flat lookup of a bare identifier across every module.
    pub fn resolve(&self, name: &str) -> Option<&Export> {
        self.index
            .get(name)
            .map(|&(m, e)| &self.modules[m].exports[e].1)
    }

    /// Module that exports `name`.
    pub fn module_of(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&(m, _)| self.modules[m].id.as_str())
    }

    /// Every resolvable bare identifier.
    pub fn list_names(&self) -> BTreeSet<String> {
        self.index.keys().cloned().collect()
    }

    /// Modules in registration order with their export names in declaration order.
    pub fn modules(&self) -> impl Iterator<Item = (&str, Vec<&str>)> {
        self.modules.iter().map(|m| {
            (
                m.id.as_str(),
                m.exports.iter().map(|(n, _)| n.as_str()).collect(),
            )
        })
    }

    /// Number of exported identifiers.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Bind fresh script values for every export into `scope`.
    pub(crate) fn declare_into(&self, scope: &Scope) {
        for module in &self.modules {
            for (name, export) in &module.exports {
                scope.declare(name, export.to_value(), false);
            }
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn react_exports() -> Vec<(&'static str, Export)> {
    vec![
        (
            "React",
            Export::namespace(vec![
                ("createElement", Export::native("createElement", natives::create_element_native)),
                ("Fragment", Export::component(Builtin::Fragment)),
                ("useMemo", Export::native("useMemo", natives::use_memo)),
                ("useCallback", Export::native("useCallback", natives::use_callback)),
                ("useState", Export::native("useState", natives::use_state)),
                ("useEffect", Export::native("useEffect", natives::use_effect)),
                ("useRef", Export::native("useRef", natives::use_ref)),
            ]),
        ),
        ("Fragment", Export::component(Builtin::Fragment)),
        ("useMemo", Export::native("useMemo", natives::use_memo)),
        ("useCallback", Export::native("useCallback", natives::use_callback)),
        ("useState", Export::native("useState", natives::use_state)),
        ("useEffect", Export::native("useEffect", natives::use_effect)),
        ("useRef", Export::native("useRef", natives::use_ref)),
    ]
}

// `staticFile` is deliberately absent: it produces server file-system paths.
fn remotion_exports() -> Vec<(&'static str, Export)> {
    vec![
        ("AbsoluteFill", Export::component(Builtin::AbsoluteFill)),
        ("Sequence", Export::component(Builtin::Sequence)),
        ("Img", Export::component(Builtin::Img)),
        ("Video", Export::component(Builtin::Video)),
        ("OffthreadVideo", Export::component(Builtin::OffthreadVideo)),
        ("Audio", Export::component(Builtin::Audio)),
        ("useCurrentFrame", Export::native("useCurrentFrame", natives::use_current_frame)),
        ("useVideoConfig", Export::native("useVideoConfig", natives::use_video_config)),
        ("interpolate", Export::native("interpolate", natives::interpolate_native)),
        (
            "interpolateColors",
            Export::native("interpolateColors", natives::interpolate_colors_native),
        ),
        ("spring", Export::native("spring", natives::spring_native)),
        ("Easing", easing_namespace()),
        ("random", Export::native("random", natives::random_native)),
    ]
}

fn easing_namespace() -> Export {
    Export::namespace(vec![
        ("linear", Export::ease(Ease::Linear)),
        ("ease", Export::ease(Ease::ease())),
        ("quad", Export::ease(Ease::Quad)),
        ("cubic", Export::ease(Ease::Cubic)),
        ("sin", Export::ease(Ease::Sin)),
        ("circle", Export::ease(Ease::Circle)),
        ("exp", Export::ease(Ease::Exp)),
        ("bounce", Export::ease(Ease::Bounce)),
        ("poly", Export::native("poly", natives::easing_poly)),
        ("back", Export::native("back", natives::easing_back)),
        ("elastic", Export::native("elastic", natives::easing_elastic)),
        ("bezier", Export::native("bezier", natives::easing_bezier)),
        ("in", Export::native("in", natives::easing_in)),
        ("out", Export::native("out", natives::easing_out)),
        ("inOut", Export::native("inOut", natives::easing_in_out)),
    ])
}

#[cfg(test)]
#[path = "../../tests/unit/registry/mod.rs"]
mod tests;
