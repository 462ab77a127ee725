use crate::foundation::core::VideoConfig;
use crate::render::{RenderError, RenderedFrame, Renderer};
use crate::script::value::{Env, Value};
use std::fmt;
use std::rc::Rc;

/// A compiled, renderable component.
///
/// Cloning is cheap and shares the evaluated module. The module's bindings are released when the
/// last clone is dropped.
#[derive(Clone)]
pub struct Component {
    inner: Rc<Inner>,
}

struct Inner {
    name: String,
    value: Value,
    module: Env,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Closures hold their defining scope, which holds them back.
        self.module.clear();
    }
}

impl Component {
    pub(crate) fn new(name: String, value: Value, module: Env) -> Self {
        Self {
            inner: Rc::new(Inner {
                name,
                value,
                module,
            }),
        }
    }

    /// Name of the top-level binding that was selected.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Render the element tree for one frame of `config`.
    pub fn render(&self, frame: u64, config: &VideoConfig) -> Result<RenderedFrame, RenderError> {
        Renderer::new(config).render(self, frame)
    }

    pub(crate) fn value(&self) -> &Value {
        &self.inner.value
    }

    /// Whether both handles refer to the same compilation.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}
