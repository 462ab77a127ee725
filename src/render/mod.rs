//! Frame evaluation of a compiled component into a serialisable node tree.
//!
//! This is the host side of the animation surface: the component is called with the frame
//! context installed, its element tree is expanded depth-first (function components are called,
//! fragments flattened, `Sequence` shifts and windows time) and the result is plain data.

use crate::compiler::{Component, panic_message};
use crate::foundation::core::VideoConfig;
use crate::script::interp::{Exception, FrameContext, Interp, Limits, plain_error, range_error};
use crate::script::value::{Builtin, Element, ElementType, PropMap, Value, number_to_string};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

const MAX_TREE_DEPTH: usize = 256;
const MAX_NODES: usize = 100_000;

/// One node of a rendered frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RenderedNode {
    /// A host tag (`div`, `svg`, ...) or a runtime component (`AbsoluteFill`, `Img`, ...).
    Element {
        /// Tag or component name.
        tag: String,
        /// Serializable props; functions and `children` are omitted.
        props: serde_json::Map<String, serde_json::Value>,
        /// Expanded children.
        children: Vec<RenderedNode>,
    },
    /// A text run.
    Text {
        /// Text content.
        text: String,
    },
}

impl RenderedNode {
    /// Concatenated text of this subtree.
    pub fn text_content(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Element { children, .. } => children.iter().map(Self::text_content).collect(),
        }
    }

    /// Depth-first search for the first element with `tag`.
    pub fn find(&self, tag: &str) -> Option<&RenderedNode> {
        match self {
            Self::Element { tag: t, .. } if t == tag => Some(self),
            Self::Element { children, .. } => children.iter().find_map(|c| c.find(tag)),
            Self::Text { .. } => None,
        }
    }
}

/// Rendered output of one frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RenderedFrame {
    /// Frame index that was rendered.
    pub frame: u64,
    /// Name of the rendered component.
    pub component: String,
    /// Top-level nodes (a component may return a fragment).
    pub nodes: Vec<RenderedNode>,
}

impl RenderedFrame {
    /// Concatenated text of every node.
    pub fn text_content(&self) -> String {
        self.nodes.iter().map(RenderedNode::text_content).collect()
    }

    /// Depth-first search for the first element with `tag`.
    pub fn find(&self, tag: &str) -> Option<&RenderedNode> {
        self.nodes.iter().find_map(|n| n.find(tag))
    }
}

/// Failure while rendering a frame; always recoverable by the host.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The requested frame lies outside the surface.
    #[error("frame {frame} is out of bounds (duration is {duration} frames)")]
    FrameOutOfBounds {
        /// Requested frame.
        frame: u64,
        /// Total frames of the surface.
        duration: u64,
    },
    /// The component threw, produced an invalid child or exceeded a budget.
    #[error("{0}")]
    Script(String),
}

pub(crate) struct Renderer {
    config: VideoConfig,
    limits: Limits,
}

impl Renderer {
    pub(crate) fn new(config: &VideoConfig) -> Self {
        Self {
            config: *config,
            limits: Limits::default(),
        }
    }

    #[tracing::instrument(skip(self, component), fields(component = component.name()))]
    pub(crate) fn render(
        &self,
        component: &Component,
        frame: u64,
    ) -> Result<RenderedFrame, RenderError> {
        if frame >= self.config.duration_in_frames {
            return Err(RenderError::FrameOutOfBounds {
                frame,
                duration: self.config.duration_in_frames,
            });
        }
        let nodes = catch_unwind(AssertUnwindSafe(|| self.render_inner(component, frame)))
            .map_err(|panic| {
                RenderError::Script(format!("internal render error: {}", panic_message(&*panic)))
            })?
            .map_err(|e| RenderError::Script(e.describe()))?;
        Ok(RenderedFrame {
            frame,
            component: component.name().to_owned(),
            nodes,
        })
    }

    fn render_inner(&self, component: &Component, frame: u64) -> Result<Vec<RenderedNode>, Exception> {
        let mut interp = Interp::new(self.limits);
        interp.push_frame(FrameContext {
            frame: frame as f64,
            config: self.config,
        });
        let root = interp.call(component.value(), &[Value::object(PropMap::new())])?;
        let mut expander = Expander {
            interp: &mut interp,
            nodes: 0,
        };
        let mut out = Vec::new();
        expander.expand(&root, 0, &mut out)?;
        Ok(out)
    }
}

struct Expander<'a> {
    interp: &'a mut Interp,
    nodes: usize,
}

impl Expander<'_> {
    fn expand(&mut self, v: &Value, depth: usize, out: &mut Vec<RenderedNode>) -> Result<(), Exception> {
        if depth > MAX_TREE_DEPTH {
            return Err(Exception::Abort(format!(
                "element tree is nested deeper than {MAX_TREE_DEPTH} levels"
            )));
        }
        match v {
            Value::Undefined | Value::Null | Value::Bool(_) | Value::Func(_) => Ok(()),
            Value::Num(n) => self.push(out, RenderedNode::Text {
                text: number_to_string(*n),
            }),
            Value::Str(s) => self.push(out, RenderedNode::Text { text: s.to_string() }),
            Value::Array(items) => {
                let items = items.borrow().to_vec();
                for item in &items {
                    self.expand(item, depth + 1, out)?;
                }
                Ok(())
            }
            Value::Object(o) => {
                let keys: Vec<String> = o.borrow().iter().map(|(k, _)| k.to_string()).collect();
                Err(plain_error(format!(
                    "Objects are not valid as a React child (found: object with keys {{{}}})",
                    keys.join(", ")
                )))
            }
            Value::Element(el) => self.expand_element(el, depth, out),
        }
    }

    fn expand_element(
        &mut self,
        el: &Rc<Element>,
        depth: usize,
        out: &mut Vec<RenderedNode>,
    ) -> Result<(), Exception> {
        let children = el.props.borrow().get("children").cloned().unwrap_or_default();
        match &el.ty {
            ElementType::Component(f) => {
                let props = Value::Object(el.props.clone());
                let rendered = self.interp.call(&Value::Func(f.clone()), &[props])?;
                self.expand(&rendered, depth + 1, out)
            }
            ElementType::Builtin(Builtin::Fragment) => self.expand(&children, depth + 1, out),
            ElementType::Builtin(Builtin::Sequence) => self.expand_sequence(el, &children, depth, out),
            ElementType::Builtin(b) => self.element(b.name(), el, &children, depth, out),
            ElementType::Host(tag) => self.element(tag, el, &children, depth, out),
        }
    }

    /// `<Sequence from durationInFrames>`: children see `frame - from` and only exist inside
    /// `[from, from + durationInFrames)`.
    fn expand_sequence(
        &mut self,
        el: &Rc<Element>,
        children: &Value,
        depth: usize,
        out: &mut Vec<RenderedNode>,
    ) -> Result<(), Exception> {
        let (from, duration) = {
            let props = el.props.borrow();
            let num = |k: &str, d: f64| match props.get(k) {
                None | Some(Value::Undefined | Value::Null) => d,
                Some(v) => v.to_number(),
            };
            (num("from", 0.0), num("durationInFrames", f64::INFINITY))
        };
        if from.is_nan() || duration.is_nan() || duration <= 0.0 {
            return Err(range_error(format!(
                "Sequence: from ({}) and durationInFrames ({}) must be numbers, durationInFrames > 0",
                number_to_string(from),
                number_to_string(duration)
            )));
        }
        let Some(ctx) = self.interp.frame().copied() else {
            return Ok(());
        };
        if ctx.frame < from || ctx.frame >= from + duration {
            return Ok(());
        }
        self.interp.push_frame(FrameContext {
            frame: ctx.frame - from,
            ..ctx
        });
        let r = self.element("Sequence", el, children, depth, out);
        self.interp.pop_frame();
        r
    }

    fn element(
        &mut self,
        tag: &str,
        el: &Rc<Element>,
        children: &Value,
        depth: usize,
        out: &mut Vec<RenderedNode>,
    ) -> Result<(), Exception> {
        let mut props = serde_json::Map::new();
        for (k, v) in el.props.borrow().iter() {
            if &**k == "children" {
                continue;
            }
            if let Some(j) = v.to_json() {
                props.insert(k.to_string(), j);
            }
        }
        let mut kids = Vec::new();
        self.expand(children, depth + 1, &mut kids)?;
        self.push(out, RenderedNode::Element {
            tag: tag.to_owned(),
            props,
            children: kids,
        })
    }

    fn push(&mut self, out: &mut Vec<RenderedNode>, node: RenderedNode) -> Result<(), Exception> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(Exception::Abort(format!(
                "rendered more than {MAX_NODES} nodes in one frame"
            )));
        }
        out.push(node);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/mod.rs"]
mod tests;
