//! Sandboxed JavaScript/JSX evaluation for generated components.
//!
//! The pipeline is `normalize` (text cleanup) -> `lexer`/`parser` (AST) -> `interp` (tree-walking
//! evaluation over `value`s). Nothing here can reach the host environment: the only free names a
//! program sees are the [`intrinsics`] and whatever the caller declares in the root scope.

pub(crate) mod ast;
pub(crate) mod error;
pub(crate) mod interp;
pub(crate) mod intrinsics;
pub(crate) mod lexer;
pub(crate) mod methods;
pub(crate) mod normalize;
pub(crate) mod parser;
pub(crate) mod value;
