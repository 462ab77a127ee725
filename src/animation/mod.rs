//! Animation primitives backing the `remotion` module exports.

pub(crate) mod color;
pub(crate) mod ease;
pub(crate) mod interpolate;
pub(crate) mod random;
pub(crate) mod spring;
