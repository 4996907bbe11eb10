//! Source-side keyframe curves and their evaluation.
//!
//! The importer reads samplers from the source file as [`KeyframeCurve`]s and
//! evaluates them through [`Interpolatable`] when cubic splines have to be
//! rasterized into plain keyframes.

pub mod curve;
pub mod values;

pub use curve::{CurveInterpolation, KeyframeCurve};
pub use values::Interpolatable;
