//! Procedural geometry for scenes that don't load a model file

pub mod primitives;

pub use primitives::{cube, plane};
