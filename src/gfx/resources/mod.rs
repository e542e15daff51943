// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Handles textures, materials, and the global uniform bindings.

pub mod global_bindings;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO};
pub use material::{Material, MaterialManager, TextureKind};
pub use texture_resource::{TextureHandle, TextureResource, TextureStore};
