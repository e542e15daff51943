// src/lib.rs
//! Brae
//!
//! A small 3D rendering playground built on wgpu and winit: forward
//! Blinn-Phong lighting with bounded light arrays, shadow mapping, OBJ
//! model import, a skybox and an offscreen color pass blitted to the
//! window through a fullscreen triangle.

pub mod app;
pub mod error;
pub mod gfx;
pub mod prelude;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::BraeApp;

/// Creates a default application instance
pub fn default() -> BraeApp {
    BraeApp::new()
}
