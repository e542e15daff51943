//! Graphics
//!
//! Everything GPU-facing: the camera system, geometry primitives, lights,
//! scene management, GPU resources and the multi-pass render engine.

pub mod camera;
pub mod geometry;
pub mod lighting;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::fly_camera::FlyCamera;
pub use rendering::render_engine::RenderEngine;
pub use scene::Scene;
