//! Rendering
//!
//! The render engine with its fixed multi-pass frame, pipeline management,
//! shadow casters and the skybox pass.

pub mod pipeline_manager;
pub mod render_engine;
pub mod shadow;
pub mod skybox;

// Re-export main types
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::RenderEngine;
pub use shadow::{ShadowCaster, ShadowKind};
pub use skybox::Skybox;
