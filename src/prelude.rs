//! Convenience imports for typical applications
//!
//! ```no_run
//! use brae::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let app = brae::default();
//!     app.run()
//! }
//! ```

// Re-export core application types
pub use crate::app::{BraeApp, InputState};
pub use crate::default;
pub use crate::error::{AssetError, CapacityError};

// Re-export graphics and scene types
pub use crate::gfx::camera::{CameraController, CameraManager, FlyCamera};
pub use crate::gfx::geometry::{cube, plane};
pub use crate::gfx::lighting::{DirectionalLight, LightBatch, PointLight, SpotLight};
pub use crate::gfx::rendering::{RenderEngine, ShadowCaster, Skybox};
pub use crate::gfx::resources::{Material, MaterialManager, TextureKind, TextureResource};
pub use crate::gfx::scene::{Mesh, Object, Scene, Vertex3D};

// Re-export common external dependencies
pub use cgmath::{InnerSpace, Vector3, Zero};
