//! Scene management
//!
//! Objects, meshes, imported models and the scene container that owns them
//! together with the camera, materials, textures and lights.

pub mod model;
pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use model::{Model, TextureCache};
pub use object::{DrawObject, Mesh, MeshId, Object};
pub use scene::Scene;
pub use vertex::Vertex3D;
