use std::path::Path;

use wgpu::Device;

use crate::{
    error::AssetError,
    gfx::{
        camera::camera_utils::CameraManager,
        lighting::LightBatch,
        resources::{material::MaterialManager, texture_resource::TextureStore},
    },
};

use super::{
    model::{load_model, Model},
    object::{Mesh, MeshId, Object},
};

/// Main scene container: camera, shared mesh/texture storage, standalone
/// objects, imported models, materials and the frame's light batch.
pub struct Scene {
    pub camera_manager: CameraManager,
    pub meshes: Vec<Mesh>,
    pub objects: Vec<Object>,
    pub models: Vec<Model>,
    pub material_manager: MaterialManager,
    pub textures: TextureStore,
    pub lights: LightBatch,
}

impl Scene {
    pub fn new(camera_manager: CameraManager) -> Self {
        Self {
            camera_manager,
            meshes: Vec::new(),
            objects: Vec::new(),
            models: Vec::new(),
            material_manager: MaterialManager::new(),
            textures: TextureStore::new(),
            lights: LightBatch::new(),
        }
    }

    /// Register a mesh; the returned id can back any number of objects.
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_object(&mut self, object: Object) -> &mut Object {
        self.objects.push(object);
        self.objects
            .last_mut()
            .expect("object pushed above")
    }

    /// Import an OBJ file and append it to the scene's models.
    pub fn load_model(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        path: &Path,
    ) -> Result<&mut Model, AssetError> {
        let model = load_model(
            device,
            queue,
            &mut self.meshes,
            &mut self.textures,
            &mut self.material_manager,
            path,
        )?;
        self.models.push(model);
        Ok(self.models.last_mut().expect("model pushed above"))
    }

    /// Upload meshes, create per-object uniforms and material GPU
    /// resources. Call once the device exists and again after adding
    /// content.
    pub fn init_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        for mesh in &mut self.meshes {
            if !mesh.is_uploaded() {
                mesh.upload(device);
            }
        }
        for object in &mut self.objects {
            if object.transform_bind_group().is_none() {
                object.init_gpu_resources(device);
            }
        }
        self.material_manager
            .update_all_gpu_resources(device, queue, &self.textures);
    }

    /// Refresh the camera matrices after a frame's input.
    pub fn update(&mut self, dt: f32) {
        self.camera_manager.update(dt);
    }

    /// Recompute and upload every transform. Mutation order matters:
    /// callers mutate positions/rotations first, then this runs, then the
    /// frame is drawn.
    pub fn update_transforms(&mut self, queue: &wgpu::Queue) {
        for object in &mut self.objects {
            object.update_transform(queue);
        }
        for model in &mut self.models {
            model.update_transforms(queue);
        }
    }

    /// Every drawable in the scene: standalone objects, then each model's
    /// flattened children.
    pub fn drawables(&self) -> impl Iterator<Item = &Object> {
        self.objects
            .iter()
            .chain(self.models.iter().flat_map(|m| m.objects.iter()))
    }
}
