//! Material system for the forward lighting model
//!
//! Materials carry a base color, Phong shading scalars and bounded texture
//! slots (diffuse/specular/emission, eight per kind). They are stored
//! centrally in [`MaterialManager`] and referenced by objects by ID;
//! textures are referenced by handle into the scene's texture store and are
//! never owned by a material.

use std::collections::HashMap;

use wgpu::Device;

use crate::{
    error::CapacityError,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

use super::texture_resource::{TextureHandle, TextureResource, TextureStore};

/// Material ID for referencing materials
pub type MaterialId = String;

/// Texture slots per channel kind on one material.
pub const MAX_TEXTURE_SLOTS: usize = 8;

/// The three texture channel kinds a material can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Emission,
}

/// GPU uniform data for materials
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 3],
    pub shininess: f32,
    pub specular_strength: f32,
    pub diffuse_count: u32,
    pub specular_count: u32,
    pub emission_count: u32,
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Material bind group management
pub struct MaterialBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl MaterialBindings {
    pub fn new(device: &Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d()) // diffuse
            .next_binding_fragment(binding_types::texture_2d()) // specular
            .next_binding_fragment(binding_types::texture_2d()) // emission
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Material Bind Group");

        MaterialBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn create_bind_group(
        &mut self,
        device: &Device,
        ubo: &MaterialUBO,
        diffuse: &wgpu::TextureView,
        specular: &wgpu::TextureView,
        emission: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .texture(diffuse)
                .texture(specular)
                .texture(emission)
                .sampler(sampler)
                .create(device, "Material Bind Group"),
        );
    }

    pub fn bind_group_layouts(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    pub fn bind_groups(&self) -> &wgpu::BindGroup {
        self.bind_group
            .as_ref()
            .expect("Bind group has not been created yet!")
    }
}

/// Fallback textures for unbound material slots.
pub struct MaterialDefaults {
    pub white: TextureResource,
    pub black: TextureResource,
}

impl MaterialDefaults {
    pub fn new(device: &Device, queue: &wgpu::Queue) -> Self {
        Self {
            white: TextureResource::solid_color(device, queue, [255, 255, 255, 255], "default white"),
            black: TextureResource::solid_color(device, queue, [0, 0, 0, 255], "default black"),
        }
    }
}

/// Material definition with Phong shading properties and texture slots.
pub struct Material {
    pub name: String,
    pub color: [f32; 3],
    /// Exponent in the specular term.
    pub shininess: f32,
    /// Overall strength of specular highlights, 0 (none) to 1 (full).
    pub specular_strength: f32,

    diffuse_maps: Vec<TextureHandle>,
    specular_maps: Vec<TextureHandle>,
    emission_maps: Vec<TextureHandle>,

    // GPU resources - shared by all objects using this material
    material_ubo: Option<MaterialUBO>,
    material_bindings: Option<MaterialBindings>,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("Default", [0.8, 0.8, 0.8], 32.0, 0.5)
    }
}

impl Material {
    pub fn new(name: &str, color: [f32; 3], shininess: f32, specular_strength: f32) -> Self {
        Self {
            name: name.to_string(),
            color,
            shininess,
            specular_strength: specular_strength.clamp(0.0, 1.0),
            diffuse_maps: Vec::new(),
            specular_maps: Vec::new(),
            emission_maps: Vec::new(),
            material_ubo: None,
            material_bindings: None,
        }
    }

    /// Builder pattern: set the base color
    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.color = [r, g, b];
        self
    }

    /// Builder pattern: set the shininess exponent
    pub fn with_shininess(mut self, shininess: f32) -> Self {
        self.shininess = shininess;
        self
    }

    /// Builder pattern: set specular strength
    pub fn with_specular_strength(mut self, strength: f32) -> Self {
        self.specular_strength = strength.clamp(0.0, 1.0);
        self
    }

    /// Bind a texture handle into the next free slot of the given kind.
    ///
    /// A full slot array rejects the push and stays unchanged.
    pub fn push_texture(
        &mut self,
        kind: TextureKind,
        handle: TextureHandle,
    ) -> Result<(), CapacityError> {
        let (slots, label) = match kind {
            TextureKind::Diffuse => (&mut self.diffuse_maps, "diffuse maps"),
            TextureKind::Specular => (&mut self.specular_maps, "specular maps"),
            TextureKind::Emission => (&mut self.emission_maps, "emission maps"),
        };
        if slots.len() >= MAX_TEXTURE_SLOTS {
            log::warn!(
                "material '{}': attempted to bind a texture when max ({}) {} were reached",
                self.name,
                MAX_TEXTURE_SLOTS,
                label
            );
            return Err(CapacityError {
                kind: label,
                capacity: MAX_TEXTURE_SLOTS,
            });
        }
        slots.push(handle);
        Ok(())
    }

    pub fn texture_count(&self, kind: TextureKind) -> usize {
        match kind {
            TextureKind::Diffuse => self.diffuse_maps.len(),
            TextureKind::Specular => self.specular_maps.len(),
            TextureKind::Emission => self.emission_maps.len(),
        }
    }

    pub fn textures(&self, kind: TextureKind) -> &[TextureHandle] {
        match kind {
            TextureKind::Diffuse => &self.diffuse_maps,
            TextureKind::Specular => &self.specular_maps,
            TextureKind::Emission => &self.emission_maps,
        }
    }

    /// Updates GPU resources for this material
    ///
    /// Must be called after material properties or slots change. The bind
    /// group samples the first texture of each kind; unbound kinds fall
    /// back to white (diffuse/specular) or black (emission).
    pub fn update_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        store: &TextureStore,
        defaults: &MaterialDefaults,
    ) {
        if self.material_ubo.is_none() {
            self.material_ubo = Some(MaterialUBO::new(device));
        }

        let uniform_data = MaterialUniform {
            color: self.color,
            shininess: self.shininess,
            specular_strength: self.specular_strength,
            diffuse_count: self.diffuse_maps.len() as u32,
            specular_count: self.specular_maps.len() as u32,
            emission_count: self.emission_maps.len() as u32,
        };

        if let Some(ubo) = &mut self.material_ubo {
            ubo.update_content(queue, uniform_data);
        }

        let diffuse = first_slot_or(&self.diffuse_maps, store, &defaults.white);
        let specular = first_slot_or(&self.specular_maps, store, &defaults.white);
        let emission = first_slot_or(&self.emission_maps, store, &defaults.black);

        let mut bindings = MaterialBindings::new(device);
        bindings.create_bind_group(
            device,
            self.material_ubo.as_ref().expect("ubo created above"),
            &diffuse.view,
            &specular.view,
            &emission.view,
            &diffuse.sampler,
        );
        self.material_bindings = Some(bindings);
    }

    /// Gets the bind group for rendering
    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.material_bindings.as_ref().map(|b| b.bind_groups())
    }

    /// Gets the bind group layout for pipeline creation
    pub fn get_bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.material_bindings
            .as_ref()
            .map(|b| b.bind_group_layouts())
    }
}

fn first_slot_or<'a>(
    slots: &[TextureHandle],
    store: &'a TextureStore,
    fallback: &'a TextureResource,
) -> &'a TextureResource {
    slots
        .first()
        .and_then(|&handle| store.get(handle))
        .unwrap_or(fallback)
}

/// Manages all materials in the engine
///
/// Centralized storage; objects reference materials by ID rather than
/// storing material data directly, so GPU resources are shared.
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    default_material_id: MaterialId,
    defaults: Option<MaterialDefaults>,
}

impl MaterialManager {
    /// Creates a new material manager with a default material
    pub fn new() -> Self {
        let mut manager = Self {
            materials: HashMap::new(),
            default_material_id: "default".to_string(),
            defaults: None,
        };

        manager
            .materials
            .insert("default".to_string(), Material::default());

        manager
    }

    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn get_material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn get_material_mut(&mut self, id: &str) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    pub fn get_default_material(&self) -> &Material {
        self.materials
            .get(&self.default_material_id)
            .expect("default material always present")
    }

    /// Gets material for an object with fallback to default
    pub fn get_material_for_object(&self, material_id: Option<&MaterialId>) -> &Material {
        match material_id {
            Some(id) => self
                .get_material(id)
                .unwrap_or_else(|| self.get_default_material()),
            None => self.get_default_material(),
        }
    }

    /// Creates a new material and adds it to the library
    pub fn create_material(&mut self, name: &str) -> &mut Material {
        let material = Material::new(name, [0.8, 0.8, 0.8], 32.0, 0.5);
        self.materials.insert(name.to_string(), material);
        self.materials
            .get_mut(name)
            .expect("material inserted above")
    }

    pub fn list_materials(&self) -> Vec<&MaterialId> {
        self.materials.keys().collect()
    }

    /// Updates GPU resources for all materials
    ///
    /// Should be called once the GPU context is available and again after
    /// materials change.
    pub fn update_all_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        store: &TextureStore,
    ) {
        if self.defaults.is_none() {
            self.defaults = Some(MaterialDefaults::new(device, queue));
        }
        let defaults = self.defaults.as_ref().expect("defaults created above");
        for material in self.materials.values_mut() {
            material.update_gpu_resources(device, queue, store, defaults);
        }
    }

    /// Gets material bind group layout for pipeline creation
    ///
    /// Uses the default material's layout as all materials share the same layout.
    pub fn get_bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.get_default_material().get_bind_group_layout()
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_slot_capacity() {
        let mut material = Material::new("crate", [1.0, 1.0, 1.0], 64.0, 1.0);
        for handle in 0..MAX_TEXTURE_SLOTS {
            material.push_texture(TextureKind::Diffuse, handle).unwrap();
        }

        let err = material
            .push_texture(TextureKind::Diffuse, 99)
            .unwrap_err();
        assert_eq!(err.capacity, MAX_TEXTURE_SLOTS);
        // rejected push changed nothing
        assert_eq!(material.texture_count(TextureKind::Diffuse), MAX_TEXTURE_SLOTS);
        assert!(!material.textures(TextureKind::Diffuse).contains(&99));

        // other kinds are unaffected
        material.push_texture(TextureKind::Specular, 99).unwrap();
        assert_eq!(material.texture_count(TextureKind::Specular), 1);
    }

    #[test]
    fn test_specular_strength_is_clamped() {
        let material = Material::new("hot", [1.0, 0.0, 0.5], 64.0, 3.0);
        assert_eq!(material.specular_strength, 1.0);
    }

    #[test]
    fn test_manager_falls_back_to_default() {
        let manager = MaterialManager::new();
        let missing = "no-such-material".to_string();
        let material = manager.get_material_for_object(Some(&missing));
        assert_eq!(material.name, "Default");
        assert_eq!(manager.get_material_for_object(None).name, "Default");
    }
}
