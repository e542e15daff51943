//! Cubemap skybox
//!
//! Drawn last in the color pass as a fullscreen triangle at the far plane
//! with depth writes off; the fragment stage reconstructs the view ray
//! from the inverse view-projection matrix in the globals.

use std::path::PathBuf;

use crate::{
    error::AssetError,
    gfx::resources::texture_resource::TextureResource,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
    },
};

pub struct Skybox {
    pub texture: TextureResource,
    layout: BindGroupLayoutWithDesc,
    bind_group: wgpu::BindGroup,
}

impl Skybox {
    /// Decode six face images (+x, -x, +y, -y, +z, -z).
    pub fn from_paths(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        paths: &[PathBuf; 6],
    ) -> Result<Self, AssetError> {
        let texture = TextureResource::cubemap_from_paths(device, queue, paths)?;
        Ok(Self::new(device, texture))
    }

    pub fn new(device: &wgpu::Device, texture: TextureResource) -> Self {
        let layout = Self::bind_group_layout(device);

        let bind_group = BindGroupBuilder::new(&layout)
            .texture(&texture.view)
            .sampler(&texture.sampler)
            .create(device, "Skybox Bind Group");

        Self {
            texture,
            layout,
            bind_group,
        }
    }

    pub fn bind_group_layout(device: &wgpu::Device) -> BindGroupLayoutWithDesc {
        BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_cube())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Skybox Bind Group Layout")
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout.layout
    }
}
