//! Global uniform bindings shared by every draw
//!
//! One uniform buffer carries the per-frame camera matrices, the light
//! arrays written from the frame's [`LightBatch`] and the active light
//! counts, plus the light-space matrix used by the shadow sampling path.
//! Bound at slot 0 in the forward pipeline.

use cgmath::SquareMatrix;

use crate::{
    gfx::camera::camera_utils::CameraUniform,
    gfx::lighting::{
        DirectionalLightSlot, LightBatch, PointLightSlot, SpotLightSlot, MAX_LIGHTS,
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content. MUST match the `Globals` struct in the
/// shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUBOContent {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    /// Inverse of `view_proj`; the skybox pass reconstructs view rays
    /// from it.
    inverse_view_proj: [[f32; 4]; 4],
    /// Light-space matrix of the active shadow caster.
    light_view_proj: [[f32; 4]; 4],
    point_lights: [PointLightSlot; MAX_LIGHTS],
    spot_lights: [SpotLightSlot; MAX_LIGHTS],
    directional_lights: [DirectionalLightSlot; MAX_LIGHTS],
    /// Active counts: point, spot, directional; slots past a count hold
    /// stale data the shader must skip.
    light_counts: [u32; 3],
    _pad: u32,
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUBOContent>;

/// Write a frame's camera, light batch and shadow matrix into the global
/// uniform buffer.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: CameraUniform,
    lights: &LightBatch,
    light_view_proj: [[f32; 4]; 4],
) {
    let view_proj: cgmath::Matrix4<f32> = camera.view_proj.into();
    let inverse_view_proj = view_proj
        .invert()
        .unwrap_or_else(cgmath::Matrix4::identity);

    let content = GlobalUBOContent {
        view_position: camera.view_position,
        view_proj: camera.view_proj,
        inverse_view_proj: inverse_view_proj.into(),
        light_view_proj,
        point_lights: *lights.point_slots(),
        spot_lights: *lights.spot_slots(),
        directional_lights: *lights.directional_slots(),
        light_counts: [
            lights.point_count() as u32,
            lights.spot_count() as u32,
            lights.directional_count() as u32,
        ],
        _pad: 0,
    };

    ubo.update_content(queue, content);
}

/// Manages the bind group layout and bind group for global uniforms
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    /// Must be called after the uniform buffer is created and before any
    /// rendering that reads the globals.
    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Global Bind Group"),
        );
    }

    pub fn bind_group_layouts(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// # Panics
    /// Panics if `create_bind_group()` hasn't been called yet
    pub fn bind_groups(&self) -> &wgpu::BindGroup {
        self.bind_group
            .as_ref()
            .expect("Bind group has not been created yet!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_ubo_content_is_uniform_aligned() {
        // uniform buffers need 16-byte struct alignment throughout
        assert_eq!(std::mem::size_of::<GlobalUBOContent>() % 16, 0);
    }
}
