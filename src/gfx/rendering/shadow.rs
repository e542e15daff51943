//! Shadow casters
//!
//! A caster owns its depth-only offscreen target and the light-space
//! matrices rendered into it: one for a directional or spot light, six for
//! a point light's cube faces. Matrices are pure functions of the light's
//! parameters with hardcoded frusta, precomputed at creation; each face
//! carries its own small uniform buffer so the shadow pass just binds and
//! draws.

use cgmath::{perspective, EuclideanSpace, InnerSpace, Matrix4, Point3, Rad, Vector3};

use crate::{
    gfx::camera::fly_camera::OPENGL_TO_WGPU_MATRIX,
    gfx::lighting::SpotLight,
    gfx::resources::texture_resource::TextureResource,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

pub const SHADOW_NEAR: f32 = 1.0;
pub const SHADOW_FAR: f32 = 25.0;
/// Lateral half-extent of the directional light's ortho box.
pub const DIRECTIONAL_EXTENT: f32 = 10.0;

/// Up vector that stays linearly independent from `direction`.
fn shadow_up(direction: Vector3<f32>) -> Vector3<f32> {
    if direction.x.abs() < 1e-4 && direction.z.abs() < 1e-4 {
        Vector3::unit_z()
    } else {
        Vector3::unit_y()
    }
}

/// Light-space matrix for a directional light. Pure function of the
/// direction: recomputing with the same input is bit-identical.
pub fn directional_light_space(direction: Vector3<f32>) -> Matrix4<f32> {
    let direction = direction.normalize();
    let eye = Point3::from_vec(-direction * (SHADOW_FAR * 0.5));
    let view = Matrix4::look_at_rh(eye, Point3::new(0.0, 0.0, 0.0), shadow_up(direction));
    let proj = OPENGL_TO_WGPU_MATRIX
        * cgmath::ortho(
            -DIRECTIONAL_EXTENT,
            DIRECTIONAL_EXTENT,
            -DIRECTIONAL_EXTENT,
            DIRECTIONAL_EXTENT,
            SHADOW_NEAR,
            SHADOW_FAR,
        );
    proj * view
}

/// Light-space matrix for a spot light: a perspective frustum matching the
/// outer cone.
pub fn spot_light_space(
    position: Vector3<f32>,
    direction: Vector3<f32>,
    outer_angle: f32,
) -> Matrix4<f32> {
    let direction = direction.normalize();
    let view = Matrix4::look_at_rh(
        Point3::from_vec(position),
        Point3::from_vec(position + direction),
        shadow_up(direction),
    );
    let proj =
        OPENGL_TO_WGPU_MATRIX * perspective(Rad(outer_angle * 2.0), 1.0, SHADOW_NEAR, SHADOW_FAR);
    proj * view
}

/// Six face matrices for a point light's cube shadow map, 90 degree
/// frusta in the conventional +x,-x,+y,-y,+z,-z order.
pub fn point_light_space(position: Vector3<f32>) -> [Matrix4<f32>; 6] {
    let proj = OPENGL_TO_WGPU_MATRIX
        * perspective(Rad(std::f32::consts::FRAC_PI_2), 1.0, SHADOW_NEAR, SHADOW_FAR);
    let eye = Point3::from_vec(position);

    let faces = [
        (Vector3::unit_x(), -Vector3::unit_y()),
        (-Vector3::unit_x(), -Vector3::unit_y()),
        (Vector3::unit_y(), Vector3::unit_z()),
        (-Vector3::unit_y(), -Vector3::unit_z()),
        (Vector3::unit_z(), -Vector3::unit_y()),
        (-Vector3::unit_z(), -Vector3::unit_y()),
    ];

    faces.map(|(forward, up)| proj * Matrix4::look_at_rh(eye, Point3::from_vec(position + forward), up))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowKind {
    Directional,
    Spot,
    Point,
}

/// Per-face uniform for the depth-only pass. MUST match the `ShadowPass`
/// struct in shadow_pass.wgsl.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct ShadowUniform {
    light_view_proj: [[f32; 4]; 4],
}

pub struct ShadowFace {
    pub matrix: Matrix4<f32>,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
    // written once at creation; matrices are precomputed
    _ubo: UniformBuffer<ShadowUniform>,
}

pub struct ShadowCaster {
    pub kind: ShadowKind,
    pub target: TextureResource,
    faces: Vec<ShadowFace>,
    layout: BindGroupLayoutWithDesc,
}

impl ShadowCaster {
    pub fn directional(device: &wgpu::Device, direction: Vector3<f32>, resolution: u32) -> Self {
        let target = TextureResource::create_shadow_map(device, resolution);
        let matrix = directional_light_space(direction);
        let view = target
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Self::build(device, ShadowKind::Directional, target, vec![(matrix, view)])
    }

    pub fn spot(device: &wgpu::Device, light: &SpotLight, resolution: u32) -> Self {
        let target = TextureResource::create_shadow_map(device, resolution);
        let matrix = spot_light_space(light.position, light.direction, light.outer_angle);
        let view = target
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Self::build(device, ShadowKind::Spot, target, vec![(matrix, view)])
    }

    pub fn point(device: &wgpu::Device, position: Vector3<f32>, resolution: u32) -> Self {
        let target = TextureResource::create_shadow_cubemap(device, resolution);
        let faces = point_light_space(position)
            .into_iter()
            .enumerate()
            .map(|(i, matrix)| (matrix, target.face_view(i as u32)))
            .collect();
        Self::build(device, ShadowKind::Point, target, faces)
    }

    fn build(
        device: &wgpu::Device,
        kind: ShadowKind,
        target: TextureResource,
        matrices: Vec<(Matrix4<f32>, wgpu::TextureView)>,
    ) -> Self {
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(device, "Shadow Pass Bind Group");

        let faces = matrices
            .into_iter()
            .map(|(matrix, view)| {
                let ubo = UniformBuffer::new_with_data(
                    device,
                    &ShadowUniform {
                        light_view_proj: matrix.into(),
                    },
                );
                let bind_group = BindGroupBuilder::new(&layout)
                    .resource(ubo.binding_resource())
                    .create(device, "Shadow Pass Bind Group");
                ShadowFace {
                    matrix,
                    view,
                    bind_group,
                    _ubo: ubo,
                }
            })
            .collect();

        Self {
            kind,
            target,
            faces,
            layout,
        }
    }

    pub fn faces(&self) -> &[ShadowFace] {
        &self.faces
    }

    pub fn is_cube(&self) -> bool {
        self.kind == ShadowKind::Point
    }

    /// The matrix the forward pass uses for shadow lookups. Point casters
    /// have no single plane; the first face stands in and the forward
    /// shader is fed an all-lit map instead.
    pub fn light_view_proj(&self) -> [[f32; 4]; 4] {
        self.faces
            .first()
            .map(|f| f.matrix.into())
            .unwrap_or_else(|| Matrix4::from_scale(1.0f32).into())
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directional_matrix_is_pure() {
        let direction = Vector3::new(-0.2, -1.0, -0.3);
        let a: [[f32; 4]; 4] = directional_light_space(direction).into();
        let b: [[f32; 4]; 4] = directional_light_space(direction).into();
        // bit-identical on recompute
        assert_eq!(a, b);
    }

    #[test]
    fn test_straight_down_direction_stays_finite() {
        let m = directional_light_space(Vector3::new(0.0, -1.0, 0.0));
        let m: [[f32; 4]; 4] = m.into();
        assert!(m.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_point_faces_are_distinct() {
        let faces = point_light_space(Vector3::new(1.0, 2.0, 3.0));
        for i in 0..6 {
            for j in (i + 1)..6 {
                let a: [[f32; 4]; 4] = faces[i].into();
                let b: [[f32; 4]; 4] = faces[j].into();
                assert_ne!(a, b, "faces {} and {} collapsed", i, j);
            }
        }
    }

    #[test]
    fn test_spot_matrix_depends_on_cone_angle() {
        let position = Vector3::new(0.0, 3.0, 0.0);
        let direction = Vector3::new(0.0, -1.0, 0.1);
        let narrow: [[f32; 4]; 4] = spot_light_space(position, direction, 0.2).into();
        let wide: [[f32; 4]; 4] = spot_light_space(position, direction, 0.4).into();
        assert_ne!(narrow, wide);
    }
}
