//! Meshes and drawable objects
//!
//! A [`Mesh`] owns GPU vertex/index buffers; several objects may reference
//! the same mesh through its index in the scene's mesh list. An [`Object`]
//! is the unit of one draw call: a mesh reference, a
//! position/rotation/scale triple, the model matrix derived from them, and
//! a material reference.
//!
//! The model matrix is only recomputed by an explicit
//! [`update_transform`](Object::update_transform) call; mutate the
//! transform fields first, update, then draw. Calling it every frame for
//! every moving object is the intended usage.

use cgmath::{Matrix, Matrix3, Matrix4, Rad, SquareMatrix, Vector3};
use wgpu::Device;

use crate::{
    gfx::resources::material::MaterialId,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

use super::vertex::Vertex3D;

/// Index of a mesh inside the scene's mesh list.
pub type MeshId = usize;

pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Option<Vec<u32>>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    vertex_count: u32,
    index_count: u32,
}

impl Mesh {
    /// An index list switches the mesh to the indexed draw path.
    pub fn new(vertices: Vec<Vertex3D>, indices: Option<Vec<u32>>) -> Self {
        let vertex_count = vertices.len() as u32;
        let index_count = indices.as_ref().map_or(0, |i| i.len() as u32);

        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
            vertex_count,
            index_count,
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    pub fn is_uploaded(&self) -> bool {
        self.vertex_buffer.is_some()
    }

    /// Create the GPU buffers for this mesh.
    pub fn upload(&mut self, device: &Device) {
        let vertex_buffer = wgpu::util::DeviceExt::create_buffer_init(
            device,
            &wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            },
        );
        self.vertex_buffer = Some(vertex_buffer);

        if let Some(indices) = &self.indices {
            let index_buffer = wgpu::util::DeviceExt::create_buffer_init(
                device,
                &wgpu::util::BufferInitDescriptor {
                    label: Some("Index Buffer"),
                    contents: bytemuck::cast_slice(indices),
                    usage: wgpu::BufferUsages::INDEX,
                },
            );
            self.index_buffer = Some(index_buffer);
        }
    }

    /// Compute averaged per-vertex normals from triangle faces, for meshes
    /// whose source file carries none.
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0; positions.len()];
        let mut counts = vec![0u32; vertex_count];

        for triangle in indices.chunks(3) {
            let i0 = triangle[0] as usize;
            let i1 = triangle[1] as usize;
            let i2 = triangle[2] as usize;

            let at = |i: usize| {
                Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2])
            };
            let (v0, v1, v2) = (at(i0), at(i1), at(i2));

            let face_normal = (v1 - v0).cross(v2 - v0);

            for &vertex_idx in &[i0, i1, i2] {
                normals[vertex_idx * 3] += face_normal.x;
                normals[vertex_idx * 3 + 1] += face_normal.y;
                normals[vertex_idx * 3 + 2] += face_normal.z;
                counts[vertex_idx] += 1;
            }
        }

        for i in 0..vertex_count {
            if counts[i] > 0 {
                let n = Vector3::new(normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2])
                    / counts[i] as f32;
                let length = cgmath::InnerSpace::magnitude(n);
                let n = if length > 0.0 { n / length } else { n };
                normals[i * 3] = n.x;
                normals[i * 3 + 1] = n.y;
                normals[i * 3 + 2] = n.z;
            }
        }

        normals
    }
}

/// Per-object uniform data. MUST match the `Transform` struct in the
/// shaders: a mat4 model matrix and a mat3 normal matrix whose columns are
/// padded to 16 bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
}

pub struct ObjectGpuResources {
    transform_ubo: UniformBuffer<TransformUniform>,
    transform_bind_group: wgpu::BindGroup,
}

pub struct Object {
    pub name: String,
    pub mesh: MeshId,
    pub material_id: Option<MaterialId>,
    pub position: Vector3<f32>,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
    pub model_matrix: Matrix4<f32>,
    pub visible: bool,
    gpu_resources: Option<ObjectGpuResources>,
}

impl Object {
    pub fn new(name: &str, mesh: MeshId) -> Self {
        Self {
            name: name.to_string(),
            mesh,
            material_id: None,
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            // identity until the first update_transform call
            model_matrix: Matrix4::identity(),
            visible: true,
            gpu_resources: None,
        }
    }

    pub fn with_material(mut self, material_id: &str) -> Self {
        self.material_id = Some(material_id.to_string());
        self
    }

    pub fn with_position(mut self, position: Vector3<f32>) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vector3<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vector3<f32>) -> Self {
        self.scale = scale;
        self
    }

    /// The matrix derived from this object's own transform fields.
    pub fn local_matrix(&self) -> Matrix4<f32> {
        compose_trs(self.position, self.rotation, self.scale)
    }

    /// Recompute the model matrix and sync it to the GPU.
    pub fn update_transform(&mut self, queue: &wgpu::Queue) {
        self.model_matrix = self.local_matrix();
        self.write_transform(queue);
    }

    /// Recompute the model matrix under a parent transform
    /// (`world = parent * local`) and sync it to the GPU.
    pub fn update_transform_with_parent(&mut self, queue: &wgpu::Queue, parent: &Matrix4<f32>) {
        self.model_matrix = parent * self.local_matrix();
        self.write_transform(queue);
    }

    fn write_transform(&mut self, queue: &wgpu::Queue) {
        if let Some(gpu_resources) = &mut self.gpu_resources {
            let uniform = TransformUniform {
                model: self.model_matrix.into(),
                normal: normal_matrix(&self.model_matrix),
            };
            gpu_resources.transform_ubo.update_content(queue, uniform);
        }
    }

    pub fn transform_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources
            .as_ref()
            .map(|res| &res.transform_bind_group)
    }

    pub fn init_gpu_resources(&mut self, device: &Device) {
        let uniform = TransformUniform {
            model: self.model_matrix.into(),
            normal: normal_matrix(&self.model_matrix),
        };
        let transform_ubo = UniformBuffer::new_with_data(device, &uniform);

        let layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(device, "Transform Bind Group Layout");

        let transform_bind_group = BindGroupBuilder::new(&layout)
            .resource(transform_ubo.binding_resource())
            .create(device, "Transform Bind Group");

        self.gpu_resources = Some(ObjectGpuResources {
            transform_ubo,
            transform_bind_group,
        });
    }
}

/// Build a transform from scratch: translate, rotate X, rotate Y, rotate
/// Z, scale. Rotation order is fixed; it is non-commutative.
pub fn compose_trs(
    position: Vector3<f32>,
    rotation: Vector3<f32>,
    scale: Vector3<f32>,
) -> Matrix4<f32> {
    Matrix4::from_translation(position)
        * Matrix4::from_angle_x(Rad(rotation.x))
        * Matrix4::from_angle_y(Rad(rotation.y))
        * Matrix4::from_angle_z(Rad(rotation.z))
        * Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z)
}

/// Inverse-transpose of the model matrix's upper 3x3, as the padded
/// column array the shader-side mat3 expects. Keeps normals perpendicular
/// under non-uniform scale.
pub fn normal_matrix(model: &Matrix4<f32>) -> [[f32; 4]; 3] {
    let upper = Matrix3::from_cols(
        model.x.truncate(),
        model.y.truncate(),
        model.z.truncate(),
    );
    let normal = upper
        .invert()
        .map(|inv| inv.transpose())
        .unwrap_or_else(Matrix3::identity);

    [
        [normal.x.x, normal.x.y, normal.x.z, 0.0],
        [normal.y.x, normal.y.y, normal.y.z, 0.0],
        [normal.z.x, normal.z.y, normal.z.z, 0.0],
    ]
}

pub trait DrawObject<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_object(&mut self, object: &'a Object, meshes: &'a [Mesh]);
}

impl<'a, 'b> DrawObject<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        let vertex_buffer = match &mesh.vertex_buffer {
            Some(buffer) => buffer,
            None => return, // Skip drawing if not uploaded
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));

        match &mesh.index_buffer {
            Some(index_buffer) => {
                self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                self.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
            None => self.draw(0..mesh.vertex_count, 0..1),
        }
    }

    fn draw_object(&mut self, object: &'b Object, meshes: &'b [Mesh]) {
        let bind_group = match object.transform_bind_group() {
            Some(bind_group) => bind_group,
            None => return,
        };
        let mesh = match meshes.get(object.mesh) {
            Some(mesh) => mesh,
            None => return,
        };
        self.set_bind_group(1, bind_group, &[]);
        self.draw_mesh(mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    fn matrices_close(a: &Matrix4<f32>, b: &Matrix4<f32>) -> bool {
        let a: &[f32; 16] = a.as_ref();
        let b: &[f32; 16] = b.as_ref();
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-6)
    }

    #[test]
    fn test_zero_rotation_is_translate_times_scale() {
        let object = Object::new("cube", 0)
            .with_position(Vector3::new(2.0, -3.5, 0.25))
            .with_scale(Vector3::new(1.5, 2.0, 0.5));

        let expected = Matrix4::from_translation(Vector3::new(2.0, -3.5, 0.25))
            * Matrix4::from_nonuniform_scale(1.5, 2.0, 0.5);

        // identity rotations must not perturb the product
        assert_eq!(object.local_matrix(), expected);
    }

    #[test]
    fn test_rotation_applies_x_then_y_then_z() {
        let rotation = Vector3::new(0.3, 0.7, 1.1);
        let object = Object::new("cube", 0).with_rotation(rotation);

        // independently composed through 3x3 rotations
        let expected = Matrix3::from_angle_x(Rad(rotation.x))
            * Matrix3::from_angle_y(Rad(rotation.y))
            * Matrix3::from_angle_z(Rad(rotation.z));
        let v = Vector3::new(0.2, -1.0, 0.5);
        let rotated = object.local_matrix() * v.extend(1.0);
        let expected_v = expected * v;
        assert!((rotated.truncate() - expected_v).magnitude() < 1e-6);

        // the order is non-commutative: swapping X and Z must change the result
        let swapped = Matrix4::from_angle_z(Rad(rotation.x))
            * Matrix4::from_angle_y(Rad(rotation.y))
            * Matrix4::from_angle_x(Rad(rotation.z));
        assert!(!matrices_close(&object.local_matrix(), &swapped));
    }

    #[test]
    fn test_model_matrix_updates_only_on_request() {
        let mut object = Object::new("cube", 0).with_position(Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(object.model_matrix, Matrix4::identity());

        object.model_matrix = object.local_matrix();
        object.position.x = 5.0;
        // stale until the caller recomputes
        assert_eq!(object.model_matrix.w.x, 1.0);
    }

    #[test]
    fn test_normal_matrix_handles_nonuniform_scale() {
        let model = Matrix4::from_angle_y(Rad(0.6)) * Matrix4::from_nonuniform_scale(2.0, 1.0, 4.0);
        let n = normal_matrix(&model);
        let n = Matrix3::from_cols(
            Vector3::new(n[0][0], n[0][1], n[0][2]),
            Vector3::new(n[1][0], n[1][1], n[1][2]),
            Vector3::new(n[2][0], n[2][1], n[2][2]),
        );

        // a surface normal must stay perpendicular to a transformed tangent
        let upper = Matrix3::from_cols(
            model.x.truncate(),
            model.y.truncate(),
            model.z.truncate(),
        );
        let tangent = upper * Vector3::unit_y();
        let transformed_normal = n * Vector3::unit_x();
        assert!(transformed_normal.dot(tangent).abs() < 1e-5);
    }

    #[test]
    fn test_face_normal_calculation() {
        // one triangle in the xy plane, normal along +z
        let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let indices = vec![0, 1, 2];
        let normals = Mesh::calculate_face_normals(&positions, &indices);

        for i in 0..3 {
            assert!((normals[i * 3 + 2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_mesh_index_state() {
        let (vertices, indices) = crate::gfx::geometry::plane(1.0, 1.0);
        let indexed = Mesh::new(vertices.clone(), Some(indices));
        let unindexed = Mesh::new(vertices, None);
        assert!(indexed.is_indexed());
        assert!(!unindexed.is_indexed());
        assert_eq!(indexed.index_count, 6);
        assert_eq!(unindexed.vertex_count, 4);
    }
}
