//! The one vertex layout every mesh in the engine uses
//!
//! Position, texture coordinates and normal, interleaved, at fixed attribute
//! locations 0/1/2. Geometry generators, the OBJ importer and the pipelines
//! all assume this exact 8-float stride.

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex3D {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x2,
        2 => Float32x3,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_stride_is_eight_floats() {
        assert_eq!(std::mem::size_of::<Vertex3D>(), 8 * std::mem::size_of::<f32>());
    }

    #[test]
    fn test_attribute_offsets() {
        let desc = Vertex3D::desc();
        assert_eq!(desc.attributes.len(), 3);
        assert_eq!(desc.attributes[0].offset, 0);
        assert_eq!(desc.attributes[1].offset, 12);
        assert_eq!(desc.attributes[2].offset, 20);
    }
}
