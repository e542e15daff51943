//! Built-in primitive shapes
//!
//! The cube is emitted as 36 unindexed vertices (six quads, two triangles
//! each) so it exercises the non-indexed draw path; the plane is indexed.

use crate::gfx::scene::vertex::Vertex3D;

/// Per-face basis: normal, then the two in-face axes (u across, v up).
const CUBE_FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
    ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]), // back
    ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),   // front
    ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),  // left
    ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),  // right
    ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),  // bottom
    ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),  // top
];

/// A unit cube centered on the origin, 36 vertices, no index buffer.
pub fn cube() -> Vec<Vertex3D> {
    let mut vertices = Vec::with_capacity(36);

    for (normal, u, v) in CUBE_FACES {
        let corner = |su: f32, sv: f32| -> Vertex3D {
            Vertex3D {
                position: [
                    0.5 * (normal[0] + su * u[0] + sv * v[0]),
                    0.5 * (normal[1] + su * u[1] + sv * v[1]),
                    0.5 * (normal[2] + su * u[2] + sv * v[2]),
                ],
                tex_coords: [0.5 * (su + 1.0), 0.5 * (sv + 1.0)],
                normal,
            }
        };

        let (bl, br, tr, tl) = (
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        );

        // two counter-clockwise triangles per face
        vertices.extend_from_slice(&[bl, br, tr, tr, tl, bl]);
    }

    vertices
}

/// A flat plane in the XZ plane centered on the origin, indexed.
pub fn plane(width: f32, depth: f32) -> (Vec<Vertex3D>, Vec<u32>) {
    let (hw, hd) = (width * 0.5, depth * 0.5);
    let normal = [0.0, 1.0, 0.0];

    let vertices = vec![
        Vertex3D {
            position: [-hw, 0.0, -hd],
            tex_coords: [0.0, 0.0],
            normal,
        },
        Vertex3D {
            position: [hw, 0.0, -hd],
            tex_coords: [1.0, 0.0],
            normal,
        },
        Vertex3D {
            position: [hw, 0.0, hd],
            tex_coords: [1.0, 1.0],
            normal,
        },
        Vertex3D {
            position: [-hw, 0.0, hd],
            tex_coords: [0.0, 1.0],
            normal,
        },
    ];

    let indices = vec![0, 2, 1, 0, 3, 2];

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_generation() {
        let cube = cube();
        assert_eq!(cube.len(), 36); // 6 faces * 2 triangles * 3 vertices

        // every position sits on the half-unit shell
        for v in &cube {
            let m = v
                .position
                .iter()
                .map(|c| c.abs())
                .fold(0.0f32, f32::max);
            assert_eq!(m, 0.5);
        }
    }

    #[test]
    fn test_cube_normals_are_axis_aligned() {
        for v in cube() {
            let sum: f32 = v.normal.iter().map(|c| c.abs()).sum();
            assert_eq!(sum, 1.0);
        }
    }

    #[test]
    fn test_plane_generation() {
        let (vertices, indices) = plane(2.0, 4.0);
        assert_eq!(vertices.len(), 4);
        assert_eq!(indices.len(), 6); // 2 triangles * 3 indices
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        assert_eq!(vertices[2].position, [1.0, 0.0, 2.0]);
    }
}
