use cgmath::*;

use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Free-flying Euler-angle camera.
///
/// `pitch`/`yaw` are in degrees. The facing vectors and the cached
/// view/projection matrices are only refreshed by an explicit [`update`]
/// call; mutate position or angles first, then update, then read matrices.
///
/// [`update`]: FlyCamera::update
#[derive(Debug, Clone, Copy)]
pub struct FlyCamera {
    pub position: Vector3<f32>,
    pub pitch: f32,
    pub yaw: f32,
    pub forward: Vector3<f32>,
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
}

impl Camera for FlyCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.position);
        let target = Point3::from_vec(self.position + self.forward);
        let view = Matrix4::look_at_rh(eye, target, self.up);
        let proj =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }
}

impl FlyCamera {
    pub fn new(position: Vector3<f32>, pitch: f32, yaw: f32, aspect: f32) -> Self {
        let mut camera = Self {
            position,
            pitch,
            yaw,
            forward: Vector3::unit_z() * -1.0, // recomputed in update()
            right: Vector3::unit_x(),
            up: Vector3::unit_y(),
            aspect,
            fovy: Deg(45.0).into(),
            znear: 0.1,
            zfar: 100.0,
            uniform: CameraUniform::default(),
        };
        camera.update();
        camera
    }

    /// Direction the camera faces for the given Euler angles (degrees).
    pub fn facing(pitch: f32, yaw: f32) -> Vector3<f32> {
        let (pitch, yaw) = (Deg(pitch), Deg(yaw));
        Vector3::new(
            Angle::cos(yaw) * Angle::cos(pitch),
            Angle::sin(pitch),
            Angle::sin(yaw) * Angle::cos(pitch),
        )
        .normalize()
    }

    /// Recompute the facing vectors and cached matrices from the current
    /// position and angles.
    pub fn update(&mut self) {
        self.forward = Self::facing(self.pitch, self.yaw);
        self.right = self.forward.cross(Vector3::unit_y()).normalize();
        self.up = Vector3::unit_y();

        self.uniform.view_position = self.position.extend(1.0).into();
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
            self.update();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-5
    }

    #[test]
    fn test_facing_matches_euler_formulas() {
        // yaw -90 looks down negative z, pitch 0
        assert!(close(FlyCamera::facing(0.0, -90.0), -Vector3::unit_z()));
        // straight up
        assert!(close(FlyCamera::facing(90.0, -90.0), Vector3::unit_y()));
        // yaw 0 looks down positive x
        assert!(close(FlyCamera::facing(0.0, 0.0), Vector3::unit_x()));
    }

    #[test]
    fn test_update_refreshes_cached_matrices() {
        let mut camera = FlyCamera::new(Vector3::new(0.0, 0.0, 3.0), 0.0, -90.0, 4.0 / 3.0);
        let before = camera.uniform.view_proj;

        camera.position.x += 5.0;
        // stale until update() is called
        assert_eq!(camera.uniform.view_proj, before);

        camera.update();
        assert_ne!(camera.uniform.view_proj, before);
        assert_eq!(camera.uniform.view_position, [5.0, 0.0, 3.0, 1.0]);
    }

    #[test]
    fn test_right_vector_is_perpendicular() {
        let camera = FlyCamera::new(Vector3::new(0.0, 0.0, 0.0), 20.0, 135.0, 1.0);
        assert!(camera.forward.dot(camera.right).abs() < 1e-5);
        assert!(camera.right.y.abs() < 1e-5);
    }
}
