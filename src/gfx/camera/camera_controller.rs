use winit::{
    event::ElementState,
    keyboard::KeyCode,
};

use super::fly_camera::FlyCamera;

/// WASD / space / shift fly controls plus mouse-delta look.
///
/// Key and mouse events are accumulated as they arrive; `update_camera`
/// applies them once per frame and clears the mouse deltas.
pub struct CameraController {
    pub move_speed: f32,
    pub sensitivity: f32,
    amount_forward: f32,
    amount_backward: f32,
    amount_left: f32,
    amount_right: f32,
    amount_up: f32,
    amount_down: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
}

impl CameraController {
    pub fn new(move_speed: f32, sensitivity: f32) -> Self {
        Self {
            move_speed,
            sensitivity,
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_left: 0.0,
            amount_right: 0.0,
            amount_up: 0.0,
            amount_down: 0.0,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
        }
    }

    /// Returns true when the key is one this controller consumes.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let amount = if state == ElementState::Pressed {
            1.0
        } else {
            0.0
        };
        match key {
            KeyCode::KeyW => {
                self.amount_forward = amount;
                true
            }
            KeyCode::KeyS => {
                self.amount_backward = amount;
                true
            }
            KeyCode::KeyA => {
                self.amount_left = amount;
                true
            }
            KeyCode::KeyD => {
                self.amount_right = amount;
                true
            }
            KeyCode::Space => {
                self.amount_up = amount;
                true
            }
            KeyCode::ShiftLeft => {
                self.amount_down = amount;
                true
            }
            _ => false,
        }
    }

    pub fn process_mouse(&mut self, delta_x: f64, delta_y: f64) {
        self.rotate_horizontal += delta_x as f32;
        self.rotate_vertical += delta_y as f32;
    }

    /// Apply a frame's worth of accumulated input to the camera.
    ///
    /// Only mutates position and angles; the caller updates the camera
    /// afterwards to refresh its matrices.
    pub fn update_camera(&mut self, camera: &mut FlyCamera, dt: f32) {
        let step = self.move_speed * dt;

        camera.position += camera.forward * (self.amount_forward - self.amount_backward) * step;
        camera.position += camera.right * (self.amount_right - self.amount_left) * step;
        camera.position += camera.up * (self.amount_up - self.amount_down) * step;

        camera.yaw += self.rotate_horizontal * self.sensitivity;
        // screen-space y grows downwards
        camera.pitch -= self.rotate_vertical * self.sensitivity;
        camera.pitch = camera.pitch.clamp(-89.0, 89.0);

        // deltas are per-frame, held keys persist until released
        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_pitch_clamps_at_89_degrees() {
        let mut camera = FlyCamera::new(Vector3::new(0.0, 0.0, 0.0), 0.0, -90.0, 1.0);
        let mut controller = CameraController::new(2.0, 0.1);

        controller.process_mouse(0.0, -10_000.0);
        controller.update_camera(&mut camera, 0.016);
        assert_eq!(camera.pitch, 89.0);

        controller.process_mouse(0.0, 20_000.0);
        controller.update_camera(&mut camera, 0.016);
        assert_eq!(camera.pitch, -89.0);
    }

    #[test]
    fn test_mouse_deltas_clear_after_update() {
        let mut camera = FlyCamera::new(Vector3::new(0.0, 0.0, 0.0), 0.0, -90.0, 1.0);
        let mut controller = CameraController::new(2.0, 0.1);

        controller.process_mouse(50.0, 0.0);
        controller.update_camera(&mut camera, 0.016);
        let yaw = camera.yaw;

        controller.update_camera(&mut camera, 0.016);
        assert_eq!(camera.yaw, yaw);
    }

    #[test]
    fn test_held_key_keeps_moving() {
        let mut camera = FlyCamera::new(Vector3::new(0.0, 0.0, 3.0), 0.0, -90.0, 1.0);
        camera.update();
        let mut controller = CameraController::new(2.0, 0.1);

        assert!(controller.process_keyboard(KeyCode::KeyW, ElementState::Pressed));
        controller.update_camera(&mut camera, 0.5);
        controller.update_camera(&mut camera, 0.5);

        // two frames of forward motion along -z
        assert!((camera.position.z - 1.0).abs() < 1e-4);

        controller.process_keyboard(KeyCode::KeyW, ElementState::Released);
        let z = camera.position.z;
        controller.update_camera(&mut camera, 0.5);
        assert_eq!(camera.position.z, z);
    }
}
