//! Light sources and the per-frame light batch
//!
//! Shaders see three fixed-capacity arrays (16 slots per kind). A
//! [`LightBatch`] is filled once per frame: `reset()` rewinds the counters,
//! then each visible light is pushed back in. Reset does NOT clear slot
//! contents; a push overwrites its slot and sets the trailing `exists`
//! flag; the shader ignores slots at or past the uploaded per-kind count,
//! which is what makes the surviving stale data harmless.

use bytemuck::Zeroable;
use cgmath::Vector3;

use crate::error::CapacityError;

/// Slot capacity per light kind.
pub const MAX_LIGHTS: usize = 16;

/// A light at a position with distance falloff
/// `1.0 / (constant + dist*linear + dist^2*quadratic)`.
#[derive(Debug, Clone, Copy)]
pub struct PointLight {
    pub position: Vector3<f32>,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub color: Vector3<f32>,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
}

/// A point light restricted to a cone; angles are in radians.
#[derive(Debug, Clone, Copy)]
pub struct SpotLight {
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
    pub angle: f32,
    pub outer_angle: f32,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
    pub color: Vector3<f32>,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
}

/// An infinitely distant light pointing in a single direction.
#[derive(Debug, Clone, Copy)]
pub struct DirectionalLight {
    pub direction: Vector3<f32>,
    pub color: Vector3<f32>,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
}

// GPU-side slot layouts. Field packing mirrors the WGSL structs: vec3 + the
// following f32 share a 16-byte row, and every struct size is a multiple of
// 16 so the uniform array stride lines up.

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightSlot {
    pub position: [f32; 3],
    pub constant: f32,
    pub color: [f32; 3],
    pub linear: f32,
    pub quadratic: f32,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub exists: u32,
    pub _pad: [u32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpotLightSlot {
    pub position: [f32; 3],
    pub constant: f32,
    pub direction: [f32; 3],
    pub linear: f32,
    pub color: [f32; 3],
    pub quadratic: f32,
    pub angle: f32,
    pub outer_angle: f32,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub exists: u32,
    pub _pad: [u32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightSlot {
    pub direction: [f32; 3],
    pub ambient: f32,
    pub color: [f32; 3],
    pub diffuse: f32,
    pub specular: f32,
    pub exists: u32,
    pub _pad: [u32; 2],
}

impl From<&PointLight> for PointLightSlot {
    fn from(light: &PointLight) -> Self {
        Self {
            position: light.position.into(),
            constant: light.constant,
            color: light.color.into(),
            linear: light.linear,
            quadratic: light.quadratic,
            ambient: light.ambient,
            diffuse: light.diffuse,
            specular: light.specular,
            // trailing write, mirrors the per-slot flag the shader checks
            exists: 1,
            _pad: [0; 3],
        }
    }
}

impl From<&SpotLight> for SpotLightSlot {
    fn from(light: &SpotLight) -> Self {
        Self {
            position: light.position.into(),
            constant: light.constant,
            direction: light.direction.into(),
            linear: light.linear,
            color: light.color.into(),
            quadratic: light.quadratic,
            angle: light.angle,
            outer_angle: light.outer_angle,
            ambient: light.ambient,
            diffuse: light.diffuse,
            specular: light.specular,
            exists: 1,
            _pad: [0; 2],
        }
    }
}

impl From<&DirectionalLight> for DirectionalLightSlot {
    fn from(light: &DirectionalLight) -> Self {
        Self {
            direction: light.direction.into(),
            ambient: light.ambient,
            color: light.color.into(),
            diffuse: light.diffuse,
            specular: light.specular,
            exists: 1,
            _pad: [0; 2],
        }
    }
}

/// The per-frame set of lights handed to the renderer.
///
/// Owned by the scene and passed explicitly into the render engine; there is
/// no global counter state anywhere.
pub struct LightBatch {
    point: [PointLightSlot; MAX_LIGHTS],
    point_count: usize,
    spot: [SpotLightSlot; MAX_LIGHTS],
    spot_count: usize,
    directional: [DirectionalLightSlot; MAX_LIGHTS],
    directional_count: usize,
}

impl LightBatch {
    pub fn new() -> Self {
        Self {
            point: [PointLightSlot::zeroed(); MAX_LIGHTS],
            point_count: 0,
            spot: [SpotLightSlot::zeroed(); MAX_LIGHTS],
            spot_count: 0,
            directional: [DirectionalLightSlot::zeroed(); MAX_LIGHTS],
            directional_count: 0,
        }
    }

    /// Rewind all counters. Slot contents are left as-is; the next pushes
    /// overwrite them in order.
    pub fn reset(&mut self) {
        self.point_count = 0;
        self.spot_count = 0;
        self.directional_count = 0;
    }

    pub fn push_point(&mut self, light: &PointLight) -> Result<(), CapacityError> {
        if self.point_count >= MAX_LIGHTS {
            log::warn!(
                "attempted to push a point light when max ({}) was reached",
                MAX_LIGHTS
            );
            return Err(CapacityError {
                kind: "point lights",
                capacity: MAX_LIGHTS,
            });
        }
        self.point[self.point_count] = light.into();
        self.point_count += 1;
        Ok(())
    }

    pub fn push_spot(&mut self, light: &SpotLight) -> Result<(), CapacityError> {
        if self.spot_count >= MAX_LIGHTS {
            log::warn!(
                "attempted to push a spot light when max ({}) was reached",
                MAX_LIGHTS
            );
            return Err(CapacityError {
                kind: "spot lights",
                capacity: MAX_LIGHTS,
            });
        }
        self.spot[self.spot_count] = light.into();
        self.spot_count += 1;
        Ok(())
    }

    pub fn push_directional(&mut self, light: &DirectionalLight) -> Result<(), CapacityError> {
        if self.directional_count >= MAX_LIGHTS {
            log::warn!(
                "attempted to push a directional light when max ({}) was reached",
                MAX_LIGHTS
            );
            return Err(CapacityError {
                kind: "directional lights",
                capacity: MAX_LIGHTS,
            });
        }
        self.directional[self.directional_count] = light.into();
        self.directional_count += 1;
        Ok(())
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn spot_count(&self) -> usize {
        self.spot_count
    }

    pub fn directional_count(&self) -> usize {
        self.directional_count
    }

    pub fn point_slots(&self) -> &[PointLightSlot; MAX_LIGHTS] {
        &self.point
    }

    pub fn spot_slots(&self) -> &[SpotLightSlot; MAX_LIGHTS] {
        &self.spot
    }

    pub fn directional_slots(&self) -> &[DirectionalLightSlot; MAX_LIGHTS] {
        &self.directional
    }
}

impl Default for LightBatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_at(x: f32) -> PointLight {
        PointLight {
            position: Vector3::new(x, 0.0, 0.0),
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
            color: Vector3::new(1.0, 1.0, 1.0),
            ambient: 0.1,
            diffuse: 1.0,
            specular: 0.5,
        }
    }

    #[test]
    fn test_slot_sizes_keep_uniform_stride() {
        assert_eq!(std::mem::size_of::<PointLightSlot>() % 16, 0);
        assert_eq!(std::mem::size_of::<SpotLightSlot>() % 16, 0);
        assert_eq!(std::mem::size_of::<DirectionalLightSlot>() % 16, 0);
    }

    #[test]
    fn test_reset_then_push_sets_exactly_n_exists_flags() {
        let mut batch = LightBatch::new();
        batch.reset();
        for i in 0..3 {
            batch.push_point(&point_at(i as f32)).unwrap();
        }

        assert_eq!(batch.point_count(), 3);
        let set = batch
            .point_slots()
            .iter()
            .filter(|slot| slot.exists == 1)
            .count();
        assert_eq!(set, 3);

        // untouched slots keep whatever was previously written (zeros here)
        for slot in &batch.point_slots()[3..] {
            assert_eq!(*slot, PointLightSlot::zeroed());
        }
    }

    #[test]
    fn test_reset_does_not_clear_slot_contents() {
        let mut batch = LightBatch::new();
        for i in 0..5 {
            batch.push_point(&point_at(10.0 + i as f32)).unwrap();
        }
        let before = *batch.point_slots();

        batch.reset();
        assert_eq!(batch.point_count(), 0);
        batch.push_point(&point_at(-1.0)).unwrap();
        batch.push_point(&point_at(-2.0)).unwrap();

        // slots past the new count are bit-identical to the previous frame
        assert_eq!(batch.point_slots()[2..5], before[2..5]);
        assert_eq!(batch.point_slots()[0].position, [-1.0, 0.0, 0.0]);
        assert_eq!(batch.point_count(), 2);
    }

    #[test]
    fn test_push_overflow_is_rejected_and_counter_unchanged() {
        let mut batch = LightBatch::new();
        for i in 0..MAX_LIGHTS {
            batch.push_point(&point_at(i as f32)).unwrap();
        }
        let snapshot = *batch.point_slots();

        let err = batch.push_point(&point_at(99.0)).unwrap_err();
        assert_eq!(err.capacity, MAX_LIGHTS);
        assert_eq!(batch.point_count(), MAX_LIGHTS);
        // nothing was written anywhere
        assert_eq!(*batch.point_slots(), snapshot);
    }

    #[test]
    fn test_kinds_count_independently() {
        let mut batch = LightBatch::new();
        batch.push_point(&point_at(0.0)).unwrap();
        batch
            .push_directional(&DirectionalLight {
                direction: Vector3::new(-0.2, -1.0, -0.3),
                color: Vector3::new(1.0, 1.0, 1.0),
                ambient: 0.1,
                diffuse: 1.0,
                specular: 0.5,
            })
            .unwrap();

        assert_eq!(batch.point_count(), 1);
        assert_eq!(batch.directional_count(), 1);
        assert_eq!(batch.spot_count(), 0);
    }
}
