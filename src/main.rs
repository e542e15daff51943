//! Sandbox scene: a field of textured cubes, an optional OBJ model and a
//! skybox, lit by a sun with a shadow map plus a camera-mounted
//! flashlight. WASD/space/shift and the mouse fly the camera; the arrow
//! keys and Q/E drive the first cube around.

use std::path::{Path, PathBuf};

use brae::prelude::*;
use winit::keyboard::KeyCode;

const CUBE_POSITIONS: [[f32; 3]; 6] = [
    [2.0, 0.0, 2.0],
    [-2.0, 0.0, -2.0],
    [0.0, -0.5, 0.0],
    [-2.0, -3.0, -4.0],
    [4.0, -4.0, 1.0],
    [-6.0, 4.0, -1.0],
];

const CUBE_ROTATIONS: [[f32; 3]; 6] = [
    [15.0, 45.0, 0.0],
    [75.0, 15.0, 100.0],
    [80.0, 55.0, 63.0],
    [21.0, 22.0, 23.0],
    [10.0, 20.0, 30.0],
    [40.0, 50.0, 60.0],
];

const SUN_DIRECTION: [f32; 3] = [-0.2, -1.0, -0.3];

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut app = brae::default();

    app.set_setup(|scene, engine| {
        let cube_mesh = scene.add_mesh(Mesh::new(cube(), None));
        let (plane_vertices, plane_indices) = plane(20.0, 20.0);
        let floor_mesh = scene.add_mesh(Mesh::new(plane_vertices, Some(plane_indices)));

        let mut crate_material = Material::new("crate", [1.0, 1.0, 1.0], 64.0, 1.0);
        let texture_slots = [
            (TextureKind::Diffuse, "assets/textures/container.png", true),
            (
                TextureKind::Specular,
                "assets/textures/container_specular.png",
                false,
            ),
            (TextureKind::Emission, "assets/textures/matrix.jpg", true),
        ];
        for (kind, path, srgb) in texture_slots {
            match TextureResource::from_path(engine.device(), engine.queue(), Path::new(path), srgb)
            {
                Ok(texture) => {
                    let handle = scene.textures.insert(texture);
                    if let Err(e) = crate_material.push_texture(kind, handle) {
                        log::warn!("{}", e);
                    }
                }
                // untextured cubes still render with the base color
                Err(e) => log::warn!("{}", e),
            }
        }
        scene.material_manager.add_material(crate_material);

        scene
            .material_manager
            .add_material(Material::new("pink", [1.0, 0.0, 0.5], 64.0, 0.5));
        scene
            .material_manager
            .add_material(Material::new("floor", [0.55, 0.55, 0.6], 16.0, 0.2));

        scene.add_object(
            Object::new("driver", cube_mesh)
                .with_material("pink")
                .with_position(Vector3::new(0.0, 0.95, 0.0)),
        );

        for (i, (position, rotation)) in
            CUBE_POSITIONS.iter().zip(CUBE_ROTATIONS.iter()).enumerate()
        {
            scene.add_object(
                Object::new(&format!("cube_{}", i), cube_mesh)
                    .with_material("crate")
                    .with_position(Vector3::new(position[0], position[1], position[2]))
                    .with_rotation(Vector3::new(
                        rotation[0].to_radians(),
                        rotation[1].to_radians(),
                        rotation[2].to_radians(),
                    )),
            );
        }

        scene.add_object(
            Object::new("floor", floor_mesh)
                .with_material("floor")
                .with_position(Vector3::new(0.0, -5.0, 0.0)),
        );

        match scene.load_model(
            engine.device(),
            engine.queue(),
            Path::new("assets/models/crate_stack/crate_stack.obj"),
        ) {
            Ok(model) => {
                model.position = Vector3::new(5.0, -4.5, -3.0);
                model.rotation.y = 30f32.to_radians();
            }
            Err(e) => log::warn!("{}", e),
        }

        let skybox_faces = ["right", "left", "top", "bottom", "front", "back"]
            .map(|face| PathBuf::from(format!("assets/skybox/{}.jpg", face)));
        match Skybox::from_paths(engine.device(), engine.queue(), &skybox_faces) {
            Ok(skybox) => engine.set_skybox(skybox),
            Err(e) => log::warn!("{}", e),
        }

        let caster = ShadowCaster::directional(
            engine.device(),
            Vector3::new(SUN_DIRECTION[0], SUN_DIRECTION[1], SUN_DIRECTION[2]),
            2048,
        );
        engine.set_shadow_caster(caster);

        Ok(())
    });

    let sun = DirectionalLight {
        direction: Vector3::new(SUN_DIRECTION[0], SUN_DIRECTION[1], SUN_DIRECTION[2]),
        color: Vector3::new(1.0, 1.0, 1.0),
        ambient: 0.1,
        diffuse: 1.0,
        specular: 0.5,
    };
    let lamp = PointLight {
        position: Vector3::new(0.0, 2.0, -4.0),
        constant: 1.0,
        linear: 0.09,
        quadratic: 0.032,
        color: Vector3::new(1.0, 0.85, 0.6),
        ambient: 0.05,
        diffuse: 1.0,
        specular: 0.5,
    };

    app.set_update(move |scene, input, dt| {
        // rebuild the light batch every frame: reset, then push
        scene.lights.reset();
        let _ = scene.lights.push_directional(&sun);
        let _ = scene.lights.push_point(&lamp);

        let camera = scene.camera_manager.camera;
        let flashlight = SpotLight {
            position: camera.position,
            direction: camera.forward,
            angle: 12f32.to_radians(),
            outer_angle: 16f32.to_radians(),
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
            color: Vector3::new(1.0, 1.0, 1.0),
            ambient: 0.0,
            diffuse: 1.0,
            specular: 1.0,
        };
        let _ = scene.lights.push_spot(&flashlight);

        // arrows and Q/E steer the driver cube relative to the camera
        let step = 2.0 * dt;
        let flat_forward = Vector3::new(camera.forward.x, 0.0, camera.forward.z);
        let flat_forward = if flat_forward.magnitude() > 1e-4 {
            flat_forward.normalize()
        } else {
            flat_forward
        };

        if let Some(driver) = scene.objects.first_mut() {
            if input.is_pressed(KeyCode::ArrowUp) {
                driver.position += flat_forward * step;
            }
            if input.is_pressed(KeyCode::ArrowDown) {
                driver.position -= flat_forward * step;
            }
            if input.is_pressed(KeyCode::ArrowLeft) {
                driver.position -= camera.right * step;
            }
            if input.is_pressed(KeyCode::ArrowRight) {
                driver.position += camera.right * step;
            }
            if input.is_pressed(KeyCode::KeyQ) {
                driver.position.y -= step;
            }
            if input.is_pressed(KeyCode::KeyE) {
                driver.position.y += step;
            }

            driver.rotation.y += 0.5 * dt;
        }
    });

    app.run()
}
