//! WGPU-based rendering engine
//!
//! Owns the surface, device and pass ordering. A frame is strict and
//! unconditional: shadow depth pass(es) with front-face culling, the color
//! pass into an offscreen scene buffer (objects, then the skybox), and a
//! fullscreen present pass that blits the scene buffer to the swapchain.

use std::sync::Arc;

use cgmath::Vector3;
use wgpu::TextureFormat;

use crate::gfx::{
    resources::{
        global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
        material::MaterialBindings,
        texture_resource::TextureResource,
    },
    scene::{object::DrawObject, scene::Scene},
};

use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::shadow::ShadowCaster;
use super::skybox::Skybox;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
};

const SHADOW_RESOLUTION: u32 = 2048;

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    depth_texture: TextureResource,

    // Offscreen scene buffer, blitted to the window by the present pass
    scene_color: TextureResource,
    present_layout: BindGroupLayoutWithDesc,
    present_bind_group: wgpu::BindGroup,

    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,

    shadow_caster: ShadowCaster,
    // bound in the forward pass when the active caster renders to a cube;
    // cleared to "far" every such frame so the plane lookup reads lit
    fallback_shadow_map: TextureResource,
    shadow_layout: BindGroupLayoutWithDesc,
    shadow_bind_group: wgpu::BindGroup,

    skybox: Option<Skybox>,
}

impl RenderEngine {
    /// Creates a new render engine for the given window.
    ///
    /// # Panics
    /// Panics if no adapter or device can be acquired; there is nothing to
    /// render with.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> RenderEngine {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to request adapter!");

        let (device, queue) = {
            adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("WGPU Device"),
                    // border clamp backs the shadow map's white border
                    required_features: wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER,
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: 4096,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                    memory_hints: wgpu::MemoryHints::default(),
                    trace: wgpu::Trace::Off,
                })
                .await
                .expect("Failed to request a device!")
        };

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: surface_capabilities.present_modes[0],
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let scene_color =
            TextureResource::create_render_target(&device, width.max(1), height.max(1), format, "Scene Color");

        let present_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(&device, "Present Bind Group Layout");
        let present_bind_group = Self::build_present_bind_group(&device, &present_layout, &scene_color);

        // default caster so the forward pass always has a map to sample
        let shadow_caster = ShadowCaster::directional(
            &device,
            Vector3::new(-0.2, -1.0, -0.3),
            SHADOW_RESOLUTION,
        );
        let fallback_shadow_map = TextureResource::create_shadow_map(&device, 4);

        let shadow_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_depth_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .create(&device, "Shadow Final Layout");
        let shadow_bind_group = Self::build_shadow_bind_group(
            &device,
            &shadow_layout,
            &shadow_caster,
            &fallback_shadow_map,
        );

        let global_ubo = GlobalUBO::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

        let transform_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(&device, "Transform Bind Group Layout");

        // throwaway bindings object just to get the shared material layout
        let temp_material_bindings = MaterialBindings::new(&device);
        let material_bind_group_layout = temp_material_bindings.bind_group_layouts().clone();

        let skybox_layout = Skybox::bind_group_layout(&device);

        let device_handle: Arc<wgpu::Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        for (name, source) in [
            ("forward", include_str!("forward.wgsl")),
            ("shadow", include_str!("shadow_pass.wgsl")),
            ("screen_quad", include_str!("screen_quad.wgsl")),
            ("skybox", include_str!("skybox.wgsl")),
        ] {
            if let Err(e) = pipeline_manager.load_shader(name, source) {
                log::error!("{}", e);
            }
        }

        // depth-only pass; front faces are culled to reduce self-shadowing
        pipeline_manager.register_pipeline(
            "Shadow",
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader("shadow")
                .with_vertex_only()
                .with_depth(TextureResource::DEPTH_FORMAT)
                .with_cull_mode(Some(wgpu::Face::Front))
                .with_bind_group_layouts(vec![
                    shadow_caster.bind_group_layout().clone(),
                    transform_layout.layout.clone(),
                ]),
        );

        pipeline_manager.register_pipeline(
            "Forward",
            PipelineConfig::default()
                .with_label("FORWARD")
                .with_shader("forward")
                .with_depth(TextureResource::DEPTH_FORMAT)
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layouts().clone(),
                    transform_layout.layout.clone(),
                    material_bind_group_layout,
                    shadow_layout.layout.clone(),
                ]),
        );

        pipeline_manager.register_pipeline(
            "Skybox",
            PipelineConfig::default()
                .with_label("SKYBOX")
                .with_shader("skybox")
                .with_no_vertex_buffers()
                .with_cull_mode(None)
                .with_depth(TextureResource::DEPTH_FORMAT)
                .with_depth_read_only(wgpu::CompareFunction::LessEqual)
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_bind_group_layouts(vec![
                    global_bindings.bind_group_layouts().clone(),
                    skybox_layout.layout.clone(),
                ]),
        );

        pipeline_manager.register_pipeline(
            "Present",
            PipelineConfig::default()
                .with_label("PRESENT")
                .with_shader("screen_quad")
                .with_no_vertex_buffers()
                .with_cull_mode(None)
                .with_color_targets(vec![Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })])
                .with_bind_group_layouts(vec![present_layout.layout.clone()]),
        );

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            for error in errors {
                log::error!("{}", error);
            }
        }

        RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            format,
            depth_texture,
            scene_color,
            present_layout,
            present_bind_group,
            pipeline_manager,
            global_ubo,
            global_bindings,
            shadow_caster,
            fallback_shadow_map,
            shadow_layout,
            shadow_bind_group,
            skybox: None,
        }
    }

    fn build_present_bind_group(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        scene_color: &TextureResource,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(layout)
            .texture(&scene_color.view)
            .sampler(&scene_color.sampler)
            .create(device, "Present Bind Group")
    }

    fn build_shadow_bind_group(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        caster: &ShadowCaster,
        fallback: &TextureResource,
    ) -> wgpu::BindGroup {
        // cube targets can't back the plane lookup; sample the cleared
        // fallback instead
        let map = if caster.is_cube() {
            fallback
        } else {
            &caster.target
        };
        BindGroupBuilder::new(layout)
            .texture(&map.view)
            .sampler(&map.sampler)
            .create(device, "Shadow Bind Group")
    }

    /// Replace the active shadow caster.
    pub fn set_shadow_caster(&mut self, caster: ShadowCaster) {
        self.shadow_bind_group = Self::build_shadow_bind_group(
            &self.device,
            &self.shadow_layout,
            &caster,
            &self.fallback_shadow_map,
        );
        self.shadow_caster = caster;
    }

    pub fn shadow_caster(&self) -> &ShadowCaster {
        &self.shadow_caster
    }

    pub fn set_skybox(&mut self, skybox: Skybox) {
        self.skybox = Some(skybox);
    }

    /// Upload the frame's camera and light state.
    ///
    /// Call after the scene has been updated for the frame and before
    /// `render_frame`.
    pub fn update(&mut self, scene: &Scene) {
        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            scene.camera_manager.camera.uniform,
            &scene.lights,
            self.shadow_caster.light_view_proj(),
        );
    }

    /// Renders a frame: shadow depth pass(es), color pass into the
    /// offscreen scene buffer, present blit. Ordering is fixed.
    pub fn render_frame(&mut self, scene: &Scene) {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                log::error!("unable to acquire surface texture: {}", e);
                return;
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // PASS 1: shadow depth, one sub-pass per caster face
        for face in self.shadow_caster.faces() {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &face.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(shadow_pipeline) = self.pipeline_manager.get_pipeline("Shadow") {
                shadow_pass.set_pipeline(shadow_pipeline);
                shadow_pass.set_bind_group(0, &face.bind_group, &[]);

                for object in scene.drawables() {
                    if object.visible {
                        shadow_pass.draw_object(object, &scene.meshes);
                    }
                }
            }
        }

        // keep the plane lookup lit while a cube caster is active
        if self.shadow_caster.is_cube() {
            encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Fallback Shadow Clear"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.fallback_shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }

        // PASS 2: color into the offscreen scene buffer, back-face culling
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Color Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.scene_color.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.2,
                            b: 0.3,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_groups(), &[]);
            render_pass.set_bind_group(3, &self.shadow_bind_group, &[]);

            if let Some(pipeline) = self.pipeline_manager.get_pipeline("Forward") {
                render_pass.set_pipeline(pipeline);

                for object in scene.drawables() {
                    if !object.visible {
                        continue;
                    }
                    let material = scene
                        .material_manager
                        .get_material_for_object(object.material_id.as_ref());

                    if let Some(material_bind_group) = material.get_bind_group() {
                        render_pass.set_bind_group(2, material_bind_group, &[]);
                        render_pass.draw_object(object, &scene.meshes);
                    } else {
                        log::warn!(
                            "skipping '{}' - material '{}' has no GPU resources",
                            object.name,
                            material.name
                        );
                    }
                }
            }

            // sky last, it only fills pixels nothing else wrote
            if let Some(skybox) = &self.skybox {
                if let Some(pipeline) = self.pipeline_manager.get_pipeline("Skybox") {
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(1, skybox.bind_group(), &[]);
                    render_pass.draw(0..3, 0..1);
                }
            }
        }

        // PASS 3: blit the scene buffer to the window
        {
            let mut present_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Present Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.get_pipeline("Present") {
                present_pass.set_pipeline(pipeline);
                present_pass.set_bind_group(0, &self.present_bind_group, &[]);
                present_pass.draw(0..3, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    /// Resizes the surface and recreates the size-dependent targets.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
        self.scene_color = TextureResource::create_render_target(
            &self.device,
            width,
            height,
            self.format,
            "Scene Color",
        );
        self.present_bind_group =
            Self::build_present_bind_group(&self.device, &self.present_layout, &self.scene_color);

        // Shadow maps keep their fixed resolution
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}
