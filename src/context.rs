//! Central GPU and window context.
//!
//! Owns the surface, device, queue, pipelines and the camera GPU resources
//! for one mounted viewport. Created once at setup, dropped at teardown;
//! field order keeps the surface alive no longer than the window.

use std::sync::Arc;

use cgmath::Deg;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, Projection, DEFAULT_FOV_DEG},
    data_structures::texture::Texture,
    pipelines::{
        grid::mk_grid_pipeline,
        model::{material_bind_group_layout, mk_model_pipeline, root_bind_group_layout},
        Pipelines,
    },
    scene::light_bind_group_layout,
};

#[derive(Debug)]
pub struct Context {
    pub depth_texture: Texture,
    pub pipelines: Pipelines,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light_bind_group_layout: wgpu::BindGroupLayout,
    pub material_bind_group_layout: wgpu::BindGroupLayout,
    pub root_bind_group_layout: wgpu::BindGroupLayout,
    pub clear_colour: wgpu::Color,
    pub config: wgpu::SurfaceConfiguration,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub(crate) window: Arc<Window>,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::debug!("wgpu setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::debug!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders assume an sRGB surface; fall back to whatever the
        // adapter offers first otherwise.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let projection = Projection::new(
            config.width,
            config.height,
            Deg(DEFAULT_FOV_DEG),
            0.1,
            1000.0,
        );
        let camera = CameraResources::new(&device, Camera::default(), &projection);

        let depth_texture = Texture::create_depth_texture(
            &device,
            [config.width, config.height],
            "depth_texture",
        );

        let light_layout = light_bind_group_layout(&device);
        let pipelines = Pipelines {
            model: mk_model_pipeline(&device, &config, &camera.bind_group_layout, &light_layout),
            grid: mk_grid_pipeline(&device, &config, &camera.bind_group_layout),
        };

        Ok(Self {
            depth_texture,
            pipelines,
            camera,
            projection,
            material_bind_group_layout: material_bind_group_layout(&device),
            root_bind_group_layout: root_bind_group_layout(&device),
            light_bind_group_layout: light_layout,
            clear_colour: wgpu::Color {
                r: 0.05,
                g: 0.05,
                b: 0.08,
                a: 1.0,
            },
            config,
            surface,
            device,
            queue,
            window,
        })
    }

    /// Update the camera uniform from controller state; called every frame.
    pub fn update_camera(&mut self, dt: instant::Duration) {
        let camera = &mut self.camera;
        camera.controller.update(&mut camera.camera, dt);
        camera.write_to_buffer(&self.queue, &self.projection);
    }
}
