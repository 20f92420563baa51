//! Orbit camera, projection and camera GPU resources.
//!
//! The viewer uses a single orbit camera: yaw/pitch/distance around a target
//! point. The frame fitter sets the distance, the [`OrbitController`] mutates
//! yaw/pitch/distance from mouse input, and [`Projection`] tracks the
//! viewport aspect ratio. [`CameraResources`] bundles the camera with its
//! uniform buffer and bind group for the render pass.

use cgmath::{Angle, Deg, Matrix4, Point3, Rad, Vector3};
use instant::Duration;
use wgpu::util::DeviceExt;
use winit::event::{MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Default vertical field of view in degrees.
pub const DEFAULT_FOV_DEG: f32 = 75.0;
/// Camera distance before any model has been framed.
pub const DEFAULT_DISTANCE: f32 = 10.0;

/// Orbit camera: a view direction towards `target` from `distance` away.
#[derive(Clone, Debug)]
pub struct Camera {
    pub target: Point3<f32>,
    pub yaw: Rad<f32>,
    pub pitch: Rad<f32>,
    pub distance: f32,
}

impl Camera {
    pub fn new<Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(yaw: Y, pitch: P, distance: f32) -> Self {
        Self {
            target: Point3::new(0.0, 0.0, 0.0),
            yaw: yaw.into(),
            pitch: pitch.into(),
            distance,
        }
    }

    /// World-space eye position derived from the orbit parameters.
    pub fn position(&self) -> Point3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vector3::new(cos_pitch * cos_yaw, sin_pitch, cos_pitch * sin_yaw) * self.distance
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position(), self.target, Vector3::unit_y())
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Deg(90.0), Deg(20.0), DEFAULT_DISTANCE)
    }
}

/// Perspective projection; `aspect` always mirrors the viewport.
#[derive(Clone, Debug)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Camera data as laid out in the uniform buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position().to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Mouse-driven orbit control: drag to rotate, wheel to zoom.
#[derive(Debug)]
pub struct OrbitController {
    rotate_sensitivity: f32,
    zoom_sensitivity: f32,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_zoom: f32,
}

impl OrbitController {
    pub fn new(rotate_sensitivity: f32, zoom_sensitivity: f32) -> Self {
        Self {
            rotate_sensitivity,
            zoom_sensitivity,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_zoom: 0.0,
        }
    }

    /// Accumulate a raw mouse drag delta.
    pub fn handle_mouse(&mut self, dx: f64, dy: f64) {
        self.pending_yaw += dx as f32;
        self.pending_pitch += dy as f32;
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        if let WindowEvent::MouseWheel { delta, .. } = event {
            self.pending_zoom -= match delta {
                MouseScrollDelta::LineDelta(_, y) => *y,
                MouseScrollDelta::PixelDelta(p) => p.y as f32 / 50.0,
            };
        }
    }

    /// Apply accumulated input to the camera. Called once per frame.
    pub fn update(&mut self, camera: &mut Camera, _dt: Duration) {
        camera.yaw += Rad(self.pending_yaw * self.rotate_sensitivity);
        camera.pitch += Rad(self.pending_pitch * self.rotate_sensitivity);
        // Keep the camera off the poles so look_at stays well defined.
        let limit = std::f32::consts::FRAC_PI_2 - 0.01;
        camera.pitch = Rad(camera.pitch.0.clamp(-limit, limit));
        camera.distance *= 1.0 + self.pending_zoom * self.zoom_sensitivity;
        camera.distance = camera.distance.max(0.05);
        self.pending_yaw = 0.0;
        self.pending_pitch = 0.0;
        self.pending_zoom = 0.0;
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(0.005, 0.1)
    }
}

/// Camera plus its GPU-side uniform buffer and bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: OrbitController,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: Camera, projection: &Projection) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&camera, projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            camera,
            controller: OrbitController::default(),
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Refresh the uniform buffer from the current camera state.
    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
