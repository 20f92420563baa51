//! The persistent render scene.
//!
//! A [`Scene`] holds a fixed set of fixtures created once at setup (the
//! light rig and the ground reference grid) and exactly one mutable model
//! slot. Model replacement goes through the slot; it can never touch the
//! fixtures, and removing the old model releases its GPU buffers by drop.
//! Fixture and model state is constructible without a device; GPU buffers
//! are attached by the upload calls once one exists.

use wgpu::util::DeviceExt;

use crate::data_structures::{
    graph::NodeGraph,
    model::{GpuMaterial, GpuMesh, Vertex},
};

/// Half extent and line count of the ground reference grid.
pub const GRID_HALF_EXTENT: f32 = 5.0;
pub const GRID_DIVISIONS: u32 = 10;

/// Combined ambient + directional light as laid out in the uniform buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub direction: [f32; 3],
    _padding: u32,
    pub color: [f32; 3],
    _padding2: u32,
    pub ambient: [f32; 3],
    _padding3: u32,
}

impl Default for LightUniform {
    fn default() -> Self {
        Self {
            direction: [0.5, 1.0, 0.75],
            _padding: 0,
            color: [1.0, 1.0, 1.0],
            _padding2: 0,
            ambient: [0.35, 0.35, 0.35],
            _padding3: 0,
        }
    }
}

pub fn light_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
        label: Some("light_bind_group_layout"),
    })
}

/// GPU side of the light rig.
#[derive(Debug)]
pub struct LightGpu {
    #[allow(unused)]
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// Ambient + directional light fixture.
#[derive(Debug, Default)]
pub struct LightRig {
    pub uniform: LightUniform,
    pub gpu: Option<LightGpu>,
}

impl LightRig {
    pub fn upload(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout) {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Buffer"),
            contents: bytemuck::cast_slice(&[self.uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("light_bind_group"),
        });
        self.gpu = Some(LightGpu { buffer, bind_group });
    }
}

/// One vertex of the ground grid line mesh.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GridVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex for GridVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<GridVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Line vertices for a square grid in the y = 0 plane, center lines accented.
pub fn grid_lines(half_extent: f32, divisions: u32) -> Vec<GridVertex> {
    let mut vertices = Vec::with_capacity(((divisions + 1) * 4) as usize);
    let accent = [0.55, 0.55, 0.6];
    let regular = [0.3, 0.3, 0.33];
    for i in 0..=divisions {
        let t = -half_extent + (i as f32 / divisions as f32) * 2.0 * half_extent;
        let color = if t.abs() < f32::EPSILON { accent } else { regular };
        vertices.push(GridVertex {
            position: [t, 0.0, -half_extent],
            color,
        });
        vertices.push(GridVertex {
            position: [t, 0.0, half_extent],
            color,
        });
        vertices.push(GridVertex {
            position: [-half_extent, 0.0, t],
            color,
        });
        vertices.push(GridVertex {
            position: [half_extent, 0.0, t],
            color,
        });
    }
    vertices
}

/// Ground reference grid fixture.
#[derive(Debug)]
pub struct GridFixture {
    pub vertices: Vec<GridVertex>,
    pub buffer: Option<wgpu::Buffer>,
}

impl GridFixture {
    pub fn new() -> Self {
        Self {
            vertices: grid_lines(GRID_HALF_EXTENT, GRID_DIVISIONS),
            buffer: None,
        }
    }

    pub fn upload(&mut self, device: &wgpu::Device) {
        self.buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }
}

impl Default for GridFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// The persistent fixtures, created once and never replaced.
#[derive(Debug, Default)]
pub struct Fixtures {
    pub lights: LightRig,
    pub grid: GridFixture,
}

/// Root transform of a model as laid out in its uniform buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RootUniform {
    pub matrix: [[f32; 4]; 4],
}

/// GPU buffers of one uploaded model.
#[derive(Debug)]
pub struct GpuModel {
    pub meshes: Vec<GpuMesh>,
    pub materials: Vec<GpuMaterial>,
    pub root_buffer: wgpu::Buffer,
    pub root_bind_group: wgpu::BindGroup,
}

impl GpuModel {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        graph: &NodeGraph,
        material_layout: &wgpu::BindGroupLayout,
        root_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let materials = graph
            .materials
            .iter()
            .map(|m| GpuMaterial::new(device, queue, m, material_layout))
            .collect::<Vec<_>>();
        let meshes = graph
            .flattened_meshes()
            .iter()
            .map(|m| GpuMesh::new(device, m))
            .collect();
        let uniform = RootUniform {
            matrix: graph.root.transform.to_matrix().into(),
        };
        let root_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model Root Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let root_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: root_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: root_buffer.as_entire_binding(),
            }],
            label: Some("model_root_bind_group"),
        });
        Self {
            meshes,
            materials,
            root_buffer,
            root_bind_group,
        }
    }

    /// Re-sync the root transform after the fitter moved the graph.
    pub fn write_root(&self, queue: &wgpu::Queue, graph: &NodeGraph) {
        let uniform = RootUniform {
            matrix: graph.root.transform.to_matrix().into(),
        };
        queue.write_buffer(&self.root_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }
}

/// A model occupying the scene's slot: the CPU graph plus, once a device
/// has seen it, its GPU buffers.
#[derive(Debug)]
pub struct LoadedModel {
    pub graph: NodeGraph,
    pub gpu: Option<GpuModel>,
}

impl LoadedModel {
    pub fn new(graph: NodeGraph) -> Self {
        Self { graph, gpu: None }
    }
}

/// Persistent scene: fixtures plus one mutable model slot.
#[derive(Debug, Default)]
pub struct Scene {
    pub fixtures: Fixtures,
    model: Option<LoadedModel>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upload_fixtures(&mut self, device: &wgpu::Device, light_layout: &wgpu::BindGroupLayout) {
        self.fixtures.lights.upload(device, light_layout);
        self.fixtures.grid.upload(device);
    }

    /// Replace the model slot: the previous model (if any) is removed first
    /// and returned so its resources are released when the caller drops it.
    pub fn set_model(&mut self, model: Option<LoadedModel>) -> Option<LoadedModel> {
        let previous = self.model.take();
        self.model = model;
        previous
    }

    pub fn model(&self) -> Option<&LoadedModel> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut LoadedModel> {
        self.model.as_mut()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }
}
