//! Mesh and material data for a loaded asset.
//!
//! Loaders produce CPU-side [`MeshData`] and [`MaterialData`]; the session
//! turns them into [`GpuMesh`]/[`GpuMaterial`] once a device is available.
//! Keeping the CPU side separate lets bounds computation and framing run
//! without touching the GPU.

use cgmath::InnerSpace;
use wgpu::util::DeviceExt;

use crate::data_structures::texture::Texture;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// One vertex of a model mesh as stored in the GPU vertex buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
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
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// CPU-side triangle mesh produced by a loader.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    /// Index into the graph's material table.
    pub material: usize,
}

impl MeshData {
    /// Returns a copy with `matrix` baked into positions and normals.
    ///
    /// Used at upload time so a static model needs no per-node uniforms;
    /// the root translation stays dynamic (see the fitter).
    pub fn baked(&self, matrix: &cgmath::Matrix4<f32>) -> MeshData {
        let normal_matrix = normal_matrix(matrix);
        let vertices = self
            .vertices
            .iter()
            .map(|v| {
                let pos = matrix * cgmath::Vector4::new(v.position[0], v.position[1], v.position[2], 1.0);
                let n = normal_matrix * cgmath::Vector3::from(v.normal);
                let n = if n.magnitude2() > 0.0 { n.normalize() } else { n };
                ModelVertex {
                    position: [pos.x, pos.y, pos.z],
                    tex_coords: v.tex_coords,
                    normal: n.into(),
                }
            })
            .collect();
        MeshData {
            name: self.name.clone(),
            vertices,
            indices: self.indices.clone(),
            material: self.material,
        }
    }
}

fn normal_matrix(matrix: &cgmath::Matrix4<f32>) -> cgmath::Matrix3<f32> {
    use cgmath::{Matrix, SquareMatrix};
    let linear = cgmath::Matrix3::new(
        matrix.x.x, matrix.x.y, matrix.x.z,
        matrix.y.x, matrix.y.y, matrix.y.z,
        matrix.z.x, matrix.z.y, matrix.z.z,
    );
    // Inverse transpose handles non-uniform scale; a singular matrix keeps
    // the plain linear part rather than producing NaNs.
    linear
        .invert()
        .map(|inv| inv.transpose())
        .unwrap_or(linear)
}

/// Decoded image pixels for a material, kept on the CPU until upload.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// CPU-side material: base color factor plus an optional color texture.
#[derive(Clone, Debug)]
pub struct MaterialData {
    pub name: String,
    pub base_color: [f32; 4],
    pub color_texture: Option<TextureData>,
}

impl Default for MaterialData {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            color_texture: None,
        }
    }
}

/// A mesh uploaded to the GPU.
#[derive(Debug)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, mesh: &MeshData) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            num_elements: mesh.indices.len() as u32,
            material: mesh.material,
        }
    }
}

/// Per-material uniform data (base color factor).
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
}

/// A material uploaded to the GPU: color texture, sampler and factor.
#[derive(Debug)]
pub struct GpuMaterial {
    pub name: String,
    #[allow(unused)]
    pub texture: Texture,
    #[allow(unused)]
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl GpuMaterial {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material: &MaterialData,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let texture = match &material.color_texture {
            Some(data) => Texture::from_pixels(device, queue, data, &material.name),
            None => Texture::create_default_color(device, queue),
        };
        let uniform = MaterialUniform {
            base_color: material.base_color,
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", material.name)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let sampler = texture
            .sampler
            .as_ref()
            .expect("material textures always carry a sampler");
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
            label: Some(&format!("{} Material Bind Group", material.name)),
        });
        Self {
            name: material.name.clone(),
            texture,
            uniform_buffer,
            bind_group,
        }
    }
}
