//! Headless render smoke test: a framed model must leave visible pixels.
//!
//! Needs a GPU adapter, so it runs behind the `integration-tests` feature.

#![cfg(feature = "integration-tests")]
#![cfg(not(target_arch = "wasm32"))]

use modelport::camera::{Camera, CameraResources, Projection, DEFAULT_FOV_DEG};
use modelport::data_structures::graph::{GraphNode, NodeGraph};
use modelport::data_structures::model::{MeshData, ModelVertex};
use modelport::data_structures::texture::Texture;
use modelport::fit;
use modelport::pipelines::{
    grid::mk_grid_pipeline,
    model::{material_bind_group_layout, mk_model_pipeline, root_bind_group_layout},
};
use modelport::scene::{light_bind_group_layout, GpuModel, LoadedModel, Scene};

const SIZE: u32 = 256;
const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.05,
    g: 0.05,
    b: 0.08,
    a: 1.0,
};

fn triangle_graph() -> NodeGraph {
    let vertices = vec![
        ModelVertex {
            position: [4.0, 4.0, 4.0],
            normal: [0.0, 0.0, 1.0],
            ..Default::default()
        },
        ModelVertex {
            position: [6.0, 4.0, 4.0],
            normal: [0.0, 0.0, 1.0],
            ..Default::default()
        },
        ModelVertex {
            position: [5.0, 6.0, 4.0],
            normal: [0.0, 0.0, 1.0],
            ..Default::default()
        },
    ];
    let mesh = MeshData {
        name: "tri".into(),
        vertices,
        indices: vec![0, 1, 2],
        material: 0,
    };
    NodeGraph::new(GraphNode::with_meshes(vec![mesh]), Vec::new())
}

async fn render_once() -> Vec<u8> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    });
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .expect("no GPU adapter available");
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: wgpu::Trace::Off,
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
        })
        .await
        .expect("device request failed");

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        width: SIZE,
        height: SIZE,
        present_mode: wgpu::PresentMode::Fifo,
        alpha_mode: wgpu::CompositeAlphaMode::Auto,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };

    let projection = Projection::new(SIZE, SIZE, cgmath::Deg(DEFAULT_FOV_DEG), 0.1, 1000.0);
    let mut camera = Camera::default();

    let mut scene = Scene::new();
    let light_layout = light_bind_group_layout(&device);
    scene.upload_fixtures(&device, &light_layout);

    let mut graph = triangle_graph();
    fit::frame(&mut graph, &mut camera, &projection);
    let mut model = LoadedModel::new(graph);
    model.gpu = Some(GpuModel::upload(
        &device,
        &queue,
        &model.graph,
        &material_bind_group_layout(&device),
        &root_bind_group_layout(&device),
    ));
    scene.set_model(Some(model));

    let camera_res = CameraResources::new(&device, camera, &projection);
    let model_pipeline =
        mk_model_pipeline(&device, &config, &camera_res.bind_group_layout, &light_layout);
    let grid_pipeline = mk_grid_pipeline(&device, &config, &camera_res.bind_group_layout);

    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Target"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let depth = Texture::create_depth_texture(&device, [SIZE, SIZE], "offscreen_depth");

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Offscreen Encoder"),
    });
    {
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Offscreen Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let grid = &scene.fixtures.grid;
        if let Some(buffer) = &grid.buffer {
            render_pass.set_pipeline(&grid_pipeline);
            render_pass.set_bind_group(0, &camera_res.bind_group, &[]);
            render_pass.set_vertex_buffer(0, buffer.slice(..));
            render_pass.draw(0..grid.vertex_count(), 0..1);
        }

        let gpu = scene.model().and_then(|m| m.gpu.as_ref()).unwrap();
        let light = scene.fixtures.lights.gpu.as_ref().unwrap();
        render_pass.set_pipeline(&model_pipeline);
        render_pass.set_bind_group(1, &camera_res.bind_group, &[]);
        render_pass.set_bind_group(2, &light.bind_group, &[]);
        render_pass.set_bind_group(3, &gpu.root_bind_group, &[]);
        for mesh in &gpu.meshes {
            let material = &gpu.materials[0];
            render_pass.set_bind_group(0, &material.bind_group, &[]);
            render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..mesh.num_elements, 0, 0..1);
        }
    }

    let bytes_per_row = 4 * SIZE;
    let output_buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: None,
        size: (bytes_per_row * SIZE) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture: &target,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &output_buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(SIZE),
            },
        },
        wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    let buffer_slice = output_buffer.slice(..);
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).unwrap();
    });
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(std::time::Duration::from_secs(3)),
        })
        .unwrap();
    rx.receive().await.unwrap().unwrap();

    let data = buffer_slice.get_mapped_range().to_vec();
    output_buffer.unmap();
    data
}

#[test]
fn framed_model_produces_non_background_pixels() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let pixels = runtime.block_on(render_once());

    let clear_rgba = [
        (CLEAR.r as f32).powf(1.0 / 2.2).mul_add(255.0, 0.5) as i16,
        (CLEAR.g as f32).powf(1.0 / 2.2).mul_add(255.0, 0.5) as i16,
        (CLEAR.b as f32).powf(1.0 / 2.2).mul_add(255.0, 0.5) as i16,
    ];
    let mut covered = 0usize;
    for chunk in pixels.chunks_exact(4) {
        let off = (chunk[0] as i16 - clear_rgba[0]).abs() > 8
            || (chunk[1] as i16 - clear_rgba[1]).abs() > 8
            || (chunk[2] as i16 - clear_rgba[2]).abs() > 8;
        if off {
            covered += 1;
        }
    }
    // The fitted model fills a good part of a 256x256 frame; require at
    // least a few percent of pixels to differ from the clear colour.
    assert!(
        covered > (SIZE * SIZE) as usize / 50,
        "only {covered} non-background pixels"
    );
}
