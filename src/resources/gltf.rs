//! glTF / GLB parsing into a node graph.
//!
//! Handles both the JSON `.gltf` form and the binary `.glb` container.
//! Buffer data comes from the GLB blob, `data:` URIs, or sibling files
//! resolved through the file handle; an unreachable external buffer fails
//! the load.

use anyhow::{anyhow, Context as _};
use base64::Engine as _;

use crate::data_structures::{
    graph::{GraphNode, NodeGraph, Transform},
    model::{MaterialData, MeshData, ModelVertex, TextureData},
};
use crate::resources::FileHandle;

pub(crate) fn parse(bytes: &[u8], handle: &dyn FileHandle) -> anyhow::Result<NodeGraph> {
    let gltf = gltf::Gltf::from_slice(bytes)?;

    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .ok_or_else(|| anyhow!("glb declares a binary chunk but carries none"))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                buffer_data.push(resolve_uri(uri, handle)?);
            }
        }
    }

    let mut materials = Vec::new();
    for material in gltf.materials() {
        materials.push(load_material(&material, &buffer_data, handle));
    }

    let mut root = GraphNode::default();
    for scene in gltf.scenes() {
        for node in scene.nodes() {
            root.children.push(to_graph_node(node, &buffer_data));
        }
    }

    Ok(NodeGraph::new(root, materials))
}

fn resolve_uri(uri: &str, handle: &dyn FileHandle) -> anyhow::Result<Vec<u8>> {
    if let Some((_, payload)) = uri.split_once("base64,") {
        return base64::engine::general_purpose::STANDARD
            .decode(payload)
            .context("invalid base64 data uri");
    }
    if uri.starts_with("data:") {
        return Err(anyhow!("unsupported data uri encoding"));
    }
    let bytes = handle
        .sibling(uri)
        .with_context(|| format!("failed to resolve glTF resource {uri}"))?;
    Ok(bytes.to_vec())
}

fn load_material(
    material: &gltf::Material,
    buffer_data: &[Vec<u8>],
    handle: &dyn FileHandle,
) -> MaterialData {
    let pbr = material.pbr_metallic_roughness();
    let name = material.name().unwrap_or("unnamed").to_string();

    let color_texture = pbr.base_color_texture().and_then(|info| {
        let source = info.texture().source().source();
        let encoded = match source {
            gltf::image::Source::View { view, .. } => {
                let buffer = buffer_data.get(view.buffer().index())?;
                buffer
                    .get(view.offset()..view.offset() + view.length())
                    .map(|s| s.to_vec())
            }
            gltf::image::Source::Uri { uri, .. } => resolve_uri(uri, handle).ok(),
        }?;
        match decode_image(&encoded) {
            Ok(data) => Some(data),
            Err(e) => {
                log::warn!("could not decode color texture for material {name}: {e:#}");
                None
            }
        }
    });

    MaterialData {
        name,
        base_color: pbr.base_color_factor(),
        color_texture,
    }
}

fn decode_image(encoded: &[u8]) -> anyhow::Result<TextureData> {
    use image::GenericImageView;
    let img = image::load_from_memory(encoded)?;
    let (width, height) = img.dimensions();
    Ok(TextureData {
        width,
        height,
        rgba: img.to_rgba8().into_raw(),
    })
}

fn to_graph_node(node: gltf::scene::Node, buffer_data: &[Vec<u8>]) -> GraphNode {
    let mut meshes = Vec::new();
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));

            let mut vertices = Vec::new();
            if let Some(positions) = reader.read_positions() {
                for position in positions {
                    vertices.push(ModelVertex {
                        position,
                        ..Default::default()
                    });
                }
            }
            if let Some(normals) = reader.read_normals() {
                for (i, normal) in normals.enumerate() {
                    if let Some(v) = vertices.get_mut(i) {
                        v.normal = normal;
                    }
                }
            }
            if let Some(tex_coords) = reader.read_tex_coords(0).map(|t| t.into_f32()) {
                for (i, tex_coord) in tex_coords.enumerate() {
                    if let Some(v) = vertices.get_mut(i) {
                        v.tex_coords = tex_coord;
                    }
                }
            }

            let indices = match reader.read_indices() {
                Some(raw) => raw.into_u32().collect(),
                // Non-indexed primitives draw vertices in order.
                None => (0..vertices.len() as u32).collect(),
            };

            meshes.push(MeshData {
                name: mesh.name().unwrap_or("unknown_mesh").to_string(),
                vertices,
                indices,
                material: primitive.material().index().unwrap_or(0),
            });
        }
    }

    let (position, rotation, scale) = node.transform().decomposed();
    let mut graph_node = GraphNode::with_meshes(meshes);
    graph_node.transform = Transform {
        position: position.into(),
        rotation: rotation.into(),
        scale: scale.into(),
    };

    for child in node.children() {
        graph_node.children.push(to_graph_node(child, buffer_data));
    }

    graph_node
}
