//! Wavefront OBJ parsing into a node graph.
//!
//! Geometry only is required; `.mtl` libraries and their textures are
//! resolved through the file handle when available and silently skipped
//! otherwise, so a bare mesh export still loads.

use std::io::{BufReader, Cursor};

use cgmath::InnerSpace;

use crate::data_structures::{
    graph::{GraphNode, NodeGraph},
    model::{MaterialData, MeshData, ModelVertex},
};
use crate::resources::FileHandle;

pub(crate) async fn parse(bytes: &[u8], handle: &dyn FileHandle) -> anyhow::Result<NodeGraph> {
    let text = std::str::from_utf8(bytes)?;
    let cursor = Cursor::new(text);
    let mut reader = BufReader::new(cursor);

    let (models, obj_materials) = tobj::load_obj_buf_async(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| async move {
            match handle.sibling(&p) {
                Ok(mtl) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mtl.to_vec()))),
                Err(e) => {
                    log::warn!("material library {p} not available, using defaults: {e:#}");
                    Ok((Vec::new(), empty_mtl_index()))
                }
            }
        },
    )
    .await?;

    let mut materials = Vec::new();
    match obj_materials {
        Ok(mtls) => {
            for m in mtls {
                materials.push(to_material(&m));
            }
        }
        Err(e) => log::warn!("ignoring unreadable material library: {e}"),
    }

    let meshes = models
        .iter()
        .map(|m| to_mesh(m, handle.name()))
        .collect::<Vec<_>>();

    Ok(NodeGraph::new(GraphNode::with_meshes(meshes), materials))
}

fn empty_mtl_index() -> std::collections::HashMap<String, usize> {
    std::collections::HashMap::new()
}

fn to_material(m: &tobj::Material) -> MaterialData {
    let [r, g, b] = m.diffuse.unwrap_or([0.8, 0.8, 0.8]);
    MaterialData {
        name: m.name.clone(),
        base_color: [r, g, b, 1.0],
        // OBJ texture maps reference loose image files; the viewer renders
        // untextured OBJ with the diffuse color.
        color_texture: None,
    }
}

fn to_mesh(m: &tobj::Model, file_name: &str) -> MeshData {
    let mut vertices = (0..m.mesh.positions.len() / 3)
        .map(|i| ModelVertex {
            position: [
                m.mesh.positions[i * 3],
                m.mesh.positions[i * 3 + 1],
                m.mesh.positions[i * 3 + 2],
            ],
            tex_coords: [
                m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
            normal: [
                m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
        })
        .collect::<Vec<_>>();

    if m.mesh.normals.is_empty() {
        compute_vertex_normals(&mut vertices, &m.mesh.indices);
    }

    MeshData {
        name: if m.name.is_empty() {
            file_name.to_string()
        } else {
            m.name.clone()
        },
        indices: m.mesh.indices.clone(),
        material: m.mesh.material_id.unwrap_or(0),
        vertices,
    }
}

/// Area-weighted face normals averaged per vertex, for OBJ exports that
/// ship positions only.
fn compute_vertex_normals(vertices: &mut [ModelVertex], indices: &[u32]) {
    let mut accumulated = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];
    for c in indices.chunks(3) {
        if c.len() < 3 {
            continue;
        }
        let [i0, i1, i2] = [c[0] as usize, c[1] as usize, c[2] as usize];
        let p0: cgmath::Vector3<f32> = vertices[i0].position.into();
        let p1: cgmath::Vector3<f32> = vertices[i1].position.into();
        let p2: cgmath::Vector3<f32> = vertices[i2].position.into();
        // Cross product length is twice the face area, so degenerate
        // triangles contribute nothing.
        let face_normal = (p1 - p0).cross(p2 - p0);
        accumulated[i0] += face_normal;
        accumulated[i1] += face_normal;
        accumulated[i2] += face_normal;
    }
    for (vertex, normal) in vertices.iter_mut().zip(accumulated) {
        vertex.normal = if normal.magnitude2() > 0.0 {
            normal.normalize().into()
        } else {
            [0.0, 1.0, 0.0]
        };
    }
}
