//! Node graph produced by the asset loaders.
//!
//! A [`NodeGraph`] is the owned tree of transformable nodes a parser emits:
//! each node carries a local [`Transform`], zero or more meshes and its
//! children, and the graph keeps one flat material table. The tree stays on
//! the CPU so the fitter can walk it without a device; upload flattens it
//! into world-space meshes.

use std::ops::Mul;

use cgmath::One;

use crate::data_structures::model::{MaterialData, MeshData};

/// Local transform of one graph node: translation, rotation and scale.
#[derive(Clone, Debug)]
pub struct Transform {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.position)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl<'a, 'b> Mul<&'b Transform> for &'a Transform {
    type Output = Transform;

    fn mul(self, rhs: &'b Transform) -> Self::Output {
        let rotation = self.rotation * rhs.rotation;
        let scale = cgmath::Vector3::new(
            self.scale.x * rhs.scale.x,
            self.scale.y * rhs.scale.y,
            self.scale.z * rhs.scale.z,
        );
        let scaled_rhs_pos = cgmath::Vector3::new(
            self.scale.x * rhs.position.x,
            self.scale.y * rhs.position.y,
            self.scale.z * rhs.position.z,
        );
        let position = self.position + (self.rotation * scaled_rhs_pos);
        Transform {
            position,
            rotation,
            scale,
        }
    }
}

/// One node of the graph: local transform, meshes and children.
#[derive(Clone, Debug, Default)]
pub struct GraphNode {
    pub transform: Transform,
    pub meshes: Vec<MeshData>,
    pub children: Vec<GraphNode>,
}

impl GraphNode {
    pub fn with_meshes(meshes: Vec<MeshData>) -> Self {
        Self {
            meshes,
            ..Default::default()
        }
    }
}

/// Axis-aligned bounding box over a graph's world-space geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: cgmath::Vector3<f32>,
    pub max: cgmath::Vector3<f32>,
}

impl Aabb {
    pub fn center(&self) -> cgmath::Vector3<f32> {
        (self.min + self.max) / 2.0
    }

    pub fn diagonal(&self) -> f32 {
        use cgmath::InnerSpace;
        (self.max - self.min).magnitude()
    }

    fn grow(&mut self, p: cgmath::Vector3<f32>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }
}

/// The renderable node graph for one loaded asset.
#[derive(Clone, Debug)]
pub struct NodeGraph {
    pub root: GraphNode,
    pub materials: Vec<MaterialData>,
}

impl NodeGraph {
    pub fn new(root: GraphNode, materials: Vec<MaterialData>) -> Self {
        let materials = if materials.is_empty() {
            vec![MaterialData::default()]
        } else {
            materials
        };
        Self { root, materials }
    }

    /// Bounding box over every vertex in world space, `None` for a graph
    /// without geometry.
    pub fn bounds(&self) -> Option<Aabb> {
        let mut aabb: Option<Aabb> = None;
        walk(&self.root, &Transform::default(), &mut |mesh, world| {
            let matrix = world.to_matrix();
            for v in &mesh.vertices {
                let p = matrix * cgmath::Vector4::new(v.position[0], v.position[1], v.position[2], 1.0);
                let p = cgmath::Vector3::new(p.x, p.y, p.z);
                match &mut aabb {
                    Some(aabb) => aabb.grow(p),
                    None => aabb = Some(Aabb { min: p, max: p }),
                }
            }
        });
        aabb
    }

    /// Shifts the whole graph by `offset` via the root translation.
    pub fn translate(&mut self, offset: cgmath::Vector3<f32>) {
        self.root.transform.position += offset;
    }

    /// Flattens the tree into world-space meshes relative to the root.
    ///
    /// The root transform itself is excluded so the fitter can keep moving
    /// the model through a single root-offset uniform after upload.
    pub fn flattened_meshes(&self) -> Vec<MeshData> {
        let mut out = Vec::new();
        for child in &self.root.children {
            walk(child, &Transform::default(), &mut |mesh, world| {
                out.push(mesh.baked(&world.to_matrix()));
            });
        }
        for mesh in &self.root.meshes {
            out.push(mesh.clone());
        }
        out
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        walk(&self.root, &Transform::default(), &mut |_, _| count += 1);
        count
    }
}

fn walk(node: &GraphNode, parent: &Transform, f: &mut impl FnMut(&MeshData, &Transform)) {
    let world = parent * &node.transform;
    for mesh in &node.meshes {
        f(mesh, &world);
    }
    for child in &node.children {
        walk(child, &world, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::model::ModelVertex;
    use cgmath::{Deg, Rotation3, Vector3};

    fn cube_mesh(min: [f32; 3], max: [f32; 3]) -> MeshData {
        let mut vertices = Vec::new();
        for x in [min[0], max[0]] {
            for y in [min[1], max[1]] {
                for z in [min[2], max[2]] {
                    vertices.push(ModelVertex {
                        position: [x, y, z],
                        ..Default::default()
                    });
                }
            }
        }
        MeshData {
            name: "cube".to_string(),
            vertices,
            indices: (0..8).collect(),
            material: 0,
        }
    }

    #[test]
    fn bounds_cover_authored_extent() {
        let graph = NodeGraph::new(
            GraphNode::with_meshes(vec![cube_mesh([4.0, 4.0, 4.0], [6.0, 6.0, 6.0])]),
            vec![],
        );
        let aabb = graph.bounds().unwrap();
        assert_eq!(aabb.min, Vector3::new(4.0, 4.0, 4.0));
        assert_eq!(aabb.max, Vector3::new(6.0, 6.0, 6.0));
        assert_eq!(aabb.center(), Vector3::new(5.0, 5.0, 5.0));
        assert!((aabb.diagonal() - 12.0f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn bounds_follow_child_transforms() {
        let mut child = GraphNode::with_meshes(vec![cube_mesh([0.0; 3], [1.0; 3])]);
        child.transform.position = Vector3::new(10.0, 0.0, 0.0);
        child.transform.scale = Vector3::new(2.0, 2.0, 2.0);
        let root = GraphNode {
            children: vec![child],
            ..Default::default()
        };
        let aabb = NodeGraph::new(root, vec![]).bounds().unwrap();
        assert_eq!(aabb.min, Vector3::new(10.0, 0.0, 0.0));
        assert_eq!(aabb.max, Vector3::new(12.0, 2.0, 2.0));
    }

    #[test]
    fn empty_graph_has_no_bounds() {
        assert!(NodeGraph::new(GraphNode::default(), vec![]).bounds().is_none());
    }

    #[test]
    fn translate_moves_bounds_through_root() {
        let mut graph = NodeGraph::new(
            GraphNode::with_meshes(vec![cube_mesh([0.0; 3], [2.0; 3])]),
            vec![],
        );
        graph.translate(Vector3::new(-1.0, -1.0, -1.0));
        let aabb = graph.bounds().unwrap();
        assert_eq!(aabb.center(), Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn flattening_excludes_root_translation() {
        let mut graph = NodeGraph::new(
            GraphNode {
                children: vec![GraphNode::with_meshes(vec![cube_mesh([0.0; 3], [1.0; 3])])],
                ..Default::default()
            },
            vec![],
        );
        graph.translate(Vector3::new(100.0, 0.0, 0.0));
        let meshes = graph.flattened_meshes();
        assert_eq!(meshes.len(), 1);
        // Root offset is applied at render time, not baked into vertices.
        assert_eq!(meshes[0].vertices[0].position[0], 0.0);
    }

    #[test]
    fn transform_composition_matches_matrix_product() {
        let a = Transform {
            position: Vector3::new(1.0, 2.0, 3.0),
            rotation: cgmath::Quaternion::from_angle_y(Deg(90.0)),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        let b = Transform {
            position: Vector3::new(0.5, 0.0, 0.0),
            rotation: cgmath::Quaternion::from_angle_x(Deg(45.0)),
            scale: Vector3::new(1.0, 1.0, 1.0),
        };
        let composed = (&a * &b).to_matrix();
        let product = a.to_matrix() * b.to_matrix();
        for c in 0..4 {
            for r in 0..4 {
                assert!((composed[c][r] - product[c][r]).abs() < 1e-5);
            }
        }
    }
}
