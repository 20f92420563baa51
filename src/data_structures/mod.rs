//! Viewer data structures: node graphs, meshes, materials and textures.
//!
//! - `graph` is the node graph a loader emits and the scene owns
//! - `model` contains CPU mesh/material data and their GPU counterparts
//! - `texture` is the GPU texture wrapper and creation utilities

pub mod graph;
pub mod model;
pub mod texture;
