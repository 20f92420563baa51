//! Bounding-volume auto-framing.
//!
//! After a model is inserted the session calls [`frame`] to recenter the
//! graph at the origin and pull the camera back far enough that the whole
//! bounding volume fits inside the view frustum.

use cgmath::Angle;

use crate::{
    camera::{Camera, Projection},
    data_structures::graph::NodeGraph,
};

/// Safety factor keeping some headroom around the framed model.
pub const FIT_MARGIN: f32 = 1.2;

/// Camera distance that fits a bounding volume of diagonal `size` into a
/// frustum with vertical field of view `fovy`.
pub fn fit_distance(size: f32, fovy: cgmath::Rad<f32>) -> f32 {
    size / (fovy / 2.0).tan() * FIT_MARGIN
}

/// Recenter `graph` at the origin and set the camera distance so the whole
/// model is in view. Idempotent for unchanged inputs; a graph without
/// geometry leaves the camera alone.
pub fn frame(graph: &mut NodeGraph, camera: &mut Camera, projection: &Projection) {
    let Some(bounds) = graph.bounds() else {
        log::warn!("model has no geometry to frame");
        return;
    };
    graph.translate(-bounds.center());
    camera.target = cgmath::Point3::new(0.0, 0.0, 0.0);
    camera.distance = fit_distance(bounds.diagonal(), projection.fovy);
    log::debug!(
        "framed model: diagonal {:.3}, camera distance {:.3}",
        bounds.diagonal(),
        camera.distance
    );
}
