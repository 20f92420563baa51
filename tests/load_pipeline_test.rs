//! End-to-end load path: handle in, framed node graph out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use modelport::camera::{Camera, Projection, DEFAULT_FOV_DEG};
use modelport::data_structures::graph::NodeGraph;
use modelport::fit;
use modelport::resources::{
    load_model, FileHandle, LoadError, MemoryHandle, TransientBytes,
};

/// Serves fixed bytes and counts how often the transient handle is released.
struct ReleaseCounting {
    name: &'static str,
    data: Vec<u8>,
    releases: Arc<AtomicUsize>,
}

impl ReleaseCounting {
    fn new(name: &'static str, data: Vec<u8>) -> (Self, Arc<AtomicUsize>) {
        let releases = Arc::new(AtomicUsize::new(0));
        (
            Self {
                name,
                data,
                releases: releases.clone(),
            },
            releases,
        )
    }
}

impl FileHandle for ReleaseCounting {
    fn name(&self) -> &str {
        self.name
    }

    fn bytes(&self) -> anyhow::Result<TransientBytes> {
        let releases = self.releases.clone();
        Ok(TransientBytes::with_release(self.data.clone(), move || {
            releases.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

const QUAD_OBJ: &str = "\
v 4.0 4.0 4.0
v 6.0 4.0 4.0
v 6.0 6.0 6.0
v 4.0 6.0 6.0
f 1 2 3 4
";

fn load(handle: &dyn FileHandle) -> Result<NodeGraph, LoadError> {
    futures::executor::block_on(load_model(handle, None))
}

#[test]
fn obj_quad_loads_with_expected_bounds() {
    let handle = MemoryHandle::new("quad.obj", QUAD_OBJ.as_bytes().to_vec());
    let graph = load(&handle).unwrap();
    assert_eq!(graph.mesh_count(), 1);
    let bounds = graph.bounds().unwrap();
    assert_eq!(bounds.min, cgmath::Vector3::new(4.0, 4.0, 4.0));
    assert_eq!(bounds.max, cgmath::Vector3::new(6.0, 6.0, 6.0));
}

#[test]
fn loaded_model_frames_to_origin() {
    let handle = MemoryHandle::new("quad.obj", QUAD_OBJ.as_bytes().to_vec());
    let mut graph = load(&handle).unwrap();

    let mut camera = Camera::default();
    let projection = Projection::new(800, 600, cgmath::Deg(DEFAULT_FOV_DEG), 0.1, 1000.0);
    fit::frame(&mut graph, &mut camera, &projection);

    let bounds = graph.bounds().unwrap();
    let center = bounds.center();
    assert!(center.x.abs() < 1e-5 && center.y.abs() < 1e-5 && center.z.abs() < 1e-5);

    let diagonal = bounds.diagonal();
    let expected =
        diagonal / (std::f32::consts::PI * DEFAULT_FOV_DEG / 360.0).tan() * fit::FIT_MARGIN;
    assert!((camera.distance - expected).abs() < 1e-4);
}

#[test]
fn successful_load_releases_bytes_once() {
    let (handle, releases) = ReleaseCounting::new("quad.obj", QUAD_OBJ.as_bytes().to_vec());
    assert!(load(&handle).is_ok());
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_load_releases_bytes_once() {
    let (handle, releases) = ReleaseCounting::new("junk.glb", b"not a model".to_vec());
    assert!(matches!(load(&handle), Err(LoadError::Failed(_))));
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[test]
fn unsupported_format_fails_without_reading() {
    let (handle, releases) = ReleaseCounting::new("scene.fbx", QUAD_OBJ.as_bytes().to_vec());
    let err = load(&handle).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFormat));
    assert_eq!(
        err.user_message(),
        "Unsupported file format. Please use .gltf, .glb, or .obj files."
    );
    assert_eq!(releases.load(Ordering::SeqCst), 0);
}

#[test]
fn parse_failure_keeps_cause_out_of_user_message() {
    let handle = MemoryHandle::new("broken.gltf", b"{ definitely not gltf".to_vec());
    let err = load(&handle).unwrap_err();
    assert_eq!(
        err.user_message(),
        "Failed to load model. Please try a different file."
    );
}

#[test]
fn progress_reaches_completion() {
    let (tx, rx) = futures::channel::mpsc::unbounded();
    let handle = MemoryHandle::new("quad.obj", QUAD_OBJ.as_bytes().to_vec());
    futures::executor::block_on(load_model(&handle, Some(&tx))).unwrap();
    drop(tx);

    let fractions: Vec<f32> = futures::executor::block_on_stream(rx).collect();
    assert!(!fractions.is_empty());
    assert_eq!(*fractions.last().unwrap(), 1.0);
    assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
}
