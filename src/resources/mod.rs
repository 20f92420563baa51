//! Asset loading: format detection, file handles and the parser dispatch.
//!
//! A host hands the viewer an opaque [`FileHandle`] (a path on native, or
//! already-fetched bytes anywhere). [`load_model`] detects the format from
//! the name suffix, reads the content into a [`TransientBytes`] handle that
//! lives exactly as long as the load, and runs the matching parser into a
//! [`NodeGraph`].

use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;

use anyhow::anyhow;

use crate::data_structures::graph::NodeGraph;

pub mod gltf;
pub mod obj;

/// User-facing message for files outside the supported format set.
pub const UNSUPPORTED_FORMAT_MSG: &str =
    "Unsupported file format. Please use .gltf, .glb, or .obj files.";
/// Generic user-facing message for any parse or transport failure.
pub const LOAD_FAILED_MSG: &str = "Failed to load model. Please try a different file.";

/// Asset format detected from the file name suffix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetFormat {
    /// `.gltf` / `.glb`: JSON or binary scene-graph format.
    GltfBinary,
    /// `.obj`: plain-text geometry format.
    WavefrontObj,
    Unsupported,
}

impl AssetFormat {
    /// Case-insensitive suffix match; a name without a suffix is unsupported.
    pub fn detect(name: &str) -> Self {
        let Some((_, suffix)) = name.rsplit_once('.') else {
            return AssetFormat::Unsupported;
        };
        match suffix.to_ascii_lowercase().as_str() {
            "gltf" | "glb" => AssetFormat::GltfBinary,
            "obj" => AssetFormat::WavefrontObj,
            _ => AssetFormat::Unsupported,
        }
    }
}

/// Why a load attempt ended without a model.
#[derive(Debug)]
pub enum LoadError {
    /// Suffix not recognized; no I/O was attempted.
    UnsupportedFormat,
    /// The underlying reader or parser failed; the cause is logged, the
    /// display string stays generic.
    Failed(anyhow::Error),
}

impl LoadError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LoadError::UnsupportedFormat => UNSUPPORTED_FORMAT_MSG,
            LoadError::Failed(_) => LOAD_FAILED_MSG,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::UnsupportedFormat => None,
            LoadError::Failed(e) => Some(e.as_ref()),
        }
    }
}

/// Byte content of a file for the duration of one load.
///
/// Released exactly once when dropped, on every load outcome. A release
/// hook lets hosts (and tests) observe the release.
pub struct TransientBytes {
    data: Vec<u8>,
    on_release: Option<Box<dyn FnOnce() + Send>>,
}

impl TransientBytes {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            on_release: None,
        }
    }

    pub fn with_release(data: Vec<u8>, on_release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            data,
            on_release: Some(Box::new(on_release)),
        }
    }
}

impl Deref for TransientBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for TransientBytes {
    fn drop(&mut self) {
        if let Some(release) = self.on_release.take() {
            release();
        }
    }
}

impl fmt::Debug for TransientBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransientBytes")
            .field("len", &self.data.len())
            .finish()
    }
}

/// Opaque file supplied by the host: a name for format detection and an
/// accessor for the binary content. Loads run off the main thread, so
/// handles must be shareable.
pub trait FileHandle: Send + Sync {
    fn name(&self) -> &str;

    fn bytes(&self) -> anyhow::Result<TransientBytes>;

    /// Resolve a resource referenced relative to this file (external glTF
    /// buffers, `.mtl` libraries). Hosts without that capability keep the
    /// default, which fails the lookup.
    fn sibling(&self, uri: &str) -> anyhow::Result<TransientBytes> {
        Err(anyhow!("external resource {uri} is not reachable from this file"))
    }
}

/// File on the local filesystem.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug)]
pub struct PathHandle {
    path: PathBuf,
    name: String,
}

#[cfg(not(target_arch = "wasm32"))]
impl PathHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl FileHandle for PathHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn bytes(&self) -> anyhow::Result<TransientBytes> {
        Ok(TransientBytes::new(std::fs::read(&self.path)?))
    }

    fn sibling(&self, uri: &str) -> anyhow::Result<TransientBytes> {
        let base = self
            .path
            .parent()
            .ok_or_else(|| anyhow!("{} has no parent directory", self.path.display()))?;
        Ok(TransientBytes::new(std::fs::read(base.join(uri))?))
    }
}

/// Already-fetched bytes; the handle wasm hosts and tests use.
#[derive(Clone, Debug, Default)]
pub struct MemoryHandle {
    name: String,
    data: Vec<u8>,
}

impl MemoryHandle {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

impl FileHandle for MemoryHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn bytes(&self) -> anyhow::Result<TransientBytes> {
        Ok(TransientBytes::new(self.data.clone()))
    }
}

/// Channel end the loader reports progress fractions into.
pub type ProgressSender = futures::channel::mpsc::UnboundedSender<f32>;

fn emit_progress(progress: Option<&ProgressSender>, fraction: f32) {
    if let Some(tx) = progress {
        // Observability only; a closed receiver never fails a load.
        let _ = tx.unbounded_send(fraction.clamp(0.0, 1.0));
    }
}

/// Load one asset into a renderable node graph.
///
/// Dispatches on the detected format; an unsupported suffix fails before
/// any byte access. The transient byte handle is released on every exit
/// path. Progress fractions are best-effort observability.
pub async fn load_model(
    handle: &dyn FileHandle,
    progress: Option<&ProgressSender>,
) -> Result<NodeGraph, LoadError> {
    let format = AssetFormat::detect(handle.name());
    log::info!("loading {:?} as {:?}", handle.name(), format);
    match format {
        AssetFormat::Unsupported => Err(LoadError::UnsupportedFormat),
        AssetFormat::GltfBinary => {
            let bytes = handle.bytes().map_err(LoadError::Failed)?;
            emit_progress(progress, 0.25);
            let result = gltf::parse(&bytes, handle);
            drop(bytes);
            emit_progress(progress, 1.0);
            result.map_err(LoadError::Failed)
        }
        AssetFormat::WavefrontObj => {
            let bytes = handle.bytes().map_err(LoadError::Failed)?;
            emit_progress(progress, 0.25);
            let result = obj::parse(&bytes, handle).await;
            drop(bytes);
            emit_progress(progress, 1.0);
            result.map_err(LoadError::Failed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_gltf_and_glb() {
        assert_eq!(AssetFormat::detect("scene.gltf"), AssetFormat::GltfBinary);
        assert_eq!(AssetFormat::detect("scene.glb"), AssetFormat::GltfBinary);
        assert_eq!(AssetFormat::detect("SCENE.GLB"), AssetFormat::GltfBinary);
        assert_eq!(AssetFormat::detect("model.min.Gltf"), AssetFormat::GltfBinary);
    }

    #[test]
    fn detects_obj() {
        assert_eq!(AssetFormat::detect("rock.obj"), AssetFormat::WavefrontObj);
        assert_eq!(AssetFormat::detect("Rock.OBJ"), AssetFormat::WavefrontObj);
    }

    #[test]
    fn rejects_everything_else() {
        assert_eq!(AssetFormat::detect("scene.txt"), AssetFormat::Unsupported);
        assert_eq!(AssetFormat::detect("scene.fbx"), AssetFormat::Unsupported);
        assert_eq!(AssetFormat::detect("noextension"), AssetFormat::Unsupported);
        assert_eq!(AssetFormat::detect(""), AssetFormat::Unsupported);
        assert_eq!(AssetFormat::detect("gltf"), AssetFormat::Unsupported);
    }

    #[test]
    fn error_messages_are_fixed_strings() {
        assert_eq!(
            LoadError::UnsupportedFormat.to_string(),
            "Unsupported file format. Please use .gltf, .glb, or .obj files."
        );
        assert_eq!(
            LoadError::Failed(anyhow!("boring detail")).to_string(),
            "Failed to load model. Please try a different file."
        );
    }

    #[test]
    fn transient_bytes_release_runs_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let bytes = TransientBytes::with_release(vec![1, 2, 3], move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(&*bytes, &[1, 2, 3]);
        drop(bytes);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsupported_load_does_not_touch_bytes() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        struct Counting {
            reads: Arc<AtomicUsize>,
        }
        impl FileHandle for Counting {
            fn name(&self) -> &str {
                "scene.txt"
            }
            fn bytes(&self) -> anyhow::Result<TransientBytes> {
                self.reads.fetch_add(1, Ordering::SeqCst);
                Ok(TransientBytes::new(Vec::new()))
            }
        }

        let reads = Arc::new(AtomicUsize::new(0));
        let handle = Counting {
            reads: reads.clone(),
        };
        let result = futures::executor::block_on(load_model(&handle, None));
        assert!(matches!(result, Err(LoadError::UnsupportedFormat)));
        assert_eq!(reads.load(Ordering::SeqCst), 0);
    }
}
