//! Viewport lifecycle and the application event loop.
//!
//! A [`ViewportSession`] owns the GPU context and the scene for one mounted
//! viewport. The [`App`] drives it through winit: window events feed the
//! camera controller, dropped files start asynchronous loads, and load
//! completions arrive back on the loop as user events.
//!
//! Loads are tracked by ticket. Every request gets a fresh ticket from the
//! [`LoadTracker`]; when a completion comes back with a ticket older than the
//! latest one issued, it is discarded so the most recently started load always
//! wins, regardless of completion order.

use std::{iter, sync::Arc};

use instant::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    context::Context,
    data_structures::graph::NodeGraph,
    fit,
    resources::{load_model, AssetFormat, FileHandle, LoadError, UNSUPPORTED_FORMAT_MSG},
    scene::{GpuModel, LoadedModel, Scene},
    viewport::{self, ViewportSize},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Host-visible load state, updated on every load start and completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStatus {
    pub loading: bool,
    pub error: Option<String>,
}

/// Issues tickets for load requests and applies completions in
/// last-started-wins order.
#[derive(Debug, Default)]
pub struct LoadTracker {
    issued: u64,
    status: LoadStatus,
}

impl LoadTracker {
    /// Gate a request by file name. An unsupported suffix is rejected on
    /// the spot: the error string is set, no ticket is issued and the
    /// loading flag is left alone, so a load already in flight keeps its
    /// state and can still settle normally. Supported names get a ticket.
    pub fn admit(&mut self, name: &str) -> Option<u64> {
        if AssetFormat::detect(name) == AssetFormat::Unsupported {
            self.status.error = Some(UNSUPPORTED_FORMAT_MSG.to_string());
            return None;
        }
        Some(self.begin())
    }

    /// Start a new request. Any load still in flight is superseded from this
    /// point on; its completion will be discarded.
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.status.loading = true;
        self.status.error = None;
        self.issued
    }

    /// Record a completion. Returns `false` (leaving the status untouched)
    /// when the ticket has been superseded by a newer request.
    pub fn finish(&mut self, ticket: u64, error: Option<String>) -> bool {
        if ticket != self.issued {
            return false;
        }
        self.status.loading = false;
        self.status.error = error;
        true
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status.loading
    }
}

/// One mounted viewport: scene, load tracking and the GPU context.
///
/// Field order matters for teardown: the scene's buffers drop before the
/// device and surface they were created from.
#[derive(Debug)]
pub struct ViewportSession {
    pub tracker: LoadTracker,
    pub scene: Scene,
    pub ctx: Context,
    is_surface_configured: bool,
    running: bool,
}

impl ViewportSession {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        let mut scene = Scene::new();
        scene.upload_fixtures(&ctx.device, &ctx.light_bind_group_layout);
        Ok(Self {
            tracker: LoadTracker::default(),
            scene,
            ctx,
            is_surface_configured: false,
            running: true,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if !self.running {
            return;
        }
        if viewport::apply_resize(&mut self.ctx, ViewportSize { width, height }) {
            self.is_surface_configured = true;
            self.ctx.window.request_redraw();
        }
    }

    /// Upload a freshly parsed graph, swap it into the scene's model slot
    /// and frame the camera on it. The previous model's buffers are released
    /// when the returned slot value drops.
    pub fn install_model(&mut self, graph: NodeGraph) {
        let mut model = LoadedModel::new(graph);
        model.gpu = Some(GpuModel::upload(
            &self.ctx.device,
            &self.ctx.queue,
            &model.graph,
            &self.ctx.material_bind_group_layout,
            &self.ctx.root_bind_group_layout,
        ));
        if let Some(previous) = self.scene.set_model(Some(model)) {
            log::info!(
                "released previous model ({} meshes)",
                previous.graph.mesh_count()
            );
        }
        if let Some(model) = self.scene.model_mut() {
            fit::frame(
                &mut model.graph,
                &mut self.ctx.camera.camera,
                &self.ctx.projection,
            );
            if let Some(gpu) = &model.gpu {
                gpu.write_root(&self.ctx.queue, &model.graph);
            }
        }
        self.ctx.window.request_redraw();
    }

    pub fn clear_model(&mut self) {
        if self.scene.set_model(None).is_some() {
            log::info!("cleared model slot");
            self.ctx.window.request_redraw();
        }
    }

    pub fn render(&mut self, dt: Duration) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.running || !self.is_surface_configured {
            return Ok(());
        }

        self.ctx.update_camera(dt);

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let grid = &self.scene.fixtures.grid;
            if let Some(buffer) = &grid.buffer {
                render_pass.set_pipeline(&self.ctx.pipelines.grid);
                render_pass.set_bind_group(0, &self.ctx.camera.bind_group, &[]);
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(0..grid.vertex_count(), 0..1);
            }

            let model = self.scene.model().and_then(|m| m.gpu.as_ref());
            let light = self.scene.fixtures.lights.gpu.as_ref();
            if let (Some(model), Some(light)) = (model, light) {
                render_pass.set_pipeline(&self.ctx.pipelines.model);
                render_pass.set_bind_group(1, &self.ctx.camera.bind_group, &[]);
                render_pass.set_bind_group(2, &light.bind_group, &[]);
                render_pass.set_bind_group(3, &model.root_bind_group, &[]);
                for mesh in &model.meshes {
                    // The material table is never empty, so index 0 is a
                    // safe fallback for out-of-range references.
                    let material = model
                        .materials
                        .get(mesh.material)
                        .unwrap_or(&model.materials[0]);
                    render_pass.set_bind_group(0, &material.bind_group, &[]);
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.num_elements, 0, 0..1);
                }
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Tear the session down in order: stop rendering, release the model,
    /// then let fixtures and the GPU context drop.
    pub fn shutdown(mut self) {
        self.running = false;
        if self.scene.set_model(None).is_some() {
            log::debug!("released model on shutdown");
        }
    }
}

/// Events delivered to the loop from async work and from host handles.
pub enum ViewerEvent {
    /// Session finished initialising off the main thread (web only).
    #[allow(dead_code)]
    Initialized(Box<ViewportSession>),
    /// A host submitted a file through a [`ViewerHandle`].
    LoadRequested(Box<dyn FileHandle>),
    /// A host asked for the model slot to be emptied.
    ClearModel,
    LoadFinished {
        ticket: u64,
        result: Result<NodeGraph, LoadError>,
    },
}

impl std::fmt::Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized(ViewportSession)"),
            Self::LoadRequested(handle) => {
                f.debug_tuple("LoadRequested").field(&handle.name()).finish()
            }
            Self::ClearModel => f.write_str("ClearModel"),
            Self::LoadFinished { ticket, result } => f
                .debug_struct("LoadFinished")
                .field("ticket", ticket)
                .field("ok", &result.is_ok())
                .finish(),
        }
    }
}

/// Cloneable handle into a running viewer loop.
///
/// Obtained through [`Viewer::on_ready`]; this is how a host submits
/// files (a [`crate::resources::MemoryHandle`] on the web, any
/// [`FileHandle`] elsewhere) without going through drag and drop.
#[derive(Clone, Debug)]
pub struct ViewerHandle {
    proxy: EventLoopProxy<ViewerEvent>,
}

impl ViewerHandle {
    /// Queue a load. Returns `false` once the loop has shut down.
    pub fn load(&self, handle: impl FileHandle + 'static) -> bool {
        self.proxy
            .send_event(ViewerEvent::LoadRequested(Box::new(handle)))
            .is_ok()
    }

    /// Queue emptying of the model slot.
    pub fn clear_model(&self) -> bool {
        self.proxy.send_event(ViewerEvent::ClearModel).is_ok()
    }
}

/// Callback invoked on every applied load-status transition.
pub type StatusObserver = Box<dyn FnMut(&LoadStatus)>;

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<ViewerEvent>,
    session: Option<ViewportSession>,
    status_observer: Option<StatusObserver>,
    /// A file to load as soon as the session is up.
    #[cfg(not(target_arch = "wasm32"))]
    initial: Option<std::path::PathBuf>,
    rotating: bool,
    last_time: Instant,
}

impl App {
    fn new(
        event_loop: &EventLoop<ViewerEvent>,
        status_observer: Option<StatusObserver>,
        #[cfg(not(target_arch = "wasm32"))] initial: Option<std::path::PathBuf>,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            session: None,
            status_observer,
            #[cfg(not(target_arch = "wasm32"))]
            initial,
            rotating: false,
            last_time: Instant::now(),
        })
    }

    fn notify_status(&mut self) {
        if let (Some(observer), Some(session)) = (&mut self.status_observer, &self.session) {
            observer(session.tracker.status());
        }
    }

    /// Start an asynchronous load of `handle`. An unsupported suffix is
    /// rejected right here: the loading flag never flips and no task is
    /// spawned. Otherwise the completion is posted back to the event loop
    /// and applied only if no newer request superseded it.
    fn request_load(&mut self, handle: Box<dyn FileHandle>) {
        let Some(session) = &mut self.session else {
            log::warn!("load requested before the viewport was initialised");
            return;
        };
        let Some(ticket) = session.tracker.admit(handle.name()) else {
            log::warn!("rejected {}: unsupported suffix", handle.name());
            self.notify_status();
            return;
        };
        log::info!("loading {} (request {})", handle.name(), ticket);

        let proxy = self.proxy.clone();
        let task = async move {
            let result = load_model(&*handle, None).await;
            if proxy
                .send_event(ViewerEvent::LoadFinished { ticket, result })
                .is_err()
            {
                log::warn!("event loop closed before a load completion was delivered");
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        self.async_runtime.spawn(task);
        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(task);

        self.notify_status();
    }

    fn on_load_finished(&mut self, ticket: u64, result: Result<NodeGraph, LoadError>) {
        let Some(session) = &mut self.session else {
            return;
        };
        let applied = match result {
            Ok(graph) => {
                if session.tracker.finish(ticket, None) {
                    session.install_model(graph);
                    true
                } else {
                    log::info!("discarding superseded load (request {})", ticket);
                    false
                }
            }
            Err(err) => {
                if session.tracker.finish(ticket, Some(err.user_message().to_string())) {
                    log::error!("model load failed: {:?}", err);
                    true
                } else {
                    log::info!("discarding superseded load failure (request {})", ticket);
                    false
                }
            }
        };
        if applied {
            self.notify_status();
        }
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => panic!("viewport initialisation failed. Cannot create a window: {e}"),
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let session = match self.async_runtime.block_on(ViewportSession::new(window)) {
                Ok(session) => session,
                Err(e) => panic!("viewport initialisation failed. Cannot create the context: {e}"),
            };
            let size = session.ctx.window.inner_size();
            self.session = Some(session);
            if let Some(session) = &mut self.session {
                session.resize(size.width, size.height);
            }
            if let Some(path) = self.initial.take() {
                self.request_load(Box::new(crate::resources::PathHandle::new(path)));
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match ViewportSession::new(window).await {
                    Ok(session) => assert!(
                        proxy
                            .send_event(ViewerEvent::Initialized(Box::new(session)))
                            .is_ok()
                    ),
                    Err(e) => log::error!("viewport initialisation failed: {e}"),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::Initialized(session) => {
                // This is the message from our wasm `spawn_local`
                self.session = Some(*session);
                let session = self.session.as_mut().unwrap();
                let size = session.ctx.window.inner_size();
                session.resize(size.width, size.height);
                session.ctx.window.request_redraw();
            }
            ViewerEvent::LoadRequested(handle) => {
                self.request_load(handle);
            }
            ViewerEvent::ClearModel => {
                if let Some(session) = &mut self.session {
                    session.clear_model();
                }
            }
            ViewerEvent::LoadFinished { ticket, result } => {
                self.on_load_finished(ticket, result);
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let Some(session) = &mut self.session else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.rotating {
                session.ctx.camera.controller.handle_mouse(dx, dy);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if let Some(session) = &mut self.session {
            session.ctx.camera.controller.handle_window_events(&event);
        }

        match event {
            WindowEvent::CloseRequested => {
                if let Some(session) = self.session.take() {
                    session.shutdown();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(session) = &mut self.session {
                    session.resize(size.width, size.height);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.rotating = state.is_pressed();
            }
            WindowEvent::DroppedFile(path) => {
                #[cfg(not(target_arch = "wasm32"))]
                self.request_load(Box::new(crate::resources::PathHandle::new(path)));
                // On the web the drop path carries no bytes; hosts read the
                // file themselves and submit a resources::MemoryHandle
                // through a ViewerHandle instead.
                #[cfg(target_arch = "wasm32")]
                let _ = path;
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                let Some(session) = &mut self.session else {
                    return;
                };
                match session.render(dt) {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = session.ctx.window.inner_size();
                        session.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Configures and runs a viewer loop.
///
/// Hosts that only want the drag-and-drop window can call [`run`]; this
/// builder is for embedding: it hands out a [`ViewerHandle`] before the
/// loop starts and reports every load-status transition to an observer.
#[derive(Default)]
pub struct Viewer {
    #[cfg(not(target_arch = "wasm32"))]
    initial: Option<std::path::PathBuf>,
    status_observer: Option<StatusObserver>,
    on_ready: Option<Box<dyn FnOnce(ViewerHandle)>>,
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path` as soon as the viewport is up.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn with_initial_model(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.initial = Some(path.into());
        self
    }

    /// Register a callback invoked on every applied load-status change:
    /// a load starting, finishing, failing or being rejected outright.
    pub fn with_status_observer(mut self, observer: impl FnMut(&LoadStatus) + 'static) -> Self {
        self.status_observer = Some(Box::new(observer));
        self
    }

    /// Register a callback handed a [`ViewerHandle`] just before the loop
    /// starts, so the host can submit files from outside the window.
    pub fn on_ready(mut self, callback: impl FnOnce(ViewerHandle) + 'static) -> Self {
        self.on_ready = Some(Box::new(callback));
        self
    }

    pub fn run(self) -> anyhow::Result<()> {
        run_event_loop(self)
    }
}

fn run_event_loop(viewer: Viewer) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<ViewerEvent> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        EventLoop::with_user_event()
            .with_any_thread(true)
            .build()
            .expect("Failed to create an event loop")
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<ViewerEvent> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        EventLoop::with_user_event()
            .with_any_thread(true)
            .build()
            .expect("Failed to create an event loop")
    };

    #[cfg(not(feature = "integration-tests"))]
    let event_loop: EventLoop<ViewerEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(
        &event_loop,
        viewer.status_observer,
        #[cfg(not(target_arch = "wasm32"))]
        viewer.initial,
    )?;

    if let Some(on_ready) = viewer.on_ready {
        on_ready(ViewerHandle {
            proxy: event_loop.create_proxy(),
        });
    }

    event_loop.run_app(&mut app)?;

    Ok(())
}

/// Run the viewer with an empty scene; models arrive via drag and drop.
pub fn run() -> anyhow::Result<()> {
    Viewer::new().run()
}

/// Run the viewer and load `path` as soon as the viewport is up.
#[cfg(not(target_arch = "wasm32"))]
pub fn run_with_model(path: impl Into<std::path::PathBuf>) -> anyhow::Result<()> {
    Viewer::new().with_initial_model(path).run()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_starts_idle() {
        let tracker = LoadTracker::default();
        assert_eq!(tracker.status(), &LoadStatus::default());
        assert!(!tracker.is_loading());
    }

    #[test]
    fn begin_sets_loading_and_clears_error() {
        let mut tracker = LoadTracker::default();
        let first = tracker.begin();
        tracker.finish(first, Some("Failed to load model.".into()));
        assert!(tracker.status().error.is_some());

        tracker.begin();
        assert!(tracker.is_loading());
        assert_eq!(tracker.status().error, None);
    }

    #[test]
    fn finish_applies_latest_ticket() {
        let mut tracker = LoadTracker::default();
        let ticket = tracker.begin();
        assert!(tracker.finish(ticket, None));
        assert!(!tracker.is_loading());
        assert_eq!(tracker.status().error, None);
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut tracker = LoadTracker::default();
        let first = tracker.begin();
        let second = tracker.begin();

        // The newer request resolves first.
        assert!(tracker.finish(second, None));
        assert!(!tracker.is_loading());

        // The older one must not disturb the settled state.
        assert!(!tracker.finish(first, Some("boom".into())));
        assert!(!tracker.is_loading());
        assert_eq!(tracker.status().error, None);
    }

    #[test]
    fn stale_completion_keeps_pending_load_pending() {
        let mut tracker = LoadTracker::default();
        let first = tracker.begin();
        let _second = tracker.begin();

        // The old request finishing must not clear the spinner for the
        // one still in flight.
        assert!(!tracker.finish(first, None));
        assert!(tracker.is_loading());
    }

    #[test]
    fn failure_surfaces_message_for_latest_only() {
        let mut tracker = LoadTracker::default();
        let ticket = tracker.begin();
        assert!(tracker.finish(ticket, Some("Failed to load model.".into())));
        assert!(!tracker.is_loading());
        assert_eq!(
            tracker.status().error.as_deref(),
            Some("Failed to load model.")
        );
    }

    #[test]
    fn tickets_are_monotonic() {
        let mut tracker = LoadTracker::default();
        let a = tracker.begin();
        let b = tracker.begin();
        let c = tracker.begin();
        assert!(a < b && b < c);
    }

    #[test]
    fn unsupported_name_never_starts_loading() {
        let mut tracker = LoadTracker::default();
        assert_eq!(tracker.admit("scene.txt"), None);
        assert!(!tracker.is_loading());
        assert_eq!(
            tracker.status().error.as_deref(),
            Some("Unsupported file format. Please use .gltf, .glb, or .obj files.")
        );
    }

    #[test]
    fn supported_name_gets_a_ticket() {
        let mut tracker = LoadTracker::default();
        let ticket = tracker.admit("model.glb");
        assert!(ticket.is_some());
        assert!(tracker.is_loading());
        assert_eq!(tracker.status().error, None);
    }

    #[test]
    fn rejection_leaves_inflight_load_untouched() {
        let mut tracker = LoadTracker::default();
        let ticket = tracker.begin();

        // A bad drop while a load is running must not cancel the spinner
        // or invalidate the running request's ticket.
        assert_eq!(tracker.admit("scene.txt"), None);
        assert!(tracker.is_loading());

        assert!(tracker.finish(ticket, None));
        assert!(!tracker.is_loading());
        assert_eq!(tracker.status().error, None);
    }

    #[test]
    fn viewer_builder_registers_hooks() {
        let viewer = Viewer::new()
            .with_status_observer(|_status| {})
            .on_ready(|_handle| {});
        assert!(viewer.status_observer.is_some());
        assert!(viewer.on_ready.is_some());
    }
}
