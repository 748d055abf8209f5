//! Core application state and lifecycle.

use kurbo::Point;
use peniko::Color;
use sketchroom_core::input::{InputResponse, Redraw};
use sketchroom_core::room::RoomName;
use sketchroom_core::session::Session;
use sketchroom_core::sync::{NativeWebSocket, SyncError};
use sketchroom_render::{RenderContext, Renderer, RendererError, VelloRenderer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use vello::util::RenderSurface;
use vello::wgpu::PresentMode;
use vello::{AaConfig, RenderParams, RendererOptions};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::event_handler::EventHandler;

/// Default relay endpoint.
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:3030/ws";

/// How often the room connection is polled while the window is idle.
const POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
    #[error("Renderer error: {0}")]
    Renderer(#[from] RendererError),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub server_url: String,
    pub room: RoomName,
    pub background_color: Color,
}

impl AppConfig {
    /// Configuration for a room with default window and server settings.
    pub fn new(room: RoomName) -> Self {
        Self {
            title: format!("SketchRoom - {}", room),
            width: 1280,
            height: 800,
            server_url: DEFAULT_SERVER_URL.to_string(),
            room,
            background_color: Color::from_rgba8(0, 0, 0, 255),
        }
    }
}

/// Runtime state that exists once the window is up.
struct AppState {
    // Windowing
    window: Arc<Window>,
    surface: RenderSurface<'static>,

    // Rendering
    vello_renderer: vello::Renderer,
    scene_renderer: VelloRenderer,
    /// Texture blitter for RGBA->surface format conversion
    texture_blitter: vello::wgpu::util::TextureBlitter,

    event_handler: EventHandler,
}

/// Main application struct.
pub struct App {
    config: AppConfig,
    session: Session,
    websocket: NativeWebSocket,
    state: Option<AppState>,
    render_cx: Option<vello::util::RenderContext>,
    /// Set when window or renderer creation failed.
    init_error: Option<RendererError>,
}

impl App {
    /// Create a new application; nothing is opened or connected yet.
    pub fn new(config: AppConfig) -> Self {
        Self {
            session: Session::new(config.room.clone()),
            config,
            websocket: NativeWebSocket::new(),
            state: None,
            render_cx: None,
            init_error: None,
        }
    }

    /// Connect to the room and run until the window closes.
    pub fn run(config: AppConfig) -> Result<(), AppError> {
        let event_loop = EventLoop::new()?;
        let mut app = App::new(config);

        log::info!("Connecting to {} (room {})", app.config.server_url, app.config.room);
        app.websocket.connect(&app.config.server_url)?;

        event_loop.run_app(&mut app)?;

        match app.init_error.take() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<AppState, RendererError> {
        let window_attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .map_err(|e| RendererError::InitFailed(e.to_string()))?,
        );

        let size = window.inner_size();
        let (width, height) = if size.width == 0 || size.height == 0 {
            (self.config.width, self.config.height)
        } else {
            (size.width, size.height)
        };
        log::info!("Surface size: {}x{}", width, height);

        let render_cx = self.render_cx.get_or_insert_with(vello::util::RenderContext::new);
        let surface = pollster::block_on(render_cx.create_surface(
            window.clone(),
            width,
            height,
            PresentMode::AutoVsync,
        ))
        .map_err(|e| RendererError::Surface(format!("{:?}", e)))?;

        let device = &render_cx.devices[surface.dev_id].device;
        let vello_renderer = vello::Renderer::new(device, RendererOptions::default())
            .map_err(|e| RendererError::InitFailed(format!("{:?}", e)))?;

        // Vello renders to Rgba8Unorm; the surface format may differ.
        let texture_blitter = vello::wgpu::util::TextureBlitter::new(device, surface.config.format);

        self.session
            .set_viewport_size(surface.config.width as f64, surface.config.height as f64);

        Ok(AppState {
            window,
            surface,
            vello_renderer,
            scene_renderer: VelloRenderer::new(),
            texture_blitter,
            event_handler: EventHandler::new(),
        })
    }

    /// Feed an input outcome to the renderer and flush any broadcast.
    fn after_input(&mut self, response: InputResponse) {
        if response.broadcast {
            self.pump();
        }
        self.repaint(response.redraw);
    }

    /// Exchange messages with the room.
    fn pump(&mut self) {
        let redraw = self.session.pump(&mut self.websocket);
        self.repaint(redraw);
    }

    fn repaint(&mut self, redraw: Redraw) {
        if redraw.is_none() {
            return;
        }
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let ctx = RenderContext::new(self.session.canvas()).with_background(self.config.background_color);
        state.scene_renderer.apply(redraw, &ctx);
        state.window.request_redraw();
    }

    fn render_frame(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let Some(render_cx) = self.render_cx.as_ref() else {
            return;
        };

        let device_handle = &render_cx.devices[state.surface.dev_id];
        let device = &device_handle.device;
        let queue = &device_handle.queue;

        let surface_texture = match state.surface.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Failed to get surface texture: {:?}", e);
                return;
            }
        };

        let width = state.surface.config.width;
        let height = state.surface.config.height;

        let params = RenderParams {
            base_color: self.config.background_color,
            width,
            height,
            antialiasing_method: AaConfig::Area,
        };

        // Vello's compute shaders need a storage-bindable Rgba8Unorm target,
        // which is then copied onto the surface.
        let render_texture = device.create_texture(&vello::wgpu::TextureDescriptor {
            label: Some("vello render texture"),
            size: vello::wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: vello::wgpu::TextureDimension::D2,
            format: vello::wgpu::TextureFormat::Rgba8Unorm,
            usage: vello::wgpu::TextureUsages::STORAGE_BINDING
                | vello::wgpu::TextureUsages::COPY_SRC
                | vello::wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let render_texture_view = render_texture.create_view(&vello::wgpu::TextureViewDescriptor::default());

        if let Err(e) = state.vello_renderer.render_to_texture(
            device,
            queue,
            state.scene_renderer.scene(),
            &render_texture_view,
            &params,
        ) {
            log::error!("Failed to render: {:?}", e);
            return;
        }

        let surface_view = surface_texture
            .texture
            .create_view(&vello::wgpu::TextureViewDescriptor::default());

        let mut encoder = device.create_command_encoder(&vello::wgpu::CommandEncoderDescriptor {
            label: Some("blit encoder"),
        });
        state
            .texture_blitter
            .copy(device, &mut encoder, &render_texture_view, &surface_view);
        queue.submit(std::iter::once(encoder.finish()));

        surface_texture.present();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        log::info!("Creating window...");
        match self.init(event_loop) {
            Ok(state) => {
                log::info!(
                    "SketchRoom initialized - {}x{}",
                    state.surface.config.width,
                    state.surface.config.height
                );
                log::info!(
                    "Left mouse draws, right mouse pans, wheel zooms, {}",
                    self.session.bindings().summary()
                );
                self.state = Some(state);
                self.repaint(Redraw::Full);
            }
            Err(e) => {
                log::error!("Initialization failed: {}", e);
                self.init_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                self.websocket.disconnect();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    return;
                }
                if let Some(render_cx) = self.render_cx.as_mut() {
                    render_cx.resize_surface(&mut state.surface, size.width, size.height);
                }
                self.session.set_viewport_size(size.width as f64, size.height as f64);
                self.repaint(Redraw::Full);
            }

            WindowEvent::RedrawRequested => self.render_frame(),

            WindowEvent::ModifiersChanged(modifiers) => {
                state.event_handler.modifiers_changed(modifiers.state());
            }

            WindowEvent::CursorMoved { position, .. } => {
                let event = state.event_handler.cursor_moved(Point::new(position.x, position.y));
                let response = self.session.handle_pointer_event(event);
                self.after_input(response);
            }

            WindowEvent::MouseInput {
                state: btn_state,
                button,
                ..
            } => {
                if let Some(event) = state.event_handler.mouse_input(btn_state, button) {
                    let response = self.session.handle_pointer_event(event);
                    self.after_input(response);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let event = state.event_handler.mouse_wheel(delta);
                let response = self.session.handle_pointer_event(event);
                self.after_input(response);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(key_event) = state.event_handler.keyboard_input(&event.logical_key, event.state) {
                    let response = self.session.handle_key_event(&key_event);
                    self.after_input(response);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.pump();
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + POLL_INTERVAL));
    }
}
