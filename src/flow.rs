//! Application event loop.
//!
//! The winit host around a [`SceneSession`]. It opens the window, builds the
//! [`GpuRenderer`], fires both asset loads and feeds their results back into
//! the session as user events. From then on the session drives the loop:
//! every tick it runs ends with a frame request, which this host turns into
//! `Window::request_redraw`.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and the renderer, then spawns the loads
//! 2. `FlowEvent::TextureLoaded` / `FlowEvent::FontLoaded` arrive in any order
//! 3. The font completion handler starts the scheduler (first redraw request)
//! 4. `RedrawRequested` runs one tick and updates the window title

use std::{fmt::Debug, sync::Arc};

use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    config::SceneConfig,
    context::GpuRenderer,
    data_structures::texture::MatcapImage,
    error::Result,
    render::Renderer,
    resources::{AssetLoader, font::Typeface},
    schedule::{FrameRequester, TickOutcome},
    session::SceneSession,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Pixels of touchpad scroll that count as one wheel line.
const PIXELS_PER_LINE: f64 = 100.0;

/// Maps the scheduler's frame requests onto winit redraws.
pub struct RedrawRequester(Arc<Window>);

impl FrameRequester for RedrawRequester {
    fn request_frame(&mut self) {
        self.0.request_redraw();
    }
}

pub(crate) enum FlowEvent {
    Initialized(GpuRenderer),
    TextureLoaded(Result<MatcapImage>),
    FontLoaded(Result<Typeface>),
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(renderer) => f.debug_tuple("Initialized").field(renderer).finish(),
            Self::TextureLoaded(result) => f
                .debug_tuple("TextureLoaded")
                .field(&result.as_ref().map(|image| &image.label))
                .finish(),
            Self::FontLoaded(result) => f
                .debug_tuple("FontLoaded")
                .field(&result.as_ref().map(|font| &font.family_name))
                .finish(),
        }
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<FlowEvent>,
    session: SceneSession,
    renderer: Option<GpuRenderer>,
    // Font results that arrived before the renderer did.
    pending_font: Option<Result<Typeface>>,
    started: bool,
    dragging: bool,
    title_revision: u64,
    frame_limit: Option<u64>,
}

impl App {
    fn new(
        event_loop: &EventLoop<FlowEvent>,
        session: SceneSession,
        frame_limit: Option<u64>,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            session,
            renderer: None,
            pending_font: None,
            started: false,
            dragging: false,
            title_revision: 0,
            frame_limit,
        })
    }

    fn spawn_loads(&self) {
        let loader = AssetLoader::new(&self.session.config().assets);

        let texture = {
            let loader = loader.clone();
            let proxy = self.proxy.clone();
            async move {
                let result = loader.load_texture().await;
                if proxy.send_event(FlowEvent::TextureLoaded(result)).is_err() {
                    log::warn!("event loop closed before the matcap arrived");
                }
            }
        };
        let font = {
            let proxy = self.proxy.clone();
            async move {
                let result = loader.load_font().await;
                if proxy.send_event(FlowEvent::FontLoaded(result)).is_err() {
                    log::warn!("event loop closed before the font arrived");
                }
            }
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            self.async_runtime.spawn(texture);
            self.async_runtime.spawn(font);
        }
        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(texture);
            wasm_bindgen_futures::spawn_local(font);
        }
    }

    fn apply_font(&mut self, result: Result<Typeface>) {
        let Some(renderer) = &self.renderer else {
            self.pending_font = Some(result);
            return;
        };
        let mut requester = RedrawRequester(renderer.window().clone());
        match result {
            Ok(font) => {
                // failures are recorded on the session
                if let Err(e) = self.session.on_font_loaded(&font, &mut requester) {
                    log::debug!("font completion rejected: {}", e);
                }
            }
            Err(e) => self.session.on_font_failed(&e),
        }
        self.refresh_title();
    }

    fn refresh_title(&mut self) {
        let debug = self.session.debug();
        if debug.revision() == self.title_revision {
            return;
        }
        self.title_revision = debug.revision();
        if let Some(renderer) = &self.renderer {
            renderer.window().set_title(&debug.summary());
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };
        let mut requester = RedrawRequester(renderer.window().clone());
        match self.session.tick(renderer, &mut requester) {
            Ok(TickOutcome::Rendered { frame, .. }) => {
                if self.frame_limit.is_some_and(|limit| frame >= limit) {
                    log::info!("rendered {} frames, exiting", frame);
                    event_loop.exit();
                }
            }
            Ok(TickOutcome::Skipped) => {}
            Err(e) => log::error!("Unable to render {}", e),
        }
        self.refresh_title();
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // resumed fires again after suspends; the renderer and loads stay
        if self.started {
            return;
        }
        self.started = true;
        let view = &self.session.config().view;
        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title(view.title.clone())
            .with_inner_size(PhysicalSize::new(view.width, view.height));

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let canvas = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id(CANVAS_ID));
            match canvas {
                Some(canvas) => {
                    window_attributes =
                        window_attributes.with_canvas(Some(canvas.unchecked_into()));
                }
                None => log::warn!("no #{} element, winit will create a canvas", CANVAS_ID),
            }
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("could not create a window: {}", e);
                event_loop.exit();
                return;
            }
        };
        let clear_colour = view.clear_colour;
        let init_future = GpuRenderer::new(window, clear_colour);

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(renderer) => self.user_event(event_loop, FlowEvent::Initialized(renderer)),
                Err(e) => {
                    log::error!("App initialization failed. Cannot create the renderer: {}", e);
                    event_loop.exit();
                    return;
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok(renderer) => {
                        if proxy.send_event(FlowEvent::Initialized(renderer)).is_err() {
                            log::error!("event loop closed during initialization");
                        }
                    }
                    Err(e) => log::error!("Cannot create the renderer: {}", e),
                }
            });
        }

        self.spawn_loads();
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        log::debug!("{:?}", event);
        match event {
            FlowEvent::Initialized(mut renderer) => {
                let window = renderer.window().clone();
                let size = window.inner_size();
                self.session.set_pixel_ratio(window.scale_factor());
                self.session.resize(size.width, size.height, &mut renderer);
                self.renderer = Some(renderer);
                if let Some(font) = self.pending_font.take() {
                    self.apply_font(font);
                }
                if self.frame_limit.is_some() && self.session.load_error().is_some() {
                    event_loop.exit();
                }
                self.refresh_title();
                window.request_redraw();
            }
            FlowEvent::TextureLoaded(Ok(image)) => {
                self.session.on_texture_loaded(image);
            }
            FlowEvent::TextureLoaded(Err(e)) => {
                self.session.on_texture_failed(&e);
                self.refresh_title();
            }
            FlowEvent::FontLoaded(result) => {
                self.apply_font(result);
                // a bounded run would otherwise wait forever
                if self.frame_limit.is_some() && self.session.load_error().is_some() {
                    event_loop.exit();
                }
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.dragging {
                let height = self.session.viewport().height;
                self.session
                    .controller_mut()
                    .handle_mouse_drag(dx, dy, height);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    self.session.resize(size.width, size.height, renderer);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.session.set_pixel_ratio(scale_factor);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.dragging = state == ElementState::Pressed;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => (position.y / PIXELS_PER_LINE) as f32,
                };
                self.session.controller_mut().handle_scroll(lines);
            }
            _ => {}
        }
    }
}

fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {}", e).into());
        }
    }
}

/// Open a window and run the scene until it is closed.
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    run_frames(config, None)
}

/// Like [`run`], but exit after `frame_limit` rendered frames when given.
pub fn run_frames(config: SceneConfig, frame_limit: Option<u64>) -> anyhow::Result<()> {
    init_logger();

    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<FlowEvent> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        EventLoop::with_user_event().with_any_thread(true).build()?
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<FlowEvent> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        EventLoop::with_user_event().with_any_thread(true).build()?
    };

    #[cfg(not(all(
        feature = "integration-tests",
        any(target_os = "linux", target_os = "windows")
    )))]
    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;

    let session = SceneSession::new(config)?;
    let mut app = App::new(&event_loop, session, frame_limit)?;

    event_loop.run_app(&mut app)?;

    if let Some(error) = app.session.load_error() {
        anyhow::bail!("scene never started: {}", error);
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> std::result::Result<(), JsValue> {
    run(SceneConfig::default()).map_err(|e| JsValue::from_str(&e.to_string()))
}
