//! The scene session: one explicit context object per mounted scene.
//!
//! A [`SceneSession`] owns everything the scene needs between frames: the
//! registry, the load gate, the scheduler, camera and controls, the debug
//! panel and the random source used for generation and per-frame jitter.
//! Hosts create one when the scene is mounted and drop it when it goes away.
//!
//! Lifecycle:
//!
//! 1. [`SceneSession::new`] (WAITING, empty registry, material without matcap)
//! 2. [`SceneSession::on_texture_loaded`] whenever the matcap arrives
//! 3. [`SceneSession::on_font_loaded`] populates text and tori, flips the load
//!    state and starts the scheduler (first frame request)
//! 4. [`SceneSession::tick`] on every requested frame

use std::sync::Arc;

use cgmath::Rad;
use rand::rngs::StdRng;

use crate::{
    camera::{Camera, OrbitController},
    config::SceneConfig,
    data_structures::{
        geometry::Geometry,
        instance::Instance,
        material::MatcapMaterial,
        scene_graph::{NodeKind, SceneNode, SceneRegistry, TextHandle},
        texture::MatcapImage,
    },
    debug::DebugPanel,
    error::{Result, SceneError},
    generate::{InstanceGenerator, RandomSource, RngSource},
    render::Renderer,
    resources::{LoadedAssets, font::Typeface, text::build_text_geometry},
    schedule::{FrameRequester, FrameScheduler, LoadState, SchedulerState, TickOutcome},
};

/// Last size reported by the host, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

pub struct SceneSession<R: RandomSource = RngSource<StdRng>> {
    config: SceneConfig,
    registry: SceneRegistry,
    load_state: LoadState,
    scheduler: FrameScheduler,
    text: Option<TextHandle>,
    material: Arc<MatcapMaterial>,
    camera: Camera,
    controller: OrbitController,
    debug: DebugPanel,
    viewport: Viewport,
    rng: R,
    load_error: Option<String>,
}

impl SceneSession<RngSource<StdRng>> {
    /// Session drawing from `config.scatter.seed`, or OS entropy without one.
    pub fn new(config: SceneConfig) -> Result<Self> {
        let rng = RngSource::from_seed_option(config.scatter.seed);
        Self::with_rng(config, rng)
    }
}

impl<R: RandomSource> SceneSession<R> {
    pub fn with_rng(config: SceneConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let viewport = Viewport {
            width: config.view.width,
            height: config.view.height,
            pixel_ratio: 1.0,
        };
        let camera = Camera::new(&config.camera, viewport.width, viewport.height);
        let controller = OrbitController::new(&config.camera);
        let mut debug = DebugPanel::new(&config.view.title);
        debug.set("loaded", false);
        debug.set("instances", 0usize);
        Ok(Self {
            registry: SceneRegistry::new(),
            load_state: LoadState::default(),
            scheduler: FrameScheduler::new(),
            text: None,
            material: Arc::new(MatcapMaterial::new("matcap")),
            camera,
            controller,
            debug,
            viewport,
            rng,
            load_error: None,
            config,
        })
    }

    /// Bind the matcap to the shared material. Safe before or after the font.
    pub fn on_texture_loaded(&mut self, image: MatcapImage) -> bool {
        self.material.set_matcap(image)
    }

    /// A missing matcap is not fatal; the material keeps rendering with the fallback.
    pub fn on_texture_failed(&mut self, error: &SceneError) {
        log::warn!("matcap unavailable, using fallback: {error}");
        self.debug.set("texture", error.to_string());
    }

    /// Font completion handler: build the text and the torus field, then start the frame loop.
    ///
    /// Runs once. A second call fails with [`SceneError::AlreadyLoaded`]
    /// and leaves the scene untouched. If the text cannot be built the font
    /// counts as failed: the scene stays unloaded and [`Self::load_error`] is set.
    pub fn on_font_loaded(
        &mut self,
        font: &Typeface,
        requester: &mut impl FrameRequester,
    ) -> Result<()> {
        if self.load_state.is_loaded() {
            return Err(SceneError::AlreadyLoaded);
        }

        // glyph outlines are only parsed here, so a broken font surfaces now
        let mut text_geometry = match build_text_geometry(font, &self.config.text) {
            Ok(geometry) => geometry,
            Err(e) => {
                self.on_font_failed(&e);
                return Err(e);
            }
        };
        text_geometry.center();
        let text = self.registry.add_text(SceneNode::new(
            NodeKind::Text,
            Arc::new(text_geometry),
            Arc::clone(&self.material),
            Instance::new(),
        ));
        self.text = Some(text);

        // one torus mesh for every instance
        let torus = Arc::new(Geometry::torus(&self.config.torus));
        InstanceGenerator::from(&self.config.scatter).populate(
            &mut self.registry,
            &torus,
            &self.material,
            &mut self.rng,
        );

        self.load_state.mark_loaded();
        self.debug.set("loaded", true);
        self.debug.set("instances", self.registry.len());
        self.scheduler.start(requester);
        Ok(())
    }

    /// Record a font failure. The scene stays in WAITING for good.
    pub fn on_font_failed(&mut self, error: &SceneError) {
        log::error!("font unavailable, scene will not start: {error}");
        self.load_error = Some(error.to_string());
        self.debug.set("error", error.to_string());
    }

    /// Apply a joined load: texture first, then the font completion handler.
    pub fn apply_assets(
        &mut self,
        assets: LoadedAssets,
        requester: &mut impl FrameRequester,
    ) -> Result<()> {
        match assets.texture {
            Ok(image) => {
                self.on_texture_loaded(image);
            }
            Err(e) => self.on_texture_failed(&e),
        }
        match assets.font {
            Ok(font) => self.on_font_loaded(&font, requester),
            Err(e) => {
                self.on_font_failed(&e);
                Err(e)
            }
        }
    }

    /// Absolute text rotation for `elapsed` seconds. Calling it twice with the same value is a no-op.
    pub fn animate_text(&mut self, elapsed: f32) -> Result<()> {
        if !self.load_state.is_loaded() {
            return Err(SceneError::NotLoaded);
        }
        let handle = self.text.ok_or(SceneError::NotLoaded)?;
        let animation = &self.config.animation;
        let node = self
            .registry
            .text_mut(handle)
            .ok_or(SceneError::NotLoaded)?;
        node.transform.rotation.y = Rad(animation.text_yaw_rate * elapsed);
        node.transform.rotation.x = Rad(animation.text_pitch_rate * elapsed);
        Ok(())
    }

    /// Add a fresh random increment in `[0, bulk_jitter)` to yaw, then pitch, of every bulk node.
    ///
    /// Accumulates: repeated calls keep turning the tori, and results depend
    /// on the whole history of draws. Returns the number of nodes touched.
    pub fn jitter_bulk(&mut self) -> Result<usize> {
        if !self.load_state.is_loaded() {
            return Err(SceneError::NotLoaded);
        }
        let jitter = self.config.animation.bulk_jitter;
        let wrap = self.config.animation.wrap_rotation;
        let rng = &mut self.rng;
        let mut touched = 0;
        self.registry.for_each_mut(NodeKind::Bulk, |node| {
            node.transform.rotation.y += Rad(rng.next_unit() * jitter);
            node.transform.rotation.x += Rad(rng.next_unit() * jitter);
            if wrap {
                node.transform.wrap_rotation();
            }
            touched += 1;
        });
        Ok(touched)
    }

    /// One frame at the scheduler's own clock.
    pub fn tick(
        &mut self,
        renderer: &mut impl Renderer,
        requester: &mut impl FrameRequester,
    ) -> Result<TickOutcome> {
        let elapsed = self.scheduler.elapsed();
        self.tick_at(elapsed, renderer, requester)
    }

    /// One frame at `elapsed` seconds.
    ///
    /// While WAITING this returns [`TickOutcome::Skipped`] and touches
    /// nothing. While RUNNING it animates, renders and requests the next
    /// frame. The next frame is requested even when rendering fails; the
    /// render error is returned afterwards.
    pub fn tick_at(
        &mut self,
        elapsed: f32,
        renderer: &mut impl Renderer,
        requester: &mut impl FrameRequester,
    ) -> Result<TickOutcome> {
        if !self.scheduler.is_running() || !self.load_state.is_loaded() {
            return Ok(TickOutcome::Skipped);
        }
        self.animate_text(elapsed)?;
        self.jitter_bulk()?;
        self.controller.update(&mut self.camera);

        let rendered = renderer.render(&self.registry, &self.camera);
        let frame = self.scheduler.complete_frame(requester);
        rendered?;
        Ok(TickOutcome::Rendered { frame, elapsed })
    }

    /// Viewport change from the host. Zero sizes (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32, renderer: &mut impl Renderer) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport.width = width;
        self.viewport.height = height;
        self.camera.resize(width, height);
        renderer.resize(width, height);
    }

    /// Store the device pixel ratio, capped at `view.max_pixel_ratio`. Returns the stored value.
    pub fn set_pixel_ratio(&mut self, device_ratio: f64) -> f64 {
        let ratio = device_ratio.min(self.config.view.max_pixel_ratio).max(f64::EPSILON);
        self.viewport.pixel_ratio = ratio;
        ratio
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn is_loaded(&self) -> bool {
        self.load_state.is_loaded()
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn text_node(&self) -> Option<&SceneNode> {
        self.text.and_then(|handle| self.registry.text(handle))
    }

    pub fn material(&self) -> &Arc<MatcapMaterial> {
        &self.material
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controller_mut(&mut self) -> &mut OrbitController {
        &mut self.controller
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn debug(&self) -> &DebugPanel {
        &self.debug
    }

    pub fn debug_mut(&mut self) -> &mut DebugPanel {
        &mut self.debug
    }
}
