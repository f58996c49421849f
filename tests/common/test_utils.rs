#![allow(dead_code)]

use std::path::Path;

use matcap_flow::{
    camera::Camera,
    config::SceneConfig,
    data_structures::scene_graph::{NodeKind, SceneRegistry},
    error::{Result, SceneError},
    generate::SequenceSource,
    render::Renderer,
    resources::font::Typeface,
    schedule::FrameRequester,
    session::SceneSession,
};

/// Counts frame requests instead of scheduling anything.
#[derive(Debug, Default)]
pub(crate) struct CountingRequester {
    requests: u32,
}

impl CountingRequester {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> u32 {
        self.requests
    }
}

impl FrameRequester for CountingRequester {
    fn request_frame(&mut self) {
        self.requests += 1;
    }
}

/// One entry per `render` call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Frame {
    pub nodes: usize,
    pub bulk: usize,
    pub aspect: f32,
}

/// Records what it was asked to draw. Can be told to fail.
#[derive(Debug, Default)]
pub(crate) struct RecordingRenderer {
    pub frames: Vec<Frame>,
    pub sizes: Vec<(u32, u32)>,
    pub fail: bool,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, scene: &SceneRegistry, camera: &Camera) -> Result<()> {
        self.frames.push(Frame {
            nodes: scene.len(),
            bulk: scene.count(NodeKind::Bulk),
            aspect: camera.aspect,
        });
        if self.fail {
            return Err(SceneError::Render("surface lost".to_string()));
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.sizes.push((width, height));
    }
}

/// Square outline with a square hole, in font units.
pub(crate) const RING: &str = "m 0 0 l 600 0 l 600 700 l 0 700 m 150 150 l 150 550 l 450 550 l 450 150";

/// A typeface with `O` (ring), `I` (bar with a curved top), `?` and a blank space.
pub(crate) fn fixture_typeface_json() -> String {
    format!(
        r#"{{
            "glyphs": {{
                "O": {{ "ha": 700, "x_min": 0, "x_max": 600, "o": "{RING}" }},
                "I": {{ "ha": 300, "x_min": 0, "x_max": 200, "o": "m 0 0 l 200 0 l 200 600 q 0 600 100 700" }},
                "?": {{ "ha": 500, "x_min": 0, "x_max": 400, "o": "m 0 0 l 400 0 l 400 400 l 0 400" }},
                " ": {{ "ha": 250, "x_min": 0, "x_max": 0 }}
            }},
            "familyName": "Fixture",
            "resolution": 1000,
            "boundingBox": {{ "xMin": 0, "xMax": 600, "yMin": 0, "yMax": 700 }},
            "underlineThickness": 50,
            "ascender": 700,
            "descender": -100
        }}"#
    )
}

pub(crate) fn fixture_typeface() -> Typeface {
    Typeface::from_slice(fixture_typeface_json().as_bytes()).expect("fixture font parses")
}

/// The font shipped in `assets/`.
pub(crate) fn shipped_typeface() -> Typeface {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join(SceneConfig::default().assets.font);
    let bytes = std::fs::read(path).expect("shipped font exists");
    Typeface::from_slice(&bytes).expect("shipped font parses")
}

/// Default config with a small field and text the fixture font can draw.
pub(crate) fn small_config(count: usize) -> SceneConfig {
    let mut config = SceneConfig::default();
    config.scatter.count = count;
    config.scatter.seed = Some(7);
    config.text.content = "OI O".to_string();
    config
}

pub(crate) fn sequence_session(config: SceneConfig, values: &[f32]) -> SceneSession<SequenceSource> {
    SceneSession::with_rng(config, SequenceSource::new(values.to_vec()))
        .expect("valid config")
}

/// A session whose completion handler already ran.
pub(crate) fn loaded_session(count: usize) -> (SceneSession, CountingRequester) {
    let mut session = SceneSession::new(small_config(count)).expect("valid config");
    let mut requester = CountingRequester::new();
    session
        .on_font_loaded(&fixture_typeface(), &mut requester)
        .expect("scene populates");
    (session, requester)
}

pub(crate) fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-5,
        "expected {expected}, got {actual}"
    );
}
